/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::str::FromStr;

use http::{HeaderMap, HeaderName, HeaderValue, Version, header};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

#[derive(Debug, Error)]
pub enum HttpResponseParseError {
    #[error("remote closed")]
    RemoteClosed,
    #[error("too large header, should be less than {0}")]
    TooLargeHeader(usize),
    #[error("too large body, should be less than {0}")]
    TooLargeBody(usize),
    #[error("invalid version {0}")]
    InvalidVersion(String),
    #[error("invalid status line")]
    InvalidStatusLine,
    #[error("invalid header line")]
    InvalidHeaderLine,
    #[error("invalid content length")]
    InvalidContentLength,
    #[error("invalid chunked transfer-encoding")]
    InvalidChunkedTransferEncoding,
    #[error("io failed: {0:?}")]
    IoFailed(#[from] io::Error),
}

/// Status line and headers of a HTTP/1.x response.
pub struct HttpResponse {
    pub version: Version,
    pub code: u16,
    pub reason: String,
    pub headers: HeaderMap,
    content_length: Option<u64>,
    chunked: bool,
}

impl HttpResponse {
    fn new(version: Version, code: u16, reason: String) -> Self {
        HttpResponse {
            version,
            code,
            reason,
            headers: HeaderMap::new(),
            content_length: None,
            chunked: false,
        }
    }

    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn expect_no_body(&self) -> bool {
        self.code < 200 || self.code == 204 || self.code == 304
    }

    pub async fn parse<R>(
        reader: &mut R,
        max_header_size: usize,
    ) -> Result<Self, HttpResponseParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::<u8>::with_capacity(1024);
        let mut header_size: usize = 0;

        let (found, nr) = limited_read_line(reader, max_header_size, &mut line_buf).await?;
        if nr == 0 {
            return Err(HttpResponseParseError::RemoteClosed);
        }
        if !found {
            return if nr < max_header_size {
                Err(HttpResponseParseError::RemoteClosed)
            } else {
                Err(HttpResponseParseError::TooLargeHeader(max_header_size))
            };
        }
        header_size += nr;

        let mut rsp = HttpResponse::build_from_status_line(&line_buf)?;

        loop {
            if header_size >= max_header_size {
                return Err(HttpResponseParseError::TooLargeHeader(max_header_size));
            }
            line_buf.clear();
            let max_len = max_header_size - header_size;
            let (found, nr) = limited_read_line(reader, max_len, &mut line_buf).await?;
            if nr == 0 {
                return Err(HttpResponseParseError::RemoteClosed);
            }
            if !found {
                return if nr < max_len {
                    Err(HttpResponseParseError::RemoteClosed)
                } else {
                    Err(HttpResponseParseError::TooLargeHeader(max_header_size))
                };
            }
            header_size += nr;
            if line_buf == b"\n" || line_buf == b"\r\n" {
                // header end line
                break;
            }

            rsp.parse_header_line(&line_buf)?;
        }

        Ok(rsp)
    }

    fn build_from_status_line(line_buf: &[u8]) -> Result<Self, HttpResponseParseError> {
        let line = std::str::from_utf8(line_buf)
            .map_err(|_| HttpResponseParseError::InvalidStatusLine)?
            .trim_end();

        let mut parts = line.splitn(3, ' ');
        let version = match parts.next() {
            Some("HTTP/1.0") => Version::HTTP_10,
            Some("HTTP/1.1") => Version::HTTP_11,
            Some(v) => return Err(HttpResponseParseError::InvalidVersion(v.to_string())),
            None => return Err(HttpResponseParseError::InvalidStatusLine),
        };
        let code = parts
            .next()
            .and_then(|s| u16::from_str(s).ok())
            .filter(|code| (100..1000).contains(code))
            .ok_or(HttpResponseParseError::InvalidStatusLine)?;
        let reason = parts.next().unwrap_or_default().to_string();

        Ok(HttpResponse::new(version, code, reason))
    }

    fn parse_header_line(&mut self, line_buf: &[u8]) -> Result<(), HttpResponseParseError> {
        let Some(p) = memchr::memchr(b':', line_buf) else {
            return Err(HttpResponseParseError::InvalidHeaderLine);
        };
        let name = HeaderName::from_bytes(line_buf[..p].trim_ascii())
            .map_err(|_| HttpResponseParseError::InvalidHeaderLine)?;
        let value = HeaderValue::from_bytes(line_buf[p + 1..].trim_ascii())
            .map_err(|_| HttpResponseParseError::InvalidHeaderLine)?;

        if name == header::CONTENT_LENGTH {
            let len = value
                .to_str()
                .ok()
                .and_then(|s| u64::from_str(s).ok())
                .ok_or(HttpResponseParseError::InvalidContentLength)?;
            if self.content_length.is_some_and(|v| v != len) {
                return Err(HttpResponseParseError::InvalidContentLength);
            }
            self.content_length = Some(len);
        } else if name == header::TRANSFER_ENCODING {
            let v = value.as_bytes().to_ascii_lowercase();
            if v.ends_with(b"chunked") {
                self.chunked = true;
            } else if memchr::memmem::find(&v, b"chunked").is_some() {
                return Err(HttpResponseParseError::InvalidChunkedTransferEncoding);
            }
        }

        self.headers.append(name, value);
        Ok(())
    }

    /// Read the whole body, which should be no larger than `max_body_size`.
    pub async fn read_body<R>(
        &self,
        reader: &mut R,
        max_body_size: usize,
    ) -> Result<Vec<u8>, HttpResponseParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut body = Vec::new();
        if self.expect_no_body() {
            return Ok(body);
        }

        if self.chunked {
            self.read_chunked_body(reader, max_body_size, &mut body).await?;
        } else if let Some(len) = self.content_length {
            if len > max_body_size as u64 {
                return Err(HttpResponseParseError::TooLargeBody(max_body_size));
            }
            body.resize(len as usize, 0);
            reader.read_exact(&mut body).await?;
        } else {
            let limit = max_body_size as u64 + 1;
            (&mut *reader).take(limit).read_to_end(&mut body).await?;
            if body.len() > max_body_size {
                return Err(HttpResponseParseError::TooLargeBody(max_body_size));
            }
        }
        Ok(body)
    }

    async fn read_chunked_body<R>(
        &self,
        reader: &mut R,
        max_body_size: usize,
        body: &mut Vec<u8>,
    ) -> Result<(), HttpResponseParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        const CHUNK_LINE_MAX_LEN: usize = 1024;

        let mut line_buf = Vec::<u8>::with_capacity(64);
        loop {
            line_buf.clear();
            let (found, _) = limited_read_line(reader, CHUNK_LINE_MAX_LEN, &mut line_buf).await?;
            if !found {
                return Err(HttpResponseParseError::InvalidChunkedTransferEncoding);
            }
            let size_s = line_buf
                .split(|b| *b == b';')
                .next()
                .map(|s| s.trim_ascii())
                .unwrap_or_default();
            let size = std::str::from_utf8(size_s)
                .ok()
                .and_then(|s| usize::from_str_radix(s, 16).ok())
                .ok_or(HttpResponseParseError::InvalidChunkedTransferEncoding)?;

            if size == 0 {
                // skip trailer fields
                loop {
                    line_buf.clear();
                    let (found, _) =
                        limited_read_line(reader, CHUNK_LINE_MAX_LEN, &mut line_buf).await?;
                    if !found {
                        return Err(HttpResponseParseError::InvalidChunkedTransferEncoding);
                    }
                    if line_buf == b"\n" || line_buf == b"\r\n" {
                        return Ok(());
                    }
                }
            }

            let start = body.len();
            let end = match start.checked_add(size) {
                Some(end) if end <= max_body_size => end,
                _ => return Err(HttpResponseParseError::TooLargeBody(max_body_size)),
            };
            body.resize(end, 0);
            reader.read_exact(&mut body[start..]).await?;

            line_buf.clear();
            let (found, _) = limited_read_line(reader, 2, &mut line_buf).await?;
            if !found {
                return Err(HttpResponseParseError::InvalidChunkedTransferEncoding);
            }
        }
    }
}

/// Read a line no longer than `max_len`, returns whether the line end is found.
async fn limited_read_line<R>(
    reader: &mut R,
    max_len: usize,
    buf: &mut Vec<u8>,
) -> io::Result<(bool, usize)>
where
    R: AsyncBufRead + Unpin,
{
    let start = buf.len();
    let nr = (&mut *reader)
        .take(max_len as u64)
        .read_until(b'\n', buf)
        .await?;
    let found = buf.len() > start && buf.last() == Some(&b'\n');
    Ok((found, nr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn parse(content: &'static [u8]) -> (HttpResponse, Vec<u8>) {
        let stream = tokio_test::io::Builder::new().read(content).build();
        let mut reader = BufReader::new(stream);
        let rsp = HttpResponse::parse(&mut reader, 4096).await.unwrap();
        let body = rsp.read_body(&mut reader, 1024).await.unwrap();
        (rsp, body)
    }

    #[tokio::test]
    async fn content_length() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 4\r\n\r\n\
            true";
        let (rsp, body) = parse(content).await;
        assert_eq!(rsp.code, 200);
        assert_eq!(rsp.reason, "OK");
        assert_eq!(rsp.version, Version::HTTP_11);
        assert_eq!(rsp.content_length(), Some(4));
        assert_eq!(body, b"true");
    }

    #[tokio::test]
    async fn no_content() {
        let content = b"HTTP/1.1 204 No Content\r\n\r\n";
        let (rsp, body) = parse(content).await;
        assert_eq!(rsp.code, 204);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn read_to_end() {
        let content = b"HTTP/1.0 400 Bad Request\r\n\
            Connection: close\r\n\r\n\
            bad line";
        let (rsp, body) = parse(content).await;
        assert_eq!(rsp.code, 400);
        assert_eq!(rsp.version, Version::HTTP_10);
        assert_eq!(body, b"bad line");
    }

    #[tokio::test]
    async fn chunked() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Transfer-Encoding: chunked\r\n\r\n\
            5\r\nhello\r\n\
            6;ext=1\r\n world\r\n\
            0\r\n\r\n";
        let (_, body) = parse(content).await;
        assert_eq!(body, b"hello world");
    }

    #[tokio::test]
    async fn chunk_size_overflow() {
        let stream = tokio_test::io::Builder::new()
            .read(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")
            .read(b"5\r\nhello\r\nffffffffffffffff\r\nabcd")
            .build();
        let mut reader = BufReader::new(stream);
        let rsp = HttpResponse::parse(&mut reader, 4096).await.unwrap();
        let r = rsp.read_body(&mut reader, 1024).await;
        assert!(matches!(r, Err(HttpResponseParseError::TooLargeBody(1024))));
    }

    #[tokio::test]
    async fn chunked_too_large() {
        let stream = tokio_test::io::Builder::new()
            .read(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")
            .read(b"5\r\nhello\r\n")
            .build();
        let mut reader = BufReader::new(stream);
        let rsp = HttpResponse::parse(&mut reader, 4096).await.unwrap();
        let r = rsp.read_body(&mut reader, 4).await;
        assert!(matches!(r, Err(HttpResponseParseError::TooLargeBody(4))));
    }

    #[tokio::test]
    async fn too_large_header() {
        let stream = tokio_test::io::Builder::new()
            .read(b"HTTP/1.1 200 OK\r\nX-Long: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n\r\n")
            .build();
        let mut reader = BufReader::new(stream);
        let r = HttpResponse::parse(&mut reader, 32).await;
        assert!(matches!(r, Err(HttpResponseParseError::TooLargeHeader(32))));
    }

    #[tokio::test]
    async fn remote_closed() {
        let stream = tokio_test::io::Builder::new().read(b"HTTP/1.1 20").build();
        let mut reader = BufReader::new(stream);
        let r = HttpResponse::parse(&mut reader, 4096).await;
        assert!(matches!(r, Err(HttpResponseParseError::RemoteClosed)));
    }

    #[tokio::test]
    async fn invalid_version() {
        let stream = tokio_test::io::Builder::new()
            .read(b"SPDY/3 200 OK\r\n\r\n")
            .build();
        let mut reader = BufReader::new(stream);
        let r = HttpResponse::parse(&mut reader, 4096).await;
        assert!(matches!(r, Err(HttpResponseParseError::InvalidVersion(_))));
    }
}
