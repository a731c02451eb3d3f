/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::anyhow;
use http::uri::PathAndQuery;
use http::{HeaderMap, HeaderName, HeaderValue, header};
use tokio::net::TcpStream;

use super::HttpTransportError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpTransportConfig {
    host: String,
    port: u16,
    api_path: PathAndQuery,
    static_headers: HeaderMap,
    pub(super) connect_timeout: Duration,
    pub(super) rsp_header_max_size: usize,
    pub(super) rsp_body_max_size: usize,
}

impl HttpTransportConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        HttpTransportConfig {
            host: host.into(),
            port,
            api_path: PathAndQuery::from_static("/"),
            static_headers: HeaderMap::new(),
            connect_timeout: Duration::from_secs(10),
            rsp_header_max_size: 8192,
            rsp_body_max_size: 64 * 1024,
        }
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    #[inline]
    pub fn api_path(&self) -> &PathAndQuery {
        &self.api_path
    }

    pub fn set_api_path(&mut self, path: PathAndQuery) {
        self.api_path = path;
    }

    pub fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.static_headers.append(name, value);
    }

    /// Add an `Authorization: <scheme> <token>` header.
    pub fn set_auth_token(&mut self, scheme: &str, token: &str) -> anyhow::Result<()> {
        let mut value = HeaderValue::from_str(&format!("{scheme} {token}"))
            .map_err(|e| anyhow!("invalid auth token: {e}"))?;
        value.set_sensitive(true);
        self.static_headers.insert(header::AUTHORIZATION, value);
        Ok(())
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn set_rsp_header_max_size(&mut self, size: usize) {
        self.rsp_header_max_size = size;
    }

    pub fn set_rsp_body_max_size(&mut self, size: usize) {
        self.rsp_body_max_size = size;
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if self.host.is_empty() {
            return Err(anyhow!("peer address is not set"));
        }
        if self.port == 0 {
            return Err(anyhow!("peer port is not set"));
        }
        Ok(())
    }

    fn host_s(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    pub fn peer(&self) -> String {
        format!("{}:{}", self.host_s(), self.port)
    }

    async fn select_peer(&self, peer_s: &str) -> Result<SocketAddr, HttpTransportError> {
        let peers: Vec<SocketAddr> = tokio::net::lookup_host(peer_s)
            .await
            .map_err(|e| HttpTransportError::ResolveFailed(peer_s.to_string(), e))?
            .collect();
        fastrand::choice(&peers)
            .copied()
            .ok_or_else(|| HttpTransportError::NoPeerAddress(peer_s.to_string()))
    }

    pub(super) async fn connect(&self) -> Result<TcpStream, HttpTransportError> {
        let peer_s = self.peer();
        let connect = async {
            let peer = self.select_peer(&peer_s).await?;
            TcpStream::connect(peer)
                .await
                .map_err(|e| HttpTransportError::ConnectFailed(peer.to_string(), e))
        };
        tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| HttpTransportError::Timeout("connect"))?
    }

    pub(super) fn write_fixed_header(
        &self,
        header_buf: &mut Vec<u8>,
        content_type: &str,
        content_length: usize,
    ) {
        header_buf.extend_from_slice(b"POST ");
        header_buf.extend_from_slice(self.api_path.as_str().as_bytes());
        header_buf.extend_from_slice(b" HTTP/1.1\r\n");
        header_buf.extend_from_slice(b"Host: ");
        let _ = write!(header_buf, "{}:{}", self.host_s(), self.port);
        header_buf.extend_from_slice(b"\r\n");
        header_buf.extend_from_slice(b"Connection: close\r\n");
        header_buf.extend_from_slice(b"Content-Type: ");
        header_buf.extend_from_slice(content_type.as_bytes());
        header_buf.extend_from_slice(b"\r\n");
        for (header, value) in &self.static_headers {
            header_buf.extend_from_slice(header.as_str().as_bytes());
            header_buf.extend_from_slice(b": ");
            header_buf.extend_from_slice(value.as_bytes());
            header_buf.extend_from_slice(b"\r\n");
        }
        let _ = write!(header_buf, "Content-Length: {content_length}\r\n\r\n");
    }
}
