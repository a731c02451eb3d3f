/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use chrono::Utc;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::{BulkWrite, PayloadEncoder};
use crate::MetricRecord;

mod config;
pub use config::HttpTransportConfig;

mod error;
pub use error::HttpTransportError;

mod response;
pub use response::{HttpResponse, HttpResponseParseError};

/// POST the whole payload to a HTTP bulk write endpoint.
///
/// A new connection is used for each flush.
pub struct HttpBulkTransport<E> {
    reporter: String,
    config: HttpTransportConfig,
    encoder: E,
    header_buf: Vec<u8>,
    body_buf: Vec<u8>,
}

impl<E: PayloadEncoder> HttpBulkTransport<E> {
    pub fn new(reporter: impl Into<String>, config: HttpTransportConfig, encoder: E) -> Self {
        HttpBulkTransport {
            reporter: reporter.into(),
            config,
            encoder,
            header_buf: Vec::with_capacity(1024),
            body_buf: Vec::with_capacity(16 * 1024),
        }
    }

    #[inline]
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    #[inline]
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Encode the records into the request buffers, returns the encoded record count.
    fn build_request(&mut self, records: &[MetricRecord]) -> usize {
        self.header_buf.clear();
        self.body_buf.clear();

        let count = self.encoder.encode(records, Utc::now(), &mut self.body_buf);
        self.config.write_fixed_header(
            &mut self.header_buf,
            self.encoder.content_type(),
            self.body_buf.len(),
        );
        count
    }

    async fn post<S>(&self, stream: S) -> Result<(), HttpTransportError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut stream = BufReader::new(stream);
        let writer = stream.get_mut();
        writer
            .write_all(&self.header_buf)
            .await
            .map_err(HttpTransportError::WriteFailed)?;
        writer
            .write_all(&self.body_buf)
            .await
            .map_err(HttpTransportError::WriteFailed)?;
        writer
            .flush()
            .await
            .map_err(HttpTransportError::WriteFailed)?;

        let rsp = HttpResponse::parse(&mut stream, self.config.rsp_header_max_size).await?;
        let body = rsp
            .read_body(&mut stream, self.config.rsp_body_max_size)
            .await?;
        self.encoder.check_response(rsp.code, &body)
    }
}

impl<E> BulkWrite for HttpBulkTransport<E>
where
    E: PayloadEncoder + Send + Sync,
{
    async fn write(&mut self, records: &[MetricRecord]) -> bool {
        if records.is_empty() {
            return true;
        }
        let count = self.build_request(records);
        if count == 0 {
            debug!("reporter {}: nothing to post after encoding", self.reporter);
            return true;
        }

        let r = match self.config.connect().await {
            Ok(stream) => self.post(stream).await,
            Err(e) => Err(e),
        };
        match r {
            Ok(_) => {
                debug!(
                    "reporter {}: posted {count} records to {}",
                    self.reporter,
                    self.config.peer()
                );
                true
            }
            Err(e) => {
                warn!(
                    "reporter {}: failed to post {count} records to {}: {e}",
                    self.reporter,
                    self.config.peer()
                );
                false
            }
        }
    }
}
