/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::HttpResponseParseError;

const ERROR_DETAIL_MAX_LEN: usize = 512;

#[derive(Debug, Error)]
pub enum HttpTransportError {
    #[error("failed to resolve {0}: {1}")]
    ResolveFailed(String, io::Error),
    #[error("no address found for {0}")]
    NoPeerAddress(String),
    #[error("failed to connect to {0}: {1}")]
    ConnectFailed(String, io::Error),
    #[error("{0} timed out")]
    Timeout(&'static str),
    #[error("write request failed: {0}")]
    WriteFailed(io::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(#[from] HttpResponseParseError),
    #[error("error response: {code} {detail}")]
    ErrorResponse { code: u16, detail: String },
}

impl HttpTransportError {
    /// Keep the head of the response body as error detail.
    pub fn error_response(code: u16, body: &[u8]) -> Self {
        let body = &body[..body.len().min(ERROR_DETAIL_MAX_LEN)];
        HttpTransportError::ErrorResponse {
            code,
            detail: String::from_utf8_lossy(body).trim().to_string(),
        }
    }
}
