/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use chrono::{DateTime, Utc};

use super::HttpTransportError;
use crate::MetricRecord;

mod precision;
pub use precision::TimestampPrecision;

mod influxdb;
pub use influxdb::InfluxdbLineEncoder;

mod bulk;
pub use bulk::BulkJsonEncoder;

/// Wire encoding of a payload for a HTTP bulk write endpoint.
pub trait PayloadEncoder {
    fn content_type(&self) -> &'static str;

    /// Append the encoded records to `buf`, returns the number of records written.
    fn encode(&self, records: &[MetricRecord], time: DateTime<Utc>, buf: &mut Vec<u8>) -> usize;

    fn check_response(&self, code: u16, body: &[u8]) -> Result<(), HttpTransportError> {
        if (200..300).contains(&code) {
            Ok(())
        } else {
            Err(HttpTransportError::error_response(code, body))
        }
    }
}
