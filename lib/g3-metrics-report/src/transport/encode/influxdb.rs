/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::Write;

use chrono::{DateTime, Utc};
use log::debug;

use super::{PayloadEncoder, TimestampPrecision};
use crate::MetricRecord;

const KIND_TAG: &str = "mtype";

/// InfluxDB line protocol.
///
/// The metric kind is added as tag `mtype` unless the record already has it.
/// Non-finite doubles are left out of the field set, and records without
/// any remaining field are skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct InfluxdbLineEncoder {
    precision: TimestampPrecision,
}

impl InfluxdbLineEncoder {
    pub fn new(precision: TimestampPrecision) -> Self {
        InfluxdbLineEncoder { precision }
    }

    #[inline]
    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    fn encode_record(
        &self,
        record: &MetricRecord,
        timestamp: Option<i64>,
        buf: &mut Vec<u8>,
    ) -> bool {
        let start = buf.len();

        write_escaped(buf, &record.name, b", ");
        for (k, v) in record.tags.iter() {
            buf.push(b',');
            write_escaped(buf, k, b",= ");
            buf.push(b'=');
            write_escaped(buf, v, b",= ");
        }
        if !record.tags.contains(KIND_TAG) {
            let _ = write!(buf, ",{KIND_TAG}={}", record.kind);
        }

        let mut field_count = 0;
        for (name, value) in &record.fields {
            if !value.is_finite() {
                continue;
            }
            buf.push(if field_count == 0 { b' ' } else { b',' });
            write_escaped(buf, name, b",= ");
            let _ = write!(buf, "={}", value.display_influxdb());
            field_count += 1;
        }
        if field_count == 0 {
            debug!("skip record {}: no finite field", record.name);
            buf.truncate(start);
            return false;
        }

        if let Some(ts) = timestamp {
            buf.push(b' ');
            buf.extend_from_slice(itoa::Buffer::new().format(ts).as_bytes());
        }
        buf.push(b'\n');
        true
    }
}

impl PayloadEncoder for InfluxdbLineEncoder {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn encode(&self, records: &[MetricRecord], time: DateTime<Utc>, buf: &mut Vec<u8>) -> usize {
        let timestamp = self.precision.timestamp(&time);
        records
            .iter()
            .filter(|r| self.encode_record(r, timestamp, buf))
            .count()
    }
}

fn write_escaped(buf: &mut Vec<u8>, s: &str, special: &[u8]) {
    for b in s.bytes() {
        if b == b'\\' || special.contains(&b) {
            buf.push(b'\\');
        }
        buf.push(b);
    }
}
