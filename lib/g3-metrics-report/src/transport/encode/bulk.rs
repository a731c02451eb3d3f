/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use super::PayloadEncoder;
use crate::MetricRecord;
use crate::transport::HttpTransportError;

/// Newline delimited json for `_bulk` style endpoints.
///
/// Each record is an action line followed by a document line.
#[derive(Clone, Debug)]
pub struct BulkJsonEncoder {
    index: String,
    type_in_action: bool,
}

impl BulkJsonEncoder {
    pub fn new(index: impl Into<String>) -> Self {
        BulkJsonEncoder {
            index: index.into(),
            type_in_action: true,
        }
    }

    pub fn with_type_in_action(mut self, enable: bool) -> Self {
        self.type_in_action = enable;
        self
    }

    #[inline]
    pub fn index(&self) -> &str {
        &self.index
    }

    fn action(&self, record: &MetricRecord) -> Value {
        if self.type_in_action {
            json!({"index": {"_index": self.index, "_type": record.kind.as_str()}})
        } else {
            json!({"index": {"_index": self.index}})
        }
    }

    fn document(record: &MetricRecord, timestamp: &str) -> Value {
        let tags: Map<String, Value> = record
            .tags
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        let fields: Map<String, Value> = record
            .fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_json_value()))
            .collect();
        json!({
            "name": record.name,
            "kind": record.kind.as_str(),
            "timestamp": timestamp,
            "tags": tags,
            "fields": fields,
        })
    }
}

impl PayloadEncoder for BulkJsonEncoder {
    fn content_type(&self) -> &'static str {
        "application/x-ndjson"
    }

    fn encode(&self, records: &[MetricRecord], time: DateTime<Utc>, buf: &mut Vec<u8>) -> usize {
        let timestamp = time.to_rfc3339_opts(SecondsFormat::Millis, true);
        for record in records {
            // serializing a Value to a Vec never fails
            let _ = serde_json::to_writer(&mut *buf, &self.action(record));
            buf.push(b'\n');
            let _ = serde_json::to_writer(&mut *buf, &Self::document(record, &timestamp));
            buf.push(b'\n');
        }
        records.len()
    }

    fn check_response(&self, code: u16, body: &[u8]) -> Result<(), HttpTransportError> {
        if !(200..300).contains(&code) {
            return Err(HttpTransportError::error_response(code, body));
        }
        if memchr::memmem::find(body, b"\"errors\":true").is_some() {
            return Err(HttpTransportError::error_response(code, body));
        }
        Ok(())
    }
}
