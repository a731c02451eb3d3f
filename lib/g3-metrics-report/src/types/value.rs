/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::{self, Write};

use indexmap::IndexMap;
use serde_json::{Number, Value};

/// Field name to value, in the order the packer added them.
pub type MetricFieldMap = IndexMap<&'static str, MetricFieldValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum MetricFieldValue {
    Double(f64),
    Signed(i64),
    Unsigned(u64),
    Text(String),
}

impl MetricFieldValue {
    pub fn is_finite(&self) -> bool {
        match self {
            MetricFieldValue::Double(f) => f.is_finite(),
            _ => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricFieldValue::Double(f) => Some(*f),
            MetricFieldValue::Signed(i) => Some(*i as f64),
            MetricFieldValue::Unsigned(u) => Some(*u as f64),
            MetricFieldValue::Text(_) => None,
        }
    }

    pub fn display_influxdb(&self) -> DisplayInfluxdbValue<'_> {
        DisplayInfluxdbValue(self)
    }

    /// Non-finite doubles have no json representation and become `null`.
    pub fn as_json_value(&self) -> Value {
        match self {
            MetricFieldValue::Double(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            MetricFieldValue::Signed(i) => Value::Number(Number::from(*i)),
            MetricFieldValue::Unsigned(u) => Value::Number(Number::from(*u)),
            MetricFieldValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<f64> for MetricFieldValue {
    fn from(value: f64) -> Self {
        MetricFieldValue::Double(value)
    }
}

impl From<i64> for MetricFieldValue {
    fn from(value: i64) -> Self {
        MetricFieldValue::Signed(value)
    }
}

impl From<u64> for MetricFieldValue {
    fn from(value: u64) -> Self {
        MetricFieldValue::Unsigned(value)
    }
}

impl From<String> for MetricFieldValue {
    fn from(value: String) -> Self {
        MetricFieldValue::Text(value)
    }
}

impl fmt::Display for MetricFieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricFieldValue::Unsigned(u) => itoa::Buffer::new().format(*u).fmt(f),
            MetricFieldValue::Signed(i) => itoa::Buffer::new().format(*i).fmt(f),
            MetricFieldValue::Double(v) => ryu::Buffer::new().format(*v).fmt(f),
            MetricFieldValue::Text(s) => f.write_str(s),
        }
    }
}

pub struct DisplayInfluxdbValue<'a>(&'a MetricFieldValue);

impl fmt::Display for DisplayInfluxdbValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            MetricFieldValue::Unsigned(u) => {
                itoa::Buffer::new().format(*u).fmt(f)?;
                f.write_char('u')
            }
            MetricFieldValue::Signed(i) => {
                itoa::Buffer::new().format(*i).fmt(f)?;
                f.write_char('i')
            }
            MetricFieldValue::Double(v) => ryu::Buffer::new().format(*v).fmt(f),
            MetricFieldValue::Text(s) => {
                f.write_char('"')?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_char('"')
            }
        }
    }
}
