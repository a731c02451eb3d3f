/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

mod name;
pub use name::MetricNameFormatter;

mod tag;
pub use tag::MetricTagMap;
pub(crate) use tag::{check_tag_name, check_tag_value};

mod value;
pub use value::{MetricFieldMap, MetricFieldValue};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty string")]
    Empty,
    #[error("invalid char {0:?}")]
    InvalidChar(char),
    #[error("unknown metric kind {0}")]
    UnknownKind(String),
}

/// The closed set of metric kinds a reporter knows how to pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Counter,
    Meter,
    Timer,
    Histogram,
    Apdex,
}

impl MetricKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
            MetricKind::Meter => "meter",
            MetricKind::Timer => "timer",
            MetricKind::Histogram => "histogram",
            MetricKind::Apdex => "apdex",
        }
    }
}

impl FromStr for MetricKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            "meter" => Ok(MetricKind::Meter),
            "timer" => Ok(MetricKind::Timer),
            "histogram" => Ok(MetricKind::Histogram),
            "apdex" => Ok(MetricKind::Apdex),
            _ => Err(ParseError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
