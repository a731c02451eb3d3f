/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::Arc;

type FormatFn = dyn Fn(&str, &str) -> String + Send + Sync;

/// Builds the record name from the context name and the metric name.
#[derive(Clone)]
pub enum MetricNameFormatter {
    /// Join the non-empty parts `prefix`, `context` and `name` with `delimiter`.
    Delimited {
        prefix: Option<String>,
        delimiter: char,
    },
    Custom(Arc<FormatFn>),
}

impl Default for MetricNameFormatter {
    fn default() -> Self {
        MetricNameFormatter::Delimited {
            prefix: None,
            delimiter: '.',
        }
    }
}

impl MetricNameFormatter {
    pub fn with_prefix(prefix: impl Into<String>, delimiter: char) -> Self {
        MetricNameFormatter::Delimited {
            prefix: Some(prefix.into()),
            delimiter,
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        MetricNameFormatter::Custom(Arc::new(f))
    }

    pub fn format(&self, context: &str, name: &str) -> String {
        match self {
            MetricNameFormatter::Delimited { prefix, delimiter } => {
                let prefix = prefix.as_deref().unwrap_or_default();
                let mut s = String::with_capacity(prefix.len() + context.len() + name.len() + 2);
                for part in [prefix, context, name] {
                    if part.is_empty() {
                        continue;
                    }
                    if !s.is_empty() {
                        s.push(*delimiter);
                    }
                    s.push_str(part);
                }
                s
            }
            MetricNameFormatter::Custom(f) => f(context, name),
        }
    }
}

impl fmt::Debug for MetricNameFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricNameFormatter::Delimited { prefix, delimiter } => f
                .debug_struct("Delimited")
                .field("prefix", prefix)
                .field("delimiter", delimiter)
                .finish(),
            MetricNameFormatter::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimited() {
        let f = MetricNameFormatter::default();
        assert_eq!(f.format("app", "requests"), "app.requests");
        assert_eq!(f.format("", "requests"), "requests");

        let f = MetricNameFormatter::with_prefix("g3", '_');
        assert_eq!(f.format("app", "requests"), "g3_app_requests");
        assert_eq!(f.format("", "requests"), "g3_requests");
    }

    #[test]
    fn custom() {
        let f = MetricNameFormatter::custom(|ctx, name| format!("[{ctx}] {name}"));
        assert_eq!(f.format("app", "requests"), "[app] requests");
        assert_eq!(format!("{f:?}"), "Custom");
    }
}
