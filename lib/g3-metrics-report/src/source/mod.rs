/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use indexmap::IndexMap;

use crate::types::{MetricKind, MetricTagMap};

mod counter;
pub use counter::{CounterSetItem, CounterValue, SetItemsPolicy};

mod meter;
pub use meter::{MeterRates, MeterSetItem, MeterValue};

mod histogram;
pub use histogram::HistogramValue;

mod apdex;
pub use apdex::ApdexValue;

/// Equality used to collapse duplicate set items within one run.
///
/// Float fields compare by bit pattern, so two NaN values of the same item
/// are duplicates.
pub trait SetItem {
    fn is_same_item(&self, other: &Self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimerValue {
    pub rates: MeterRates,
    pub histogram: HistogramValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricSourceValue {
    Gauge(f64),
    Counter(CounterValue),
    Meter(MeterValue),
    Timer(TimerValue),
    Histogram(HistogramValue),
    Apdex(ApdexValue),
    /// A source whose declared kind is not one we can pack.
    Unknown(String),
}

impl MetricSourceValue {
    pub fn kind(&self) -> Option<MetricKind> {
        match self {
            MetricSourceValue::Gauge(_) => Some(MetricKind::Gauge),
            MetricSourceValue::Counter(_) => Some(MetricKind::Counter),
            MetricSourceValue::Meter(_) => Some(MetricKind::Meter),
            MetricSourceValue::Timer(_) => Some(MetricKind::Timer),
            MetricSourceValue::Histogram(_) => Some(MetricKind::Histogram),
            MetricSourceValue::Apdex(_) => Some(MetricKind::Apdex),
            MetricSourceValue::Unknown(_) => None,
        }
    }
}

/// Snapshot of one metric for the current report run.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValueSource {
    pub name: String,
    pub tags: MetricTagMap,
    pub value: MetricSourceValue,
}

impl MetricValueSource {
    pub fn new(name: impl Into<String>, value: MetricSourceValue) -> Self {
        MetricValueSource {
            name: name.into(),
            tags: MetricTagMap::default(),
            value,
        }
    }

    /// Build from a provider that declares the kind by name.
    ///
    /// The value is kept only if the declared name is exactly one of the known
    /// kinds and agrees with the value, otherwise the source becomes `Unknown`.
    pub fn with_declared_kind(
        name: impl Into<String>,
        declared: &str,
        value: MetricSourceValue,
    ) -> Self {
        let value = match MetricKind::from_str(declared) {
            Ok(kind) if value.kind() == Some(kind) => value,
            _ => MetricSourceValue::Unknown(declared.to_string()),
        };
        MetricValueSource::new(name, value)
    }

    pub fn with_tags(mut self, tags: MetricTagMap) -> Self {
        self.tags = tags;
        self
    }

    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        MetricValueSource::new(name, MetricSourceValue::Gauge(value))
    }

    pub fn counter(name: impl Into<String>, value: CounterValue) -> Self {
        MetricValueSource::new(name, MetricSourceValue::Counter(value))
    }

    pub fn meter(name: impl Into<String>, value: MeterValue) -> Self {
        MetricValueSource::new(name, MetricSourceValue::Meter(value))
    }

    pub fn timer(name: impl Into<String>, value: TimerValue) -> Self {
        MetricValueSource::new(name, MetricSourceValue::Timer(value))
    }

    pub fn histogram(name: impl Into<String>, value: HistogramValue) -> Self {
        MetricValueSource::new(name, MetricSourceValue::Histogram(value))
    }

    pub fn apdex(name: impl Into<String>, value: ApdexValue) -> Self {
        MetricValueSource::new(name, MetricSourceValue::Apdex(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

pub type EnvironmentInfo = IndexMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsContextSnapshot {
    pub context: String,
    pub sources: Vec<MetricValueSource>,
}

impl MetricsContextSnapshot {
    pub fn new(context: impl Into<String>) -> Self {
        MetricsContextSnapshot {
            context: context.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: MetricValueSource) -> Self {
        self.sources.push(source);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub contexts: Vec<MetricsContextSnapshot>,
    pub health: Vec<HealthCheck>,
    pub environment: EnvironmentInfo,
}

impl MetricsSnapshot {
    pub fn with_context(mut self, context: MetricsContextSnapshot) -> Self {
        self.contexts.push(context);
        self
    }

    pub fn source_count(&self) -> usize {
        self.contexts.iter().map(|c| c.sources.len()).sum()
    }
}

/// Supplies the metric values for each report run.
pub trait MetricsSnapshotProvider {
    fn snapshot(&mut self) -> MetricsSnapshot;
}

impl<F> MetricsSnapshotProvider for F
where
    F: FnMut() -> MetricsSnapshot,
{
    fn snapshot(&mut self) -> MetricsSnapshot {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_kind() {
        let s = MetricValueSource::with_declared_kind("g", "gauge", MetricSourceValue::Gauge(1.0));
        assert_eq!(s.value, MetricSourceValue::Gauge(1.0));
        assert_eq!(s.value.kind(), Some(MetricKind::Gauge));

        let s = MetricValueSource::with_declared_kind("g", "Gauge", MetricSourceValue::Gauge(1.0));
        assert_eq!(s.value, MetricSourceValue::Unknown("Gauge".to_string()));
        assert_eq!(s.value.kind(), None);

        let s = MetricValueSource::with_declared_kind("g", "summary", MetricSourceValue::Gauge(1.0));
        assert_eq!(s.value, MetricSourceValue::Unknown("summary".to_string()));

        let s = MetricValueSource::with_declared_kind("g", "counter", MetricSourceValue::Gauge(1.0));
        assert_eq!(s.value, MetricSourceValue::Unknown("counter".to_string()));
    }
}
