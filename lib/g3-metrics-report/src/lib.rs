/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod types;
pub use types::{MetricFieldMap, MetricFieldValue, MetricKind, MetricNameFormatter, MetricTagMap};

pub mod source;
pub use source::{
    MetricSourceValue, MetricValueSource, MetricsContextSnapshot, MetricsSnapshot,
    MetricsSnapshotProvider,
};

mod payload;
pub use payload::{MetricRecord, PayloadBuilder};

pub mod pack;

mod report;
pub use report::{
    ReportRunController, ReportRunState, ReportScheduler, ReportSchedulerHandle, ReportStats,
    ReportStatsSnapshot,
};

pub mod transport;

pub mod config;
