/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::pack;
use crate::payload::{MetricRecord, PayloadBuilder};
use crate::source::{EnvironmentInfo, HealthCheck, MetricValueSource, MetricsSnapshot};
use crate::transport::BulkWrite;
use crate::types::{MetricNameFormatter, MetricTagMap};

mod stats;
pub use stats::{ReportStats, ReportStatsSnapshot};

mod scheduler;
pub use scheduler::{ReportScheduler, ReportSchedulerHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportRunState {
    Idle,
    Running,
    Flushing,
    Closed,
}

/// Drives report runs: start, pack every reported metric, flush once.
pub struct ReportRunController<T: BulkWrite> {
    name: String,
    report_interval: Duration,
    flush_timeout: Duration,
    builder: PayloadBuilder,
    transport: T,
    state: ReportRunState,
    stats: Arc<ReportStats>,
}

impl<T: BulkWrite> ReportRunController<T> {
    pub fn new(
        name: impl Into<String>,
        formatter: MetricNameFormatter,
        global_tags: MetricTagMap,
        transport: T,
    ) -> Self {
        ReportRunController {
            name: name.into(),
            report_interval: Duration::from_secs(10),
            flush_timeout: Duration::from_secs(30),
            builder: PayloadBuilder::new(formatter, global_tags),
            transport,
            state: ReportRunState::Idle,
            stats: Arc::new(ReportStats::default()),
        }
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn report_interval(&self) -> Duration {
        self.report_interval
    }

    #[inline]
    pub fn flush_timeout(&self) -> Duration {
        self.flush_timeout
    }

    #[inline]
    pub fn state(&self) -> ReportRunState {
        self.state
    }

    #[inline]
    pub fn stats(&self) -> &Arc<ReportStats> {
        &self.stats
    }

    /// Records packed in the current run and not yet flushed.
    #[inline]
    pub fn payload(&self) -> &[MetricRecord] {
        self.builder.payload()
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn start_report_run(&mut self) {
        match self.state {
            ReportRunState::Idle => {}
            ReportRunState::Running | ReportRunState::Flushing => {
                warn!(
                    "reporter {}: new run started while in state {:?}, restart it",
                    self.name, self.state
                );
            }
            ReportRunState::Closed => {
                warn!("reporter {}: already closed, skip new run", self.name);
                return;
            }
        }
        self.builder.init();
        self.state = ReportRunState::Running;
        self.stats.add_run();
    }

    pub fn report_metric(&mut self, context: &str, source: &MetricValueSource) {
        if self.state != ReportRunState::Running {
            debug!(
                "reporter {}: skip metric {context}/{} reported in state {:?}",
                self.name, source.name, self.state
            );
            return;
        }
        pack::pack_metric(&mut self.builder, &self.stats, context, source);
    }

    /// A missing source is silently skipped.
    pub fn report_metric_opt(&mut self, context: &str, source: Option<&MetricValueSource>) {
        if let Some(source) = source {
            self.report_metric(context, source);
        }
    }

    /// Health checks are accepted but produce no record.
    pub fn report_health(&mut self, checks: &[HealthCheck]) {
        debug!("reporter {}: ignore {} health checks", self.name, checks.len());
    }

    /// Environment info is accepted but produces no record.
    pub fn report_environment(&mut self, env: &EnvironmentInfo) {
        debug!("reporter {}: ignore {} environment entries", self.name, env.len());
    }

    /// End the current run and write its payload with a single transport call.
    ///
    /// The payload is moved out of the builder before writing, so the builder
    /// is empty afterwards whatever the result, even if this future is dropped.
    /// Returns `false` if no run is active, the write failed or timed out.
    pub async fn end_and_flush_report_run(&mut self) -> bool {
        if self.state != ReportRunState::Running {
            warn!(
                "reporter {}: flush requested in state {:?}",
                self.name, self.state
            );
            return false;
        }

        self.state = ReportRunState::Flushing;
        let records = self.builder.take_payload();
        let mut guard = FlushGuard {
            state: &mut self.state,
            stats: &self.stats,
            finished: false,
        };
        let write = self.transport.write(&records);
        let ok = match tokio::time::timeout(self.flush_timeout, write).await {
            Ok(ok) => ok,
            Err(_) => {
                warn!(
                    "reporter {}: flush of {} records timed out after {:?}",
                    self.name,
                    records.len(),
                    self.flush_timeout
                );
                false
            }
        };
        if ok {
            debug!("reporter {}: flushed {} records", self.name, records.len());
        }
        guard.finish(ok);
        ok
    }

    /// Run a whole report cycle over the snapshot.
    pub async fn report_snapshot(&mut self, snapshot: &MetricsSnapshot) -> bool {
        self.start_report_run();
        for context in &snapshot.contexts {
            for source in &context.sources {
                self.report_metric(&context.context, source);
            }
        }
        self.report_health(&snapshot.health);
        self.report_environment(&snapshot.environment);
        self.end_and_flush_report_run().await
    }

    pub fn close(&mut self) {
        if self.state == ReportRunState::Closed {
            return;
        }
        self.builder.clear();
        self.state = ReportRunState::Closed;
        debug!("reporter {}: closed", self.name);
    }
}

/// Puts the controller back to idle when a flush ends, a dropped flush
/// counts as failed.
struct FlushGuard<'a> {
    state: &'a mut ReportRunState,
    stats: &'a ReportStats,
    finished: bool,
}

impl FlushGuard<'_> {
    fn finish(&mut self, ok: bool) {
        self.stats.add_flush_result(ok);
        self.finished = true;
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.stats.add_flush_result(false);
        }
        *self.state = ReportRunState::Idle;
    }
}

impl<T: BulkWrite> Drop for ReportRunController<T> {
    fn drop(&mut self) {
        self.builder.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CounterSetItem, CounterValue, MetricsContextSnapshot};
    use crate::transport::MemoryTransport;
    use crate::types::{MetricFieldValue, MetricKind};

    fn controller() -> (ReportRunController<MemoryTransport>, MemoryTransport) {
        let transport = MemoryTransport::default();
        let observer = transport.clone();
        let controller = ReportRunController::new(
            "test",
            MetricNameFormatter::default(),
            MetricTagMap::default(),
            transport,
        );
        (controller, observer)
    }

    struct SlowTransport(Duration);

    impl BulkWrite for SlowTransport {
        async fn write(&mut self, _records: &[MetricRecord]) -> bool {
            tokio::time::sleep(self.0).await;
            true
        }
    }

    fn slow_controller(delay: Duration) -> ReportRunController<SlowTransport> {
        ReportRunController::new(
            "slow",
            MetricNameFormatter::default(),
            MetricTagMap::default(),
            SlowTransport(delay),
        )
        .with_flush_timeout(Duration::from_secs(1))
    }

    #[tokio::test]
    async fn single_gauge() {
        let (mut c, observer) = controller();
        c.start_report_run();
        c.report_metric("app", &MetricValueSource::gauge("requests", 42.0));
        assert!(c.end_and_flush_report_run().await);

        let batch = observer.last_batch().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].kind, MetricKind::Gauge);
        assert_eq!(batch[0].name, "app.requests");
        assert_eq!(batch[0].fields.len(), 1);
        assert_eq!(batch[0].field("value"), Some(&MetricFieldValue::Double(42.0)));
        assert_eq!(c.state(), ReportRunState::Idle);
    }

    #[tokio::test]
    async fn counter_with_two_items() {
        let (mut c, observer) = controller();
        let counter = CounterValue::new(10)
            .with_item(CounterSetItem::new(
                MetricTagMap::default().with_tag("item", "a"),
                3,
                30.0,
            ))
            .with_item(CounterSetItem::new(
                MetricTagMap::default().with_tag("item", "b"),
                4,
                40.0,
            ));
        c.start_report_run();
        c.report_metric("app", &MetricValueSource::counter("hits", counter));
        assert!(c.end_and_flush_report_run().await);

        let batch = observer.last_batch().unwrap();
        assert_eq!(batch.len(), 3);
        let aggregate: Vec<_> = batch.iter().filter(|r| r.tags.is_empty()).collect();
        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate[0].field("count"), Some(&MetricFieldValue::Signed(10)));
        assert_eq!(batch.iter().filter(|r| r.tags.contains("item")).count(), 2);
    }

    #[tokio::test]
    async fn nan_gauge() {
        let (mut c, observer) = controller();
        c.start_report_run();
        c.report_metric("app", &MetricValueSource::gauge("load", f64::NAN));
        assert!(c.end_and_flush_report_run().await);
        assert!(observer.last_batch().unwrap().is_empty());
        assert_eq!(c.stats().snapshot().dropped_non_finite, 1);
    }

    #[tokio::test]
    async fn failed_write_clears_builder() {
        let (mut c, observer) = controller();
        observer.set_fail(true);
        c.start_report_run();
        c.report_metric("app", &MetricValueSource::gauge("requests", 1.0));
        assert_eq!(c.payload().len(), 1);
        assert!(!c.end_and_flush_report_run().await);
        assert!(c.payload().is_empty());

        let snap = c.stats().snapshot();
        assert_eq!(snap.flush_failed, 1);
        assert_eq!(snap.flush_ok, 0);
    }

    #[tokio::test]
    async fn report_outside_run() {
        let (mut c, observer) = controller();
        c.report_metric("app", &MetricValueSource::gauge("requests", 1.0));
        assert!(c.payload().is_empty());
        assert!(!c.end_and_flush_report_run().await);
        assert_eq!(observer.batch_count(), 0);
    }

    #[tokio::test]
    async fn restart_while_running() {
        let (mut c, observer) = controller();
        c.start_report_run();
        c.report_metric("app", &MetricValueSource::gauge("stale", 1.0));
        c.start_report_run();
        c.report_metric("app", &MetricValueSource::gauge("fresh", 2.0));
        assert!(c.end_and_flush_report_run().await);

        let batch = observer.last_batch().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].name, "app.fresh");
        assert_eq!(c.stats().snapshot().runs, 2);
    }

    #[tokio::test]
    async fn missing_source() {
        let (mut c, _observer) = controller();
        c.start_report_run();
        c.report_metric_opt("app", None);
        assert!(c.payload().is_empty());
        c.report_metric_opt("app", Some(&MetricValueSource::gauge("g", 1.0)));
        assert_eq!(c.payload().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_cycle() {
        let (mut c, observer) = controller();
        let snapshot = MetricsSnapshot::default()
            .with_context(
                MetricsContextSnapshot::new("db")
                    .with_source(MetricValueSource::gauge("conn", 5.0))
                    .with_source(MetricValueSource::gauge("idle", 2.0)),
            )
            .with_context(
                MetricsContextSnapshot::new("web")
                    .with_source(MetricValueSource::counter("hits", CounterValue::new(3))),
            );
        assert!(c.report_snapshot(&snapshot).await);

        let names: Vec<_> = observer
            .last_batch()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["db.conn", "db.idle", "web.hits"]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_timeout() {
        let mut c = slow_controller(Duration::from_secs(5));
        c.start_report_run();
        c.report_metric("app", &MetricValueSource::gauge("g", 1.0));
        assert!(!c.end_and_flush_report_run().await);
        assert!(c.payload().is_empty());
        assert_eq!(c.state(), ReportRunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_flush() {
        let mut c = slow_controller(Duration::from_millis(500));
        c.start_report_run();
        c.report_metric("app", &MetricValueSource::gauge("g", 1.0));
        let r =
            tokio::time::timeout(Duration::from_millis(100), c.end_and_flush_report_run()).await;
        assert!(r.is_err());
        assert!(c.payload().is_empty());
        assert_eq!(c.state(), ReportRunState::Idle);
        let stats = c.stats().snapshot();
        assert_eq!(stats.flush_ok, 0);
        assert_eq!(stats.flush_failed, 1);

        c.report_metric("app", &MetricValueSource::gauge("g", 1.0));
        assert!(c.payload().is_empty());

        c.start_report_run();
        assert_eq!(c.state(), ReportRunState::Running);
        assert!(c.payload().is_empty());
    }

    #[tokio::test]
    async fn close() {
        let (mut c, _observer) = controller();
        c.start_report_run();
        c.report_metric("app", &MetricValueSource::gauge("g", 1.0));
        c.close();
        c.close();
        assert_eq!(c.state(), ReportRunState::Closed);
        assert!(c.payload().is_empty());

        c.start_report_run();
        assert_eq!(c.state(), ReportRunState::Closed);
        assert!(!c.end_and_flush_report_run().await);
    }
}
