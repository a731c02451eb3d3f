/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use log::{debug, info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::ReportRunController;
use crate::source::MetricsSnapshotProvider;
use crate::transport::BulkWrite;

/// Run a complete report cycle on each report interval.
pub struct ReportScheduler<T: BulkWrite, P> {
    controller: ReportRunController<T>,
    provider: P,
}

impl<T, P> ReportScheduler<T, P>
where
    T: BulkWrite,
    P: MetricsSnapshotProvider,
{
    pub fn new(controller: ReportRunController<T>, provider: P) -> Self {
        ReportScheduler {
            controller,
            provider,
        }
    }

    /// Report until `quit` fires or its sender is dropped.
    ///
    /// The first cycle runs one interval after the start. A cycle that takes
    /// longer than the interval delays the next one.
    pub async fn into_running(mut self, mut quit: oneshot::Receiver<()>) {
        let report_interval = self.controller.report_interval();
        let mut interval =
            tokio::time::interval_at(Instant::now() + report_interval, report_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = &mut quit => break,
                _ = interval.tick() => {
                    let snapshot = self.provider.snapshot();
                    if !self.controller.report_snapshot(&snapshot).await {
                        warn!(
                            "reporter {}: report of {} sources failed, wait for next cycle",
                            self.controller.name(),
                            snapshot.source_count()
                        );
                    }
                }
            }
        }

        info!("reporter {}: quit", self.controller.name());
        self.controller.close();
    }
}

impl<T, P> ReportScheduler<T, P>
where
    T: BulkWrite + Send + 'static,
    P: MetricsSnapshotProvider + Send + 'static,
{
    pub fn spawn(self) -> ReportSchedulerHandle {
        let (quit_sender, quit_receiver) = oneshot::channel();
        let name = self.controller.name().to_string();
        let join = tokio::spawn(self.into_running(quit_receiver));
        ReportSchedulerHandle {
            name,
            quit_sender,
            join,
        }
    }
}

pub struct ReportSchedulerHandle {
    name: String,
    quit_sender: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl ReportSchedulerHandle {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop the scheduler and wait for the current cycle to finish.
    pub async fn shutdown(self) {
        if self.quit_sender.send(()).is_err() {
            debug!("reporter {}: scheduler already stopped", self.name);
        }
        if let Err(e) = self.join.await {
            warn!("reporter {}: scheduler task failed: {e}", self.name);
        }
    }
}
