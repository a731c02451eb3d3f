/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportStatsSnapshot {
    pub runs: u64,
    pub packed_records: u64,
    pub dropped_non_finite: u64,
    pub dropped_unknown_kind: u64,
    pub flush_ok: u64,
    pub flush_failed: u64,
}

impl ReportStatsSnapshot {
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped_non_finite + self.dropped_unknown_kind
    }
}

/// Counters of a reporter, shared with whoever wants to observe it.
#[derive(Default)]
pub struct ReportStats {
    runs: AtomicU64,
    packed_records: AtomicU64,
    dropped_non_finite: AtomicU64,
    dropped_unknown_kind: AtomicU64,
    flush_ok: AtomicU64,
    flush_failed: AtomicU64,
}

impl ReportStats {
    pub(crate) fn add_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_packed_records(&self, count: u64) {
        self.packed_records.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_dropped_non_finite(&self) {
        self.dropped_non_finite.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_dropped_unknown_kind(&self) {
        self.dropped_unknown_kind.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_flush_result(&self, ok: bool) {
        if ok {
            self.flush_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.flush_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ReportStatsSnapshot {
        ReportStatsSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            packed_records: self.packed_records.load(Ordering::Relaxed),
            dropped_non_finite: self.dropped_non_finite.load(Ordering::Relaxed),
            dropped_unknown_kind: self.dropped_unknown_kind.load(Ordering::Relaxed),
            flush_ok: self.flush_ok.load(Ordering::Relaxed),
            flush_failed: self.flush_failed.load(Ordering::Relaxed),
        }
    }
}
