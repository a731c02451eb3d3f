/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::MetricRecord;

pub mod encode;
pub use encode::{BulkJsonEncoder, InfluxdbLineEncoder, PayloadEncoder, TimestampPrecision};

pub mod http;
pub use self::http::{HttpBulkTransport, HttpTransportConfig, HttpTransportError};

/// Write a whole payload to the remote store.
///
/// Called once per flush. Failures are reported as `false`, retry is up to
/// the caller.
pub trait BulkWrite {
    fn write(&mut self, records: &[MetricRecord]) -> impl Future<Output = bool> + Send;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardTransport;

impl BulkWrite for DiscardTransport {
    async fn write(&mut self, _records: &[MetricRecord]) -> bool {
        true
    }
}

/// Keeps every written payload in memory.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    batches: Arc<Mutex<Vec<Vec<MetricRecord>>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryTransport {
    /// Make the following writes fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn batches(&self) -> Vec<Vec<MetricRecord>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn last_batch(&self) -> Option<Vec<MetricRecord>> {
        self.batches.lock().unwrap().last().cloned()
    }
}

impl BulkWrite for MemoryTransport {
    async fn write(&mut self, records: &[MetricRecord]) -> bool {
        if self.fail.load(Ordering::Relaxed) {
            return false;
        }
        let mut batches = self.batches.lock().unwrap();
        batches.push(records.to_vec());
        true
    }
}

pub enum AnyBulkTransport {
    Discard(DiscardTransport),
    Memory(MemoryTransport),
    Influxdb(HttpBulkTransport<InfluxdbLineEncoder>),
    BulkJson(HttpBulkTransport<BulkJsonEncoder>),
}

impl BulkWrite for AnyBulkTransport {
    async fn write(&mut self, records: &[MetricRecord]) -> bool {
        match self {
            AnyBulkTransport::Discard(t) => t.write(records).await,
            AnyBulkTransport::Memory(t) => t.write(records).await,
            AnyBulkTransport::Influxdb(t) => t.write(records).await,
            AnyBulkTransport::BulkJson(t) => t.write(records).await,
        }
    }
}
