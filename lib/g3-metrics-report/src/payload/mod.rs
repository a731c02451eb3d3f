/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::types::{MetricFieldMap, MetricFieldValue, MetricKind, MetricTagMap};

mod builder;
pub use builder::PayloadBuilder;

/// One flattened unit of a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub kind: MetricKind,
    pub name: String,
    pub tags: MetricTagMap,
    pub fields: MetricFieldMap,
}

impl MetricRecord {
    #[inline]
    pub fn field(&self, name: &str) -> Option<&MetricFieldValue> {
        self.fields.get(name)
    }
}
