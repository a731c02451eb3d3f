/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::types::MetricTagMap;

/// Controls the extra records packed for the items of a counter or meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetItemsPolicy {
    pub report_set_items: bool,
    pub report_item_percentages: bool,
}

impl Default for SetItemsPolicy {
    fn default() -> Self {
        SetItemsPolicy {
            report_set_items: true,
            report_item_percentages: true,
        }
    }
}

impl SetItemsPolicy {
    pub const AGGREGATE_ONLY: SetItemsPolicy = SetItemsPolicy {
        report_set_items: false,
        report_item_percentages: false,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterSetItem {
    pub tags: MetricTagMap,
    pub count: i64,
    pub percent: f64,
}

impl CounterSetItem {
    pub fn new(tags: MetricTagMap, count: i64, percent: f64) -> Self {
        CounterSetItem {
            tags,
            count,
            percent,
        }
    }
}

impl super::SetItem for CounterSetItem {
    fn is_same_item(&self, other: &Self) -> bool {
        self.count == other.count
            && self.percent.to_bits() == other.percent.to_bits()
            && self.tags == other.tags
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterValue {
    pub count: i64,
    pub items: Vec<CounterSetItem>,
    pub policy: SetItemsPolicy,
}

impl CounterValue {
    pub fn new(count: i64) -> Self {
        CounterValue {
            count,
            items: Vec::new(),
            policy: SetItemsPolicy::default(),
        }
    }

    pub fn with_item(mut self, item: CounterSetItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_policy(mut self, policy: SetItemsPolicy) -> Self {
        self.policy = policy;
        self
    }
}
