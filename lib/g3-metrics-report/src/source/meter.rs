/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::SetItemsPolicy;
use crate::types::MetricTagMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeterRates {
    pub count: i64,
    pub one_min_rate: f64,
    pub five_min_rate: f64,
    pub fifteen_min_rate: f64,
    pub mean_rate: f64,
}

impl MeterRates {
    fn same_bits(&self, other: &Self) -> bool {
        self.count == other.count
            && self.one_min_rate.to_bits() == other.one_min_rate.to_bits()
            && self.five_min_rate.to_bits() == other.five_min_rate.to_bits()
            && self.fifteen_min_rate.to_bits() == other.fifteen_min_rate.to_bits()
            && self.mean_rate.to_bits() == other.mean_rate.to_bits()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeterSetItem {
    pub tags: MetricTagMap,
    pub percent: f64,
    pub rates: MeterRates,
}

impl super::SetItem for MeterSetItem {
    fn is_same_item(&self, other: &Self) -> bool {
        self.percent.to_bits() == other.percent.to_bits()
            && self.rates.same_bits(&other.rates)
            && self.tags == other.tags
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterValue {
    pub rates: MeterRates,
    pub items: Vec<MeterSetItem>,
    pub policy: SetItemsPolicy,
}

impl MeterValue {
    pub fn new(rates: MeterRates) -> Self {
        MeterValue {
            rates,
            items: Vec::new(),
            policy: SetItemsPolicy::default(),
        }
    }

    pub fn with_item(mut self, item: MeterSetItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_policy(mut self, policy: SetItemsPolicy) -> Self {
        self.policy = policy;
        self
    }
}
