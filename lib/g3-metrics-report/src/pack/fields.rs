/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::source::{ApdexValue, HistogramValue, MeterRates};
use crate::types::{MetricFieldMap, MetricFieldValue};

pub const VALUE: &str = "value";
pub const COUNT: &str = "count";
pub const PERCENT: &str = "percent";

pub const METER_COUNT: &str = "count.meter";
pub const RATE_1M: &str = "rate1m";
pub const RATE_5M: &str = "rate5m";
pub const RATE_15M: &str = "rate15m";
pub const RATE_MEAN: &str = "rate.mean";

pub const HISTOGRAM_COUNT: &str = "count.hist";
pub const SUM: &str = "sum";
pub const LAST: &str = "last";
pub const MAX: &str = "max";
pub const MEAN: &str = "mean";
pub const MEDIAN: &str = "median";
pub const MIN: &str = "min";
pub const P75: &str = "p75";
pub const P95: &str = "p95";
pub const P98: &str = "p98";
pub const P99: &str = "p99";
pub const P999: &str = "p999";
pub const SAMPLES: &str = "samples";
pub const STDDEV: &str = "stddev";
pub const USER_LAST: &str = "user.last";
pub const USER_MAX: &str = "user.max";
pub const USER_MIN: &str = "user.min";

pub const SCORE: &str = "score";
pub const SATISFIED: &str = "satisfied";
pub const TOLERATING: &str = "tolerating";
pub const FRUSTRATING: &str = "frustrating";

pub const RATE_FIELDS: [&str; 5] = [METER_COUNT, RATE_1M, RATE_5M, RATE_15M, RATE_MEAN];

pub const HISTOGRAM_FIELDS: [&str; 14] = [
    HISTOGRAM_COUNT,
    SUM,
    LAST,
    MAX,
    MEAN,
    MEDIAN,
    MIN,
    P75,
    P95,
    P98,
    P99,
    P999,
    SAMPLES,
    STDDEV,
];

pub const APDEX_FIELDS: [&str; 5] = [SAMPLES, SCORE, SATISFIED, TOLERATING, FRUSTRATING];

pub fn rate_fields(rates: &MeterRates) -> MetricFieldMap {
    let mut map = MetricFieldMap::with_capacity(RATE_FIELDS.len() + 1);
    add_rate_fields(rates, &mut map);
    map
}

pub fn add_rate_fields(rates: &MeterRates, map: &mut MetricFieldMap) {
    map.insert(METER_COUNT, rates.count.into());
    map.insert(RATE_1M, rates.one_min_rate.into());
    map.insert(RATE_5M, rates.five_min_rate.into());
    map.insert(RATE_15M, rates.fifteen_min_rate.into());
    map.insert(RATE_MEAN, rates.mean_rate.into());
}

pub fn histogram_fields(histogram: &HistogramValue) -> MetricFieldMap {
    let mut map = MetricFieldMap::with_capacity(HISTOGRAM_FIELDS.len() + 3);
    add_histogram_fields(histogram, &mut map);
    map
}

pub fn add_histogram_fields(h: &HistogramValue, map: &mut MetricFieldMap) {
    map.insert(HISTOGRAM_COUNT, h.count.into());
    map.insert(SUM, h.sum.into());
    map.insert(LAST, h.last_value.into());
    map.insert(MAX, h.max.into());
    map.insert(MEAN, h.mean.into());
    map.insert(MEDIAN, h.median.into());
    map.insert(MIN, h.min.into());
    map.insert(P75, h.p75.into());
    map.insert(P95, h.p95.into());
    map.insert(P98, h.p98.into());
    map.insert(P99, h.p99.into());
    map.insert(P999, h.p999.into());
    map.insert(SAMPLES, h.sample_size.into());
    map.insert(STDDEV, h.std_dev.into());

    let user_values = [
        (USER_LAST, &h.last_user_value),
        (USER_MAX, &h.max_user_value),
        (USER_MIN, &h.min_user_value),
    ];
    for (name, value) in user_values {
        if let Some(v) = value {
            map.insert(name, MetricFieldValue::Text(v.clone()));
        }
    }
}

pub fn apdex_fields(apdex: &ApdexValue) -> MetricFieldMap {
    let mut map = MetricFieldMap::with_capacity(APDEX_FIELDS.len());
    map.insert(SAMPLES, apdex.sample_size.into());
    map.insert(SCORE, apdex.score.into());
    map.insert(SATISFIED, apdex.satisfied.into());
    map.insert(TOLERATING, apdex.tolerating.into());
    map.insert(FRUSTRATING, apdex.frustrating.into());
    map
}
