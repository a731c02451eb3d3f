/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use hdrhistogram::{Counter, Histogram};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistogramValue {
    pub count: i64,
    pub sum: f64,
    pub last_value: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
    pub sample_size: i64,
    pub std_dev: f64,
    pub last_user_value: Option<String>,
    pub max_user_value: Option<String>,
    pub min_user_value: Option<String>,
}

impl HistogramValue {
    /// Compute the distribution stats from the recorded values.
    ///
    /// hdrhistogram keeps neither the sum nor the last value, so the sum is
    /// derived from the mean and the last value has to be given by the caller.
    pub fn from_histogram<T: Counter>(histogram: &Histogram<T>, last_value: Option<u64>) -> Self {
        if histogram.is_empty() {
            return HistogramValue {
                last_value: last_value.unwrap_or_default() as f64,
                ..Default::default()
            };
        }

        let len = histogram.len();
        let mean = histogram.mean();
        let quantile = |q: f64| histogram.value_at_quantile(q) as f64;
        HistogramValue {
            count: i64::try_from(len).unwrap_or(i64::MAX),
            sum: mean * len as f64,
            last_value: last_value.unwrap_or_default() as f64,
            max: histogram.max() as f64,
            mean,
            median: quantile(0.5),
            min: histogram.min() as f64,
            p75: quantile(0.75),
            p95: quantile(0.95),
            p98: quantile(0.98),
            p99: quantile(0.99),
            p999: quantile(0.999),
            sample_size: i64::try_from(len).unwrap_or(i64::MAX),
            std_dev: histogram.stdev(),
            last_user_value: None,
            max_user_value: None,
            min_user_value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hdr() {
        let mut h = Histogram::<u64>::new(3).unwrap();
        for v in 1..=100u64 {
            h.record(v).unwrap();
        }
        let v = HistogramValue::from_histogram(&h, Some(100));
        assert_eq!(v.count, 100);
        assert_eq!(v.sample_size, 100);
        assert_eq!(v.min, 1.0);
        assert_eq!(v.max, 100.0);
        assert_eq!(v.median, 50.0);
        assert_eq!(v.p99, 99.0);
        assert_eq!(v.last_value, 100.0);
        assert!((v.mean - 50.5).abs() < 1e-9);
        assert!((v.sum - 5050.0).abs() < 1e-6);
    }

    #[test]
    fn from_empty_hdr() {
        let h = Histogram::<u64>::new(3).unwrap();
        let v = HistogramValue::from_histogram(&h, None);
        assert_eq!(v, HistogramValue::default());
    }
}
