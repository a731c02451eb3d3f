/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use log::debug;

use crate::payload::PayloadBuilder;
use crate::report::ReportStats;
use crate::source::{
    ApdexValue, CounterValue, HistogramValue, MeterValue, MetricSourceValue, MetricValueSource,
    TimerValue,
};
use crate::types::{MetricFieldMap, MetricKind};

pub mod fields;

/// Route the source to the packer of its kind.
///
/// Returns the number of records appended to the builder. Sources of an
/// unknown kind and non-finite gauges append nothing and are counted as
/// dropped in `stats`.
pub fn pack_metric(
    builder: &mut PayloadBuilder,
    stats: &ReportStats,
    context: &str,
    source: &MetricValueSource,
) -> usize {
    let added = match &source.value {
        MetricSourceValue::Gauge(v) => pack_gauge(builder, stats, context, source, *v),
        MetricSourceValue::Counter(v) => pack_counter(builder, context, source, v),
        MetricSourceValue::Meter(v) => pack_meter(builder, context, source, v),
        MetricSourceValue::Timer(v) => pack_timer(builder, context, source, v),
        MetricSourceValue::Histogram(v) => pack_histogram(builder, context, source, v),
        MetricSourceValue::Apdex(v) => pack_apdex(builder, context, source, v),
        MetricSourceValue::Unknown(kind) => {
            debug!("skip metric {context}/{}: unknown kind {kind}", source.name);
            stats.add_dropped_unknown_kind();
            0
        }
    };
    stats.add_packed_records(added as u64);
    added
}

pub fn pack_gauge(
    builder: &mut PayloadBuilder,
    stats: &ReportStats,
    context: &str,
    source: &MetricValueSource,
    value: f64,
) -> usize {
    if !value.is_finite() {
        debug!(
            "skip gauge {context}/{}: non-finite value {value}",
            source.name
        );
        stats.add_dropped_non_finite();
        return 0;
    }

    let mut map = MetricFieldMap::with_capacity(1);
    map.insert(fields::VALUE, value.into());
    builder.pack_value_source(MetricKind::Gauge, context, source, map);
    1
}

pub fn pack_counter(
    builder: &mut PayloadBuilder,
    context: &str,
    source: &MetricValueSource,
    counter: &CounterValue,
) -> usize {
    let mut map = MetricFieldMap::with_capacity(1);
    map.insert(fields::COUNT, counter.count.into());
    builder.pack_value_source(MetricKind::Counter, context, source, map);

    let mut added = 1;
    if !counter.items.is_empty() && counter.policy.report_set_items {
        added += builder.pack_counter_set_items(context, source, &counter.items, counter.policy);
    }
    added
}

pub fn pack_meter(
    builder: &mut PayloadBuilder,
    context: &str,
    source: &MetricValueSource,
    meter: &MeterValue,
) -> usize {
    let map = fields::rate_fields(&meter.rates);

    let mut added = 0;
    if !meter.items.is_empty() && meter.policy.report_set_items {
        added += builder.pack_meter_set_items(context, source, &meter.items, meter.policy);
    }

    builder.pack_value_source(MetricKind::Meter, context, source, map);
    added + 1
}

pub fn pack_timer(
    builder: &mut PayloadBuilder,
    context: &str,
    source: &MetricValueSource,
    timer: &TimerValue,
) -> usize {
    let mut map = MetricFieldMap::with_capacity(
        fields::RATE_FIELDS.len() + fields::HISTOGRAM_FIELDS.len() + 3,
    );
    fields::add_rate_fields(&timer.rates, &mut map);
    fields::add_histogram_fields(&timer.histogram, &mut map);
    builder.pack_value_source(MetricKind::Timer, context, source, map);
    1
}

pub fn pack_histogram(
    builder: &mut PayloadBuilder,
    context: &str,
    source: &MetricValueSource,
    histogram: &HistogramValue,
) -> usize {
    let map = fields::histogram_fields(histogram);
    builder.pack_value_source(MetricKind::Histogram, context, source, map);
    1
}

pub fn pack_apdex(
    builder: &mut PayloadBuilder,
    context: &str,
    source: &MetricValueSource,
    apdex: &ApdexValue,
) -> usize {
    let map = fields::apdex_fields(apdex);
    builder.pack_value_source(MetricKind::Apdex, context, source, map);
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CounterSetItem, MeterRates, MeterSetItem, SetItemsPolicy};
    use crate::types::{MetricFieldValue, MetricNameFormatter, MetricTagMap};

    fn builder() -> PayloadBuilder {
        PayloadBuilder::new(MetricNameFormatter::default(), MetricTagMap::default())
    }

    fn field_names(builder: &PayloadBuilder, index: usize) -> Vec<&'static str> {
        builder.payload()[index].fields.keys().copied().collect()
    }

    fn item_tags(name: &str) -> MetricTagMap {
        MetricTagMap::default().with_tag("item", name)
    }

    #[test]
    fn gauge() {
        let stats = ReportStats::default();
        for v in [0.0, -1.5, 42.0, f64::MAX, f64::MIN_POSITIVE] {
            let mut b = builder();
            let source = MetricValueSource::gauge("g", v);
            assert_eq!(pack_metric(&mut b, &stats, "app", &source), 1);
            assert_eq!(b.payload()[0].field("value"), Some(&MetricFieldValue::Double(v)));
        }

        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut b = builder();
            let source = MetricValueSource::gauge("g", v);
            assert_eq!(pack_metric(&mut b, &stats, "app", &source), 0);
            assert!(b.is_empty());
        }
        let snap = stats.snapshot();
        assert_eq!(snap.dropped_non_finite, 3);
        assert_eq!(snap.packed_records, 5);
    }

    #[test]
    fn counter_with_items() {
        let stats = ReportStats::default();
        let mut b = builder();
        let counter = CounterValue::new(10)
            .with_item(CounterSetItem::new(item_tags("a"), 3, 30.0))
            .with_item(CounterSetItem::new(item_tags("b"), 4, 40.0))
            .with_item(CounterSetItem::new(item_tags("a"), 3, 30.0));
        let source = MetricValueSource::counter("hits", counter);
        assert_eq!(pack_metric(&mut b, &stats, "app", &source), 3);

        let records = b.payload();
        assert_eq!(records[0].field("count"), Some(&MetricFieldValue::Signed(10)));
        assert!(records[0].tags.is_empty());
        assert_eq!(records[1].tags.get("item"), Some("a"));
        assert_eq!(records[2].tags.get("item"), Some("b"));
        assert_eq!(records[2].field("count"), Some(&MetricFieldValue::Signed(4)));
    }

    #[test]
    fn counter_aggregate_only() {
        let stats = ReportStats::default();
        let mut b = builder();
        let counter = CounterValue::new(10)
            .with_item(CounterSetItem::new(item_tags("a"), 3, 30.0))
            .with_policy(SetItemsPolicy::AGGREGATE_ONLY);
        let source = MetricValueSource::counter("hits", counter);
        assert_eq!(pack_metric(&mut b, &stats, "app", &source), 1);
        assert_eq!(field_names(&b, 0), vec!["count"]);
    }

    #[test]
    fn meter_items_before_aggregate() {
        let stats = ReportStats::default();
        let mut b = builder();
        let rates = MeterRates {
            count: 9,
            one_min_rate: 0.1,
            five_min_rate: 0.2,
            fifteen_min_rate: 0.3,
            mean_rate: 0.4,
        };
        let meter = MeterValue::new(rates).with_item(MeterSetItem {
            tags: item_tags("x"),
            percent: 100.0,
            rates,
        });
        let source = MetricValueSource::meter("calls", meter);
        assert_eq!(pack_metric(&mut b, &stats, "app", &source), 2);

        let records = b.payload();
        assert_eq!(records[0].tags.get("item"), Some("x"));
        assert!(records[1].tags.is_empty());
        assert_eq!(field_names(&b, 1), fields::RATE_FIELDS);
        assert_eq!(records[1].field("count.meter"), Some(&MetricFieldValue::Signed(9)));
    }

    #[test]
    fn timer_fields_union() {
        let stats = ReportStats::default();
        let mut b = builder();
        let timer = TimerValue {
            rates: MeterRates::default(),
            histogram: HistogramValue::default(),
        };
        let source = MetricValueSource::timer("latency", timer);
        assert_eq!(pack_metric(&mut b, &stats, "app", &source), 1);

        let mut expected = fields::RATE_FIELDS.to_vec();
        expected.extend_from_slice(&fields::HISTOGRAM_FIELDS);
        assert_eq!(field_names(&b, 0), expected);
        assert_eq!(b.payload()[0].kind, MetricKind::Timer);
    }

    #[test]
    fn histogram_and_apdex() {
        let stats = ReportStats::default();
        let mut b = builder();
        let source = MetricValueSource::histogram("size", HistogramValue::default());
        assert_eq!(pack_metric(&mut b, &stats, "app", &source), 1);
        assert_eq!(field_names(&b, 0), fields::HISTOGRAM_FIELDS);

        let source = MetricValueSource::apdex("apdex", ApdexValue::from_counts(1, 1, 0));
        assert_eq!(pack_metric(&mut b, &stats, "app", &source), 1);
        assert_eq!(field_names(&b, 1), fields::APDEX_FIELDS);
        assert_eq!(b.payload()[1].field("score"), Some(&MetricFieldValue::Double(0.75)));
    }

    #[test]
    fn unknown_kind() {
        let stats = ReportStats::default();
        let mut b = builder();
        let source = MetricValueSource::new("x", MetricSourceValue::Unknown("summary".into()));
        assert_eq!(pack_metric(&mut b, &stats, "app", &source), 0);
        assert!(b.is_empty());
        assert_eq!(stats.snapshot().dropped_unknown_kind, 1);
    }
}
