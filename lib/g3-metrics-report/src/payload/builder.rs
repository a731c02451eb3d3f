/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::MetricRecord;
use crate::pack::fields;
use crate::source::{CounterSetItem, MeterSetItem, MetricValueSource, SetItem, SetItemsPolicy};
use crate::types::{MetricFieldMap, MetricKind, MetricNameFormatter, MetricTagMap};

/// Accumulates the records of one report run.
///
/// Not synchronized, it is owned by a single report run controller.
pub struct PayloadBuilder {
    formatter: MetricNameFormatter,
    global_tags: MetricTagMap,
    records: Vec<MetricRecord>,
}

impl PayloadBuilder {
    pub fn new(formatter: MetricNameFormatter, global_tags: MetricTagMap) -> Self {
        PayloadBuilder {
            formatter,
            global_tags,
            records: Vec::new(),
        }
    }

    #[inline]
    pub fn global_tags(&self) -> &MetricTagMap {
        &self.global_tags
    }

    /// Start a new run, dropping anything left from an unflushed one.
    pub fn init(&mut self) {
        self.records.clear();
    }

    pub fn pack_value_source(
        &mut self,
        kind: MetricKind,
        context: &str,
        source: &MetricValueSource,
        fields: MetricFieldMap,
    ) {
        let record = MetricRecord {
            kind,
            name: self.formatter.format(context, &source.name),
            tags: self.global_tags.merged(&source.tags),
            fields,
        };
        self.records.push(record);
    }

    /// Pack one record for each distinct item. Returns the number of records added.
    pub fn pack_counter_set_items(
        &mut self,
        context: &str,
        source: &MetricValueSource,
        items: &[CounterSetItem],
        policy: SetItemsPolicy,
    ) -> usize {
        self.pack_items(MetricKind::Counter, context, source, items, |item| {
            let mut map = MetricFieldMap::with_capacity(2);
            map.insert(fields::COUNT, item.count.into());
            if policy.report_item_percentages {
                map.insert(fields::PERCENT, item.percent.into());
            }
            (&item.tags, map)
        })
    }

    /// Pack one record for each distinct item. Returns the number of records added.
    pub fn pack_meter_set_items(
        &mut self,
        context: &str,
        source: &MetricValueSource,
        items: &[MeterSetItem],
        policy: SetItemsPolicy,
    ) -> usize {
        self.pack_items(MetricKind::Meter, context, source, items, |item| {
            let mut map = fields::rate_fields(&item.rates);
            if policy.report_item_percentages {
                map.insert(fields::PERCENT, item.percent.into());
            }
            (&item.tags, map)
        })
    }

    fn pack_items<'a, T, F>(
        &mut self,
        kind: MetricKind,
        context: &str,
        source: &MetricValueSource,
        items: &'a [T],
        build: F,
    ) -> usize
    where
        T: SetItem,
        F: Fn(&'a T) -> (&'a MetricTagMap, MetricFieldMap),
    {
        if items.is_empty() {
            return 0;
        }

        let name = self.formatter.format(context, &source.name);
        let base_tags = self.global_tags.merged(&source.tags);

        let mut packed: Vec<&T> = Vec::with_capacity(items.len());
        for item in items {
            if packed.iter().any(|p| p.is_same_item(item)) {
                continue;
            }
            packed.push(item);

            let (item_tags, fields) = build(item);
            self.records.push(MetricRecord {
                kind,
                name: name.clone(),
                tags: base_tags.merged(item_tags),
                fields,
            });
        }
        packed.len()
    }

    #[inline]
    pub fn payload(&self) -> &[MetricRecord] {
        &self.records
    }

    /// Move all records out, leaving the builder empty.
    pub fn take_payload(&mut self) -> Vec<MetricRecord> {
        std::mem::take(&mut self.records)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CounterValue, MeterRates};
    use crate::types::MetricFieldValue;

    fn builder() -> PayloadBuilder {
        let global = MetricTagMap::default().with_tag("env", "test");
        PayloadBuilder::new(MetricNameFormatter::default(), global)
    }

    #[test]
    fn pack_value_source() {
        let mut b = builder();
        let source = MetricValueSource::gauge("requests", 42.0)
            .with_tags(MetricTagMap::default().with_tag("route", "/"));
        let mut map = MetricFieldMap::new();
        map.insert("value", MetricFieldValue::Double(42.0));
        b.pack_value_source(MetricKind::Gauge, "app", &source, map);

        let records = b.payload();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, MetricKind::Gauge);
        assert_eq!(records[0].name, "app.requests");
        assert_eq!(records[0].tags.get("env"), Some("test"));
        assert_eq!(records[0].tags.get("route"), Some("/"));
        assert_eq!(records[0].field("value"), Some(&MetricFieldValue::Double(42.0)));
    }

    #[test]
    fn counter_items_dedup() {
        let mut b = builder();
        let item_a = CounterSetItem::new(MetricTagMap::default().with_tag("item", "a"), 3, 30.0);
        let item_b = CounterSetItem::new(MetricTagMap::default().with_tag("item", "b"), 4, 40.0);
        let source = MetricValueSource::counter("hits", CounterValue::new(10));

        let items = [item_a.clone(), item_b, item_a];
        let n = b.pack_counter_set_items("app", &source, &items, SetItemsPolicy::default());
        assert_eq!(n, 2);
        assert_eq!(b.len(), 2);

        let r = &b.payload()[0];
        assert_eq!(r.tags.get("item"), Some("a"));
        assert_eq!(r.tags.get("env"), Some("test"));
        assert_eq!(r.field("count"), Some(&MetricFieldValue::Signed(3)));
        assert_eq!(r.field("percent"), Some(&MetricFieldValue::Double(30.0)));
    }

    #[test]
    fn nan_items_dedup() {
        let mut b = builder();
        let tags = MetricTagMap::default().with_tag("item", "a");
        let item = CounterSetItem::new(tags.clone(), 0, f64::NAN);
        let source = MetricValueSource::counter("hits", CounterValue::new(0));
        let items = [item.clone(), item];
        let n = b.pack_counter_set_items("app", &source, &items, SetItemsPolicy::default());
        assert_eq!(n, 1);

        let rates = MeterRates {
            mean_rate: f64::NAN,
            ..Default::default()
        };
        let item = MeterSetItem {
            tags,
            percent: f64::NAN,
            rates,
        };
        let source = MetricValueSource::meter("calls", Default::default());
        let items = [item.clone(), item];
        let n = b.pack_meter_set_items("app", &source, &items, SetItemsPolicy::default());
        assert_eq!(n, 1);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn counter_items_without_percent() {
        let mut b = builder();
        let item = CounterSetItem::new(MetricTagMap::default().with_tag("item", "a"), 3, 30.0);
        let source = MetricValueSource::counter("hits", CounterValue::new(3));
        let policy = SetItemsPolicy {
            report_set_items: true,
            report_item_percentages: false,
        };
        b.pack_counter_set_items("app", &source, &[item], policy);
        let r = &b.payload()[0];
        assert_eq!(r.fields.len(), 1);
        assert!(r.field("percent").is_none());
    }

    #[test]
    fn meter_items() {
        let mut b = builder();
        let rates = MeterRates {
            count: 5,
            one_min_rate: 1.0,
            five_min_rate: 2.0,
            fifteen_min_rate: 3.0,
            mean_rate: 4.0,
        };
        let item = MeterSetItem {
            tags: MetricTagMap::default().with_tag("item", "x"),
            percent: 50.0,
            rates,
        };
        let source = MetricValueSource::meter("calls", Default::default());
        let n = b.pack_meter_set_items("", &source, &[item], SetItemsPolicy::default());
        assert_eq!(n, 1);
        let r = &b.payload()[0];
        assert_eq!(r.name, "calls");
        assert_eq!(r.fields.len(), 6);
        assert_eq!(r.field("rate5m"), Some(&MetricFieldValue::Double(2.0)));
        assert_eq!(r.field("percent"), Some(&MetricFieldValue::Double(50.0)));
    }

    #[test]
    fn clear_is_idempotent() {
        let mut b = builder();
        b.clear();
        assert!(b.is_empty());

        let source = MetricValueSource::gauge("g", 1.0);
        b.pack_value_source(MetricKind::Gauge, "app", &source, MetricFieldMap::new());
        b.clear();
        b.clear();
        assert!(b.is_empty());
        b.init();
        assert!(b.payload().is_empty());
    }

    #[test]
    fn take_payload() {
        let mut b = builder();
        let source = MetricValueSource::gauge("g", 1.0);
        b.pack_value_source(MetricKind::Gauge, "app", &source, MetricFieldMap::new());
        let records = b.take_payload();
        assert_eq!(records.len(), 1);
        assert!(b.is_empty());
    }
}
