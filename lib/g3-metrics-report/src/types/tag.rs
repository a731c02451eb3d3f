/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::{self, Write};

use indexmap::IndexMap;

use super::ParseError;

/// Insertion ordered tag set, keys are unique.
///
/// Inserting an existing key replaces the value in place, so merging global
/// tags with metric tags keeps the global ordering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricTagMap {
    inner: IndexMap<String, String>,
}

impl MetricTagMap {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn insert<K, V>(&mut self, name: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.insert(name.into(), value.into())
    }

    pub fn with_tag<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.insert(name, value);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(|v| v.as_str())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Add all tags of `other`, values in `other` win on conflict.
    pub fn extend_from(&mut self, other: &MetricTagMap) {
        for (k, v) in &other.inner {
            self.inner.insert(k.clone(), v.clone());
        }
    }

    pub fn merged(&self, other: &MetricTagMap) -> MetricTagMap {
        let mut map = self.clone();
        map.extend_from(other);
        map
    }

    /// Parse tags in the `name:value,name:value` form.
    ///
    /// A part without a value delimiter is a tag with an empty value.
    pub fn parse_kv(data: &str) -> Result<Self, ParseError> {
        let mut map = MetricTagMap::default();
        for part in data.split(',') {
            if part.is_empty() {
                continue;
            }
            match memchr::memchr(b':', part.as_bytes()) {
                Some(p) => {
                    let name = check_tag_name(&part[..p])?;
                    let value = check_tag_value(&part[p + 1..])?;
                    map.insert(name, value);
                }
                None => {
                    let name = check_tag_name(part)?;
                    map.insert(name, "");
                }
            }
        }
        Ok(map)
    }
}

pub(crate) fn check_tag_name(s: &str) -> Result<&str, ParseError> {
    if s.is_empty() {
        return Err(ParseError::Empty);
    }
    check_tag_value(s)
}

pub(crate) fn check_tag_value(s: &str) -> Result<&str, ParseError> {
    if let Some(c) = s.chars().find(|c| c.is_control()) {
        return Err(ParseError::InvalidChar(c));
    }
    Ok(s)
}

impl fmt::Display for MetricTagMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.inner.iter();
        let Some((name, value)) = iter.next() else {
            return Ok(());
        };
        f.write_str(name)?;
        f.write_char(':')?;
        f.write_str(value)?;

        for (name, value) in iter {
            f.write_char(',')?;
            f.write_str(name)?;
            f.write_char(':')?;
            f.write_str(value)?;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for MetricTagMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = MetricTagMap::default();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
