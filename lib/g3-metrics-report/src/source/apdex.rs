/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApdexValue {
    pub score: f64,
    pub sample_size: i64,
    pub satisfied: i64,
    pub tolerating: i64,
    pub frustrating: i64,
}

impl ApdexValue {
    /// Compute the score from the satisfied / tolerating / frustrating counts.
    pub fn from_counts(satisfied: i64, tolerating: i64, frustrating: i64) -> Self {
        let sample_size = satisfied + tolerating + frustrating;
        let score = if sample_size > 0 {
            (satisfied as f64 + tolerating as f64 / 2.0) / sample_size as f64
        } else {
            0.0
        };
        ApdexValue {
            score,
            sample_size,
            satisfied,
            tolerating,
            frustrating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_counts() {
        let v = ApdexValue::from_counts(60, 30, 10);
        assert_eq!(v.sample_size, 100);
        assert!((v.score - 0.75).abs() < f64::EPSILON);

        let v = ApdexValue::from_counts(0, 0, 0);
        assert_eq!(v.score, 0.0);
    }
}
