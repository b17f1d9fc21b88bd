// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Active alarm collection
//!
//! Records are kept in the order they were raised. A kind appears at most
//! once; raising an already active kind leaves the original record (and its
//! trigger time and value) untouched. An empty collection means no alarms.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{AlarmError, AlarmKind, AlarmLimits, AlarmRecord, ALARM_RULES};
use crate::sensors::Reading;

/// Ordered set of currently active alarms, at most one per kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveAlarms {
    records: Vec<AlarmRecord>,
}

impl ActiveAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the collection with one reading.
    ///
    /// Rules are applied in [`ALARM_RULES`] order: a tripped rule raises its
    /// kind, an untripped rule clears it.
    pub fn evaluate(&mut self, limits: &AlarmLimits, reading: &Reading) -> Result<(), AlarmError> {
        for rule in ALARM_RULES.iter() {
            match rule.check(limits, reading) {
                Some(value) => {
                    self.insert(rule.kind, reading.timestamp, value)?;
                }
                None => {
                    self.remove(rule.kind);
                }
            }
        }
        Ok(())
    }

    /// Raise an alarm. Returns `false` when the kind is already active (or is
    /// `NoAlarm`), in which case nothing changes.
    pub fn insert(
        &mut self,
        kind: AlarmKind,
        timestamp: DateTime<Utc>,
        value: f64,
    ) -> Result<bool, AlarmError> {
        if !kind.is_alarm() || self.contains(kind) {
            return Ok(false);
        }

        self.records
            .try_reserve(1)
            .map_err(|source| AlarmError::Allocation { kind, source })?;
        self.records.push(AlarmRecord { kind, timestamp, value });

        info!("{} alarm raised at {:.1}", kind, value);
        Ok(true)
    }

    /// Clear an alarm. Returns `false` when the kind was not active.
    pub fn remove(&mut self, kind: AlarmKind) -> bool {
        match self.records.iter().position(|r| r.kind == kind) {
            Some(index) => {
                let record = self.records.remove(index);
                info!("{} alarm cleared (raised {})", kind, record.timestamp);
                true
            }
            None => {
                debug!("{} alarm not active, nothing to clear", kind);
                false
            }
        }
    }

    pub fn contains(&self, kind: AlarmKind) -> bool {
        self.records.iter().any(|r| r.kind == kind)
    }

    pub fn get(&self, kind: AlarmKind) -> Option<&AlarmRecord> {
        self.records.iter().find(|r| r.kind == kind)
    }

    /// Active records in the order they were raised
    pub fn iter(&self) -> std::slice::Iter<'_, AlarmRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Kind of the oldest active alarm, `NoAlarm` when none are active
    pub fn head_kind(&self) -> AlarmKind {
        self.records
            .first()
            .map(|r| r.kind)
            .unwrap_or(AlarmKind::NoAlarm)
    }

    pub fn kinds(&self) -> Vec<AlarmKind> {
        self.records.iter().map(|r| r.kind).collect()
    }
}

impl<'a> IntoIterator for &'a ActiveAlarms {
    type Item = &'a AlarmRecord;
    type IntoIter = std::slice::Iter<'a, AlarmRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn reading(secs: i64, temperature: f64, humidity: f64, pressure: f64) -> Reading {
        Reading {
            timestamp: at(secs),
            temperature,
            humidity,
            pressure,
        }
    }

    #[test]
    fn test_new_collection_has_no_alarms() {
        let alarms = ActiveAlarms::new();
        assert!(alarms.is_empty());
        assert_eq!(alarms.iter().count(), 0);
        assert_eq!(alarms.head_kind(), AlarmKind::NoAlarm);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut alarms = ActiveAlarms::new();

        assert!(alarms.insert(AlarmKind::HighHumidity, at(0), 80.0).unwrap());
        assert!(!alarms.insert(AlarmKind::HighHumidity, at(5), 90.0).unwrap());

        assert_eq!(alarms.len(), 1);
        let record = alarms.get(AlarmKind::HighHumidity).unwrap();
        assert_eq!(record.timestamp, at(0));
        assert_eq!(record.value, 80.0);
    }

    #[test]
    fn test_no_alarm_is_never_stored() {
        let mut alarms = ActiveAlarms::new();
        assert!(!alarms.insert(AlarmKind::NoAlarm, at(0), 0.0).unwrap());
        assert!(alarms.is_empty());
    }

    #[test]
    fn test_insert_appends_at_tail() {
        let mut alarms = ActiveAlarms::new();
        alarms.insert(AlarmKind::LowPressure, at(0), 970.0).unwrap();
        alarms.insert(AlarmKind::HighTemperature, at(1), 40.0).unwrap();
        alarms.insert(AlarmKind::LowHumidity, at(2), 10.0).unwrap();

        assert_eq!(
            alarms.kinds(),
            vec![AlarmKind::LowPressure, AlarmKind::HighTemperature, AlarmKind::LowHumidity]
        );
        assert_eq!(alarms.head_kind(), AlarmKind::LowPressure);
    }

    #[test]
    fn test_remove_head_middle_and_tail() {
        let mut alarms = ActiveAlarms::new();
        for (i, kind) in [
            AlarmKind::HighTemperature,
            AlarmKind::HighHumidity,
            AlarmKind::HighPressure,
            AlarmKind::LowPressure,
        ]
        .into_iter()
        .enumerate()
        {
            alarms.insert(kind, at(i as i64), i as f64).unwrap();
        }

        assert!(alarms.remove(AlarmKind::HighHumidity));
        assert_eq!(
            alarms.kinds(),
            vec![AlarmKind::HighTemperature, AlarmKind::HighPressure, AlarmKind::LowPressure]
        );

        assert!(alarms.remove(AlarmKind::HighTemperature));
        assert_eq!(alarms.kinds(), vec![AlarmKind::HighPressure, AlarmKind::LowPressure]);

        assert!(alarms.remove(AlarmKind::LowPressure));
        assert_eq!(alarms.kinds(), vec![AlarmKind::HighPressure]);

        assert!(alarms.remove(AlarmKind::HighPressure));
        assert!(alarms.is_empty());
    }

    #[test]
    fn test_remove_inactive_is_noop() {
        let mut alarms = ActiveAlarms::new();
        assert!(!alarms.remove(AlarmKind::LowTemperature));

        alarms.insert(AlarmKind::HighTemperature, at(0), 35.0).unwrap();
        let before = alarms.clone();
        assert!(!alarms.remove(AlarmKind::LowTemperature));
        assert_eq!(alarms, before);
    }

    #[test]
    fn test_insert_then_remove_restores_previous_state() {
        let mut alarms = ActiveAlarms::new();
        alarms.insert(AlarmKind::HighPressure, at(0), 1020.0).unwrap();
        let before = alarms.clone();

        alarms.insert(AlarmKind::LowHumidity, at(1), 20.0).unwrap();
        alarms.remove(AlarmKind::LowHumidity);
        assert_eq!(alarms, before);

        let mut empty = ActiveAlarms::new();
        empty.insert(AlarmKind::LowTemperature, at(0), 5.0).unwrap();
        empty.remove(AlarmKind::LowTemperature);
        assert_eq!(empty, ActiveAlarms::new());
    }

    #[test]
    fn test_single_high_temperature_alarm() {
        let mut alarms = ActiveAlarms::new();
        let limits = AlarmLimits::default();

        alarms.evaluate(&limits, &reading(0, 35.0, 50.0, 1000.0)).unwrap();

        assert_eq!(alarms.len(), 1);
        let record = alarms.iter().next().unwrap();
        assert_eq!(record.kind, AlarmKind::HighTemperature);
        assert_eq!(record.value, 35.0);
        assert_eq!(record.timestamp, at(0));
    }

    #[test]
    fn test_alarm_clears_when_condition_ends() {
        let mut alarms = ActiveAlarms::new();
        let limits = AlarmLimits::default();

        alarms.evaluate(&limits, &reading(0, 35.0, 50.0, 1000.0)).unwrap();
        alarms.evaluate(&limits, &reading(2, 20.0, 50.0, 1000.0)).unwrap();

        assert!(alarms.is_empty());
        assert_eq!(alarms.head_kind(), AlarmKind::NoAlarm);
    }

    #[test]
    fn test_simultaneous_alarms_follow_rule_order() {
        let mut alarms = ActiveAlarms::new();
        let limits = AlarmLimits::default();

        alarms.evaluate(&limits, &reading(0, 35.0, 80.0, 1000.0)).unwrap();

        assert_eq!(
            alarms.kinds(),
            vec![AlarmKind::HighTemperature, AlarmKind::HighHumidity]
        );
    }

    #[test]
    fn test_repeated_evaluation_keeps_original_record() {
        let mut alarms = ActiveAlarms::new();
        let limits = AlarmLimits::default();
        let first = reading(0, 35.0, 50.0, 1000.0);

        alarms.evaluate(&limits, &first).unwrap();
        let snapshot = alarms.clone();
        alarms.evaluate(&limits, &first).unwrap();
        assert_eq!(alarms, snapshot);

        // A later, hotter reading does not refresh the trigger data
        alarms.evaluate(&limits, &reading(4, 41.0, 50.0, 1000.0)).unwrap();
        assert_eq!(alarms, snapshot);
    }

    #[test]
    fn test_order_stable_across_cycles() {
        let mut alarms = ActiveAlarms::new();
        let limits = AlarmLimits::default();

        // Pressure first, then temperature in a later cycle
        alarms.evaluate(&limits, &reading(0, 20.0, 50.0, 1020.0)).unwrap();
        alarms.evaluate(&limits, &reading(2, 35.0, 50.0, 1020.0)).unwrap();
        alarms.evaluate(&limits, &reading(4, 36.0, 50.0, 1021.0)).unwrap();

        assert_eq!(
            alarms.kinds(),
            vec![AlarmKind::HighPressure, AlarmKind::HighTemperature]
        );
        assert_eq!(alarms.get(AlarmKind::HighPressure).unwrap().timestamp, at(0));
        assert_eq!(alarms.get(AlarmKind::HighTemperature).unwrap().timestamp, at(2));
    }

    #[test]
    fn test_cardinality_matches_tripped_rules() {
        let limits = AlarmLimits::default();
        let mut alarms = ActiveAlarms::new();
        let start = at(0);

        let samples = [
            (35.0, 80.0, 1020.0),
            (5.0, 10.0, 970.0),
            (20.0, 50.0, 1000.0),
            (30.0, 25.0, 985.0),
            (10.0, 70.0, 1016.0),
        ];

        for (i, (t, h, p)) in samples.into_iter().enumerate() {
            let r = Reading {
                timestamp: start + Duration::seconds(i as i64 * 2),
                temperature: t,
                humidity: h,
                pressure: p,
            };
            alarms.evaluate(&limits, &r).unwrap();

            let tripped = ALARM_RULES
                .iter()
                .filter(|rule| rule.check(&limits, &r).is_some())
                .count();
            assert_eq!(alarms.len(), tripped);

            let kinds: std::collections::HashSet<_> = alarms.iter().map(|a| a.kind).collect();
            assert_eq!(kinds.len(), alarms.len());
        }
    }

    #[test]
    fn test_traversal_is_restartable() {
        let mut alarms = ActiveAlarms::new();
        alarms.insert(AlarmKind::HighTemperature, at(0), 35.0).unwrap();
        alarms.insert(AlarmKind::LowPressure, at(0), 980.0).unwrap();

        let first: Vec<_> = (&alarms).into_iter().map(|r| r.kind).collect();
        let second: Vec<_> = alarms.iter().map(|r| r.kind).collect();
        assert_eq!(first, second);
    }
}
