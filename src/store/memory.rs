use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::{DateRange, EventQuery, EventStore};
use crate::models::{
    Child, DailyLogEntry, DailyLogType, HealthDetails, HealthRecordEntry, HealthRecordType,
    LogDetails,
};

fn in_range(range: &DateRange, timestamp: &DateTime<Utc>) -> bool {
    let after_start = range.lower_bound().map_or(true, |lo| *timestamp >= lo);
    let before_end = range.upper_bound_exclusive().map_or(true, |hi| *timestamp < hi);
    after_start && before_end
}

/// Applies `query` the way the SQL adapter does.
fn matches<T: PartialEq>(
    query: &EventQuery<T>,
    child_id: &str,
    event_type: &T,
    timestamp: &DateTime<Utc>,
) -> bool {
    let type_ok = query.types.as_ref().map_or(true, |t| t.contains(event_type));
    let child_ok = query
        .child_ids
        .as_ref()
        .map_or(true, |ids| ids.iter().any(|id| id == child_id));
    type_ok && child_ok && in_range(&query.range, timestamp)
}

/// In-memory [`EventStore`] for tests.
#[derive(Default)]
pub struct MemoryStore {
    pub children: Vec<Child>,
    pub daily_logs: Vec<DailyLogEntry>,
    pub health_records: Vec<HealthRecordEntry>,
    pub fail_queries: bool,
    /// Size of every `children_by_ids` call, in order.
    pub child_lookups: Mutex<Vec<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_queries: true,
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Child>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_logs(mut self, logs: impl IntoIterator<Item = DailyLogEntry>) -> Self {
        self.daily_logs.extend(logs);
        self
    }

    pub fn with_records(mut self, records: impl IntoIterator<Item = HealthRecordEntry>) -> Self {
        self.health_records.extend(records);
        self
    }

    pub fn lookup_sizes(&self) -> Vec<usize> {
        self.child_lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn query_daily_logs(
        &self,
        query: &EventQuery<DailyLogType>,
    ) -> Result<Vec<DailyLogEntry>> {
        if self.fail_queries {
            bail!("daily_logs unavailable");
        }
        Ok(self
            .daily_logs
            .iter()
            .filter(|e| matches(query, &e.child_id, &e.log_type, &e.timestamp))
            .cloned()
            .collect())
    }

    async fn query_health_records(
        &self,
        query: &EventQuery<HealthRecordType>,
    ) -> Result<Vec<HealthRecordEntry>> {
        if self.fail_queries {
            bail!("health_records unavailable");
        }
        Ok(self
            .health_records
            .iter()
            .filter(|e| matches(query, &e.child_id, &e.record_type, &e.timestamp))
            .cloned()
            .collect())
    }

    async fn children_by_ids(&self, ids: &[String]) -> Result<Vec<Child>> {
        self.child_lookups.lock().unwrap().push(ids.len());
        Ok(self
            .children
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

pub fn child(id: &str, class_id: &str, center_id: &str) -> Child {
    Child {
        id: id.to_string(),
        first_name: format!("First {id}"),
        last_name: format!("Last {id}"),
        date_of_birth: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
        center_id: center_id.to_string(),
        class_id: class_id.to_string(),
    }
}

pub fn log(
    id: &str,
    child_id: &str,
    log_type: DailyLogType,
    details: LogDetails,
    timestamp: DateTime<Utc>,
) -> DailyLogEntry {
    DailyLogEntry {
        id: id.to_string(),
        child_id: child_id.to_string(),
        staff_id: "staff-1".to_string(),
        timestamp,
        log_type,
        details,
    }
}

pub fn nap(id: &str, child_id: &str, minutes: f64, timestamp: DateTime<Utc>) -> DailyLogEntry {
    let details = LogDetails {
        sleep_duration: Some(minutes),
        ..LogDetails::default()
    };
    log(id, child_id, DailyLogType::Nap, details, timestamp)
}

pub fn incident(
    id: &str,
    child_id: &str,
    text: &str,
    timestamp: DateTime<Utc>,
) -> HealthRecordEntry {
    HealthRecordEntry {
        id: id.to_string(),
        child_id: child_id.to_string(),
        recorded_by_user_id: "nurse-1".to_string(),
        timestamp,
        record_type: HealthRecordType::Incident,
        details: HealthDetails {
            incident: Some(text.to_string()),
            medication: None,
        },
        action_taken: Some("Ice pack".to_string()),
    }
}

pub fn medication(
    id: &str,
    child_id: &str,
    text: &str,
    timestamp: DateTime<Utc>,
) -> HealthRecordEntry {
    HealthRecordEntry {
        id: id.to_string(),
        child_id: child_id.to_string(),
        recorded_by_user_id: "nurse-1".to_string(),
        timestamp,
        record_type: HealthRecordType::MedicationAdministered,
        details: HealthDetails {
            incident: None,
            medication: Some(text.to_string()),
        },
        action_taken: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 3, d)
    }

    #[test]
    fn range_includes_whole_end_day() {
        let range = DateRange::new(day(4), day(6));

        assert!(in_range(&range, &at(4, 0)));
        assert!(in_range(&range, &Utc.with_ymd_and_hms(2024, 3, 6, 23, 59, 59).unwrap()));
        assert!(!in_range(&range, &Utc.with_ymd_and_hms(2024, 3, 3, 23, 59, 59).unwrap()));
        assert!(!in_range(&range, &at(7, 0)));
    }

    #[test]
    fn open_range_sides_are_unconstrained() {
        let ts = Utc.with_ymd_and_hms(1999, 1, 1, 12, 0, 0).unwrap();
        assert!(in_range(&DateRange::default(), &ts));
        assert!(in_range(&DateRange::new(None, day(1)), &ts));
        assert!(!in_range(&DateRange::new(day(1), None), &ts));
    }

    #[tokio::test]
    async fn queries_apply_every_constraint() {
        let store = MemoryStore::new().with_logs([
            nap("n1", "a", 30.0, at(5, 9)),
            nap("n2", "b", 30.0, at(5, 9)),
            log("m1", "a", DailyLogType::Meal, LogDetails::default(), at(5, 9)),
            nap("n3", "a", 30.0, at(6, 9)),
        ]);
        let query = EventQuery::new(DateRange::new(day(5), day(5)))
            .with_types([DailyLogType::Nap])
            .with_child_ids(["a".to_string()]);

        let found = store.query_daily_logs(&query).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["n1"]);

        let everything = store.query_daily_logs(&EventQuery::default()).await.unwrap();
        assert_eq!(everything.len(), 4);
    }
}
