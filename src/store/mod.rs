//! Read access to the event collections and the child directory.
//!
//! Report code only talks to [`EventStore`]; the PostgreSQL adapter lives in
//! [`postgres`] and tests use the in-memory [`memory::MemoryStore`].

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::models::{Child, DailyLogEntry, DailyLogType, HealthRecordEntry, HealthRecordType};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Largest id set sent in a single membership filter.
pub const ID_BATCH_LIMIT: usize = 30;

pub type SharedStore = Arc<dyn EventStore>;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn query_daily_logs(&self, query: &EventQuery<DailyLogType>)
        -> Result<Vec<DailyLogEntry>>;

    async fn query_health_records(
        &self,
        query: &EventQuery<HealthRecordType>,
    ) -> Result<Vec<HealthRecordEntry>>;

    /// Children whose id is in `ids`. Unknown ids are simply absent.
    async fn children_by_ids(&self, ids: &[String]) -> Result<Vec<Child>>;
}

/// Whole-day date bounds, inclusive on both ends, evaluated in UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.start.map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Midnight after `end`, so the whole end day is included.
    pub fn upper_bound_exclusive(&self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|d| d.succ_opt())
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }
}

/// Constraints applied to one event collection query. `None` leaves that
/// dimension unconstrained.
#[derive(Debug, Clone)]
pub struct EventQuery<T> {
    pub range: DateRange,
    pub types: Option<Vec<T>>,
    pub child_ids: Option<Vec<String>>,
}

impl<T> Default for EventQuery<T> {
    fn default() -> Self {
        Self {
            range: DateRange::default(),
            types: None,
            child_ids: None,
        }
    }
}

impl<T: PartialEq> EventQuery<T> {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = T>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    pub fn with_child_ids(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.child_ids = Some(ids.into_iter().collect());
        self
    }
}

/// Deduplicates `ids` and splits them into membership-filter sized batches.
pub fn id_batches<'a>(ids: impl IntoIterator<Item = &'a String>) -> Vec<Vec<String>> {
    let distinct: BTreeSet<&String> = ids.into_iter().collect();
    let distinct: Vec<String> = distinct.into_iter().cloned().collect();
    distinct
        .chunks(ID_BATCH_LIMIT)
        .map(|chunk| chunk.to_vec())
        .collect()
}
