use std::future::Future;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};

use super::{id_batches, DateRange, EventQuery, EventStore};
use crate::models::{
    Child, DailyLogEntry, DailyLogType, HealthDetails, HealthRecordEntry, HealthRecordType,
    LogDetails,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ChildRow {
    id: String,
    first_name: String,
    last_name: String,
    date_of_birth: NaiveDate,
    center_id: String,
    class_id: String,
}

impl From<ChildRow> for Child {
    fn from(row: ChildRow) -> Self {
        Child {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            center_id: row.center_id,
            class_id: row.class_id,
        }
    }
}

#[derive(FromRow)]
struct DailyLogRow {
    id: String,
    child_id: String,
    staff_id: String,
    logged_at: DateTime<Utc>,
    log_type: String,
    details: Json<LogDetails>,
}

impl TryFrom<DailyLogRow> for DailyLogEntry {
    type Error = anyhow::Error;

    fn try_from(row: DailyLogRow) -> Result<Self> {
        Ok(DailyLogEntry {
            log_type: row.log_type.parse()?,
            id: row.id,
            child_id: row.child_id,
            staff_id: row.staff_id,
            timestamp: row.logged_at,
            details: row.details.0,
        })
    }
}

#[derive(FromRow)]
struct HealthRecordRow {
    id: String,
    child_id: String,
    recorded_by_user_id: String,
    logged_at: DateTime<Utc>,
    record_type: String,
    details: Json<HealthDetails>,
    action_taken: Option<String>,
}

impl TryFrom<HealthRecordRow> for HealthRecordEntry {
    type Error = anyhow::Error;

    fn try_from(row: HealthRecordRow) -> Result<Self> {
        Ok(HealthRecordEntry {
            record_type: row.record_type.parse()?,
            id: row.id,
            child_id: row.child_id,
            recorded_by_user_id: row.recorded_by_user_id,
            timestamp: row.logged_at,
            details: row.details.0,
            action_taken: row.action_taken,
        })
    }
}

fn push_constraints(
    builder: &mut QueryBuilder<'_, Postgres>,
    type_column: &str,
    range: &DateRange,
    types: Option<Vec<String>>,
    child_ids: Option<Vec<String>>,
) {
    if let Some(lo) = range.lower_bound() {
        builder.push(" AND logged_at >= ").push_bind(lo);
    }
    if let Some(hi) = range.upper_bound_exclusive() {
        builder.push(" AND logged_at < ").push_bind(hi);
    }
    if let Some(types) = types {
        builder
            .push(format!(" AND {type_column} = ANY("))
            .push_bind(types)
            .push(")");
    }
    if let Some(ids) = child_ids {
        builder.push(" AND child_id = ANY(").push_bind(ids).push(")");
    }
}

fn type_names<T>(types: &Option<Vec<T>>, name: fn(&T) -> &'static str) -> Option<Vec<String>> {
    types
        .as_ref()
        .map(|types| types.iter().map(|t| name(t).to_string()).collect())
}

fn daily_log_query(
    query: &EventQuery<DailyLogType>,
    child_ids: Option<Vec<String>>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "SELECT id, child_id, staff_id, logged_at, log_type, details \
         FROM daily_logs WHERE TRUE",
    );
    let types = type_names(&query.types, DailyLogType::as_str);
    push_constraints(&mut builder, "log_type", &query.range, types, child_ids);
    builder
}

fn health_record_query(
    query: &EventQuery<HealthRecordType>,
    child_ids: Option<Vec<String>>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "SELECT id, child_id, recorded_by_user_id, logged_at, record_type, details, action_taken \
         FROM health_records WHERE TRUE",
    );
    let types = type_names(&query.types, HealthRecordType::as_str);
    push_constraints(&mut builder, "record_type", &query.range, types, child_ids);
    builder
}

/// Calls `fetch` once per id batch, or once unfiltered when there is no
/// child-id constraint. An empty id set matches nothing.
async fn fetch_in_batches<T, F, Fut>(child_ids: Option<&[String]>, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<Vec<String>>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let Some(ids) = child_ids else {
        return fetch(None).await;
    };

    let mut out = Vec::new();
    for batch in id_batches(ids) {
        out.extend(fetch(Some(batch)).await?);
    }
    Ok(out)
}

impl PgStore {
    async fn fetch_daily_logs(
        &self,
        query: &EventQuery<DailyLogType>,
        child_ids: Option<Vec<String>>,
    ) -> Result<Vec<DailyLogEntry>> {
        let rows = daily_log_query(query, child_ids)
            .build_query_as::<DailyLogRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(DailyLogEntry::try_from).collect()
    }

    async fn fetch_health_records(
        &self,
        query: &EventQuery<HealthRecordType>,
        child_ids: Option<Vec<String>>,
    ) -> Result<Vec<HealthRecordEntry>> {
        let rows = health_record_query(query, child_ids)
            .build_query_as::<HealthRecordRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(HealthRecordEntry::try_from).collect()
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn query_daily_logs(
        &self,
        query: &EventQuery<DailyLogType>,
    ) -> Result<Vec<DailyLogEntry>> {
        tracing::debug!("Querying daily logs: {:?}", query);
        fetch_in_batches(query.child_ids.as_deref(), move |batch| {
            self.fetch_daily_logs(query, batch)
        })
        .await
    }

    async fn query_health_records(
        &self,
        query: &EventQuery<HealthRecordType>,
    ) -> Result<Vec<HealthRecordEntry>> {
        tracing::debug!("Querying health records: {:?}", query);
        fetch_in_batches(query.child_ids.as_deref(), move |batch| {
            self.fetch_health_records(query, batch)
        })
        .await
    }

    async fn children_by_ids(&self, ids: &[String]) -> Result<Vec<Child>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ChildRow>(
            "SELECT id, first_name, last_name, date_of_birth, center_id, class_id
             FROM children
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Child::from).collect())
    }
}
