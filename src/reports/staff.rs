use std::collections::BTreeMap;

use anyhow::Result;

use super::directory::resolve_children;
use super::ReportFilter;
use crate::models::{DailyLogType, HealthRecordType, StaffActivityData};
use crate::store::{EventQuery, EventStore};

/// Logs written and health records filed per staff member.
pub async fn staff_activity_report(
    store: &dyn EventStore,
    filter: &ReportFilter,
) -> Result<Vec<StaffActivityData>> {
    tracing::info!(
        "Building staff activity report for {:?} (center: {:?})",
        filter.range,
        filter.center_id
    );

    let log_query: EventQuery<DailyLogType> = EventQuery::new(filter.range);
    let record_query: EventQuery<HealthRecordType> = EventQuery::new(filter.range);
    let (logs, records) = tokio::try_join!(
        store.query_daily_logs(&log_query),
        store.query_health_records(&record_query)
    )?;

    let scope = match filter.center_id.as_deref() {
        None => None,
        Some(center_id) => {
            let referenced = logs
                .iter()
                .map(|e| e.child_id.as_str())
                .chain(records.iter().map(|e| e.child_id.as_str()));
            Some(resolve_children(store, referenced, Some(center_id)).await?)
        }
    };
    let in_scope = |child_id: &str| scope.as_ref().map_or(true, |c| c.contains_key(child_id));

    let mut staff: BTreeMap<&str, StaffActivityData> = BTreeMap::new();
    for entry in logs.iter().filter(|e| in_scope(e.child_id.as_str())) {
        let data = staff.entry(entry.staff_id.as_str()).or_default();
        data.total_logs += 1;
        *data
            .logs_by_type
            .entry(entry.log_type.as_str().to_string())
            .or_default() += 1;
    }
    for record in records.iter().filter(|e| in_scope(e.child_id.as_str())) {
        staff
            .entry(record.recorded_by_user_id.as_str())
            .or_default()
            .health_records_recorded += 1;
    }

    Ok(staff
        .into_iter()
        .map(|(staff_id, mut data)| {
            data.staff_id = staff_id.to_string();
            data
        })
        .collect())
}
