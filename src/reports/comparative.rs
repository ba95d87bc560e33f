use std::collections::{BTreeMap, HashMap};

use anyhow::Result;

use super::directory::resolve_children;
use super::{average, GroupBy, ReportFilter};
use crate::models::{
    Child, ComparativeData, DailyLogEntry, DailyLogType, HealthRecordEntry, HealthRecordType,
};
use crate::store::{EventQuery, EventStore};

/// Meal, mood and engagement distributions plus activity counts per group.
pub async fn comparative_report(
    store: &dyn EventStore,
    filter: &ReportFilter,
    group_by: GroupBy,
) -> Result<Vec<ComparativeData>> {
    tracing::info!(
        "Building comparative report by {} for {:?} (center: {:?})",
        group_by,
        filter.range,
        filter.center_id
    );

    let log_query: EventQuery<DailyLogType> = EventQuery::new(filter.range);
    let record_query: EventQuery<HealthRecordType> = EventQuery::new(filter.range);
    let (logs, records) = tokio::try_join!(
        store.query_daily_logs(&log_query),
        store.query_health_records(&record_query)
    )?;

    let referenced = logs
        .iter()
        .map(|e| e.child_id.as_str())
        .chain(records.iter().map(|e| e.child_id.as_str()));
    let children = resolve_children(store, referenced, filter.center_id.as_deref()).await?;

    Ok(aggregate_comparative(&logs, &records, &children, group_by))
}

fn bump(counts: &mut BTreeMap<String, u64>, value: Option<&String>) {
    if let Some(value) = value {
        *counts.entry(value.clone()).or_default() += 1;
    }
}

pub fn aggregate_comparative(
    logs: &[DailyLogEntry],
    records: &[HealthRecordEntry],
    children: &HashMap<String, Child>,
    group_by: GroupBy,
) -> Vec<ComparativeData> {
    // (data, total nap minutes, naps with a duration)
    let mut groups: BTreeMap<&str, (ComparativeData, f64, u64)> = BTreeMap::new();

    for entry in logs {
        let Some(child) = children.get(&entry.child_id) else {
            continue;
        };
        let (data, nap_total, timed_naps) = groups.entry(group_by.key(child)).or_default();
        let details = &entry.details;
        match entry.log_type {
            DailyLogType::Meal => {
                data.meal_count += 1;
                bump(&mut data.meal_statuses, details.meal_status.as_ref());
            }
            DailyLogType::Nap => {
                data.nap_count += 1;
                if let Some(minutes) = details.sleep_duration {
                    *nap_total += minutes;
                    *timed_naps += 1;
                }
            }
            DailyLogType::Mood => {
                data.mood_count += 1;
                bump(&mut data.mood_counts, details.mood.as_ref());
            }
            DailyLogType::GeneralActivity => {
                data.activity_count += 1;
                bump(
                    &mut data.engagement_levels,
                    details.activity_engagement_level.as_ref(),
                );
            }
            DailyLogType::Diaper => data.diaper_count += 1,
        }
    }

    for record in records {
        let Some(child) = children.get(&record.child_id) else {
            continue;
        };
        let (data, _, _) = groups.entry(group_by.key(child)).or_default();
        match record.record_type {
            HealthRecordType::Incident => data.total_incidents += 1,
            HealthRecordType::MedicationAdministered => data.total_medications += 1,
        }
    }

    groups
        .into_iter()
        .map(|(group, (mut data, nap_total, timed_naps))| {
            data.group = group.to_string();
            data.average_nap_duration = average(nap_total, timed_naps);
            data
        })
        .collect()
}
