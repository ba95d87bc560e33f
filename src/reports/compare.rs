use std::collections::HashMap;

use anyhow::Result;

use super::{average, summary_report, GroupBy, ReportFilter};
use crate::models::{
    ChildComparisonData, DailyLogEntry, DailyLogType, HealthEventSummary, HealthRecordEntry,
    HealthRecordType, SummaryReportData,
};
use crate::store::{DateRange, EventQuery, EventStore};

pub const MISSING_DETAIL: &str = "No details provided";

/// Summary rows for the two requested groups. Groups absent from the data
/// have no row.
pub async fn compare_groups(
    store: &dyn EventStore,
    range: DateRange,
    group_by: GroupBy,
    first: &str,
    second: &str,
) -> Result<Vec<SummaryReportData>> {
    let filter = ReportFilter {
        range,
        center_id: None,
    };
    let all = summary_report(store, &filter, group_by).await?;

    Ok(all
        .into_iter()
        .filter(|row| row.id == first || row.id == second)
        .collect())
}

pub async fn compare_classes(
    store: &dyn EventStore,
    range: DateRange,
    first_class: &str,
    second_class: &str,
) -> Result<Vec<SummaryReportData>> {
    compare_groups(store, range, GroupBy::Class, first_class, second_class).await
}

pub async fn compare_centers(
    store: &dyn EventStore,
    range: DateRange,
    first_center: &str,
    second_center: &str,
) -> Result<Vec<SummaryReportData>> {
    compare_groups(store, range, GroupBy::Center, first_center, second_center).await
}

/// Side-by-side health and nap totals for two children. Always yields one
/// entry per requested child, zero-filled when a child has no events.
pub async fn compare_children(
    store: &dyn EventStore,
    range: DateRange,
    first_child: &str,
    second_child: &str,
) -> Result<Vec<ChildComparisonData>> {
    tracing::info!(
        "Comparing children {} and {} for {:?}",
        first_child,
        second_child,
        range
    );

    let ids = [first_child.to_string(), second_child.to_string()];
    let health_query = EventQuery::new(range)
        .with_types([HealthRecordType::Incident, HealthRecordType::MedicationAdministered])
        .with_child_ids(ids.clone());
    let nap_query = EventQuery::new(range)
        .with_types([DailyLogType::Nap])
        .with_child_ids(ids);

    let (records, naps) = tokio::try_join!(
        store.query_health_records(&health_query),
        store.query_daily_logs(&nap_query)
    )?;

    Ok(build_child_comparison(
        [first_child, second_child],
        &records,
        &naps,
    ))
}

#[derive(Default, Clone)]
struct ChildTotals {
    total_incidents: u64,
    total_medications: u64,
    total_nap_duration: f64,
    nap_count: u64,
    health_events: Vec<HealthEventSummary>,
}

pub fn build_child_comparison(
    child_ids: [&str; 2],
    records: &[HealthRecordEntry],
    naps: &[DailyLogEntry],
) -> Vec<ChildComparisonData> {
    let mut totals: HashMap<&str, ChildTotals> = child_ids
        .iter()
        .map(|id| (*id, ChildTotals::default()))
        .collect();

    for record in records {
        let Some(child) = totals.get_mut(record.child_id.as_str()) else {
            continue;
        };
        let detail = match record.record_type {
            HealthRecordType::Incident => {
                child.total_incidents += 1;
                record.details.incident.as_deref()
            }
            HealthRecordType::MedicationAdministered => {
                child.total_medications += 1;
                record.details.medication.as_deref()
            }
        };
        child.health_events.push(HealthEventSummary {
            timestamp: record.timestamp,
            event_type: record.record_type,
            detail: detail.unwrap_or(MISSING_DETAIL).to_string(),
        });
    }

    for nap in naps.iter().filter(|e| e.log_type == DailyLogType::Nap) {
        let (Some(child), Some(duration)) = (
            totals.get_mut(nap.child_id.as_str()),
            nap.details.sleep_duration,
        ) else {
            continue;
        };
        child.total_nap_duration += duration;
        child.nap_count += 1;
    }

    let [first, second] = child_ids;
    let second_totals = totals.remove(second).unwrap_or_default();
    let first_totals = if first == second {
        second_totals.clone()
    } else {
        totals.remove(first).unwrap_or_default()
    };

    vec![
        first_totals.into_comparison(first),
        second_totals.into_comparison(second),
    ]
}

impl ChildTotals {
    fn into_comparison(mut self, child_id: &str) -> ChildComparisonData {
        self.health_events.sort_by_key(|event| event.timestamp);
        ChildComparisonData {
            child_id: child_id.to_string(),
            total_incidents: self.total_incidents,
            total_medications: self.total_medications,
            average_nap_duration: average(self.total_nap_duration, self.nap_count),
            health_events: self.health_events,
        }
    }
}
