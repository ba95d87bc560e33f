use std::collections::{BTreeMap, HashMap};

use anyhow::Result;

use super::directory::resolve_children;
use super::{average, GroupBy, ReportFilter};
use crate::models::{
    Child, DailyLogEntry, DailyLogType, HealthRecordEntry, HealthRecordType, SummaryReportData,
};
use crate::store::{EventQuery, EventStore};

#[derive(Default)]
struct GroupTotals {
    total_nap_duration: f64,
    nap_count: u64,
    total_incidents: u64,
}

/// Average nap duration and incident count per class or center.
pub async fn summary_report(
    store: &dyn EventStore,
    filter: &ReportFilter,
    group_by: GroupBy,
) -> Result<Vec<SummaryReportData>> {
    tracing::info!(
        "Building summary report by {} for {:?} (center: {:?})",
        group_by,
        filter.range,
        filter.center_id
    );

    let nap_query = EventQuery::new(filter.range).with_types([DailyLogType::Nap]);
    let incident_query = EventQuery::new(filter.range).with_types([HealthRecordType::Incident]);
    let (naps, incidents) = tokio::try_join!(
        store.query_daily_logs(&nap_query),
        store.query_health_records(&incident_query)
    )?;

    let referenced = naps
        .iter()
        .map(|e| e.child_id.as_str())
        .chain(incidents.iter().map(|e| e.child_id.as_str()));
    let children = resolve_children(store, referenced, filter.center_id.as_deref()).await?;

    let report = aggregate_summary(&naps, &incidents, &children, group_by);
    tracing::info!(
        "Summary report: {} naps, {} incidents, {} groups",
        naps.len(),
        incidents.len(),
        report.len()
    );
    Ok(report)
}

/// Groups already-fetched events. Events whose child is not in `children`
/// are dropped, as are naps without a recorded duration.
pub fn aggregate_summary(
    naps: &[DailyLogEntry],
    incidents: &[HealthRecordEntry],
    children: &HashMap<String, Child>,
    group_by: GroupBy,
) -> Vec<SummaryReportData> {
    let mut groups: BTreeMap<&str, GroupTotals> = BTreeMap::new();

    for nap in naps.iter().filter(|e| e.log_type == DailyLogType::Nap) {
        let Some(duration) = nap.details.sleep_duration else {
            continue;
        };
        let Some(child) = children.get(&nap.child_id) else {
            continue;
        };
        let totals = groups.entry(group_by.key(child)).or_default();
        totals.total_nap_duration += duration;
        totals.nap_count += 1;
    }

    for record in incidents
        .iter()
        .filter(|e| e.record_type == HealthRecordType::Incident)
    {
        if let Some(child) = children.get(&record.child_id) {
            groups.entry(group_by.key(child)).or_default().total_incidents += 1;
        }
    }

    groups
        .into_iter()
        .map(|(id, totals)| SummaryReportData {
            id: id.to_string(),
            average_nap_duration: average(totals.total_nap_duration, totals.nap_count),
            total_incidents: totals.total_incidents,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogDetails;
    use crate::store::memory::{at, child, incident, log, medication, nap, MemoryStore};
    use crate::store::DateRange;
    use chrono::NaiveDate;

    fn directory(children: &[Child]) -> HashMap<String, Child> {
        children.iter().map(|c| (c.id.clone(), c.clone())).collect()
    }

    #[test]
    fn averages_naps_across_a_class() {
        let naps = vec![
            nap("n1", "A", 60.0, at(1, 12)),
            nap("n2", "A", 30.0, at(2, 12)),
            nap("n3", "B", 90.0, at(2, 13)),
        ];
        let children = directory(&[child("A", "classX", "c1"), child("B", "classX", "c1")]);

        let report = aggregate_summary(&naps, &[], &children, GroupBy::Class);

        assert_eq!(
            report,
            vec![SummaryReportData {
                id: "classX".to_string(),
                average_nap_duration: 60.0,
                total_incidents: 0,
            }]
        );
    }

    #[test]
    fn unresolved_children_contribute_nothing() {
        let incidents = vec![
            incident("i1", "A", "fell", at(1, 9)),
            incident("i2", "A", "bump", at(1, 10)),
        ];

        let report = aggregate_summary(&[], &incidents, &HashMap::new(), GroupBy::Class);

        assert!(report.is_empty());
    }

    #[test]
    fn incident_only_group_has_zero_average() {
        let incidents = vec![incident("i1", "A", "fell", at(1, 9))];
        let naps = vec![nap("n1", "B", 45.0, at(1, 12))];
        let children = directory(&[child("A", "x", "north"), child("B", "y", "south")]);

        let report = aggregate_summary(&naps, &incidents, &children, GroupBy::Center);

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].id, "north");
        assert_eq!(report[0].average_nap_duration, 0.0);
        assert_eq!(report[0].total_incidents, 1);
        assert_eq!(report[1].id, "south");
        assert_eq!(report[1].average_nap_duration, 45.0);
        assert_eq!(report[1].total_incidents, 0);
    }

    #[test]
    fn naps_without_duration_are_skipped() {
        let naps = vec![
            nap("n1", "A", 40.0, at(1, 12)),
            log("n2", "A", DailyLogType::Nap, LogDetails::default(), at(1, 13)),
        ];
        let children = directory(&[child("A", "x", "c1")]);

        let report = aggregate_summary(&naps, &[], &children, GroupBy::Class);

        assert_eq!(report[0].average_nap_duration, 40.0);
    }

    #[test]
    fn other_event_types_are_ignored() {
        let logs = vec![log("m1", "A", DailyLogType::Meal, LogDetails::default(), at(1, 8))];
        let records = vec![medication("d1", "A", "Tylenol", at(1, 9))];
        let children = directory(&[child("A", "x", "c1")]);

        assert!(aggregate_summary(&logs, &records, &children, GroupBy::Class).is_empty());
    }

    #[tokio::test]
    async fn report_applies_date_range_and_center_filter() {
        let store = MemoryStore::new()
            .with_children([
                child("A", "x", "c1"),
                child("B", "y", "c1"),
                child("C", "z", "c2"),
            ])
            .with_logs([
                nap("n1", "A", 30.0, at(1, 12)),
                nap("n2", "A", 50.0, at(10, 12)),
                nap("n3", "C", 80.0, at(2, 12)),
            ])
            .with_records([
                incident("i1", "B", "scrape", at(3, 9)),
                incident("i2", "C", "bump", at(3, 9)),
                incident("i3", "ghost", "bump", at(3, 9)),
            ]);
        let filter = ReportFilter {
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 3, 1),
                NaiveDate::from_ymd_opt(2024, 3, 5),
            ),
            center_id: Some("c1".to_string()),
        };

        let report = summary_report(&store, &filter, GroupBy::Class).await.unwrap();

        assert_eq!(
            report,
            vec![
                SummaryReportData {
                    id: "x".into(),
                    average_nap_duration: 30.0,
                    total_incidents: 0,
                },
                SummaryReportData {
                    id: "y".into(),
                    average_nap_duration: 0.0,
                    total_incidents: 1,
                },
            ]
        );
    }

    #[tokio::test]
    async fn group_counts_never_exceed_events() {
        let store = MemoryStore::new()
            .with_children([child("A", "x", "c1")])
            .with_records([
                incident("i1", "A", "a", at(1, 9)),
                incident("i2", "B", "b", at(1, 9)),
                incident("i3", "C", "c", at(1, 9)),
            ]);

        let report = summary_report(&store, &ReportFilter::default(), GroupBy::Center)
            .await
            .unwrap();

        let counted: u64 = report.iter().map(|r| r.total_incidents).sum();
        assert_eq!(counted, 1);
    }

    #[tokio::test]
    async fn empty_store_gives_empty_report() {
        let store = MemoryStore::new();
        let report = summary_report(&store, &ReportFilter::default(), GroupBy::Class)
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = MemoryStore::failing();
        assert!(summary_report(&store, &ReportFilter::default(), GroupBy::Class)
            .await
            .is_err());
    }
}
