use axum::{
    extract::{FromRequestParts, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{
    ApiResponse, ChildComparisonData, ComparativeData, StaffActivityData, SummaryReportData,
};
use crate::reports::{
    comparative_report, compare_centers, compare_children, compare_classes,
    staff_activity_report, summary_report, GroupBy, ReportFilter,
};
use crate::store::{DateRange, SharedStore};

type ReportResult<T> = Result<Json<ApiResponse<Vec<T>>>, AppError>;

/// `Query` whose rejections are rendered as the report error envelope.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ReportQuery<T>(T);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    center_id: Option<String>,
    group_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassComparisonQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    class_id1: Option<String>,
    class_id2: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterComparisonQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    center_id1: Option<String>,
    center_id2: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildComparisonQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    child_id1: Option<String>,
    child_id2: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffActivityQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    center_id: Option<String>,
}

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/reports/summary", get(get_summary))
        .route("/reports/class-comparison", get(get_class_comparison))
        .route("/reports/center-comparison", get(get_center_comparison))
        .route("/reports/child-comparison", get(get_child_comparison))
        .route("/reports/comparative", get(get_comparative))
        .route("/reports/staff-activity", get(get_staff_activity))
        .with_state(store)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    non_empty(value).ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

fn parse_date(value: Option<String>, name: &str) -> Result<Option<NaiveDate>, AppError> {
    non_empty(value)
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .ok()
                .filter(|date| (1..=9999).contains(&date.year()))
                .ok_or_else(|| {
                    AppError::BadRequest(format!("Invalid {name} '{raw}' (expected YYYY-MM-DD)"))
                })
        })
        .transpose()
}

fn parse_range(start: Option<String>, end: Option<String>) -> Result<DateRange, AppError> {
    let range = DateRange::new(parse_date(start, "startDate")?, parse_date(end, "endDate")?);
    if let (Some(start), Some(end)) = (range.start, range.end) {
        if start > end {
            return Err(AppError::BadRequest(format!(
                "startDate {start} is after endDate {end}"
            )));
        }
    }
    Ok(range)
}

fn parse_group_by(value: Option<String>) -> Result<GroupBy, AppError> {
    required(value, "groupBy")?
        .parse()
        .map_err(AppError::BadRequest)
}

async fn get_summary(
    State(store): State<SharedStore>,
    ReportQuery(params): ReportQuery<GroupedQuery>,
) -> ReportResult<SummaryReportData> {
    let group_by = parse_group_by(params.group_by)?;
    let filter = ReportFilter {
        range: parse_range(params.start_date, params.end_date)?,
        center_id: non_empty(params.center_id),
    };

    let data = summary_report(store.as_ref(), &filter, group_by).await?;
    Ok(Json(ApiResponse::ok("Summary report generated", data)))
}

async fn get_class_comparison(
    State(store): State<SharedStore>,
    ReportQuery(params): ReportQuery<ClassComparisonQuery>,
) -> ReportResult<SummaryReportData> {
    let first = required(params.class_id1, "classId1")?;
    let second = required(params.class_id2, "classId2")?;
    let range = parse_range(params.start_date, params.end_date)?;

    let data = compare_classes(store.as_ref(), range, &first, &second).await?;
    Ok(Json(ApiResponse::ok("Class comparison generated", data)))
}

async fn get_center_comparison(
    State(store): State<SharedStore>,
    ReportQuery(params): ReportQuery<CenterComparisonQuery>,
) -> ReportResult<SummaryReportData> {
    let first = required(params.center_id1, "centerId1")?;
    let second = required(params.center_id2, "centerId2")?;
    let range = parse_range(params.start_date, params.end_date)?;

    let data = compare_centers(store.as_ref(), range, &first, &second).await?;
    Ok(Json(ApiResponse::ok("Center comparison generated", data)))
}

async fn get_child_comparison(
    State(store): State<SharedStore>,
    ReportQuery(params): ReportQuery<ChildComparisonQuery>,
) -> ReportResult<ChildComparisonData> {
    let first = required(params.child_id1, "childId1")?;
    let second = required(params.child_id2, "childId2")?;
    let range = parse_range(params.start_date, params.end_date)?;

    let data = compare_children(store.as_ref(), range, &first, &second).await?;
    Ok(Json(ApiResponse::ok("Child comparison generated", data)))
}

async fn get_comparative(
    State(store): State<SharedStore>,
    ReportQuery(params): ReportQuery<GroupedQuery>,
) -> ReportResult<ComparativeData> {
    let group_by = parse_group_by(params.group_by)?;
    let filter = ReportFilter {
        range: parse_range(params.start_date, params.end_date)?,
        center_id: non_empty(params.center_id),
    };

    let data = comparative_report(store.as_ref(), &filter, group_by).await?;
    Ok(Json(ApiResponse::ok("Comparative report generated", data)))
}

async fn get_staff_activity(
    State(store): State<SharedStore>,
    ReportQuery(params): ReportQuery<StaffActivityQuery>,
) -> ReportResult<StaffActivityData> {
    let filter = ReportFilter {
        range: parse_range(params.start_date, params.end_date)?,
        center_id: non_empty(params.center_id),
    };

    let data = staff_activity_report(store.as_ref(), &filter).await?;
    Ok(Json(ApiResponse::ok("Staff activity report generated", data)))
}
