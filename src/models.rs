use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub center_id: String,
    pub class_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DailyLogType {
    Meal,
    Nap,
    Diaper,
    Mood,
    #[serde(rename = "General Activity")]
    GeneralActivity,
}

impl DailyLogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DailyLogType::Meal => "Meal",
            DailyLogType::Nap => "Nap",
            DailyLogType::Diaper => "Diaper",
            DailyLogType::Mood => "Mood",
            DailyLogType::GeneralActivity => "General Activity",
        }
    }
}

impl fmt::Display for DailyLogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DailyLogType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Meal" => Ok(DailyLogType::Meal),
            "Nap" => Ok(DailyLogType::Nap),
            "Diaper" => Ok(DailyLogType::Diaper),
            "Mood" => Ok(DailyLogType::Mood),
            "General Activity" => Ok(DailyLogType::GeneralActivity),
            other => Err(anyhow!("unknown daily log type: {other}")),
        }
    }
}

/// Type-dependent payload of a daily log. Only the field matching the
/// entry's type is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_status: Option<String>,
    /// Minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_engagement_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogEntry {
    pub id: String,
    pub child_id: String,
    pub staff_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub log_type: DailyLogType,
    pub details: LogDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthRecordType {
    Incident,
    #[serde(rename = "Medication Administered")]
    MedicationAdministered,
}

impl HealthRecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthRecordType::Incident => "Incident",
            HealthRecordType::MedicationAdministered => "Medication Administered",
        }
    }
}

impl fmt::Display for HealthRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthRecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Incident" => Ok(HealthRecordType::Incident),
            "Medication Administered" => Ok(HealthRecordType::MedicationAdministered),
            other => Err(anyhow!("unknown health record type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecordEntry {
    pub id: String,
    pub child_id: String,
    pub recorded_by_user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub record_type: HealthRecordType,
    pub details: HealthDetails,
    pub action_taken: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReportData {
    pub id: String,
    pub average_nap_duration: f64,
    pub total_incidents: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeData {
    pub group: String,
    pub meal_statuses: BTreeMap<String, u64>,
    pub engagement_levels: BTreeMap<String, u64>,
    pub mood_counts: BTreeMap<String, u64>,
    pub meal_count: u64,
    pub nap_count: u64,
    pub mood_count: u64,
    pub activity_count: u64,
    pub diaper_count: u64,
    pub average_nap_duration: f64,
    pub total_incidents: u64,
    pub total_medications: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEventSummary {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: HealthRecordType,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildComparisonData {
    pub child_id: String,
    pub total_incidents: u64,
    pub total_medications: u64,
    pub average_nap_duration: f64,
    pub health_events: Vec<HealthEventSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffActivityData {
    pub staff_id: String,
    pub total_logs: u64,
    pub logs_by_type: BTreeMap<String, u64>,
    pub health_records_recorded: u64,
}

/// Envelope shared by every report response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}
