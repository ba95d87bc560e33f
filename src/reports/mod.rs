//! Report aggregation over daily logs and health records.

use std::fmt;
use std::str::FromStr;

use crate::models::Child;
use crate::store::DateRange;

pub mod comparative;
pub mod compare;
pub mod directory;
pub mod staff;
pub mod summary;

pub use comparative::comparative_report;
pub use compare::{compare_centers, compare_children, compare_classes};
pub use staff::staff_activity_report;
pub use summary::summary_report;

/// Dimension children are bucketed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Class,
    Center,
}

impl GroupBy {
    pub fn key<'a>(&self, child: &'a Child) -> &'a str {
        match self {
            GroupBy::Class => &child.class_id,
            GroupBy::Center => &child.center_id,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Class => f.write_str("class"),
            GroupBy::Center => f.write_str("center"),
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(GroupBy::Class),
            "center" => Ok(GroupBy::Center),
            other => Err(format!(
                "Invalid groupBy value '{other}', expected 'class' or 'center'"
            )),
        }
    }
}

/// Inputs shared by the grouped reports.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub range: DateRange,
    /// Restricts the children considered before grouping.
    pub center_id: Option<String>,
}

/// Plain mean that reports 0 for an empty sample.
pub(crate) fn average(total: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
