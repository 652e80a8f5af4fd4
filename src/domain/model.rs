use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const COL_ENTITY_NAME: &str = "Name of Covered Entity";
pub const COL_ENTITY_TYPE: &str = "Covered Entity Type";
pub const COL_INDIVIDUALS_AFFECTED: &str = "Individuals Affected";
pub const COL_SUBMISSION_DATE: &str = "Breach Submission Date";
pub const COL_BREACH_TYPE: &str = "Type of Breach";
pub const COL_LOCATION: &str = "Location of Breached Information";

pub const HEALTHCARE_PROVIDER: &str = "Healthcare Provider";
pub const DEFAULT_SHEET: &str = "reportResultTable1";

/// One row of an HHS breach report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreachRecord {
    pub entity_name: String,
    pub entity_type: String,
    pub individuals_affected: u64,
    /// `None` when the cell was empty or could not be parsed as a date.
    pub submission_date: Option<NaiveDate>,
    pub breach_type: String,
    /// `None` for empty cells.
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BreachReport {
    pub source: String,
    pub columns: Vec<String>,
    pub records: Vec<BreachRecord>,
}

impl BreachReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(|r| r.submission_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

/// Breach count and impact for one location label.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationShare {
    pub label: String,
    pub breaches: u64,
    pub affected: u64,
}

/// Counts per category for one time period, in scheme order.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodCounts {
    pub period: String,
    pub counts: Vec<u64>,
}
