use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time bucket used on the x axis of the trend charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum TimePeriod {
    #[default]
    Month,
    Quarter,
    Year,
}

impl TimePeriod {
    /// Sortable label: `2023-04`, `2023-Q2` or `2023`.
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            TimePeriod::Month => format!("{:04}-{:02}", date.year(), date.month()),
            TimePeriod::Quarter => format!("{}-Q{}", date.year(), (date.month() - 1) / 3 + 1),
            TimePeriod::Year => date.year().to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Month => "month",
            TimePeriod::Quarter => "quarter",
            TimePeriod::Year => "year",
        }
    }

    pub fn capitalized(&self) -> &'static str {
        match self {
            TimePeriod::Month => "Month",
            TimePeriod::Quarter => "Quarter",
            TimePeriod::Year => "Year",
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" => Ok(TimePeriod::Month),
            "quarter" => Ok(TimePeriod::Quarter),
            "year" => Ok(TimePeriod::Year),
            other => Err(format!(
                "Invalid time period '{}'. Use 'month', 'quarter', or 'year'.",
                other
            )),
        }
    }
}

/// `Jan 2023` style label for a `YYYY-MM` bucket; other labels pass through.
pub fn month_display(label: &str) -> String {
    NaiveDate::parse_from_str(&format!("{}-01", label), "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| label.to_string())
}

/// Same day `months - 1` months before `latest` (clamped to month end), so
/// the window spans `months` months including the latest one.
pub fn window_start(latest: NaiveDate, months: u32) -> NaiveDate {
    let back = months.saturating_sub(1);
    latest
        .checked_sub_months(chrono::Months::new(back))
        .unwrap_or(NaiveDate::MIN)
}
