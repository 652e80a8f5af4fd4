//! Buckets free-text "Location of Breached Information" values into the
//! target-system categories plotted by the trend charts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemCategory {
    NetworkServer,
    Email,
    ElectronicMedicalRecord,
    OtherSystems,
    Other,
    Unknown,
}

impl SystemCategory {
    pub fn label(&self) -> &'static str {
        match self {
            SystemCategory::NetworkServer => "Network Server",
            SystemCategory::Email => "Email",
            SystemCategory::ElectronicMedicalRecord => "Electronic Medical Record",
            SystemCategory::OtherSystems => "Other Systems",
            SystemCategory::Other => "Other",
            SystemCategory::Unknown => "Unknown",
        }
    }
}

/// Which bucket set a chart uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CategoryScheme {
    /// Network Server / EMR / Other Systems; missing locations are `Unknown`.
    Legacy,
    /// Network Server / Email / EMR / Other; missing locations are `Other`.
    #[default]
    Focused,
}

impl CategoryScheme {
    /// Categories drawn on the chart, in legend order.
    pub fn plotted(&self) -> &'static [SystemCategory] {
        match self {
            CategoryScheme::Legacy => &[
                SystemCategory::NetworkServer,
                SystemCategory::ElectronicMedicalRecord,
                SystemCategory::OtherSystems,
            ],
            CategoryScheme::Focused => &[
                SystemCategory::NetworkServer,
                SystemCategory::Email,
                SystemCategory::ElectronicMedicalRecord,
                SystemCategory::Other,
            ],
        }
    }

    pub fn categorize(&self, location: Option<&str>) -> SystemCategory {
        match self {
            CategoryScheme::Legacy => categorize_legacy(location),
            CategoryScheme::Focused => categorize_focused(location),
        }
    }
}

fn mentions_medical_record(location: &str) -> bool {
    location.contains("electronic medical record")
        || location.contains("emr")
        || location.contains("ehr")
}

pub fn categorize_legacy(location: Option<&str>) -> SystemCategory {
    let Some(location) = location else {
        return SystemCategory::Unknown;
    };
    let location = location.to_lowercase();

    if location.contains("network server") {
        SystemCategory::NetworkServer
    } else if mentions_medical_record(&location) {
        SystemCategory::ElectronicMedicalRecord
    } else {
        SystemCategory::OtherSystems
    }
}

pub fn categorize_focused(location: Option<&str>) -> SystemCategory {
    let Some(location) = location else {
        return SystemCategory::Other;
    };
    let location = location.to_lowercase();

    if location.contains("network server") {
        SystemCategory::NetworkServer
    } else if location.contains("email") {
        SystemCategory::Email
    } else if mentions_medical_record(&location) {
        SystemCategory::ElectronicMedicalRecord
    } else {
        SystemCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_buckets() {
        assert_eq!(categorize_legacy(None), SystemCategory::Unknown);
        assert_eq!(
            categorize_legacy(Some("Network Server")),
            SystemCategory::NetworkServer
        );
        assert_eq!(
            categorize_legacy(Some("Electronic Medical Record, Email")),
            SystemCategory::ElectronicMedicalRecord
        );
        // "email" is not a legacy bucket.
        assert_eq!(categorize_legacy(Some("Email")), SystemCategory::OtherSystems);
    }

    #[test]
    fn test_focused_rule_order() {
        assert_eq!(categorize_focused(None), SystemCategory::Other);
        assert_eq!(
            categorize_focused(Some("Email, Network Server")),
            SystemCategory::NetworkServer
        );
        assert_eq!(
            categorize_focused(Some("Email, Electronic Medical Record")),
            SystemCategory::Email
        );
        assert_eq!(
            categorize_focused(Some("Hosted EHR")),
            SystemCategory::ElectronicMedicalRecord
        );
        assert_eq!(categorize_focused(Some("Paper/Films")), SystemCategory::Other);
    }

    #[test]
    fn test_matching_ignores_case() {
        assert_eq!(
            categorize_legacy(Some("NETWORK SERVER")),
            SystemCategory::NetworkServer
        );
        assert_eq!(
            categorize_focused(Some("Hosted EMR platform")),
            SystemCategory::ElectronicMedicalRecord
        );
    }

    #[test]
    fn test_plotted_categories() {
        assert_eq!(CategoryScheme::Legacy.plotted().len(), 3);
        assert_eq!(CategoryScheme::Focused.plotted()[3].label(), "Other");
    }
}
