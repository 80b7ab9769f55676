// src/models/report_kind.rs
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Named report kinds. Each has its own column layout and query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReportKind {
    Weight,
    DailyProduction,
}

impl ReportKind {
    /// Base name used for downloaded files.
    pub fn file_stem(&self) -> &'static str {
        match self {
            ReportKind::Weight => "rapport_pesee",
            ReportKind::DailyProduction => "rapport_production_journaliere",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_from_url_segment() {
        assert_eq!(ReportKind::from_str("weight").unwrap(), ReportKind::Weight);
        assert_eq!(ReportKind::from_str("daily-production").unwrap(), ReportKind::DailyProduction);
        assert!(ReportKind::from_str("daily_production").is_err());
        assert!(ReportKind::from_str("stock").is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for kind in ReportKind::iter() {
            assert_eq!(ReportKind::from_str(&kind.to_string()).unwrap(), kind);
        }
    }
}
