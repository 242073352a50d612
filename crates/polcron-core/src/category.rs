//! # Schedule Category — Single Source of Truth
//!
//! The four periodic script buckets a policy can target. One enum, matched
//! exhaustively, so adding a bucket forces every consumer (default
//! directories, registry key names, configuration) to handle it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PolcronError;

/// A periodic script schedule bucket.
///
/// | Category | Registry key suffix | Default directory |
/// |----------|---------------------|-------------------|
/// | Hourly   | `Hourly Scripts`    | `/etc/cron.hourly`  |
/// | Daily    | `Daily Scripts`     | `/etc/cron.daily`   |
/// | Weekly   | `Weekly Scripts`    | `/etc/cron.weekly`  |
/// | Monthly  | `Monthly Scripts`   | `/etc/cron.monthly` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleCategory {
    /// Run once an hour.
    Hourly,
    /// Run once a day.
    Daily,
    /// Run once a week.
    Weekly,
    /// Run once a month.
    Monthly,
}

/// Number of schedule categories.
pub const SCHEDULE_CATEGORY_COUNT: usize = 4;

impl ScheduleCategory {
    /// All categories, shortest period first.
    pub fn all() -> &'static [ScheduleCategory] {
        &[Self::Hourly, Self::Daily, Self::Weekly, Self::Monthly]
    }

    /// Lowercase identifier, matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Last path segment of the category's registry key.
    pub fn key_suffix(&self) -> &'static str {
        match self {
            Self::Hourly => "Hourly Scripts",
            Self::Daily => "Daily Scripts",
            Self::Weekly => "Weekly Scripts",
            Self::Monthly => "Monthly Scripts",
        }
    }

    /// Host directory scripts of this category are written to by default.
    pub fn default_directory(&self) -> &'static str {
        match self {
            Self::Hourly => "/etc/cron.hourly",
            Self::Daily => "/etc/cron.daily",
            Self::Weekly => "/etc/cron.weekly",
            Self::Monthly => "/etc/cron.monthly",
        }
    }
}

impl std::fmt::Display for ScheduleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleCategory {
    type Err = PolcronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(PolcronError::UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_count_and_unique() {
        let all = ScheduleCategory::all();
        assert_eq!(all.len(), SCHEDULE_CATEGORY_COUNT);
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), SCHEDULE_CATEGORY_COUNT);
    }

    #[test]
    fn test_as_str_roundtrip() {
        for category in ScheduleCategory::all() {
            let parsed: ScheduleCategory = category.as_str().parse().unwrap();
            assert_eq!(*category, parsed);
        }
        assert!("Daily".parse::<ScheduleCategory>().is_err());
    }

    #[test]
    fn test_key_suffixes_end_in_scripts() {
        for category in ScheduleCategory::all() {
            assert!(category.key_suffix().ends_with("Scripts"));
        }
    }

    #[test]
    fn test_serde_matches_as_str() {
        for category in ScheduleCategory::all() {
            let json = serde_json::to_string(category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_default_directories() {
        assert_eq!(ScheduleCategory::Daily.default_directory(), "/etc/cron.daily");
        assert_eq!(ScheduleCategory::Hourly.default_directory(), "/etc/cron.hourly");
    }
}
