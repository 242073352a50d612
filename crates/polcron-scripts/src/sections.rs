//! # Category Map
//!
//! Static lookup from a policy registry key to the schedule category it
//! declares and the directory its scripts are written to. Keys outside the
//! map are ignored by reconciliation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use polcron_core::ScheduleCategory;
use serde::{Deserialize, Serialize};

/// Registry key under which the four `<Period> Scripts` keys live.
pub const DEFAULT_POLICY_ROOT: &str = r"Software\Policies\Samba\Unix Settings";

/// Target directory per schedule category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryDirectories {
    pub hourly: PathBuf,
    pub daily: PathBuf,
    pub weekly: PathBuf,
    pub monthly: PathBuf,
}

impl Default for CategoryDirectories {
    fn default() -> Self {
        Self {
            hourly: ScheduleCategory::Hourly.default_directory().into(),
            daily: ScheduleCategory::Daily.default_directory().into(),
            weekly: ScheduleCategory::Weekly.default_directory().into(),
            monthly: ScheduleCategory::Monthly.default_directory().into(),
        }
    }
}

impl CategoryDirectories {
    /// Directory for `category`.
    pub fn get(&self, category: ScheduleCategory) -> &Path {
        match category {
            ScheduleCategory::Hourly => &self.hourly,
            ScheduleCategory::Daily => &self.daily,
            ScheduleCategory::Weekly => &self.weekly,
            ScheduleCategory::Monthly => &self.monthly,
        }
    }

    /// Every category rooted under `base`, as `<base>/cron.<category>`.
    pub fn under(base: &Path) -> Self {
        let dir = |c: ScheduleCategory| base.join(format!("cron.{}", c.as_str()));
        Self {
            hourly: dir(ScheduleCategory::Hourly),
            daily: dir(ScheduleCategory::Daily),
            weekly: dir(ScheduleCategory::Weekly),
            monthly: dir(ScheduleCategory::Monthly),
        }
    }
}

/// Where a recognized key's scripts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTarget {
    /// Schedule bucket.
    pub category: ScheduleCategory,
    /// Directory generated files are created in.
    pub directory: PathBuf,
}

/// Full registry key → category target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    targets: BTreeMap<String, CategoryTarget>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new(DEFAULT_POLICY_ROOT, &CategoryDirectories::default())
    }
}

impl CategoryMap {
    /// Build the map for keys `<policy_root>\<Period> Scripts`.
    pub fn new(policy_root: &str, directories: &CategoryDirectories) -> Self {
        let root = policy_root.trim_end_matches('\\');
        let targets = ScheduleCategory::all()
            .iter()
            .map(|&category| {
                (
                    format!("{root}\\{}", category.key_suffix()),
                    CategoryTarget {
                        category,
                        directory: directories.get(category).to_path_buf(),
                    },
                )
            })
            .collect();
        Self { targets }
    }

    /// Target for an exact registry key, if recognized.
    pub fn lookup(&self, keyname: &str) -> Option<&CategoryTarget> {
        self.targets.get(keyname)
    }

    /// Recognized keys with their targets, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryTarget)> {
        self.targets.iter().map(|(k, t)| (k.as_str(), t))
    }

    /// Registry key that declares `category`.
    pub fn key_for(&self, category: ScheduleCategory) -> Option<&str> {
        self.iter()
            .find(|(_, t)| t.category == category)
            .map(|(k, _)| k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_map_matches_cron_layout() {
        let map = CategoryMap::default();
        let daily = map
            .lookup(r"Software\Policies\Samba\Unix Settings\Daily Scripts")
            .unwrap();
        assert_eq!(daily.category, ScheduleCategory::Daily);
        assert_eq!(daily.directory, PathBuf::from("/etc/cron.daily"));
        assert_eq!(map.iter().count(), 4);
    }

    #[test]
    fn test_lookup_is_exact() {
        let map = CategoryMap::default();
        assert!(map.lookup(r"Software\Policies\Samba\Unix Settings\daily scripts").is_none());
        assert!(map.lookup(r"Software\Policies\Samba\Unix Settings\Yearly Scripts").is_none());
        assert!(map.lookup("Daily Scripts").is_none());
    }

    #[test]
    fn test_custom_root_and_directories() {
        let dirs = CategoryDirectories::under(Path::new("/srv"));
        let map = CategoryMap::new(r"Software\Acme\", &dirs);
        let weekly = map.lookup(r"Software\Acme\Weekly Scripts").unwrap();
        assert_eq!(weekly.directory, PathBuf::from("/srv/cron.weekly"));
        assert_eq!(
            map.key_for(ScheduleCategory::Hourly),
            Some(r"Software\Acme\Hourly Scripts")
        );
    }

    #[test]
    fn test_directories_partial_yaml_keeps_defaults() {
        let dirs: CategoryDirectories = serde_yaml::from_str("daily: /tmp/d\n").unwrap();
        assert_eq!(dirs.daily, PathBuf::from("/tmp/d"));
        assert_eq!(dirs.monthly, PathBuf::from("/etc/cron.monthly"));
    }
}
