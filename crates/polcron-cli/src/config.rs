//! # Configuration
//!
//! Optional YAML file selected with `--config`. Every field has a default,
//! so an empty file, a partial file, or no file at all are all valid:
//!
//! ```yaml
//! state_dir: /var/lib/polcron
//! policy_root: 'Software\Policies\Samba\Unix Settings'
//! payload_file: MACHINE/Registry.pol
//! directories:
//!   daily: /etc/cron.daily
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use polcron_ledger::FileLedger;
use polcron_preg::PregParser;
use polcron_scripts::{
    CategoryDirectories, CategoryMap, Reconciler, DEFAULT_PAYLOAD_FILE, DEFAULT_POLICY_ROOT,
};

/// Default location of the ledger and extension registry.
pub const DEFAULT_STATE_DIR: &str = "/var/lib/polcron";

/// Ledger file name inside the state directory.
pub const LEDGER_FILE: &str = "ledger.json";

/// Extension registry file name inside the state directory.
pub const REGISTRY_FILE: &str = "extensions.json";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding the ledger and the extension registry.
    pub state_dir: PathBuf,
    /// Registry key prefix of the `<Period> Scripts` keys.
    pub policy_root: String,
    /// Target directory per schedule category.
    pub directories: CategoryDirectories,
    /// Payload location relative to a source's directory.
    pub payload_file: PathBuf,
    /// File the settings were loaded from, if any.
    #[serde(skip)]
    pub source_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            policy_root: DEFAULT_POLICY_ROOT.to_string(),
            directories: CategoryDirectories::default(),
            payload_file: PathBuf::from(DEFAULT_PAYLOAD_FILE),
            source_file: None,
        }
    }
}

impl Settings {
    /// Load from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut settings = Self::from_yaml(&text)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        settings.source_file = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(settings)
    }

    /// Parse settings from YAML text. Empty text yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Path of the ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir.join(LEDGER_FILE)
    }

    /// Path of the extension registry file.
    pub fn registry_path(&self) -> PathBuf {
        self.state_dir.join(REGISTRY_FILE)
    }

    /// Category map for the configured root and directories.
    pub fn category_map(&self) -> CategoryMap {
        CategoryMap::new(&self.policy_root, &self.directories)
    }

    /// Reconciler over `Registry.pol` payloads.
    pub fn reconciler(&self) -> Reconciler<PregParser> {
        Reconciler::new(self.category_map(), PregParser).with_payload_file(&self.payload_file)
    }

    /// Open the durable ledger.
    pub fn open_ledger(&self) -> Result<FileLedger> {
        let path = self.ledger_path();
        FileLedger::open(&path)
            .with_context(|| format!("failed to open ledger: {}", path.display()))
    }
}
