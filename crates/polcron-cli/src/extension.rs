//! # Extension Registration
//!
//! The host's list of installed policy extensions lives in
//! `<state_dir>/extensions.json`, keyed by braced GUID:
//!
//! ```json
//! {
//!   "{5930022C-94FF-4ED5-A403-CFB4549DB6F0}": {
//!     "name": "polcron_scripts",
//!     "path": "/usr/bin/polcron",
//!     "config": "/etc/polcron.yaml",
//!     "machine": true,
//!     "user": false,
//!     "registered_at": "2026-10-16T09:00:00Z"
//!   }
//! }
//! ```
//!
//! `register` and `unregister` print the installed list afterwards, like
//! `list` does.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SubsecRound, Utc};
use clap::Args;
use serde::{Deserialize, Serialize};

use polcron_core::ExtensionId;
use polcron_scripts::{EXTENSION_ID, EXTENSION_MODULE, EXTENSION_NAME};

use crate::config::Settings;

/// One installed extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionEntry {
    pub name: String,
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub machine: bool,
    pub user: bool,
    pub registered_at: DateTime<Utc>,
}

/// The on-disk extension registry.
#[derive(Debug)]
pub struct ExtensionRegistry {
    path: PathBuf,
    entries: BTreeMap<ExtensionId, ExtensionEntry>,
}

impl ExtensionRegistry {
    /// Load the registry at `path`; a missing file is an empty registry.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt extension registry: {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read extension registry: {}", path.display()))
            }
        };
        Ok(Self { path, entries })
    }

    /// Insert or replace an entry and persist.
    pub fn register(&mut self, id: ExtensionId, entry: ExtensionEntry) -> Result<()> {
        tracing::info!(guid = %id, name = %entry.name, "registering extension");
        self.entries.insert(id, entry);
        self.save()
    }

    /// Remove an entry and persist. Returns whether it was present.
    pub fn unregister(&mut self, id: &ExtensionId) -> Result<bool> {
        if self.entries.remove(id).is_none() {
            tracing::info!(guid = %id, "extension was not registered");
            return Ok(false);
        }
        tracing::info!(guid = %id, "unregistered extension");
        self.save()?;
        Ok(true)
    }

    /// Installed extensions ordered by GUID.
    pub fn list(&self) -> impl Iterator<Item = (&ExtensionId, &ExtensionEntry)> {
        self.entries.iter()
    }

    /// Entry for `id`.
    pub fn get(&self, id: &ExtensionId) -> Option<&ExtensionEntry> {
        self.entries.get(id)
    }

    fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to stage extension registry in {}", parent.display()))?;
        tmp.write_all(&bytes)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to write extension registry: {}", self.path.display()))?;
        Ok(())
    }
}

/// Arguments for `polcron register`.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Executable the host should run; defaults to this binary.
    #[arg(long)]
    pub path: Option<PathBuf>,
}

/// Execute `polcron register`.
pub fn run_register(args: &RegisterArgs, settings: &Settings) -> Result<u8> {
    let path = match &args.path {
        Some(p) => p.clone(),
        None => std::env::current_exe().context("cannot determine path of this executable")?,
    };
    let path = path.canonicalize().unwrap_or(path);

    let mut registry = ExtensionRegistry::open(settings.registry_path())?;
    registry.register(
        EXTENSION_ID,
        ExtensionEntry {
            name: EXTENSION_MODULE.to_string(),
            path,
            config: settings.source_file.clone(),
            machine: true,
            user: false,
            registered_at: Utc::now().trunc_subsecs(0),
        },
    )?;
    tracing::info!(extension = EXTENSION_NAME, "registered");
    print_list(&registry);
    Ok(0)
}

/// Execute `polcron unregister`.
pub fn run_unregister(settings: &Settings) -> Result<u8> {
    let mut registry = ExtensionRegistry::open(settings.registry_path())?;
    registry.unregister(&EXTENSION_ID)?;
    print_list(&registry);
    Ok(0)
}

/// Execute `polcron list`.
pub fn run_list(settings: &Settings) -> Result<u8> {
    let registry = ExtensionRegistry::open(settings.registry_path())?;
    print_list(&registry);
    Ok(0)
}

/// Render the installed list: the GUID, then one tab-indented
/// `key: value` line per field.
pub fn render_list(registry: &ExtensionRegistry) -> String {
    let mut out = String::new();
    for (id, entry) in registry.list() {
        out.push_str(&format!("{id}\n"));
        out.push_str(&format!("\tname: {}\n", entry.name));
        out.push_str(&format!("\tpath: {}\n", entry.path.display()));
        if let Some(config) = &entry.config {
            out.push_str(&format!("\tconfig: {}\n", config.display()));
        }
        out.push_str(&format!("\tmachine: {}\n", entry.machine));
        out.push_str(&format!("\tuser: {}\n", entry.user));
        out.push_str(&format!("\tregistered_at: {}\n", entry.registered_at.to_rfc3339()));
    }
    out
}

fn print_list(registry: &ExtensionRegistry) {
    print!("{}", render_list(registry));
}
