//! # Script Materializer
//!
//! Writes one executable file per body into a category's directory. Every
//! file gets a fresh unique name (`gp_` plus a random suffix), so it never
//! collides with earlier output, leftovers of an interrupted run, or files
//! the host put there.
//!
//! A batch either returns every path it created or fails after unlinking
//! whatever it had created so far.

use std::io::Write;
use std::path::{Path, PathBuf};

use polcron_core::ScheduleCategory;
use polcron_ledger::Materialize;
use thiserror::Error;

/// Name prefix of generated scripts.
pub const SCRIPT_PREFIX: &str = "gp_";

/// Shebang plus the attribution block written ahead of every body.
pub const SCRIPT_HEADER: &str = "#!/bin/sh

### autogenerated by polcron
#
# This file is generated from Group Policy scripts declared for this
# machine. To change it, edit the policy objects that apply to this
# machine. DO NOT MODIFY THIS FILE DIRECTLY; it is rewritten or removed
# whenever policy is refreshed.
#

";

/// Permission bits of generated scripts: owner read/write/execute.
pub const SCRIPT_MODE: u32 = 0o700;

/// Errors while generating one category's scripts.
#[derive(Error, Debug)]
pub enum MaterializeError {
    /// A uniquely named file could not be created in the directory.
    #[error("cannot create script in {directory}: {source}")]
    Create {
        /// Target directory.
        directory: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the content or setting permissions failed.
    #[error("cannot write script {path}: {source}")]
    Write {
        /// Script being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Full content of a generated script for `body`.
pub fn render_script(body: &str) -> String {
    format!("{SCRIPT_HEADER}{body}\n")
}

/// One category's scripts, ready to be materialized.
///
/// Captures its own category and directory, so the work it performs never
/// depends on which bucket happened to be processed last.
#[derive(Debug, Clone, Copy)]
pub struct ScriptBatch<'a> {
    /// Schedule bucket, for logging.
    pub category: ScheduleCategory,
    /// Directory files are created in.
    pub directory: &'a Path,
    /// Bodies in declaration order.
    pub bodies: &'a [String],
}

impl Materialize for ScriptBatch<'_> {
    type Error = MaterializeError;

    fn materialize(&self) -> Result<Vec<PathBuf>, MaterializeError> {
        let mut created = Vec::with_capacity(self.bodies.len());
        for body in self.bodies {
            match write_script(self.directory, body) {
                Ok(path) => {
                    tracing::info!(
                        category = %self.category,
                        path = %path.display(),
                        "generated script"
                    );
                    created.push(path);
                }
                Err(e) => {
                    discard(&created);
                    return Err(e);
                }
            }
        }
        Ok(created)
    }
}

fn write_script(directory: &Path, body: &str) -> Result<PathBuf, MaterializeError> {
    let mut file = tempfile::Builder::new()
        .prefix(SCRIPT_PREFIX)
        .tempfile_in(directory)
        .map_err(|source| MaterializeError::Create {
            directory: directory.to_path_buf(),
            source,
        })?;
    let write_err = |path: &Path, source| MaterializeError::Write {
        path: path.to_path_buf(),
        source,
    };

    file.write_all(render_script(body).as_bytes())
        .map_err(|e| write_err(file.path(), e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| write_err(file.path(), e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(SCRIPT_MODE))
            .map_err(|e| write_err(file.path(), e))?;
    }

    // Dropping a NamedTempFile unlinks it; keep() hands ownership to the caller.
    let (_, path) = file.keep().map_err(|e| {
        let path = e.file.path().to_path_buf();
        write_err(&path, e.error)
    })?;
    Ok(path)
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not remove partial script");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_one_file_per_body_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let items = bodies(&["echo one", "echo two"]);
        let batch = ScriptBatch {
            category: ScheduleCategory::Daily,
            directory: dir.path(),
            bodies: &items,
        };
        let paths = batch.materialize().unwrap();

        assert_eq!(paths.len(), 2);
        for (path, body) in paths.iter().zip(&items) {
            assert_eq!(path.parent().unwrap(), dir.path());
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with(SCRIPT_PREFIX));
            assert_eq!(std::fs::read_to_string(path).unwrap(), render_script(body));
        }
        assert_ne!(paths[0], paths[1]);
    }

    #[test]
    fn test_content_layout() {
        let content = render_script("echo hi");
        assert!(content.starts_with("#!/bin/sh\n"));
        assert!(content.contains("DO NOT MODIFY THIS FILE DIRECTLY"));
        assert!(content.ends_with("#\n\necho hi\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let items = bodies(&["true"]);
        let batch = ScriptBatch {
            category: ScheduleCategory::Hourly,
            directory: dir.path(),
            bodies: &items,
        };
        let paths = batch.materialize().unwrap();
        let mode = std::fs::metadata(&paths[0]).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_missing_directory_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("cron.daily");
        let items = bodies(&["true"]);
        let batch = ScriptBatch {
            category: ScheduleCategory::Daily,
            directory: &missing,
            bodies: &items,
        };
        let err = batch.materialize().unwrap_err();
        assert!(matches!(err, MaterializeError::Create { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_existing_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let foreign = dir.path().join("logrotate");
        std::fs::write(&foreign, "keep me").unwrap();
        let items = bodies(&["echo a", "echo b", "echo c"]);
        let batch = ScriptBatch {
            category: ScheduleCategory::Weekly,
            directory: dir.path(),
            bodies: &items,
        };
        batch.materialize().unwrap();
        assert_eq!(std::fs::read_to_string(&foreign).unwrap(), "keep me");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }
}
