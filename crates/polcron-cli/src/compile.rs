//! # Compile Subcommand
//!
//! Compiles a YAML policy manifest into a `Registry.pol` payload.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use polcron_preg::PolicyManifest;

/// Arguments for `polcron compile`.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Manifest to compile.
    #[arg(value_name = "MANIFEST_YAML")]
    pub manifest: PathBuf,

    /// Payload file to write.
    #[arg(long, short)]
    pub out: PathBuf,
}

/// Execute `polcron compile`.
pub fn run_compile(args: &CompileArgs) -> Result<u8> {
    let manifest = PolicyManifest::load(&args.manifest)
        .with_context(|| format!("failed to load manifest: {}", args.manifest.display()))?;
    let document = manifest
        .to_document()
        .with_context(|| format!("invalid manifest: {}", args.manifest.display()))?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    document
        .write(&args.out)
        .with_context(|| format!("failed to write payload: {}", args.out.display()))?;

    println!("{} entries -> {}", document.entries.len(), args.out.display());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use polcron_preg::{PolicyParser, PregParser};

    use super::*;

    #[test]
    fn test_compile_writes_parseable_payload() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("policy.yaml");
        std::fs::write(
            &manifest,
            "entries:\n  - key: 'Software\\Policies\\Samba\\Unix Settings\\Daily Scripts'\n    value: '1'\n    data: 'echo hi'\n",
        )
        .unwrap();
        let out = dir.path().join("gpo").join("MACHINE").join("Registry.pol");

        let code = run_compile(&CompileArgs {
            manifest,
            out: out.clone(),
        })
        .unwrap();
        assert_eq!(code, 0);

        let doc = PregParser.parse(&out).unwrap();
        assert_eq!(doc.entries.len(), 1);
        assert_eq!(doc.entries[0].data().as_deref(), Some("echo hi"));
    }

    #[test]
    fn test_compile_missing_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_compile(&CompileArgs {
            manifest: dir.path().join("missing.yaml"),
            out: dir.path().join("Registry.pol"),
        });
        assert!(result.is_err());
    }
}
