//! Canonical bundle layout: write, read, and file-tree restore.
//!
//! A bundle is a `bridge/` directory holding `outputs.json`, `meta.json`,
//! and an optional `files/` tree. It is the unit exchanged across the
//! trust boundary; archiving and transport belong to the hosting platform.
//!
//! Writes are fail-fast: metadata and outputs land on disk before any file
//! copying begins, and the first error aborts the whole write.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::meta::{validate_meta, BridgeMeta};
use crate::outputs::{normalize_outputs, parse_json_object, OutputsMap, SanitizeMode};

/// Directory name of the bundle inside its staging root.
pub const BUNDLE_DIR: &str = "bridge";
/// Outputs member file name.
pub const OUTPUTS_FILE: &str = "outputs.json";
/// Metadata member file name.
pub const META_FILE: &str = "meta.json";
/// Optional attached-files subdirectory name.
pub const FILES_DIR: &str = "files";

/// A parsed, validated bundle.
#[derive(Debug)]
pub struct Bundle {
    /// Strict-validated outputs map.
    pub outputs: OutputsMap,
    /// Structurally validated metadata.
    pub meta: BridgeMeta,
    /// Path of the attached-files subdirectory; may not exist.
    pub files_dir: PathBuf,
}

/// Lexically normalize a caller-supplied bundle file path.
///
/// Absolute paths are rejected, and a path that climbs above its own root
/// after normalization (`../x`, but also `safe/../../x`) is rejected as a
/// workspace escape. Both checks run before any copy is attempted.
pub fn normalize_bundle_path(entry: &str) -> Result<PathBuf> {
    let path = Path::new(entry);
    if path.is_absolute() {
        return Err(BridgeError::AbsolutePath {
            path: entry.to_string(),
        });
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(BridgeError::PathEscape {
                        path: entry.to_string(),
                    });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(BridgeError::AbsolutePath {
                    path: entry.to_string(),
                });
            }
        }
    }
    Ok(normalized)
}

/// Write the canonical bundle tree under `root`.
///
/// `outputs.json` and `meta.json` are written first; file copying only
/// starts afterwards. Each `files` entry must be a relative path that stays
/// inside the workspace after normalization; sources are resolved against
/// `source_base` and a missing source propagates the underlying I/O error.
///
/// Returns the bundle directory path.
pub fn write_bundle(
    root: &Path,
    outputs: &OutputsMap,
    meta: &Map<String, Value>,
    files: &[String],
    source_base: &Path,
) -> Result<PathBuf> {
    let bundle_dir = root.join(BUNDLE_DIR);
    fs::create_dir_all(&bundle_dir)?;

    fs::write(
        bundle_dir.join(OUTPUTS_FILE),
        serde_json::to_vec_pretty(outputs)?,
    )?;
    fs::write(bundle_dir.join(META_FILE), serde_json::to_vec_pretty(meta)?)?;

    if !files.is_empty() {
        // police every entry before the first copy
        let mut resolved = Vec::with_capacity(files.len());
        for entry in files {
            resolved.push(normalize_bundle_path(entry)?);
        }

        let files_dir = bundle_dir.join(FILES_DIR);
        for rel in resolved {
            let dest = files_dir.join(&rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            debug!(file = %rel.display(), "attaching bundle file");
            fs::copy(source_base.join(&rel), &dest)?;
        }
    }

    Ok(bundle_dir)
}

/// Read and validate a bundle under `root`.
///
/// Metadata is structurally validated and outputs are re-normalized in
/// strict mode unconditionally; the read side never trusts the producer's
/// sanitize mode. The files directory path is returned without being
/// inspected.
pub fn read_bundle(root: &Path) -> Result<Bundle> {
    let bundle_dir = root.join(BUNDLE_DIR);

    let meta_text = fs::read_to_string(bundle_dir.join(META_FILE))?;
    let meta_value: Value =
        serde_json::from_str(&meta_text).map_err(|source| BridgeError::InvalidJson {
            label: META_FILE.to_string(),
            source,
        })?;
    let meta = validate_meta(&meta_value)?;

    let outputs_text = fs::read_to_string(bundle_dir.join(OUTPUTS_FILE))?;
    let outputs = parse_json_object(&outputs_text, OUTPUTS_FILE)?;
    let outputs = normalize_outputs(&outputs, SanitizeMode::Strict)?;

    Ok(Bundle {
        outputs,
        meta,
        files_dir: bundle_dir.join(FILES_DIR),
    })
}

/// Restore the bundle's attached file tree into `dest`.
///
/// A missing or non-directory source means "no files to restore": returns
/// `Ok(false)` without creating `dest`. An existing directory (even an
/// empty one) ensures `dest` exists and is copied into recursively,
/// overwriting colliding paths; returns `Ok(true)`.
pub fn restore_files(files_dir: &Path, dest: &Path) -> Result<bool> {
    if !files_dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dest)?;
    copy_tree(files_dir, dest)?;
    Ok(true)
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&target)?;
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
