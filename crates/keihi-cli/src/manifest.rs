//! Manifest files listing which receipts to scan.
//!
//! The first line names a directory. Every following non-blank line is a
//! file-identifier prefix, resolved to the first entry of that directory
//! (by name) whose filename starts with it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

/// Resolve a manifest into the files it names, in manifest order.
///
/// A relative directory is taken relative to the working directory.
pub fn list_files(manifest: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let content = fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());

    let dir_line = lines
        .next()
        .with_context(|| format!("Manifest {} is empty", manifest.display()))?;
    let dir = PathBuf::from(dir_line);

    let mut entries: Vec<PathBuf> = fs::read_dir(&dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    let mut files = Vec::new();
    for prefix in lines {
        let found = entries.iter().find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(prefix))
        });

        match found {
            Some(path) => {
                debug!("{} -> {}", prefix, path.display());
                files.push(path.clone());
            }
            None => warn!("No file in {} matches {}, skipping", dir.display(), prefix),
        }
    }

    Ok(files)
}
