//! Recursive project tree scan.

use std::path::Path;

use tracing::info;
use walkdir::{DirEntry, WalkDir};

use crate::error::{CliflowError, Result};

fn is_ignored(entry: &DirEntry, ignore: &[String]) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| ignore.iter().any(|i| i == name))
}

/// Visit every regular file under `root`, skipping entries whose name is in
/// `ignore` (ignored directories are not descended into).
///
/// A missing root is not an error: nothing is visited. Symlinks are not
/// followed.
pub fn walk<F>(root: &Path, ignore: &[String], mut visit: F) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
{
    if !root.exists() {
        info!(root = %root.display(), "Discovery root does not exist, skipping");
        return Ok(());
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored(e, ignore));

    for entry in walker {
        let entry = entry.map_err(|e| {
            CliflowError::Discovery(format!("Failed to scan {}: {}", root.display(), e))
        })?;
        if entry.file_type().is_file() {
            visit(entry.path())?;
        }
    }

    Ok(())
}
