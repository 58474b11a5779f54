//! Utility functions shared across the codebase.
//!
//! Path formatting for log output and the atomic file write used for the
//! final index artifact.

use anyhow::{Context, Result};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Format a path for display, abbreviating the home directory to `~`.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use cityindex::utils::path_for_display;
/// assert_eq!(path_for_display(Path::new("./countries.json")), "./countries.json");
/// ```
pub fn path_for_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

/// Write a file so that readers observe either the previous contents or the
/// complete new contents, never a partial write.
///
/// The closure receives a buffered writer backed by a temporary file created in
/// the destination directory; the temporary file is renamed over `path` only
/// after the closure returns `Ok` and the buffer has been flushed.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<()>,
{
    let parent = parent_dir(path);
    let mut temp = NamedTempFile::new_in(&parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;

    {
        let mut writer = BufWriter::new(&mut temp);
        write(&mut writer)?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush output for {}", path.display()))?;
    }

    temp.persist(path)
        .with_context(|| format!("Failed to move output into place at {}", path.display()))?;
    Ok(())
}

/// Directory a relative or bare file name should be written next to.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
