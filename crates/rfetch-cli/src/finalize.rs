//! The "copy to file" collaborator: a thin wrapper that redirects the
//! engine's sink to a `.part` sibling of the destination and renames it into
//! place only on success.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Path for the temp file: appends `.part` to the final path
/// (`archive.iso` -> `archive.iso.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut os = final_path.as_os_str().to_owned();
    os.push(".part");
    PathBuf::from(os)
}

/// Opens `final_path`'s temp sibling for writing, truncating any previous
/// partial attempt.
pub async fn create_temp(final_path: &Path) -> Result<(File, PathBuf)> {
    let temp = temp_path(final_path);
    let file = File::create(&temp)
        .await
        .with_context(|| format!("failed to create temp file: {}", temp.display()))?;
    Ok((file, temp))
}

/// Syncs and atomically renames the temp file into place.
pub async fn finalize(file: File, temp_path: &Path, final_path: &Path) -> Result<()> {
    file.sync_all()
        .await
        .with_context(|| format!("failed to fsync {}", temp_path.display()))?;
    drop(file);
    tokio::fs::rename(temp_path, final_path)
        .await
        .with_context(|| {
            format!(
                "failed to rename {} to {}",
                temp_path.display(),
                final_path.display()
            )
        })?;
    Ok(())
}

/// Removes the partial file after a failed transfer. Absence is not an
/// error; failure to remove is logged but does not escalate.
pub async fn cleanup(temp_path: &Path) {
    match tokio::fs::remove_file(temp_path).await {
        Ok(()) => tracing::info!("removed partial file {}", temp_path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("failed to remove partial file {}: {}", temp_path.display(), e),
    }
}
