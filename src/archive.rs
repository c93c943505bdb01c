//! Packaging of a run directory into a single ZIP archive
//!
//! Every regular file below the run directory is stored with Deflate
//! compression under its base file name, so the archive is flat. The run
//! directory is removed recursively once the archive has been finalised; if
//! writing the archive fails the directory is left untouched and the partial
//! archive is deleted.

use crate::config::ArchiveConfig;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

/// Result of archiving a run directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// The archive that was written
    pub archive_path: PathBuf,
    /// Entry names, in the order they were written
    pub entries: Vec<String>,
    /// Files left out because their base name was already taken
    pub skipped: Vec<PathBuf>,
    /// Whether the run directory was removed afterwards
    pub run_dir_removed: bool,
}

/// Archive writer and run directory cleanup
#[derive(Debug, Clone, Default)]
pub struct Archiver {
    config: ArchiveConfig,
}

impl Archiver {
    /// Create a new archiver
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Write `<run_dir>.zip` and remove `run_dir`
    ///
    /// A failure to remove the run directory after a successful archive is
    /// logged and reported through [`ArchiveOutcome::run_dir_removed`]; the
    /// archive is still returned.
    pub async fn archive(&self, run_dir: &Path) -> Result<ArchiveOutcome> {
        let archive_path = archive_path_for(run_dir)?;
        debug!(?run_dir, ?archive_path, "archiving run directory");

        let (dir, out) = (run_dir.to_path_buf(), archive_path.clone());
        let (entries, skipped) = tokio::task::spawn_blocking(move || write_archive(&dir, &out))
            .await
            .map_err(|e| Error::Archive {
                path: archive_path.clone(),
                reason: format!("archive task failed: {}", e),
            })??;

        info!(?archive_path, entries = entries.len(), skipped = skipped.len(), "archive written");

        let run_dir_removed = if self.config.keep_run_dir {
            debug!(?run_dir, "keeping run directory");
            false
        } else {
            match tokio::fs::remove_dir_all(run_dir).await {
                Ok(()) => {
                    debug!(?run_dir, "removed run directory");
                    true
                }
                Err(e) => {
                    warn!(?run_dir, error = %e, "failed to remove run directory");
                    false
                }
            }
        };

        Ok(ArchiveOutcome {
            archive_path,
            entries,
            skipped,
            run_dir_removed,
        })
    }
}

/// Archive path for a run directory: same location, `.zip` appended
pub fn archive_path_for(run_dir: &Path) -> Result<PathBuf> {
    let name = run_dir.file_name().ok_or_else(|| Error::Archive {
        path: run_dir.to_path_buf(),
        reason: "run directory has no file name".to_string(),
    })?;
    let mut archive_name = name.to_os_string();
    archive_name.push(".zip");
    Ok(run_dir.with_file_name(archive_name))
}

/// Write every regular file below `run_dir` into a new archive at `archive_path`
///
/// Returns the written entry names and the files skipped as duplicates.
/// The partial archive is removed on failure.
pub fn write_archive(run_dir: &Path, archive_path: &Path) -> Result<(Vec<String>, Vec<PathBuf>)> {
    let result = write_entries(run_dir, archive_path);
    if result.is_err()
        && archive_path.exists()
        && let Err(e) = std::fs::remove_file(archive_path)
    {
        warn!(?archive_path, error = %e, "failed to remove partial archive");
    }
    result.map_err(|reason| Error::Archive {
        path: archive_path.to_path_buf(),
        reason,
    })
}

fn write_entries(
    run_dir: &Path,
    archive_path: &Path,
) -> std::result::Result<(Vec<String>, Vec<PathBuf>), String> {
    if !run_dir.is_dir() {
        return Err(format!("{} is not a directory", run_dir.display()));
    }

    let file = File::create(archive_path).map_err(|e| format!("failed to create archive: {}", e))?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for entry in WalkDir::new(run_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| format!("failed to walk run directory: {}", e))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !seen.insert(name.clone()) {
            warn!(path = ?entry.path(), %name, "skipping file with duplicate base name");
            skipped.push(entry.path().to_path_buf());
            continue;
        }

        zip.start_file(name.as_str(), options)
            .map_err(|e| format!("failed to add {}: {}", name, e))?;
        let mut source = File::open(entry.path())
            .map_err(|e| format!("failed to open {}: {}", entry.path().display(), e))?;
        std::io::copy(&mut source, &mut zip)
            .map_err(|e| format!("failed to compress {}: {}", entry.path().display(), e))?;

        debug!(%name, "added archive entry");
        entries.push(name);
    }

    let mut writer = zip
        .finish()
        .map_err(|e| format!("failed to finalise archive: {}", e))?;
    writer
        .flush()
        .map_err(|e| format!("failed to flush archive: {}", e))?;

    Ok((entries, skipped))
}
