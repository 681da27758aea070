//! In-place repair of a compilation file and the matching restore.
//!
//! `replace` runs strictly in this order: read the compilation, write the
//! rewritten content to a `.tmp` sibling with the original permission bits,
//! move the original to the backup path, move the temp file into place. If
//! the last move fails the backup is moved back before the error is returned.

use super::filesystem::RepairFileSystem;
use super::format::{LineKind, classify_line, encode_series};
use super::text::split_lines;
use crate::domain::{MeasurementSeries, RepairScope, SombreroError};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const TEMP_SUFFIX: &str = ".tmp";

pub fn temp_path_for(compilation: &Path) -> PathBuf {
    let mut name = compilation
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(TEMP_SUFFIX);
    compilation.with_file_name(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    pub replaced_missing: usize,
    pub replaced_present: usize,
}

pub fn rewrite_compilation(
    content: &str,
    series: &MeasurementSeries,
    scope: RepairScope,
) -> Rewrite {
    let replacement = encode_series(series);
    let mut rewritten = String::with_capacity(content.len());
    let mut replaced_missing = 0;
    let mut replaced_present = 0;

    for line in split_lines(content) {
        let replace = match classify_line(line.content) {
            LineKind::MissingMarker => {
                replaced_missing += 1;
                true
            }
            LineKind::Series(_) if scope.replaces_present() => {
                replaced_present += 1;
                true
            }
            LineKind::Series(_) | LineKind::Opaque => false,
        };
        rewritten.push_str(if replace {
            replacement.as_str()
        } else {
            line.content
        });
        rewritten.push_str(line.terminator);
    }

    Rewrite {
        content: rewritten,
        replaced_missing,
        replaced_present,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    pub compilation: PathBuf,
    pub backup: PathBuf,
    pub replaced_missing: usize,
    pub replaced_present: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("backup '{}' already exists; restore or remove it first", backup.display())]
    BackupExists { backup: PathBuf },
    #[error("backup path '{}' collides with the staging file or the compilation", backup.display())]
    BackupPathConflict { backup: PathBuf },
    #[error("failed to read compilation '{}': {source}", path.display())]
    ReadCompilation { path: PathBuf, source: io::Error },
    #[error("failed to write rewritten compilation '{}': {source}", path.display())]
    WriteTemp { path: PathBuf, source: io::Error },
    #[error("failed to copy permissions of '{}' onto '{}': {source}", from.display(), to.display())]
    CopyPermissions {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("failed to move compilation '{}' to backup '{}': {source}", compilation.display(), backup.display())]
    Backup {
        compilation: PathBuf,
        backup: PathBuf,
        source: io::Error,
    },
    #[error(
        "failed to move rewritten compilation '{}' into '{}': {source}{}",
        temp.display(),
        compilation.display(),
        restore_note(.restore_error)
    )]
    Swap {
        temp: PathBuf,
        compilation: PathBuf,
        source: io::Error,
        restore_error: Option<io::Error>,
    },
}

fn restore_note(restore_error: &Option<io::Error>) -> String {
    match restore_error {
        Some(error) => format!(" (restoring the original from backup also failed: {error})"),
        None => " (original compilation restored from backup)".to_string(),
    }
}

impl RepairError {
    /// The I/O failure that aborted the repair, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::BackupExists { .. } | Self::BackupPathConflict { .. } => None,
            Self::ReadCompilation { source, .. }
            | Self::WriteTemp { source, .. }
            | Self::CopyPermissions { source, .. }
            | Self::Backup { source, .. }
            | Self::Swap { source, .. } => Some(source),
        }
    }

    /// False only when the original could not be moved back after a failed swap.
    pub fn original_in_place(&self) -> bool {
        match self {
            Self::Swap { restore_error, .. } => restore_error.is_none(),
            _ => true,
        }
    }
}

impl From<RepairError> for SombreroError {
    fn from(error: RepairError) -> Self {
        match &error {
            RepairError::BackupExists { .. } => {
                SombreroError::precondition_conflict("PRECONDITION.BACKUP_EXISTS", error.to_string())
            }
            RepairError::BackupPathConflict { .. } => {
                SombreroError::input_validation("INPUT.BACKUP_PATH", error.to_string())
            }
            _ if !error.original_in_place() => {
                SombreroError::io_system("IO.GREYSCALE_ROLLBACK", error.to_string())
            }
            _ => SombreroError::io_system("IO.GREYSCALE_REPAIR", error.to_string()),
        }
    }
}

pub fn replace(
    fs: &dyn RepairFileSystem,
    compilation: &Path,
    backup: &Path,
    series: &MeasurementSeries,
    scope: RepairScope,
) -> Result<RepairReport, RepairError> {
    let temp = temp_path_for(compilation);
    if backup == temp.as_path() || backup == compilation {
        return Err(RepairError::BackupPathConflict {
            backup: backup.to_path_buf(),
        });
    }
    if fs.exists(backup) {
        return Err(RepairError::BackupExists {
            backup: backup.to_path_buf(),
        });
    }

    let content = fs
        .read_to_string(compilation)
        .map_err(|source| RepairError::ReadCompilation {
            path: compilation.to_path_buf(),
            source,
        })?;
    let rewrite = rewrite_compilation(&content, series, scope);
    debug!(
        compilation = %compilation.display(),
        replaced_missing = rewrite.replaced_missing,
        replaced_present = rewrite.replaced_present,
        "rewrote compilation in memory"
    );

    if let Err(source) = fs.write(&temp, rewrite.content.as_bytes()) {
        discard_temp(fs, &temp);
        return Err(RepairError::WriteTemp { path: temp, source });
    }
    if let Err(source) = fs.copy_permissions(compilation, &temp) {
        discard_temp(fs, &temp);
        return Err(RepairError::CopyPermissions {
            from: compilation.to_path_buf(),
            to: temp,
            source,
        });
    }
    debug!(temp = %temp.display(), "staged rewritten compilation");

    if let Err(source) = fs.rename(compilation, backup) {
        discard_temp(fs, &temp);
        return Err(RepairError::Backup {
            compilation: compilation.to_path_buf(),
            backup: backup.to_path_buf(),
            source,
        });
    }
    debug!(backup = %backup.display(), "moved original compilation to backup");

    if let Err(source) = fs.rename(&temp, compilation) {
        let restore_error = fs.rename(backup, compilation).err();
        match &restore_error {
            Some(error) => warn!(
                backup = %backup.display(),
                "could not move backup back into place: {error}"
            ),
            None => discard_temp(fs, &temp),
        }
        return Err(RepairError::Swap {
            temp,
            compilation: compilation.to_path_buf(),
            source,
            restore_error,
        });
    }
    debug!(compilation = %compilation.display(), "installed repaired compilation");

    Ok(RepairReport {
        compilation: compilation.to_path_buf(),
        backup: backup.to_path_buf(),
        replaced_missing: rewrite.replaced_missing,
        replaced_present: rewrite.replaced_present,
    })
}

fn discard_temp(fs: &dyn RepairFileSystem, temp: &Path) {
    if fs.exists(temp) {
        let _ = fs.remove_file(temp);
    }
}

#[derive(Debug)]
pub struct RestoreReport {
    pub compilation: PathBuf,
    pub backup: PathBuf,
    pub bytes_restored: u64,
    /// Set when the content was restored but the backup could not be deleted.
    pub cleanup_error: Option<io::Error>,
}

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("no backup file found at '{}'; cannot restore original compilation", backup.display())]
    MissingBackup { backup: PathBuf },
    #[error("failed to restore '{}' from backup '{}': {source}", compilation.display(), backup.display())]
    Copy {
        backup: PathBuf,
        compilation: PathBuf,
        source: io::Error,
    },
}

impl From<RestoreError> for SombreroError {
    fn from(error: RestoreError) -> Self {
        match &error {
            RestoreError::MissingBackup { .. } => {
                SombreroError::not_found("NOT_FOUND.BACKUP", error.to_string())
            }
            RestoreError::Copy { .. } => {
                SombreroError::io_system("IO.GREYSCALE_RESTORE", error.to_string())
            }
        }
    }
}

pub fn restore(
    fs: &dyn RepairFileSystem,
    compilation: &Path,
    backup: &Path,
) -> Result<RestoreReport, RestoreError> {
    if !fs.exists(backup) {
        return Err(RestoreError::MissingBackup {
            backup: backup.to_path_buf(),
        });
    }

    let bytes_restored = fs
        .copy(backup, compilation)
        .map_err(|source| RestoreError::Copy {
            backup: backup.to_path_buf(),
            compilation: compilation.to_path_buf(),
            source,
        })?;
    debug!(
        compilation = %compilation.display(),
        bytes_restored,
        "restored compilation from backup"
    );

    let cleanup_error = fs.remove_file(backup).err();
    Ok(RestoreReport {
        compilation: compilation.to_path_buf(),
        backup: backup.to_path_buf(),
        bytes_restored,
        cleanup_error,
    })
}
