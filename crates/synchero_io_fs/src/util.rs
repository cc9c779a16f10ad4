use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::{FileTime, set_file_times};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::spec::MergeTreeError;

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

pub(crate) fn compile_patterns_exclude(
    patterns: Option<&[String]>,
) -> Result<Option<GlobSet>, MergeTreeError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder_glob_set = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            MergeTreeError::InvalidPattern(format!("Invalid exclude pattern `{pattern}`: {e}"))
        })?;
        builder_glob_set.add(glob);
    }
    let glob_set = builder_glob_set
        .build()
        .map_err(|e| MergeTreeError::InvalidPattern(format!("Invalid exclude patterns: {e}")))?;
    Ok(Some(glob_set))
}

pub(crate) fn should_exclude_by_patterns(value: &str, patterns_exclude: Option<&GlobSet>) -> bool {
    patterns_exclude.is_some_and(|glob_set| glob_set.is_match(value))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Canonical path when it exists, otherwise the lexically absolute one.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

pub(crate) fn is_overlap(path_a: &Path, path_b: &Path) -> bool {
    let (path_a, path_b) = (normalize_path(path_a), normalize_path(path_b));
    path_a.starts_with(&path_b) || path_b.starts_with(&path_a)
}

/// Create the top-level destination directory and its missing ancestors.
pub(crate) fn init_destination_root(path_dir_dst: &Path) -> Result<(), MergeTreeError> {
    if path_dir_dst.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path_dir_dst).map_err(|e| MergeTreeError::DestinationInitFailed {
        path: path_dir_dst.to_path_buf(),
        message: e.to_string(),
    })
}

/// Ensure a nested destination directory exists without following a link.
pub(crate) fn ensure_destination_dir(path_dir_dst: &Path) -> Result<(), MergeTreeError> {
    match fs::symlink_metadata(path_dir_dst) {
        Ok(meta_dst) if meta_dst.file_type().is_symlink() => {
            Err(MergeTreeError::DestinationConflict {
                path: path_dir_dst.to_path_buf(),
                message: "Destination directory is a symbolic link".to_string(),
            })
        }
        Ok(meta_dst) if meta_dst.is_dir() => Ok(()),
        Ok(_) => Err(MergeTreeError::DestinationConflict {
            path: path_dir_dst.to_path_buf(),
            message: "Destination is a file, expected directory".to_string(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path_dir_dst).map_err(|e| MergeTreeError::DestinationInitFailed {
                path: path_dir_dst.to_path_buf(),
                message: e.to_string(),
            })
        }
        Err(e) => Err(MergeTreeError::DestinationInitFailed {
            path: path_dir_dst.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

/// Whether a file already sits at `path_file_dst`.
///
/// Directories and symlinks at the target are conflicts: the merge never
/// replaces a directory with a file and never writes through a link.
pub(crate) fn probe_destination_file(path_file_dst: &Path) -> Result<bool, MergeTreeError> {
    match fs::symlink_metadata(path_file_dst) {
        Ok(meta_dst) if meta_dst.file_type().is_symlink() => {
            Err(MergeTreeError::DestinationConflict {
                path: path_file_dst.to_path_buf(),
                message: "Destination is a symbolic link".to_string(),
            })
        }
        Ok(meta_dst) if meta_dst.is_dir() => Err(MergeTreeError::DestinationConflict {
            path: path_file_dst.to_path_buf(),
            message: "Destination is a directory".to_string(),
        }),
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MergeTreeError::DestinationConflict {
            path: path_file_dst.to_path_buf(),
            message: format!("Failed to inspect destination ({e})"),
        }),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CopyAndWorkers

/// Copy bytes, then access/modification times (and xattrs on Linux).
///
/// `fs::copy` already carries permission bits.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;

    let stat_src = fs::metadata(path_file_src)?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    {
        copy_xattrs_linux(path_file_src, path_file_dst);
    }
    Ok(())
}

/// Best effort: attributes the destination filesystem rejects are dropped.
#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(names) = xattr::list(path_file_src) else {
        return;
    };
    for name in names {
        let Ok(Some(raw_value)) = xattr::get(path_file_src, &name) else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            debug!(
                "xattr {} not copied to {}: {e}",
                name.to_string_lossy(),
                path_file_dst.display()
            );
        }
    }
}

/// Worker count for a merge: serial unless asked, never zero.
///
/// A request above the CPU count is honored; the pool just time-slices.
pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_workers = num_workers_max.unwrap_or(1).max(1);
    let n_cpu = std::thread::available_parallelism().map_or(1, |n| n.get());
    if n_workers > n_cpu {
        debug!("Requested {n_workers} workers on {n_cpu} CPU(s)");
    }
    n_workers
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
