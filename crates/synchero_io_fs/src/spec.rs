//! Merge options, per-file events and top-level error types.

use std::fmt;
use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy for source entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumMergeSymlinkStrategy {
    /// Treat links as unsupported entries: not counted as files, never copied.
    #[default]
    Skip,
    /// Follow the link and merge its target file or directory.
    Dereference,
}

/// Outcome of one per-file merge decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumMergeOutcome {
    /// No file existed at the destination; the source file was copied.
    New,
    /// A destination file existed and was replaced.
    Overridden,
    /// A destination file existed and was left untouched.
    Skipped,
}

impl EnumMergeOutcome {
    /// Stable lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Overridden => "overridden",
            Self::Skipped => "skipped",
        }
    }

    /// Whether this outcome writes bytes to the destination.
    pub fn is_copy(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

impl fmt::Display for EnumMergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `merge_tree`.
#[derive(Debug, Clone, Default)]
pub struct SpecMergeOptions {
    /// Replace existing destination files instead of skipping them.
    pub if_overwrite: bool,
    /// Glob patterns applied to entry basenames; matches are not visited.
    pub patterns_exclude: Option<Vec<String>>,
    /// Symlink handling behavior.
    pub rule_symlink: EnumMergeSymlinkStrategy,
    /// Worker threads for subdirectory recursion. `None` or `1` runs serially.
    pub num_workers_max: Option<usize>,
    /// Decide and notify without touching the filesystem.
    pub if_dry_run: bool,
}

impl SpecMergeOptions {
    /// Default options with the given overwrite flag.
    pub fn with_overwrite(if_overwrite: bool) -> Self {
        Self {
            if_overwrite,
            ..Self::default()
        }
    }
}

/// One copy/skip decision handed to a [`crate::reporter::MergeReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMergeEvent {
    /// Decision taken for this file.
    pub outcome: EnumMergeOutcome,
    /// Basename of the source file.
    pub name_file: String,
    /// Full source path.
    pub path_file_src: PathBuf,
    /// Full destination path.
    pub path_file_dst: PathBuf,
}

/// Errors that abort a `merge_tree` run.
#[derive(Debug)]
pub enum MergeTreeError {
    /// Invalid exclude pattern.
    InvalidPattern(String),
    /// Source path is missing or not a directory (at any recursion level).
    SourceNotDirectory(PathBuf),
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    SourceDestinationOverlap {
        /// Normalized source directory.
        source: PathBuf,
        /// Normalized destination directory.
        destination: PathBuf,
    },
    /// Destination directory could not be created.
    DestinationInitFailed {
        /// Destination directory that failed initialization.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Destination entry has a type the merge must not write through.
    DestinationConflict {
        /// Conflicting destination path.
        path: PathBuf,
        /// What was found there.
        message: String,
    },
    /// Source directory listing failed.
    ReadDirFailed {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Copying one file failed.
    CopyFailed {
        /// Source file.
        path_src: PathBuf,
        /// Destination file.
        path_dst: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
}

impl fmt::Display for MergeTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern(msg) => write!(f, "{msg}"),
            Self::SourceNotDirectory(path) => {
                write!(f, "Source directory {} does not exist.", path.display())
            }
            Self::SourceDestinationOverlap {
                source,
                destination,
            } => write!(
                f,
                "Source and destination directories overlap: {} <-> {}",
                source.display(),
                destination.display()
            ),
            Self::DestinationInitFailed { path, message } => {
                write!(
                    f,
                    "Failed to initialize destination {}: {message}",
                    path.display()
                )
            }
            Self::DestinationConflict { path, message } => {
                write!(f, "{message}: {}", path.display())
            }
            Self::ReadDirFailed { path, message } => {
                write!(f, "Failed to read directory {}: {message}", path.display())
            }
            Self::CopyFailed {
                path_src,
                path_dst,
                message,
            } => write!(
                f,
                "Failed to copy {} -> {}: {message}",
                path_src.display(),
                path_dst.display()
            ),
        }
    }
}

impl std::error::Error for MergeTreeError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{EnumMergeOutcome, MergeTreeError, SpecMergeOptions};

    #[test]
    fn outcome_tags_are_distinct() {
        assert_eq!(EnumMergeOutcome::New.to_string(), "new");
        assert_eq!(EnumMergeOutcome::Overridden.to_string(), "overridden");
        assert_eq!(EnumMergeOutcome::Skipped.to_string(), "skipped");
        assert!(EnumMergeOutcome::New.is_copy());
        assert!(!EnumMergeOutcome::Skipped.is_copy());
    }

    #[test]
    fn options_default_is_serial_skip() {
        let spec_mg_options = SpecMergeOptions::default();
        assert!(!spec_mg_options.if_overwrite);
        assert!(!spec_mg_options.if_dry_run);
        assert!(spec_mg_options.num_workers_max.is_none());
        assert!(SpecMergeOptions::with_overwrite(true).if_overwrite);
    }

    #[test]
    fn copy_failed_names_both_paths() {
        let err = MergeTreeError::CopyFailed {
            path_src: PathBuf::from("/src/a.txt"),
            path_dst: PathBuf::from("/dst/a.txt"),
            message: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to copy /src/a.txt -> /dst/a.txt: disk full"
        );
    }
}
