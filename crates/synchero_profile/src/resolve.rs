//! Disk + relative path resolution.

use std::path::{Path, PathBuf};

use crate::conf::C_USER_PLACEHOLDER;
use crate::spec::ProfileError;

/// Builds full paths from a profile disk and a pair-relative path.
///
/// The home directory is injected so resolution never consults process-wide
/// state on its own; only [`SpecPathResolver::from_env`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPathResolver {
    home_dir: Option<PathBuf>,
    if_drive_letters: bool,
}

impl SpecPathResolver {
    /// Resolver for the invoking user; drive letters are honored on Windows.
    pub fn from_env() -> Self {
        Self {
            home_dir: dirs::home_dir(),
            if_drive_letters: cfg!(windows),
        }
    }

    /// Resolver with an explicit home directory.
    pub fn with_home_dir(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: Some(home_dir.into()),
            if_drive_letters: cfg!(windows),
        }
    }

    /// Resolver that cannot substitute `<user>`.
    pub fn without_home_dir() -> Self {
        Self {
            home_dir: None,
            if_drive_letters: cfg!(windows),
        }
    }

    /// Treat single-letter disks as drive roots (`C` -> `C:/`).
    pub fn with_drive_letters(mut self, if_drive_letters: bool) -> Self {
        self.if_drive_letters = if_drive_letters;
        self
    }

    /// Injected home directory, if any.
    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    /// Full path for `path_relative` on `disk`.
    ///
    /// A path containing `<user>` is taken as-is after substitution and the
    /// disk is ignored.
    pub fn resolve(&self, disk: &str, path_relative: &str) -> Result<PathBuf, ProfileError> {
        if path_relative.contains(C_USER_PLACEHOLDER) {
            let path_home = self
                .home_dir
                .as_ref()
                .ok_or_else(|| ProfileError::HomeUnavailable(path_relative.to_string()))?;
            return Ok(PathBuf::from(
                path_relative.replace(C_USER_PLACEHOLDER, &path_home.to_string_lossy()),
            ));
        }
        Ok(self.derive_disk_root(disk).join(path_relative))
    }

    fn derive_disk_root(&self, disk: &str) -> PathBuf {
        let b_is_drive_letter = disk.len() == 1 && disk.chars().all(|c| c.is_ascii_alphabetic());
        if self.if_drive_letters && b_is_drive_letter {
            return PathBuf::from(format!("{disk}:/"));
        }
        PathBuf::from(disk)
    }
}

impl Default for SpecPathResolver {
    fn default() -> Self {
        Self::from_env()
    }
}
