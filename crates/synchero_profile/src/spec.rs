//! Profile models, sync direction, per-pair plans and configuration errors.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::resolve::SpecPathResolver;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Copy direction for a profile run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSyncDirection {
    /// `source` -> `destination`, as declared in the profile.
    Backup,
    /// `destination` -> `source`.
    Restore,
}

impl EnumSyncDirection {
    /// Lowercase command name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for EnumSyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ProfileModels

/// One source/destination mapping inside a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDirectoryPair {
    /// Pair name, selectable with `--pair`.
    pub name: String,
    /// Path on the source disk; may contain the `<user>` placeholder.
    pub source: String,
    /// Path on the destination disk.
    pub destination: String,
}

/// Named profile: two disks and the directory pairs between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecProfile {
    /// Profile name.
    pub name: String,
    /// Source disk: a drive letter, mount point or directory.
    pub source_disk: String,
    /// Destination disk: a drive letter, mount point or directory.
    pub destination_disk: String,
    /// Directory pairs, processed in declaration order.
    pub directory_pairs: Vec<SpecDirectoryPair>,
    /// Glob patterns for entry basenames that are never copied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    /// Follow symbolic links instead of ignoring them.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub follow_symlinks: bool,
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecProfileConfig {
    /// All configured profiles.
    pub profiles: Vec<SpecProfile>,
}

/// Resolved paths for one pair, already oriented for the run direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPairPlan {
    /// Directory pair name.
    pub name: String,
    /// Directory read from.
    pub path_dir_src: PathBuf,
    /// Directory written to.
    pub path_dir_dst: PathBuf,
}

impl SpecProfileConfig {
    /// Profile names in declaration order.
    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    /// Look up a profile by exact name.
    pub fn find_profile(&self, name: &str) -> Result<&SpecProfile, ProfileError> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ProfileError::UnknownProfile {
                name: name.to_string(),
                available: self.profile_names(),
            })
    }

    /// Reject empty or duplicated profile and pair names.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let mut set_profile_names = HashSet::new();
        for profile in &self.profiles {
            if profile.name.trim().is_empty() {
                return Err(ProfileError::Invalid("Profile name must not be empty.".to_string()));
            }
            if !set_profile_names.insert(profile.name.as_str()) {
                return Err(ProfileError::Invalid(format!(
                    "Duplicate profile name: `{}`",
                    profile.name
                )));
            }

            let mut set_pair_names = HashSet::new();
            for directory_pair in &profile.directory_pairs {
                if directory_pair.name.trim().is_empty() {
                    return Err(ProfileError::Invalid(format!(
                        "Directory pair name must not be empty (profile `{}`).",
                        profile.name
                    )));
                }
                if !set_pair_names.insert(directory_pair.name.as_str()) {
                    return Err(ProfileError::Invalid(format!(
                        "Duplicate directory pair `{}` in profile `{}`",
                        directory_pair.name, profile.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl SpecProfile {
    /// Pair names in declaration order.
    pub fn pair_names(&self) -> Vec<String> {
        self.directory_pairs.iter().map(|p| p.name.clone()).collect()
    }

    /// All pairs when `pair` is `None`, otherwise the single named pair.
    pub fn select_pairs(
        &self,
        pair: Option<&str>,
    ) -> Result<Vec<&SpecDirectoryPair>, ProfileError> {
        let Some(name_pair) = pair else {
            return Ok(self.directory_pairs.iter().collect());
        };

        self.directory_pairs
            .iter()
            .find(|p| p.name == name_pair)
            .map(|p| vec![p])
            .ok_or_else(|| ProfileError::UnknownPair {
                profile: self.name.clone(),
                name: name_pair.to_string(),
                available: self.pair_names(),
            })
    }

    /// Resolve selected pairs into source/destination paths for `direction`.
    ///
    /// `Restore` swaps the roles: files flow from the destination disk back to
    /// the source disk.
    pub fn plan(
        &self,
        direction: EnumSyncDirection,
        pair: Option<&str>,
        resolver: &SpecPathResolver,
    ) -> Result<Vec<SpecPairPlan>, ProfileError> {
        self.select_pairs(pair)?
            .into_iter()
            .map(|directory_pair| {
                let path_source = resolver.resolve(&self.source_disk, &directory_pair.source)?;
                let path_destination =
                    resolver.resolve(&self.destination_disk, &directory_pair.destination)?;
                let (path_dir_src, path_dir_dst) = match direction {
                    EnumSyncDirection::Backup => (path_source, path_destination),
                    EnumSyncDirection::Restore => (path_destination, path_source),
                };
                Ok(SpecPairPlan {
                    name: directory_pair.name.clone(),
                    path_dir_src,
                    path_dir_dst,
                })
            })
            .collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Configuration-stage errors. The merge engine is never invoked after one.
#[derive(Debug)]
pub enum ProfileError {
    /// Configuration file could not be read or written.
    Io {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Configuration file is not valid profile JSON.
    Parse {
        /// Configuration file path.
        path: PathBuf,
        /// Parser error text.
        message: String,
    },
    /// Configuration parsed but is inconsistent.
    Invalid(String),
    /// No profile with this name.
    UnknownProfile {
        /// Requested name.
        name: String,
        /// Valid names.
        available: Vec<String>,
    },
    /// No directory pair with this name in the profile.
    UnknownPair {
        /// Profile searched.
        profile: String,
        /// Requested name.
        name: String,
        /// Valid names.
        available: Vec<String>,
    },
    /// `<user>` placeholder used but no home directory is known.
    HomeUnavailable(String),
    /// Refusing to replace an existing configuration file.
    ConfigExists(PathBuf),
}

impl ProfileError {
    /// Unknown profile/pair lookups are reported to the user as a no-op.
    pub fn is_unknown_name(&self) -> bool {
        matches!(self, Self::UnknownProfile { .. } | Self::UnknownPair { .. })
    }
}

fn _format_available(available: &[String]) -> String {
    available
        .iter()
        .map(|name| format!("\n  - {name}"))
        .collect::<String>()
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "Failed to access config {}: {message}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "Error decoding JSON in {}: {message}", path.display())
            }
            Self::Invalid(msg) => write!(f, "{msg}"),
            Self::UnknownProfile { name, available } => write!(
                f,
                "Profile '{name}' not found. Available profiles are:{}",
                _format_available(available)
            ),
            Self::UnknownPair {
                profile,
                name,
                available,
            } => write!(
                f,
                concat!(
                    "Directory Pair '{}' not found in profile '{}'. ",
                    "Available directory pairs are:{}"
                ),
                name,
                profile,
                _format_available(available)
            ),
            Self::HomeUnavailable(path) => write!(
                f,
                "Cannot resolve `<user>` in {path}: home directory is unknown"
            ),
            Self::ConfigExists(path) => write!(
                f,
                "Config file {} already exists (use --force to replace it)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ProfileError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
