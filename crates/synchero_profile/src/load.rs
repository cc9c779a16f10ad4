//! Reading and writing the JSON profile file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::conf::{C_CONFIG_FILE_NAME, derive_default_profile_config};
use crate::spec::{ProfileError, SpecProfileConfig};

/// `<home>/.syncMaster.json`.
pub fn default_config_path(path_home: &Path) -> PathBuf {
    path_home.join(C_CONFIG_FILE_NAME)
}

/// Read, parse and validate the profile file at `path`.
pub fn load_config(path: &Path) -> Result<SpecProfileConfig, ProfileError> {
    let txt_config = fs::read_to_string(path).map_err(|e| ProfileError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let cfg: SpecProfileConfig =
        serde_json::from_str(&txt_config).map_err(|e| ProfileError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    cfg.validate()?;

    debug!(
        "Loaded {} profile(s) from {}",
        cfg.profiles.len(),
        path.display()
    );
    Ok(cfg)
}

/// Write the default template to `path`, creating parent directories.
///
/// An existing file is only replaced when `if_force` is set.
pub fn write_default_config(
    path: &Path,
    if_force: bool,
) -> Result<SpecProfileConfig, ProfileError> {
    if path.exists() && !if_force {
        return Err(ProfileError::ConfigExists(path.to_path_buf()));
    }

    let map_io_err = |e: std::io::Error| ProfileError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    if let Some(path_parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(path_parent).map_err(map_io_err)?;
    }

    let cfg = derive_default_profile_config();
    let txt_config = serde_json::to_string_pretty(&cfg).map_err(|e| ProfileError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    fs::write(path, txt_config + "\n").map_err(map_io_err)?;

    info!("Wrote default config to {}", path.display());
    Ok(cfg)
}
