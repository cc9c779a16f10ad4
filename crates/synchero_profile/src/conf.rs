//! Profile constants and the default configuration template.

use crate::spec::{SpecDirectoryPair, SpecProfile, SpecProfileConfig};

/// Config file name under the user's home directory.
pub const C_CONFIG_FILE_NAME: &str = ".syncMaster.json";
/// Placeholder replaced by the user's home directory in pair paths.
pub const C_USER_PLACEHOLDER: &str = "<user>";

/// Template written by `synchero create-config`.
pub fn derive_default_profile_config() -> SpecProfileConfig {
    let (c_source_disk, c_destination_disk) = if cfg!(windows) {
        ("C", "D")
    } else {
        ("/", "/mnt/backup")
    };

    let derive_pair = |name: &str, folder: &str| SpecDirectoryPair {
        name: name.to_string(),
        source: format!("{C_USER_PLACEHOLDER}/{folder}"),
        destination: format!("Backups/{folder}"),
    };

    SpecProfileConfig {
        profiles: vec![SpecProfile {
            name: "default".to_string(),
            source_disk: c_source_disk.to_string(),
            destination_disk: c_destination_disk.to_string(),
            directory_pairs: vec![
                derive_pair("documents", "Documents"),
                derive_pair("pictures", "Pictures"),
            ],
            exclude: vec!["*.tmp".to_string(), "Thumbs.db".to_string(), ".DS_Store".to_string()],
            follow_symlinks: false,
        }],
    }
}
