//! `synchero_profile` v1:
//! Profile configuration for `synchero`.
//!
//! Modules:
//! - `spec`    : profile/pair models, sync direction, pair plans, errors
//! - `conf`    : constants and the default profile template
//! - `load`    : reading/writing the JSON profile file
//! - `resolve` : disk + relative path resolution with an injected home directory

pub mod conf;
pub mod load;
pub mod resolve;
pub mod spec;

pub use conf::{C_CONFIG_FILE_NAME, C_USER_PLACEHOLDER, derive_default_profile_config};
pub use load::{default_config_path, load_config, write_default_config};
pub use resolve::SpecPathResolver;
pub use spec::{
    EnumSyncDirection, ProfileError, SpecDirectoryPair, SpecPairPlan, SpecProfile,
    SpecProfileConfig,
};
