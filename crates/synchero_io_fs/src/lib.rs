//! `synchero_io_fs` v1:
//! Rust-side directory merge engine behind `synchero backup` / `synchero restore`.
//!
//! Modules:
//! - `merge`    : traversal, per-file decisions and bottom-up aggregation
//! - `spec`     : enums/options/events/errors
//! - `report`   : additive statistics and the per-pair report model
//! - `reporter` : per-file notification side channel
//! - `util`     : shared helper functions

pub mod merge;
pub mod report;
pub mod reporter;
pub mod spec;
mod util;

pub use merge::merge_tree;
pub use report::{C_LABEL_PAIR_UNSET, ReportMerge, StatsMerge};
pub use reporter::{MergeReporter, ReporterSilent, ReporterTracing};
pub use spec::{
    EnumMergeOutcome, EnumMergeSymlinkStrategy, MergeTreeError, SpecMergeEvent, SpecMergeOptions,
};
