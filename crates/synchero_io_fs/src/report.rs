//! Merge statistics and the per-pair report model.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::path::PathBuf;

use crate::spec::EnumMergeOutcome;

/// Label rendered for a report no directory pair has claimed.
pub const C_LABEL_PAIR_UNSET: &str = "null";

/// Additive counters for one subtree.
///
/// Every recursion level returns a fresh value; parents sum children into
/// their own with `+=`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsMerge {
    /// Plain files encountered (directories excluded).
    pub cnt_total: u64,
    /// Files written (`cnt_new + cnt_overridden`).
    pub cnt_copied: u64,
    /// Files copied because nothing existed at the destination.
    pub cnt_new: u64,
    /// Files copied over an existing destination file.
    pub cnt_overridden: u64,
    /// Files left untouched because overwrite was off.
    pub cnt_skipped: u64,
    /// Entries that were neither plain files nor directories.
    pub cnt_unsupported: u64,
    /// Entries removed by exclude patterns.
    pub cnt_excluded: u64,
}

impl StatsMerge {
    /// Count one plain-file decision.
    pub fn add_outcome(&mut self, outcome: EnumMergeOutcome) {
        self.cnt_total += 1;
        match outcome {
            EnumMergeOutcome::New => {
                self.cnt_new += 1;
                self.cnt_copied += 1;
            }
            EnumMergeOutcome::Overridden => {
                self.cnt_overridden += 1;
                self.cnt_copied += 1;
            }
            EnumMergeOutcome::Skipped => self.cnt_skipped += 1,
        }
    }

    /// Increment unsupported count by one.
    pub fn add_unsupported(&mut self) {
        self.cnt_unsupported += 1;
    }

    /// Increment excluded count by one.
    pub fn add_excluded(&mut self) {
        self.cnt_excluded += 1;
    }

    /// `total == copied + skipped` and `copied == new + overridden`.
    pub fn is_consistent(&self) -> bool {
        self.cnt_total == self.cnt_copied + self.cnt_skipped
            && self.cnt_copied == self.cnt_new + self.cnt_overridden
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_total".to_string(), self.cnt_total);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_new".to_string(), self.cnt_new);
        dict_counts.insert("cnt_overridden".to_string(), self.cnt_overridden);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_unsupported".to_string(), self.cnt_unsupported);
        dict_counts.insert("cnt_excluded".to_string(), self.cnt_excluded);
        dict_counts
    }
}

impl AddAssign for StatsMerge {
    fn add_assign(&mut self, other: Self) {
        self.cnt_total += other.cnt_total;
        self.cnt_copied += other.cnt_copied;
        self.cnt_new += other.cnt_new;
        self.cnt_overridden += other.cnt_overridden;
        self.cnt_skipped += other.cnt_skipped;
        self.cnt_unsupported += other.cnt_unsupported;
        self.cnt_excluded += other.cnt_excluded;
    }
}

impl Add for StatsMerge {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl Sum for StatsMerge {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Result of one `merge_tree` run.
///
/// `label_pair` is left unset by the engine; callers attach the directory
/// pair name after the run returns.
#[derive(Debug, Default, Clone)]
pub struct ReportMerge {
    /// Directory pair name, if any.
    pub label_pair: Option<String>,
    /// Top-level source directory.
    pub path_dir_src: PathBuf,
    /// Top-level destination directory.
    pub path_dir_dst: PathBuf,
    /// Counters aggregated over the whole subtree.
    pub stats: StatsMerge,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
}

impl ReportMerge {
    /// Pair label, or [`C_LABEL_PAIR_UNSET`].
    pub fn label(&self) -> &str {
        self.label_pair.as_deref().unwrap_or(C_LABEL_PAIR_UNSET)
    }

    /// Attach a directory pair label.
    pub fn with_label(mut self, label_pair: impl Into<String>) -> Self {
        self.label_pair = Some(label_pair.into());
        self
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = self.stats.to_dict();
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            concat!(
                "{} pair={} total={} copied={} new={} overridden={} skipped={} ",
                "unsupported={} excluded={} warnings={}"
            ),
            prefix,
            self.label(),
            dict_counts["cnt_total"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_new"],
            dict_counts["cnt_overridden"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_unsupported"],
            dict_counts["cnt_excluded"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[MERGE]"))
    }
}
