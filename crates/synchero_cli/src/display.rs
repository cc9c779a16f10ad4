//! Console narration on stdout. Diagnostics go through `tracing` on stderr.

use console::style;
use synchero_io_fs::{EnumMergeOutcome, MergeReporter, ReportMerge, SpecMergeEvent};
use synchero_profile::SpecProfileConfig;

use crate::run::{EnumPairOutcome, ReportSync};

const C_RULE_WIDTH: usize = 40;

/// Prints one line per file decision.
pub(crate) struct ReporterConsole {
    pub(crate) if_dry_run: bool,
}

impl MergeReporter for ReporterConsole {
    fn report_entry(&self, event: &SpecMergeEvent) {
        let line = format_event(event);
        if self.if_dry_run {
            println!("{} {line}", style("[dry-run]").dim());
        } else {
            println!("{line}");
        }
    }
}

pub(crate) fn format_event(event: &SpecMergeEvent) -> String {
    let path_dst = event.path_file_dst.display();
    match event.outcome {
        EnumMergeOutcome::New => format!("✅ Copied: {} -> {path_dst}", event.name_file),
        EnumMergeOutcome::Overridden => {
            format!("📄 Overridden: {} -> {path_dst}", event.name_file)
        }
        EnumMergeOutcome::Skipped => format!("⏭️ Skipped: {} -> {path_dst}", event.name_file),
    }
}

/// Multi-line block shown after each merged pair.
pub(crate) fn format_pair_summary(report: &ReportMerge) -> String {
    let rule = "=".repeat(C_RULE_WIDTH);
    let stats = report.stats;
    let mut l_lines = vec![
        String::new(),
        rule.clone(),
        format!("✨ Sync Complete for Directory Pair: {}", report.label()),
        format!("📂 Source Directory: {}", report.path_dir_src.display()),
        format!("📂 Destination Directory: {}", report.path_dir_dst.display()),
        rule.clone(),
        format!("📂 Total files processed: {}", stats.cnt_total),
        format!("✅ Copied files: {}", stats.cnt_copied),
        format!("🆕 New files copied: {}", stats.cnt_new),
        format!("♻️ Overwritten files: {}", stats.cnt_overridden),
        format!("⏭️ Skipped files: {}", stats.cnt_skipped),
    ];
    if stats.cnt_excluded > 0 {
        l_lines.push(format!("🚫 Excluded entries: {}", stats.cnt_excluded));
    }
    if stats.cnt_unsupported > 0 {
        l_lines.push(format!("⚠️ Unsupported entries: {}", stats.cnt_unsupported));
    }
    l_lines.push(rule);
    l_lines.push(String::new());
    l_lines.join("\n")
}

pub(crate) fn format_sync_total(report_sync: &ReportSync) -> String {
    let stats_total = report_sync.stats_total();
    format!(
        "🏁 {} '{}': pairs={} merged={} missing={} failed={} total={} copied={} skipped={}",
        report_sync.direction,
        report_sync.name_profile,
        report_sync.l_outcomes.len(),
        report_sync.cnt_merged(),
        report_sync.cnt_missing(),
        report_sync.cnt_failed(),
        stats_total.cnt_total,
        stats_total.cnt_copied,
        stats_total.cnt_skipped
    )
}

pub(crate) fn print_pair_outcome(outcome: &EnumPairOutcome) {
    match outcome {
        EnumPairOutcome::Merged(report) => println!("{}", format_pair_summary(report)),
        EnumPairOutcome::SourceMissing { name, path_dir_src } => println!(
            "{}",
            style(format!(
                "Source directory {} does not exist. Skipping pair '{name}'.",
                path_dir_src.display()
            ))
            .yellow()
        ),
        EnumPairOutcome::Failed { name, error } => {
            println!("{}", style(format!("❌ Pair '{name}' failed: {error}")).red())
        }
    }
}

pub(crate) fn print_sync_total(report_sync: &ReportSync) {
    let line = format_sync_total(report_sync);
    if report_sync.has_failures() {
        println!("{}", style(line).red());
    } else {
        println!("{}", style(line).green());
    }
}

pub(crate) fn format_profiles(cfg: &SpecProfileConfig) -> String {
    let mut l_lines = Vec::new();
    for profile in &cfg.profiles {
        l_lines.push(format!(
            "{} ({} -> {})",
            profile.name, profile.source_disk, profile.destination_disk
        ));
        for directory_pair in &profile.directory_pairs {
            l_lines.push(format!(
                "  - {}: {} -> {}",
                directory_pair.name, directory_pair.source, directory_pair.destination
            ));
        }
    }
    l_lines.join("\n")
}

pub(crate) fn print_profiles(cfg: &SpecProfileConfig) {
    if cfg.profiles.is_empty() {
        println!("{}", style("No profiles configured.").yellow());
        return;
    }
    println!("{}", format_profiles(cfg));
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use synchero_io_fs::{EnumMergeOutcome, ReportMerge, SpecMergeEvent, StatsMerge};
    use synchero_profile::{EnumSyncDirection, SpecDirectoryPair, SpecProfile, SpecProfileConfig};

    use super::{format_event, format_pair_summary, format_profiles, format_sync_total};
    use crate::run::{EnumPairOutcome, ReportSync};

    fn derive_event(outcome: EnumMergeOutcome) -> SpecMergeEvent {
        SpecMergeEvent {
            outcome,
            name_file: "a.txt".to_string(),
            path_file_src: PathBuf::from("/src/a.txt"),
            path_file_dst: PathBuf::from("/dst/a.txt"),
        }
    }

    fn derive_report(label: &str, stats: StatsMerge) -> ReportMerge {
        ReportMerge {
            label_pair: Some(label.to_string()),
            path_dir_src: PathBuf::from("/src"),
            path_dir_dst: PathBuf::from("/dst"),
            stats,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn event_lines_match_outcome() {
        assert_eq!(
            format_event(&derive_event(EnumMergeOutcome::New)),
            "✅ Copied: a.txt -> /dst/a.txt"
        );
        assert_eq!(
            format_event(&derive_event(EnumMergeOutcome::Overridden)),
            "📄 Overridden: a.txt -> /dst/a.txt"
        );
        assert_eq!(
            format_event(&derive_event(EnumMergeOutcome::Skipped)),
            "⏭️ Skipped: a.txt -> /dst/a.txt"
        );
    }

    #[test]
    fn pair_summary_lists_counters() {
        let mut stats = StatsMerge::default();
        stats.add_outcome(EnumMergeOutcome::New);
        stats.add_outcome(EnumMergeOutcome::Skipped);
        let txt = format_pair_summary(&derive_report("docs", stats));

        assert!(txt.contains("✨ Sync Complete for Directory Pair: docs"));
        assert!(txt.contains("📂 Source Directory: /src"));
        assert!(txt.contains("📂 Total files processed: 2"));
        assert!(txt.contains("✅ Copied files: 1"));
        assert!(txt.contains("🆕 New files copied: 1"));
        assert!(txt.contains("♻️ Overwritten files: 0"));
        assert!(txt.contains("⏭️ Skipped files: 1"));
        assert!(!txt.contains("Excluded"));
    }

    #[test]
    fn sync_total_sums_merged_pairs() {
        let mut stats = StatsMerge::default();
        stats.add_outcome(EnumMergeOutcome::Overridden);
        let report_sync = ReportSync {
            name_profile: "laptop".to_string(),
            direction: EnumSyncDirection::Restore,
            l_outcomes: vec![
                EnumPairOutcome::Merged(derive_report("docs", stats)),
                EnumPairOutcome::Merged(derive_report("music", stats)),
                EnumPairOutcome::SourceMissing {
                    name: "notes".to_string(),
                    path_dir_src: PathBuf::from("/nowhere"),
                },
            ],
        };

        assert_eq!(
            format_sync_total(&report_sync),
            "🏁 restore 'laptop': pairs=3 merged=2 missing=1 failed=0 total=2 copied=2 skipped=0"
        );
    }

    #[test]
    fn profiles_listing_shows_pairs() {
        let cfg = SpecProfileConfig {
            profiles: vec![SpecProfile {
                name: "laptop".to_string(),
                source_disk: "/data".to_string(),
                destination_disk: "/backup".to_string(),
                directory_pairs: vec![SpecDirectoryPair {
                    name: "docs".to_string(),
                    source: "docs".to_string(),
                    destination: "laptop/docs".to_string(),
                }],
                exclude: Vec::new(),
                follow_symlinks: false,
            }],
        };

        assert_eq!(
            format_profiles(&cfg),
            "laptop (/data -> /backup)\n  - docs: docs -> laptop/docs"
        );
    }
}
