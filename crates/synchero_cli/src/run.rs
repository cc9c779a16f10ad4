//! Profile run orchestration: one merge per selected directory pair.

use std::path::PathBuf;

use synchero_io_fs::{
    EnumMergeSymlinkStrategy, MergeReporter, MergeTreeError, ReportMerge, SpecMergeOptions,
    StatsMerge, merge_tree,
};
use synchero_profile::{
    EnumSyncDirection, ProfileError, SpecPairPlan, SpecPathResolver, SpecProfile,
    SpecProfileConfig,
};
use tracing::{error, info, warn};

/// What the user asked for on the command line.
#[derive(Debug, Clone)]
pub(crate) struct SpecSyncRequest {
    pub(crate) name_profile: String,
    pub(crate) name_pair: Option<String>,
    pub(crate) direction: EnumSyncDirection,
    pub(crate) if_overwrite: bool,
    pub(crate) if_dry_run: bool,
    pub(crate) num_workers_max: Option<usize>,
}

/// Result for one directory pair.
#[derive(Debug)]
pub(crate) enum EnumPairOutcome {
    /// Merge completed; the report carries the pair label.
    Merged(ReportMerge),
    /// Source directory for this direction does not exist; nothing was touched.
    SourceMissing { name: String, path_dir_src: PathBuf },
    /// Merge aborted part-way.
    Failed { name: String, error: MergeTreeError },
}

/// All pair outcomes of one profile run, in pair order.
#[derive(Debug)]
pub(crate) struct ReportSync {
    pub(crate) name_profile: String,
    pub(crate) direction: EnumSyncDirection,
    pub(crate) l_outcomes: Vec<EnumPairOutcome>,
}

impl ReportSync {
    /// Field-wise sum over merged pairs.
    pub(crate) fn stats_total(&self) -> StatsMerge {
        self.l_outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                EnumPairOutcome::Merged(report) => Some(report.stats),
                _ => None,
            })
            .sum()
    }

    pub(crate) fn cnt_merged(&self) -> usize {
        self.l_outcomes
            .iter()
            .filter(|o| matches!(o, EnumPairOutcome::Merged(_)))
            .count()
    }

    pub(crate) fn cnt_missing(&self) -> usize {
        self.l_outcomes
            .iter()
            .filter(|o| matches!(o, EnumPairOutcome::SourceMissing { .. }))
            .count()
    }

    pub(crate) fn cnt_failed(&self) -> usize {
        self.l_outcomes
            .iter()
            .filter(|o| matches!(o, EnumPairOutcome::Failed { .. }))
            .count()
    }

    pub(crate) fn has_failures(&self) -> bool {
        self.cnt_failed() > 0
    }
}

/// Merge every selected pair of the requested profile.
///
/// Missing sources and failed merges are recorded and the run moves on to the
/// next pair in both directions. `on_pair` sees each outcome as soon as its
/// pair completes. Only configuration problems (unknown profile or pair,
/// unresolvable paths) abort before any merge.
pub(crate) fn run_profile(
    cfg: &SpecProfileConfig,
    spec_request: &SpecSyncRequest,
    resolver: &SpecPathResolver,
    reporter: &dyn MergeReporter,
    mut on_pair: impl FnMut(&EnumPairOutcome),
) -> Result<ReportSync, ProfileError> {
    let profile = cfg.find_profile(&spec_request.name_profile)?;
    let l_plans = profile.plan(
        spec_request.direction,
        spec_request.name_pair.as_deref(),
        resolver,
    )?;
    info!(
        "Running {} for profile '{}' ({} pair(s))",
        spec_request.direction,
        profile.name,
        l_plans.len()
    );

    let mut l_outcomes = Vec::with_capacity(l_plans.len());
    for spec_plan in l_plans {
        let outcome = run_pair(profile, &spec_plan, spec_request, reporter);
        on_pair(&outcome);
        l_outcomes.push(outcome);
    }

    Ok(ReportSync {
        name_profile: profile.name.clone(),
        direction: spec_request.direction,
        l_outcomes,
    })
}

fn derive_merge_options(profile: &SpecProfile, spec_request: &SpecSyncRequest) -> SpecMergeOptions {
    SpecMergeOptions {
        if_overwrite: spec_request.if_overwrite,
        patterns_exclude: (!profile.exclude.is_empty()).then(|| profile.exclude.clone()),
        rule_symlink: if profile.follow_symlinks {
            EnumMergeSymlinkStrategy::Dereference
        } else {
            EnumMergeSymlinkStrategy::Skip
        },
        num_workers_max: spec_request.num_workers_max,
        if_dry_run: spec_request.if_dry_run,
    }
}

fn run_pair(
    profile: &SpecProfile,
    spec_plan: &SpecPairPlan,
    spec_request: &SpecSyncRequest,
    reporter: &dyn MergeReporter,
) -> EnumPairOutcome {
    info!(
        "Pair '{}': {} -> {}",
        spec_plan.name,
        spec_plan.path_dir_src.display(),
        spec_plan.path_dir_dst.display()
    );
    let spec_mg_options = derive_merge_options(profile, spec_request);

    match merge_tree(
        &spec_plan.path_dir_src,
        &spec_plan.path_dir_dst,
        spec_mg_options,
        reporter,
    ) {
        Ok(report) => EnumPairOutcome::Merged(report.with_label(spec_plan.name.clone())),
        Err(MergeTreeError::SourceNotDirectory(path)) if path == spec_plan.path_dir_src => {
            warn!("Source directory {} does not exist.", path.display());
            EnumPairOutcome::SourceMissing {
                name: spec_plan.name.clone(),
                path_dir_src: path,
            }
        }
        Err(e) => {
            error!("Pair '{}' failed: {e}", spec_plan.name);
            EnumPairOutcome::Failed {
                name: spec_plan.name.clone(),
                error: e,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use synchero_io_fs::{MergeTreeError, ReporterSilent};
    use synchero_profile::{
        EnumSyncDirection, ProfileError, SpecDirectoryPair, SpecPathResolver, SpecProfile,
        SpecProfileConfig,
    };
    use tempfile::TempDir;

    use super::{EnumPairOutcome, SpecSyncRequest, run_profile};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn derive_pair(name: &str, source: &str, destination: &str) -> SpecDirectoryPair {
        SpecDirectoryPair {
            name: name.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
        }
    }

    fn derive_config(tmp: &TempDir) -> SpecProfileConfig {
        SpecProfileConfig {
            profiles: vec![SpecProfile {
                name: "laptop".to_string(),
                source_disk: tmp.path().join("disk_src").to_string_lossy().to_string(),
                destination_disk: tmp.path().join("disk_dst").to_string_lossy().to_string(),
                directory_pairs: vec![
                    derive_pair("docs", "docs", "backup/docs"),
                    derive_pair("music", "music", "backup/music"),
                    derive_pair("notes", "<user>/notes", "backup/notes"),
                ],
                exclude: vec!["*.tmp".to_string()],
                follow_symlinks: false,
            }],
        }
    }

    fn derive_request(direction: EnumSyncDirection) -> SpecSyncRequest {
        SpecSyncRequest {
            name_profile: "laptop".to_string(),
            name_pair: None,
            direction,
            if_overwrite: false,
            if_dry_run: false,
            num_workers_max: None,
        }
    }

    fn derive_resolver(tmp: &TempDir) -> SpecPathResolver {
        SpecPathResolver::with_home_dir(tmp.path().join("home")).with_drive_letters(false)
    }

    #[test]
    fn backup_merges_existing_pairs_and_skips_missing_sources() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("disk_src/docs/a.txt"), "a");
        write_text(&tmp.path().join("disk_src/docs/junk.tmp"), "junk");
        write_text(&tmp.path().join("home/notes/n.txt"), "n");

        let mut l_seen = Vec::new();
        let report_sync = run_profile(
            &derive_config(&tmp),
            &derive_request(EnumSyncDirection::Backup),
            &derive_resolver(&tmp),
            &ReporterSilent,
            |outcome| {
                l_seen.push(match outcome {
                    EnumPairOutcome::Merged(report) => report.label().to_string(),
                    EnumPairOutcome::SourceMissing { name, .. } => format!("missing:{name}"),
                    EnumPairOutcome::Failed { name, .. } => format!("failed:{name}"),
                })
            },
        )
        .expect("run");

        assert_eq!(l_seen, vec!["docs", "missing:music", "notes"]);
        assert_eq!(report_sync.cnt_merged(), 2);
        assert_eq!(report_sync.cnt_missing(), 1);
        assert!(!report_sync.has_failures());

        let stats_total = report_sync.stats_total();
        assert_eq!(stats_total.cnt_total, 2);
        assert_eq!(stats_total.cnt_new, 2);
        assert_eq!(stats_total.cnt_excluded, 1);
        assert!(tmp.path().join("disk_dst/backup/docs/a.txt").exists());
        assert!(!tmp.path().join("disk_dst/backup/docs/junk.tmp").exists());
        assert!(tmp.path().join("disk_dst/backup/notes/n.txt").exists());
        assert!(!tmp.path().join("disk_dst/backup/music").exists());
    }

    #[test]
    fn restore_copies_back_from_destination() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("disk_dst/backup/music/song.flac"), "la");
        write_text(&tmp.path().join("disk_src/music/song.flac"), "local edit");

        let mut spec_request = derive_request(EnumSyncDirection::Restore);
        spec_request.name_pair = Some("music".to_string());
        let report_sync = run_profile(
            &derive_config(&tmp),
            &spec_request,
            &derive_resolver(&tmp),
            &ReporterSilent,
            |_| {},
        )
        .expect("run");

        assert_eq!(report_sync.l_outcomes.len(), 1);
        assert_eq!(report_sync.stats_total().cnt_skipped, 1);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("disk_src/music/song.flac")).expect("read"),
            "local edit"
        );

        spec_request.if_overwrite = true;
        let report_sync = run_profile(
            &derive_config(&tmp),
            &spec_request,
            &derive_resolver(&tmp),
            &ReporterSilent,
            |_| {},
        )
        .expect("run");
        assert_eq!(report_sync.stats_total().cnt_overridden, 1);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("disk_src/music/song.flac")).expect("read"),
            "la"
        );
    }

    #[test]
    fn restore_with_missing_backup_continues() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("disk_dst/backup/notes/n.txt"), "n");

        let report_sync = run_profile(
            &derive_config(&tmp),
            &derive_request(EnumSyncDirection::Restore),
            &derive_resolver(&tmp),
            &ReporterSilent,
            |_| {},
        )
        .expect("run");

        assert_eq!(report_sync.cnt_missing(), 2);
        assert_eq!(report_sync.cnt_merged(), 1);
        assert!(tmp.path().join("home/notes/n.txt").exists());
    }

    #[test]
    fn failed_pair_is_recorded_and_next_pair_runs() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("disk_src/docs/a.txt"), "a");
        std::fs::create_dir_all(tmp.path().join("disk_dst/backup/docs/a.txt")).expect("mkdir");
        write_text(&tmp.path().join("disk_src/music/m.txt"), "m");

        let report_sync = run_profile(
            &derive_config(&tmp),
            &derive_request(EnumSyncDirection::Backup),
            &derive_resolver(&tmp),
            &ReporterSilent,
            |_| {},
        )
        .expect("run");

        assert!(report_sync.has_failures());
        assert!(matches!(
            &report_sync.l_outcomes[0],
            EnumPairOutcome::Failed { error: MergeTreeError::DestinationConflict { .. }, .. }
        ));
        assert!(matches!(&report_sync.l_outcomes[1], EnumPairOutcome::Merged(_)));
        assert!(tmp.path().join("disk_dst/backup/music/m.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_fails_pair_and_run_continues() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let path_locked = tmp.path().join("disk_src/docs/locked.txt");
        write_text(&path_locked, "secret");
        write_text(&tmp.path().join("disk_src/music/m.txt"), "m");
        let set_mode = |mode: u32| {
            std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(mode))
                .expect("chmod")
        };
        set_mode(0o000);
        if std::fs::File::open(&path_locked).is_ok() {
            set_mode(0o644);
            return;
        }

        let report_sync = run_profile(
            &derive_config(&tmp),
            &derive_request(EnumSyncDirection::Backup),
            &derive_resolver(&tmp),
            &ReporterSilent,
            |_| {},
        )
        .expect("run");
        set_mode(0o644);

        assert_eq!(report_sync.cnt_failed(), 1);
        match &report_sync.l_outcomes[0] {
            EnumPairOutcome::Failed {
                name,
                error: MergeTreeError::CopyFailed { path_src, .. },
            } => {
                assert_eq!(name, "docs");
                assert_eq!(path_src, &path_locked);
            }
            other => panic!("expected CopyFailed for docs, got {other:?}"),
        }
        assert!(matches!(&report_sync.l_outcomes[1], EnumPairOutcome::Merged(_)));
        assert!(tmp.path().join("disk_dst/backup/music/m.txt").exists());
    }

    #[test]
    fn unknown_profile_and_pair_abort_before_merging() {
        let tmp = TempDir::new().expect("tempdir");
        let cfg = derive_config(&tmp);
        let resolver = derive_resolver(&tmp);

        let mut spec_request = derive_request(EnumSyncDirection::Backup);
        spec_request.name_profile = "desk".to_string();
        let err = run_profile(&cfg, &spec_request, &resolver, &ReporterSilent, |_| {})
            .expect_err("unknown profile");
        assert!(matches!(err, ProfileError::UnknownProfile { .. }));

        let mut spec_request = derive_request(EnumSyncDirection::Backup);
        spec_request.name_pair = Some("videos".to_string());
        let err = run_profile(&cfg, &spec_request, &resolver, &ReporterSilent, |_| {})
            .expect_err("unknown pair");
        assert!(err.is_unknown_name());
        assert!(!tmp.path().join("disk_dst").exists());
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("disk_src/docs/a.txt"), "a");

        let mut spec_request = derive_request(EnumSyncDirection::Backup);
        spec_request.if_dry_run = true;
        let report_sync = run_profile(
            &derive_config(&tmp),
            &spec_request,
            &derive_resolver(&tmp),
            &ReporterSilent,
            |_| {},
        )
        .expect("run");

        assert_eq!(report_sync.stats_total().cnt_new, 1);
        assert!(!tmp.path().join("disk_dst").exists());
    }
}
