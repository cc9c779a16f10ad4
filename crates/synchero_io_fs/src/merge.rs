//! Directory tree merge: traversal, per-file decisions and statistics.

use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::report::{ReportMerge, StatsMerge};
use crate::reporter::MergeReporter;
use crate::spec::{
    EnumMergeOutcome, EnumMergeSymlinkStrategy, MergeTreeError, SpecMergeEvent, SpecMergeOptions,
};
use crate::util::{
    calculate_worker_limit, compile_patterns_exclude, copy_file_with_metadata,
    ensure_destination_dir, init_destination_root, is_overlap, normalize_path,
    probe_destination_file, should_exclude_by_patterns,
};

#[derive(Debug, Clone)]
struct SpecDirEntry {
    path_dir_src_sub: PathBuf,
    path_dir_dst_sub: PathBuf,
    name_dir: String,
}

#[derive(Debug, Clone)]
struct SpecFileEntry {
    path_file_src: PathBuf,
    path_file_dst: PathBuf,
    name_file: String,
}

enum EnumEntryKind {
    Directory,
    File,
    Unsupported(&'static str),
}

struct SpecMergeContext<'a> {
    spec_mg_options: SpecMergeOptions,
    glob_set_exclude: Option<GlobSet>,
    reporter: &'a dyn MergeReporter,
    if_parallel: bool,
    /// Resolved destination root; only set when symlinks are dereferenced.
    path_dir_dst_resolved: Option<PathBuf>,
}

/// Statistics and warnings returned by one recursion level.
#[derive(Debug, Default)]
struct SpecMergeLevel {
    stats: StatsMerge,
    warnings: Vec<String>,
}

impl SpecMergeLevel {
    fn absorb(&mut self, spec_level_sub: SpecMergeLevel) {
        self.stats += spec_level_sub.stats;
        self.warnings.extend(spec_level_sub.warnings);
    }

    fn add_unsupported(&mut self, warning: String) {
        warn!("{warning}");
        self.stats.add_unsupported();
        self.warnings.push(warning);
    }
}

/// Merge the tree under `dir_source` into `dir_destination`.
///
/// Every plain file is either copied (`new` when nothing exists at the
/// destination, `overridden` when `if_overwrite` is set) or left alone
/// (`skipped`). Each decision is handed to `reporter`. Subdirectories are
/// merged recursively and their statistics summed into the parent's.
///
/// The destination and its missing ancestors are created first (unless
/// `if_dry_run`). Any error aborts the run: a missing source, an unreadable
/// directory, a destination entry of the wrong type, or a failed file copy.
/// The returned report carries no pair label.
pub fn merge_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_mg_options: SpecMergeOptions,
    reporter: &dyn MergeReporter,
) -> Result<ReportMerge, MergeTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    if !path_dir_src.is_dir() {
        return Err(MergeTreeError::SourceNotDirectory(path_dir_src));
    }
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(MergeTreeError::SourceDestinationOverlap {
            source: path_dir_src,
            destination: path_dir_dst,
        });
    }
    let glob_set_exclude = compile_patterns_exclude(spec_mg_options.patterns_exclude.as_deref())?;
    if !spec_mg_options.if_dry_run {
        init_destination_root(&path_dir_dst)?;
    }

    let n_workers_max = calculate_worker_limit(spec_mg_options.num_workers_max);
    let path_dir_dst_resolved = (spec_mg_options.rule_symlink
        == EnumMergeSymlinkStrategy::Dereference)
        .then(|| normalize_path(&path_dir_dst));
    let mut spec_mg_ctx = SpecMergeContext {
        spec_mg_options,
        glob_set_exclude,
        reporter,
        if_parallel: n_workers_max > 1,
        path_dir_dst_resolved,
    };

    debug!(
        "Merging {} -> {} (workers={n_workers_max})",
        path_dir_src.display(),
        path_dir_dst.display()
    );

    let spec_level = if spec_mg_ctx.if_parallel {
        match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
            Ok(thread_pool) => thread_pool
                .install(|| merge_directory(&path_dir_src, &path_dir_dst, &[], &spec_mg_ctx))?,
            Err(e) => {
                let warning = format!(
                    "Failed to initialize thread pool (workers={n_workers_max}); \
                     fallback to serial merge. ({e})"
                );
                warn!("{warning}");
                spec_mg_ctx.if_parallel = false;
                let mut spec_level =
                    merge_directory(&path_dir_src, &path_dir_dst, &[], &spec_mg_ctx)?;
                spec_level.warnings.insert(0, warning);
                spec_level
            }
        }
    } else {
        merge_directory(&path_dir_src, &path_dir_dst, &[], &spec_mg_ctx)?
    };

    Ok(ReportMerge {
        label_pair: None,
        path_dir_src,
        path_dir_dst,
        stats: spec_level.stats,
        warnings: spec_level.warnings,
    })
}

/// Merge one directory level and return its own fresh statistics.
///
/// `l_ancestors` holds canonical paths of the directories above this one; it
/// is only populated when symlinks are dereferenced.
fn merge_directory(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    l_ancestors: &[PathBuf],
    spec_mg_ctx: &SpecMergeContext<'_>,
) -> Result<SpecMergeLevel, MergeTreeError> {
    if !path_dir_src.is_dir() {
        return Err(MergeTreeError::SourceNotDirectory(path_dir_src.to_path_buf()));
    }

    let enum_rule_symlink = spec_mg_ctx.spec_mg_options.rule_symlink;
    let mut l_chain = l_ancestors.to_vec();
    if enum_rule_symlink == EnumMergeSymlinkStrategy::Dereference {
        let path_canonical =
            fs::canonicalize(path_dir_src).map_err(|e| MergeTreeError::ReadDirFailed {
                path: path_dir_src.to_path_buf(),
                message: e.to_string(),
            })?;
        l_chain.push(path_canonical);
    }

    let mut spec_level = SpecMergeLevel::default();
    let mut l_dirs: Vec<SpecDirEntry> = Vec::new();
    let mut l_files: Vec<SpecFileEntry> = Vec::new();

    let map_read_err = |e: std::io::Error| MergeTreeError::ReadDirFailed {
        path: path_dir_src.to_path_buf(),
        message: e.to_string(),
    };
    for entry_res in fs::read_dir(path_dir_src).map_err(map_read_err)? {
        let entry = entry_res.map_err(map_read_err)?;
        let path_entry = entry.path();
        let name_entry = entry.file_name();
        let c_name = name_entry.to_string_lossy().to_string();

        if should_exclude_by_patterns(&c_name, spec_mg_ctx.glob_set_exclude.as_ref()) {
            debug!("Excluded: {}", path_entry.display());
            spec_level.stats.add_excluded();
            continue;
        }

        let cfg_file_type = entry.file_type().map_err(map_read_err)?;
        match classify_entry(&path_entry, cfg_file_type, enum_rule_symlink) {
            EnumEntryKind::Directory => {
                let opt_reason = cfg_file_type
                    .is_symlink()
                    .then(|| {
                        inspect_symlink_dir(
                            &path_entry,
                            &l_chain,
                            spec_mg_ctx.path_dir_dst_resolved.as_deref(),
                        )
                    })
                    .flatten();
                if let Some(reason) = opt_reason {
                    spec_level.add_unsupported(format!("{reason}: {}", path_entry.display()));
                    continue;
                }
                l_dirs.push(SpecDirEntry {
                    path_dir_dst_sub: path_dir_dst.join(&name_entry),
                    path_dir_src_sub: path_entry,
                    name_dir: c_name,
                });
            }
            EnumEntryKind::File => l_files.push(SpecFileEntry {
                path_file_dst: path_dir_dst.join(&name_entry),
                path_file_src: path_entry,
                name_file: c_name,
            }),
            EnumEntryKind::Unsupported(kind) => {
                spec_level.add_unsupported(format!(
                    "Unsupported entry skipped ({kind}): {}",
                    path_entry.display()
                ));
            }
        }
    }

    l_dirs.sort_by(|a, b| a.name_dir.cmp(&b.name_dir));
    l_files.sort_by(|a, b| a.name_file.cmp(&b.name_file));

    for spec_file_entry in l_files {
        let enum_outcome = merge_file(spec_file_entry, spec_mg_ctx)?;
        spec_level.stats.add_outcome(enum_outcome);
    }

    let l_levels_sub = if spec_mg_ctx.if_parallel {
        l_dirs
            .par_iter()
            .map(|d| merge_subdirectory(d, &l_chain, spec_mg_ctx))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        l_dirs
            .iter()
            .map(|d| merge_subdirectory(d, &l_chain, spec_mg_ctx))
            .collect::<Result<Vec<_>, _>>()?
    };
    for spec_level_sub in l_levels_sub {
        spec_level.absorb(spec_level_sub);
    }

    Ok(spec_level)
}

fn merge_subdirectory(
    spec_dir_entry: &SpecDirEntry,
    l_chain: &[PathBuf],
    spec_mg_ctx: &SpecMergeContext<'_>,
) -> Result<SpecMergeLevel, MergeTreeError> {
    if !spec_mg_ctx.spec_mg_options.if_dry_run {
        ensure_destination_dir(&spec_dir_entry.path_dir_dst_sub)?;
    }
    debug!("Entering {}", spec_dir_entry.path_dir_src_sub.display());
    merge_directory(
        &spec_dir_entry.path_dir_src_sub,
        &spec_dir_entry.path_dir_dst_sub,
        l_chain,
        spec_mg_ctx,
    )
}

fn classify_entry(
    path_entry: &Path,
    cfg_file_type: fs::FileType,
    rule_symlink: EnumMergeSymlinkStrategy,
) -> EnumEntryKind {
    if cfg_file_type.is_dir() {
        return EnumEntryKind::Directory;
    }
    if cfg_file_type.is_file() {
        return EnumEntryKind::File;
    }
    if !cfg_file_type.is_symlink() {
        return EnumEntryKind::Unsupported("special file");
    }

    match rule_symlink {
        EnumMergeSymlinkStrategy::Skip => EnumEntryKind::Unsupported("symlink"),
        EnumMergeSymlinkStrategy::Dereference => match fs::metadata(path_entry) {
            Ok(meta_target) if meta_target.is_dir() => EnumEntryKind::Directory,
            Ok(meta_target) if meta_target.is_file() => EnumEntryKind::File,
            Ok(_) => EnumEntryKind::Unsupported("symlink to special file"),
            Err(_) => EnumEntryKind::Unsupported("broken symlink"),
        },
    }
}

/// Why a dereferenced directory link must not be followed, if it must not.
///
/// A target on the ancestor chain is a loop. A target inside the destination
/// (or containing it) would feed the merge its own output.
fn inspect_symlink_dir(
    path_link: &Path,
    l_chain: &[PathBuf],
    path_dir_dst_resolved: Option<&Path>,
) -> Option<&'static str> {
    let Ok(path_target) = fs::canonicalize(path_link) else {
        return Some("Symlink loop detected");
    };
    if l_chain.contains(&path_target) {
        return Some("Symlink loop detected");
    }
    match path_dir_dst_resolved {
        Some(path_dst)
            if path_target.starts_with(path_dst) || path_dst.starts_with(&path_target) =>
        {
            Some("Symlink into destination")
        }
        _ => None,
    }
}

fn merge_file(
    spec_file_entry: SpecFileEntry,
    spec_mg_ctx: &SpecMergeContext<'_>,
) -> Result<EnumMergeOutcome, MergeTreeError> {
    let b_exists = probe_destination_file(&spec_file_entry.path_file_dst)?;
    let enum_outcome = match (b_exists, spec_mg_ctx.spec_mg_options.if_overwrite) {
        (true, true) => EnumMergeOutcome::Overridden,
        (true, false) => EnumMergeOutcome::Skipped,
        (false, _) => EnumMergeOutcome::New,
    };

    if enum_outcome.is_copy() && !spec_mg_ctx.spec_mg_options.if_dry_run {
        copy_file_with_metadata(&spec_file_entry.path_file_src, &spec_file_entry.path_file_dst)
            .map_err(|e| MergeTreeError::CopyFailed {
                path_src: spec_file_entry.path_file_src.clone(),
                path_dst: spec_file_entry.path_file_dst.clone(),
                message: e.to_string(),
            })?;
    }

    spec_mg_ctx.reporter.report_entry(&SpecMergeEvent {
        outcome: enum_outcome,
        name_file: spec_file_entry.name_file,
        path_file_src: spec_file_entry.path_file_src,
        path_file_dst: spec_file_entry.path_file_dst,
    });
    Ok(enum_outcome)
}
