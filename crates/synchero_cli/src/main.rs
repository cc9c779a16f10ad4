//! SyncHero: profile-driven directory backup and restore.
//!
//! Profiles live in a JSON file (default `~/.syncMaster.json`). `backup`
//! merges every directory pair of a profile from source to destination,
//! `restore` merges them back. Existing files are kept unless `--force`.

mod display;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use console::style;
use synchero_io_fs::{MergeReporter, ReporterTracing};
use synchero_log::{EnumLogLevel, init_logging};
use synchero_profile::{
    EnumSyncDirection, SpecPathResolver, default_config_path, load_config, write_default_config,
};
use tracing::debug;

use crate::display::{ReporterConsole, print_pair_outcome, print_profiles, print_sync_total};
use crate::run::{SpecSyncRequest, run_profile};

#[derive(Parser, Debug)]
#[command(
    name = "synchero",
    version = env!("CARGO_PKG_VERSION"),
    about = "Back up and restore directory pairs described by named profiles"
)]
struct Cli {
    /// Profile file (defaults to ~/.syncMaster.json)
    #[arg(short, long, global = true, env = "SYNCHERO_CONFIG")]
    config: Option<PathBuf>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only on stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy each pair from its source to its destination
    Backup(SyncArgs),
    /// Copy each pair from its destination back to its source
    Restore(SyncArgs),
    /// Write a default profile file
    #[command(name = "create-config", alias = "createConfig")]
    CreateConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show configured profiles and their directory pairs
    List,
}

#[derive(Args, Debug)]
struct SyncArgs {
    /// Profile name
    profile: String,

    /// Overwrite files that already exist at the destination
    #[arg(short, long)]
    force: bool,

    /// Only process this directory pair
    #[arg(short, long)]
    pair: Option<String>,

    /// Report what would be copied without writing anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Worker threads for subdirectory merges
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl SyncArgs {
    fn into_request(self, direction: EnumSyncDirection) -> SpecSyncRequest {
        SpecSyncRequest {
            name_profile: self.profile,
            name_pair: self.pair,
            direction,
            if_overwrite: self.force,
            if_dry_run: self.dry_run,
            num_workers_max: self.jobs,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(EnumLogLevel::from_flags(cli.verbose, cli.quiet)) {
        eprintln!("{e}");
    }

    match run_cli(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    let resolver = SpecPathResolver::from_env();
    let path_config = match cli.config {
        Some(path) => path,
        None => {
            let path_home = resolver
                .home_dir()
                .ok_or_else(|| anyhow!("Cannot locate the home directory; pass --config"))?;
            default_config_path(path_home)
        }
    };
    debug!("Using config {}", path_config.display());

    match cli.command {
        Commands::Backup(sync_args) => run_sync(
            &path_config,
            sync_args.into_request(EnumSyncDirection::Backup),
            &resolver,
            cli.quiet,
        ),
        Commands::Restore(sync_args) => run_sync(
            &path_config,
            sync_args.into_request(EnumSyncDirection::Restore),
            &resolver,
            cli.quiet,
        ),
        Commands::CreateConfig { force } => {
            println!("Creating config file...");
            write_default_config(&path_config, force)
                .with_context(|| format!("create-config at {}", path_config.display()))?;
            println!("Config file written to {}", path_config.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::List => {
            let cfg = load_config(&path_config)?;
            print_profiles(&cfg);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_sync(
    path_config: &std::path::Path,
    spec_request: SpecSyncRequest,
    resolver: &SpecPathResolver,
    if_quiet: bool,
) -> Result<ExitCode> {
    let cfg = load_config(path_config)?;
    // `-q` drops per-file lines from stdout; `RUST_LOG=info` brings them back on stderr.
    let reporter: Box<dyn MergeReporter> = if if_quiet {
        Box::new(ReporterTracing)
    } else {
        Box::new(ReporterConsole {
            if_dry_run: spec_request.if_dry_run,
        })
    };

    let report_sync = match run_profile(
        &cfg,
        &spec_request,
        resolver,
        &*reporter,
        print_pair_outcome,
    ) {
        Ok(report_sync) => report_sync,
        Err(e) if e.is_unknown_name() => {
            println!("{e}");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e.into()),
    };

    print_sync_total(&report_sync);
    if report_sync.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use synchero_profile::EnumSyncDirection;

    use super::{Cli, Commands};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn backup_flags_map_to_request() {
        let cli = Cli::try_parse_from([
            "synchero", "-vv", "backup", "laptop", "-f", "-p", "docs", "-n", "-j", "4",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);

        let Commands::Backup(sync_args) = cli.command else {
            panic!("expected backup");
        };
        let spec_request = sync_args.into_request(EnumSyncDirection::Backup);
        assert_eq!(spec_request.name_profile, "laptop");
        assert_eq!(spec_request.name_pair.as_deref(), Some("docs"));
        assert!(spec_request.if_overwrite);
        assert!(spec_request.if_dry_run);
        assert_eq!(spec_request.num_workers_max, Some(4));
    }

    #[test]
    fn restore_defaults_keep_existing_files() {
        let cli = Cli::try_parse_from(["synchero", "restore", "laptop"]).expect("parse");
        let Commands::Restore(sync_args) = cli.command else {
            panic!("expected restore");
        };
        let spec_request = sync_args.into_request(EnumSyncDirection::Restore);
        assert!(!spec_request.if_overwrite);
        assert!(!spec_request.if_dry_run);
        assert_eq!(spec_request.name_pair, None);
        assert_eq!(spec_request.num_workers_max, None);
    }

    #[test]
    fn create_config_accepts_legacy_spelling() {
        let cli = Cli::try_parse_from(["synchero", "createConfig", "--force"]).expect("parse");
        assert!(matches!(cli.command, Commands::CreateConfig { force: true }));
    }

    #[test]
    fn backup_requires_profile() {
        assert!(Cli::try_parse_from(["synchero", "backup"]).is_err());
    }
}
