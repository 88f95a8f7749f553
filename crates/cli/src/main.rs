//! gitsvnmatch command-line migration driver.
//!
//! Converts one Subversion subpath to Git with `git svn`, copies the
//! converted remotes into local heads and tags, then correlates the fresh
//! conversion with a previously converted repository and writes the match
//! file. Each failure class exits with its own status code.

mod signals;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gitsvnmatch_core::config::{normalize_subpath, MigrateConfig};
use gitsvnmatch_core::errors::{ConvertError, MatchError};
use gitsvnmatch_core::matchfile::write_match_file;
use gitsvnmatch_core::matcher::Matcher;
use gitsvnmatch_core::models::Side;
use gitsvnmatch_core::svn::SvnConverter;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Migrate a Subversion subpath to Git and match it against an old conversion.
#[derive(Parser, Debug)]
#[command(name = "gitsvnmatch", version, about)]
struct Cli {
    /// Path to the TOML configuration file (default: ~/.config/gitsvnmatch/config.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subpath to convert, sans the `trunk` part (e.g. `libs/gui`).
    #[arg(long)]
    subpath: Option<String>,

    /// Skip the Subversion to Git conversion and use the local copy as is.
    #[arg(long)]
    no_svn_clone: bool,

    /// Skip matching the old and new repositories.
    #[arg(long)]
    no_match_gits: bool,

    /// Walk the old and new histories concurrently.
    #[arg(long)]
    parallel_walks: bool,

    /// The Subversion repository does not use trunk/branches/tags.
    #[arg(long)]
    no_stdlayout: bool,

    /// Base URL to record in `git-svn-id` trailers.
    #[arg(long)]
    canonical_subversion_url_base: Option<String>,

    /// Base URL actually fetched from; may be a local mirror.
    #[arg(long)]
    actual_subversion_url_base: Option<String>,

    /// Path to the `git svn` authors file.
    #[arg(long)]
    authors_file_path: Option<PathBuf>,

    /// Base path at which converted repositories are placed.
    #[arg(long)]
    output_git_path_base: Option<PathBuf>,

    /// Base path of the old repositories to match against.
    #[arg(long)]
    old_git_path_base: Option<PathBuf>,

    /// Base path at which match files are written.
    #[arg(long)]
    match_file_output_path_base: Option<PathBuf>,

    /// Log level filter (overrides the config file; `RUST_LOG` wins over both).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut MigrateConfig) {
        if self.no_svn_clone {
            config.stages.svn_clone = false;
        }
        if self.no_match_gits {
            config.stages.match_gits = false;
        }
        if self.parallel_walks {
            config.matching.parallel_walks = true;
        }
        if self.no_stdlayout {
            config.svn.std_layout = false;
        }
        if let Some(url) = &self.canonical_subversion_url_base {
            config.svn.canonical_url_base = url.clone();
        }
        if let Some(url) = &self.actual_subversion_url_base {
            config.svn.actual_url_base = url.clone();
        }
        if let Some(path) = &self.authors_file_path {
            config.svn.authors_file = Some(path.clone());
        }
        if let Some(path) = &self.output_git_path_base {
            config.paths.output_git_path_base = path.clone();
        }
        if let Some(path) = &self.old_git_path_base {
            config.paths.old_git_path_base = path.clone();
        }
        if let Some(path) = &self.match_file_output_path_base {
            config.paths.match_file_output_path_base = path.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Exit statuses
// ---------------------------------------------------------------------------

const EXIT_USAGE: u8 = 1;
const EXIT_CLONE: u8 = 2;
const EXIT_OLD_UNREADABLE: u8 = 3;
const EXIT_NEW_UNREADABLE: u8 = 4;
const EXIT_COMMIT_UNREADABLE: u8 = 5;
const EXIT_MATCH: u8 = 6;
const EXIT_MATCHFILE_DIR: u8 = 8;
const EXIT_MATCHFILE_WRITE: u8 = 9;
const EXIT_COPY_REFS: u8 = 10;

/// A fatal error together with the status the process exits with.
struct Failure {
    status: u8,
    error: anyhow::Error,
}

impl Failure {
    fn new(status: u8, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }
}

fn match_status(err: &MatchError) -> u8 {
    match err {
        MatchError::RepositoryUnreadable {
            side: Side::Old, ..
        } => EXIT_OLD_UNREADABLE,
        MatchError::RepositoryUnreadable {
            side: Side::New, ..
        } => EXIT_NEW_UNREADABLE,
        MatchError::CommitUnreadable { .. } => EXIT_COMMIT_UNREADABLE,
        MatchError::DirectoryCreateFailed { .. } => EXIT_MATCHFILE_DIR,
        MatchError::FileWriteFailed { .. } => EXIT_MATCHFILE_WRITE,
        MatchError::Cancelled { .. }
        | MatchError::WalkerPanicked { .. }
        | MatchError::MatchFileUnreadable { .. } => EXIT_MATCH,
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .init();

    let Some(subpath) = cli.subpath.as_deref() else {
        eprintln!("specify --subpath");
        return ExitCode::from(EXIT_USAGE);
    };

    match run(&config, subpath).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(status = failure.status, "{:#}", failure.error);
            eprintln!("Error: {:#}", failure.error);
            ExitCode::from(failure.status)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<MigrateConfig> {
    let mut config = match &cli.config {
        Some(path) => MigrateConfig::load_from_file(path)
            .with_context(|| format!("failed to load configuration file {}", path.display()))?,
        None => MigrateConfig::load_or_default(MigrateConfig::default_path())
            .context("failed to load default configuration file")?,
    };
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run(config: &MigrateConfig, subpath: &str) -> Result<(), Failure> {
    let subpath = normalize_subpath(subpath).map_err(|e| Failure::new(EXIT_USAGE, e))?;
    let match_config = config
        .match_config(subpath)
        .map_err(|e| Failure::new(EXIT_USAGE, e))?;

    if config.stages.svn_clone {
        convert(config, subpath).await?;
    }

    if config.stages.match_gits {
        let cancel = signals::setup_signal_handlers();
        let matcher = Matcher::new(match_config.clone()).with_cancel_flag(cancel);

        info!("matching");
        let report = tokio::task::spawn_blocking(move || matcher.run())
            .await
            .map_err(|e| Failure::new(EXIT_MATCH, anyhow!("matcher task failed: {e}")))?
            .map_err(|e| {
                let status = match_status(&e);
                Failure::new(status, anyhow::Error::new(e).context("failed to match"))
            })?;

        let skipped = report.diagnostics().count();
        if skipped > 0 {
            warn!(skipped, "commits without a usable git-svn-id were not matched");
        }
        if !report.duplicates.is_empty() {
            warn!(
                duplicates = report.duplicates.len(),
                "some revisions were claimed by more than one commit"
            );
        }

        write_match_file(&report.table, &match_config.match_file_path).map_err(|e| {
            let status = match_status(&e);
            Failure::new(status, anyhow::Error::new(e).context("failed to write matchfile"))
        })?;

        info!(
            path = %match_config.match_file_path.display(),
            summary = %report.table.summary(),
            "match file written"
        );
    }

    Ok(())
}

async fn convert(config: &MigrateConfig, subpath: &str) -> Result<(), Failure> {
    let converter = SvnConverter::new(config, subpath);

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    spinner.set_message(format!("Converting {}...", converter.source_url()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let cloned = converter.clone_repository().await;
    spinner.finish_and_clear();
    cloned.map_err(|e: ConvertError| {
        Failure::new(
            EXIT_CLONE,
            anyhow::Error::new(e).context("could not clone svn repo"),
        )
    })?;

    let copied = converter.copy_remotes_to_tags_and_heads().map_err(|e| {
        Failure::new(
            EXIT_COPY_REFS,
            anyhow::Error::new(e).context("could not copy subversion remotes to tags and heads"),
        )
    })?;
    info!(refs = copied, "converted repository ready");
    Ok(())
}
