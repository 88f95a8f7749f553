//! Asynchronous driver for the external `git svn` converter.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use git2::Repository;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::config::MigrateConfig;
use crate::errors::ConvertError;
use crate::git::refs::copy_remotes_to_tags_and_heads;

/// Converts one Subversion subpath into a Git repository with `git svn`.
#[derive(Debug, Clone)]
pub struct SvnConverter {
    source_url: String,
    canonical_url: String,
    output_path: PathBuf,
    std_layout: bool,
    authors_file: Option<PathBuf>,
}

fn join_url(base: &str, subpath: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), subpath.trim_matches('/'))
}

impl SvnConverter {
    /// Build the converter for `subpath` from the configured URL bases.
    pub fn new(config: &MigrateConfig, subpath: &str) -> Self {
        let subpath = subpath.trim_matches('/');
        let converter = Self {
            source_url: join_url(&config.svn.actual_url_base, subpath),
            canonical_url: join_url(&config.svn.canonical_url_base, subpath),
            output_path: config.new_repo_path(subpath),
            std_layout: config.svn.std_layout,
            authors_file: config.svn.authors_file.clone(),
        };
        debug!(
            source = %converter.source_url,
            output = %converter.output_path.display(),
            "created SvnConverter"
        );
        converter
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Arguments for a fresh `git svn clone`.
    pub fn clone_args(&self) -> Vec<String> {
        let mut args = vec!["svn".to_string(), "clone".to_string()];
        if self.std_layout {
            args.push("--stdlayout".into());
        }
        if let Some(authors) = &self.authors_file {
            args.push(format!("--authors-file={}", authors.display()));
        }
        if self.canonical_url != self.source_url {
            args.push(format!("--rewrite-root={}", self.canonical_url));
        }
        args.push(self.source_url.clone());
        args.push(self.output_path.to_string_lossy().to_string());
        args
    }

    /// Arguments for `git svn fetch` inside an existing conversion.
    pub fn fetch_args(&self) -> Vec<String> {
        let mut args = vec!["svn".to_string(), "fetch".to_string()];
        if let Some(authors) = &self.authors_file {
            args.push(format!("--authors-file={}", authors.display()));
        }
        args
    }

    /// Clone the Subversion history, or fetch new revisions if the output
    /// repository already exists.
    #[instrument(skip(self), fields(source = %self.source_url, output = %self.output_path.display()))]
    pub async fn clone_repository(&self) -> Result<(), ConvertError> {
        if Repository::open(&self.output_path).is_ok() {
            info!("output repository exists, fetching new revisions");
            self.run_git(Some(&self.output_path), &self.fetch_args()).await?;
        } else {
            if let Some(parent) = self.output_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            info!("cloning subversion repository");
            self.run_git(None, &self.clone_args()).await?;
        }
        info!("conversion completed");
        Ok(())
    }

    /// Copy the converter's remote-tracking refs to local tags and heads.
    #[instrument(skip(self), fields(output = %self.output_path.display()))]
    pub fn copy_remotes_to_tags_and_heads(&self) -> Result<usize, ConvertError> {
        let repo = Repository::open(&self.output_path)?;
        Ok(copy_remotes_to_tags_and_heads(&repo)?)
    }

    async fn run_git(&self, dir: Option<&Path>, args: &[String]) -> Result<String, ConvertError> {
        let mut cmd = Command::new("git");
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(cmd = ?format!("git {}", args.join(" ")), "running git command");
        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::BinaryNotFound("git".into())
            } else {
                ConvertError::IoError(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let exit_code = output.status.code().unwrap_or(-1);
            warn!(exit_code, %stderr, "git svn command failed");
            return Err(ConvertError::CommandFailed { exit_code, stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
