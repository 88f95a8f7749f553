//! TOML-based configuration for gitsvnmatch.
//!
//! Every section has defaults, so an absent or partial file is valid.
//! Command-line flags are applied on top by the binary before
//! [`MigrateConfig::validate`] runs.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::matcher::MatchConfig;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MigrateConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where repositories and match files live.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Subversion source settings.
    #[serde(default)]
    pub svn: SvnConfig,

    /// Which stages run.
    #[serde(default)]
    pub stages: StagesConfig,

    /// Correlation behaviour.
    #[serde(default)]
    pub matching: MatchingConfig,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            paths: PathsConfig::default(),
            svn: SvnConfig::default(),
            stages: StagesConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

fn data_base() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gitsvnmatch")
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Base directories; each is joined with the subpath being migrated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathsConfig {
    /// Base path at which converted (new) repositories are placed.
    #[serde(default = "default_output_git_path_base")]
    pub output_git_path_base: PathBuf,

    /// Base path of the previously converted (old) repositories.
    #[serde(default = "default_old_git_path_base")]
    pub old_git_path_base: PathBuf,

    /// Base path under which `<subpath>.json` match files are written.
    #[serde(default = "default_match_file_output_path_base")]
    pub match_file_output_path_base: PathBuf,
}

fn default_output_git_path_base() -> PathBuf {
    data_base().join("git")
}
fn default_old_git_path_base() -> PathBuf {
    data_base().join("oldgit")
}
fn default_match_file_output_path_base() -> PathBuf {
    data_base().join("matchfiles")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_git_path_base: default_output_git_path_base(),
            old_git_path_base: default_old_git_path_base(),
            match_file_output_path_base: default_match_file_output_path_base(),
        }
    }
}

// ---------------------------------------------------------------------------
// SVN
// ---------------------------------------------------------------------------

/// Subversion source settings for the conversion stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SvnConfig {
    /// URL base written into `git-svn-id` trailers.
    #[serde(default = "default_svn_url_base")]
    pub canonical_url_base: String,

    /// URL base actually fetched from; may be a local mirror.
    #[serde(default = "default_svn_url_base")]
    pub actual_url_base: String,

    /// Optional `git svn` authors file.
    #[serde(default)]
    pub authors_file: Option<PathBuf>,

    /// Whether the repository uses the trunk/branches/tags layout.
    #[serde(default = "default_true")]
    pub std_layout: bool,
}

fn default_svn_url_base() -> String {
    "svn+ssh://svn.gna.org/svn/gnustep".into()
}
fn default_true() -> bool {
    true
}

impl Default for SvnConfig {
    fn default() -> Self {
        Self {
            canonical_url_base: default_svn_url_base(),
            actual_url_base: default_svn_url_base(),
            authors_file: None,
            std_layout: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Stages / matching
// ---------------------------------------------------------------------------

/// Stage toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StagesConfig {
    /// Run the Subversion to Git conversion (or reuse the local copy).
    #[serde(default = "default_true")]
    pub svn_clone: bool,

    /// Correlate the old and new histories and write the match file.
    #[serde(default = "default_true")]
    pub match_gits: bool,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            svn_clone: true,
            match_gits: true,
        }
    }
}

/// Correlation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchingConfig {
    /// Walk the two histories concurrently.
    #[serde(default)]
    pub parallel_walks: bool,
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl MigrateConfig {
    /// Load a [`MigrateConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: MigrateConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Default configuration file location (`~/.config/gitsvnmatch/config.toml`).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gitsvnmatch")
            .join("config.toml")
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("paths.output_git_path_base", &self.paths.output_git_path_base),
            ("paths.old_git_path_base", &self.paths.old_git_path_base),
            (
                "paths.match_file_output_path_base",
                &self.paths.match_file_output_path_base,
            ),
        ];
        for (field, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    detail: "path must not be empty".into(),
                });
            }
        }
        if self.stages.svn_clone {
            if self.svn.actual_url_base.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "svn.actual_url_base".into(),
                    detail: "SVN URL base must not be empty when cloning".into(),
                });
            }
            if self.svn.canonical_url_base.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "svn.canonical_url_base".into(),
                    detail: "SVN URL base must not be empty when cloning".into(),
                });
            }
        }
        Ok(())
    }

    /// Path of the converted (new) repository for `subpath`.
    pub fn new_repo_path(&self, subpath: &str) -> PathBuf {
        self.paths.output_git_path_base.join(subpath)
    }

    /// Path of the previously converted (old) repository for `subpath`.
    pub fn old_repo_path(&self, subpath: &str) -> PathBuf {
        self.paths.old_git_path_base.join(subpath)
    }

    /// Path of the match file for `subpath`.
    pub fn match_file_path(&self, subpath: &str) -> PathBuf {
        self.paths
            .match_file_output_path_base
            .join(format!("{subpath}.json"))
    }

    /// Build the explicit configuration handed to the correlation engine.
    pub fn match_config(&self, subpath: &str) -> Result<MatchConfig, ConfigError> {
        let subpath = normalize_subpath(subpath)?;
        Ok(MatchConfig {
            old_repo_path: self.old_repo_path(subpath),
            new_repo_path: self.new_repo_path(subpath),
            match_file_path: self.match_file_path(subpath),
            parallel_walks: self.matching.parallel_walks,
        })
    }
}

/// Validate `subpath` and strip trailing slashes, so `libs/gui/` names the
/// same repositories and match file as `libs/gui`.
pub fn normalize_subpath(subpath: &str) -> Result<&str, ConfigError> {
    validate_subpath(subpath)?;
    Ok(subpath.trim_end_matches('/'))
}

/// A subpath such as `libs/gui`: non-empty, relative, no `..`.
pub fn validate_subpath(subpath: &str) -> Result<(), ConfigError> {
    let invalid = |detail: &str| ConfigError::InvalidValue {
        field: "subpath".into(),
        detail: detail.into(),
    };
    if subpath.trim_matches('/').is_empty() {
        return Err(invalid("subpath must not be empty"));
    }
    let path = Path::new(subpath);
    if path.is_absolute() {
        return Err(invalid("subpath must be relative"));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(invalid("subpath must not contain '..'"));
    }
    Ok(())
}
