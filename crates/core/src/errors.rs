//! Error types for the gitsvnmatch core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

use crate::models::Side;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Trailer(#[from] TrailerError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

// ---------------------------------------------------------------------------
// Trailer errors
// ---------------------------------------------------------------------------

/// Errors from parsing the `git-svn-id` trailer of one commit message.
///
/// These are recoverable: the walker records them and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrailerError {
    /// No line of the message carries the trailer key.
    #[error("no git-svn-id trailer found")]
    NotFound,

    /// The trailer exists but its value cannot be understood.
    #[error("malformed git-svn-id '{value}': {reason}")]
    Malformed { value: String, reason: String },
}

// ---------------------------------------------------------------------------
// Matching errors
// ---------------------------------------------------------------------------

/// Which step of opening a repository failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenStage {
    Storage,
    HeadReference,
    HeadCommit,
}

impl std::fmt::Display for OpenStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage => write!(f, "open repository"),
            Self::HeadReference => write!(f, "resolve head reference"),
            Self::HeadCommit => write!(f, "load head commit"),
        }
    }
}

/// Errors from correlating the two histories and persisting the result.
#[derive(Debug, Error)]
pub enum MatchError {
    /// A repository's storage, HEAD or head commit could not be resolved.
    #[error("{side} repository at '{path}' is unreadable: could not {stage}: {source}")]
    RepositoryUnreadable {
        side: Side,
        path: String,
        stage: OpenStage,
        #[source]
        source: git2::Error,
    },

    /// A commit reachable from HEAD could not be loaded.
    #[error("{side} history: could not read commit {commit}: {source}")]
    CommitUnreadable {
        side: Side,
        commit: String,
        #[source]
        source: git2::Error,
    },

    /// The walk observed the cancellation flag.
    #[error("{side} history walk cancelled")]
    Cancelled { side: Side },

    /// A walk running on its own thread did not return.
    #[error("{side} history walk thread panicked")]
    WalkerPanicked { side: Side },

    /// The match file's directory could not be created.
    #[error("failed to create match file directory '{path}': {source}")]
    DirectoryCreateFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The match file could not be written.
    #[error("failed to write match file '{path}': {source}")]
    FileWriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An existing match file could not be read back.
    #[error("failed to read match file '{path}': {detail}")]
    MatchFileUnreadable { path: String, detail: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Conversion errors
// ---------------------------------------------------------------------------

/// Errors from driving the external Subversion converter.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// A `git svn` command exited with a non-zero status.
    #[error("git svn command failed (exit {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    /// A `git2` library error while rewriting refs.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// Generic I/O wrapper.
    #[error("conversion I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
