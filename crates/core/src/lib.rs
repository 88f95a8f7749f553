//! gitsvnmatch core library.
//!
//! Correlates a previously converted ("old") Git history with a freshly
//! regenerated ("new") one through the `git-svn-id` trailer each commit
//! carries, and persists the resulting revision → commit table as a match
//! file. Also wraps the external `git svn` conversion that produces the
//! new history.

pub mod config;
pub mod errors;
pub mod git;
pub mod match_table;
pub mod matcher;
pub mod matchfile;
pub mod models;
pub mod svn;

// Re-exports for convenience.
pub use config::MigrateConfig;
pub use match_table::{MatchSummary, MatchTable};
pub use matcher::{MatchConfig, MatchReport, Matcher};
pub use matchfile::{read_match_file, write_match_file};
pub use models::{GitMatch, Side, SvnRevision};
