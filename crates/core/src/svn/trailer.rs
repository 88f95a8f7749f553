//! Parser for the `git-svn-id` trailer written by `git svn` into every
//! converted commit message.
//!
//! The trailer looks like:
//!
//! ```text
//! git-svn-id: svn+ssh://svn.gna.org/svn/gnustep/libs/gui/trunk@27000 72102866-910b-0410-8b05-ffd578937521
//! ```
//!
//! i.e. `<path>@<revision> <repository-uuid>`.

use tracing::trace;

use crate::errors::TrailerError;
use crate::models::SvnRevision;

/// Trailer key identifying the Subversion origin of a commit.
pub const GIT_SVN_ID_KEY: &str = "git-svn-id";

/// A parsed `git-svn-id` trailer value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSvnId {
    pub path: String,
    pub revision: SvnRevision,
    pub repository_id: String,
}

/// Extract the Subversion revision a commit was converted from.
pub fn revision_from_commit_message(message: &str) -> Result<SvnRevision, TrailerError> {
    find_git_svn_id(message).map(|id| id.revision)
}

/// Find and parse the first `git-svn-id` line of a commit message.
///
/// Only the first line whose key matches is considered; if it is malformed
/// the message is malformed, even if a later line would parse.
pub fn find_git_svn_id(message: &str) -> Result<GitSvnId, TrailerError> {
    for line in message.lines() {
        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        if key == GIT_SVN_ID_KEY {
            trace!(value, "found git-svn-id trailer");
            return parse_git_svn_id(value);
        }
    }
    Err(TrailerError::NotFound)
}

/// Parse a trailer value of the form `<path>@<revision> <repository-id>`.
pub fn parse_git_svn_id(value: &str) -> Result<GitSvnId, TrailerError> {
    let malformed = |reason: &str| TrailerError::Malformed {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (path_rev, repository_id) = value
        .split_once(' ')
        .ok_or_else(|| malformed("missing repository identifier"))?;
    let repository_id = repository_id.trim();
    if repository_id.is_empty() {
        return Err(malformed("missing repository identifier"));
    }

    let (path, rev) = path_rev
        .rsplit_once('@')
        .ok_or_else(|| malformed("missing '@' between path and revision"))?;
    // `git svn` always writes a path before the `@`, so `@100 uuid` is rejected.
    if path.is_empty() {
        return Err(malformed("empty path"));
    }
    if rev.is_empty() || !rev.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("revision is not a non-negative integer"));
    }
    let revision = rev
        .parse::<u64>()
        .map_err(|_| malformed("revision out of range"))?;

    Ok(GitSvnId {
        path: path.to_string(),
        revision: SvnRevision(revision),
        repository_id: repository_id.to_string(),
    })
}
