//! Subversion-side concerns: the `git-svn-id` trailer and the external
//! `git svn` converter.

pub mod converter;
pub mod trailer;

pub use converter::SvnConverter;
pub use trailer::{find_git_svn_id, revision_from_commit_message, GitSvnId, GIT_SVN_ID_KEY};
