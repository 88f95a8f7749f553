//! Copying of `git svn` remote-tracking refs into local tags and heads.

use git2::{Oid, Repository};
use tracing::{debug, info, instrument};

/// Namespace `git svn --stdlayout` fetches branches and tags into.
pub const SVN_REMOTE_PREFIX: &str = "refs/remotes/origin/";

/// Ref `git svn` uses when the repository has no standard layout.
pub const SVN_SINGLE_REMOTE: &str = "refs/remotes/git-svn";

/// Map a `git svn` remote ref to the local ref it should be copied to.
///
/// `trunk` (and the single-branch remote) becomes `master`; tags land under
/// `refs/tags/`. Peg refs such as `branch@1234`, which `git svn` keeps for
/// deleted or replaced branches, are not copied.
pub fn local_ref_name(remote_ref: &str) -> Option<String> {
    if remote_ref == SVN_SINGLE_REMOTE {
        return Some("refs/heads/master".into());
    }
    let short = remote_ref.strip_prefix(SVN_REMOTE_PREFIX)?;
    if short.is_empty() || short.contains('@') {
        return None;
    }
    if let Some(tag) = short.strip_prefix("tags/") {
        return (!tag.is_empty()).then(|| format!("refs/tags/{tag}"));
    }
    if short == "trunk" {
        return Some("refs/heads/master".into());
    }
    Some(format!("refs/heads/{short}"))
}

/// Copy every convertible remote ref into `refs/heads` / `refs/tags`,
/// overwriting existing refs. Returns the number of refs written.
#[instrument(skip(repo), fields(path = %repo.path().display()))]
pub fn copy_remotes_to_tags_and_heads(repo: &Repository) -> Result<usize, git2::Error> {
    let mut planned: Vec<(String, Oid)> = Vec::new();
    for reference in repo.references()? {
        let reference = reference?;
        let Some(name) = reference.name() else {
            continue;
        };
        let Some(dest) = local_ref_name(name) else {
            continue;
        };
        let target = reference.resolve()?.target();
        if let Some(oid) = target {
            planned.push((dest, oid));
        }
    }

    planned.sort();
    for (dest, oid) in &planned {
        debug!(dest = dest.as_str(), %oid, "copying ref");
        repo.reference(dest, *oid, true, "gitsvnmatch: copy git svn remote")?;
    }
    info!(count = planned.len(), "copied remotes to tags and heads");
    Ok(planned.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::history::test_support::{commit, svn_message};

    #[test]
    fn test_local_ref_name() {
        assert_eq!(
            local_ref_name("refs/remotes/origin/trunk").as_deref(),
            Some("refs/heads/master")
        );
        assert_eq!(
            local_ref_name("refs/remotes/origin/gui-0_10").as_deref(),
            Some("refs/heads/gui-0_10")
        );
        assert_eq!(
            local_ref_name("refs/remotes/origin/tags/gui-0_10_0").as_deref(),
            Some("refs/tags/gui-0_10_0")
        );
        assert_eq!(
            local_ref_name("refs/remotes/git-svn").as_deref(),
            Some("refs/heads/master")
        );
        assert_eq!(local_ref_name("refs/remotes/origin/gui@2104"), None);
        assert_eq!(local_ref_name("refs/remotes/origin/tags/"), None);
        assert_eq!(local_ref_name("refs/heads/master"), None);
        assert_eq!(local_ref_name("refs/remotes/upstream/trunk"), None);
    }

    #[test]
    fn test_copy_remotes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let c1 = commit(&repo, &svn_message("one", 1), &[]);
        let c2 = commit(&repo, &svn_message("two", 2), &[c1]);
        repo.reference("refs/remotes/origin/trunk", c2, true, "t").unwrap();
        repo.reference("refs/remotes/origin/stable", c1, true, "t").unwrap();
        repo.reference("refs/remotes/origin/tags/v1", c1, true, "t").unwrap();
        repo.reference("refs/remotes/origin/old@1", c1, true, "t").unwrap();

        let count = copy_remotes_to_tags_and_heads(&repo).unwrap();
        assert_eq!(count, 3);
        assert_eq!(repo.refname_to_id("refs/heads/master").unwrap(), c2);
        assert_eq!(repo.refname_to_id("refs/heads/stable").unwrap(), c1);
        assert_eq!(repo.refname_to_id("refs/tags/v1").unwrap(), c1);
        assert!(repo.refname_to_id("refs/heads/old@1").is_err());
    }
}
