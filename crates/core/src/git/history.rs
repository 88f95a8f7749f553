//! Read-only traversal of one converted history via `git2`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use git2::{Oid, Repository};
use tracing::{debug, info, instrument, warn};

use crate::errors::{MatchError, OpenStage, TrailerError};
use crate::models::{Side, SvnRevision};
use crate::svn::trailer::revision_from_commit_message;

/// An opened repository whose HEAD commit has been resolved.
pub struct HistoryRepo {
    repo: Repository,
    path: PathBuf,
    side: Side,
    head: Oid,
}

/// A commit whose message did not yield a revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkDiagnostic {
    pub side: Side,
    pub commit: Oid,
    pub error: TrailerError,
}

/// Everything one walk learned about its history.
#[derive(Debug, Clone)]
pub struct WalkReport {
    pub side: Side,
    pub head: Oid,
    /// Every reachable commit, in the order it was processed.
    pub visited: Vec<Oid>,
    /// `(revision, commit)` pairs, in processing order.
    pub emitted: Vec<(SvnRevision, Oid)>,
    pub diagnostics: Vec<WalkDiagnostic>,
}

impl HistoryRepo {
    /// Open the repository at `path` and resolve its head commit.
    ///
    /// Each step that can fail is reported as
    /// [`MatchError::RepositoryUnreadable`] naming `side`.
    #[instrument(skip_all, fields(side = %side, path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(side: Side, path: P) -> Result<Self, MatchError> {
        let path = path.as_ref();
        info!("opening git repository");
        let unreadable = |stage: OpenStage, source: git2::Error| MatchError::RepositoryUnreadable {
            side,
            path: path.display().to_string(),
            stage,
            source,
        };

        let repo = Repository::open(path).map_err(|e| unreadable(OpenStage::Storage, e))?;
        let head = {
            let head_ref = repo
                .head()
                .map_err(|e| unreadable(OpenStage::HeadReference, e))?;
            head_ref
                .peel_to_commit()
                .map_err(|e| unreadable(OpenStage::HeadCommit, e))?
                .id()
        };
        debug!(%head, "resolved head commit");

        Ok(Self {
            repo,
            path: path.to_path_buf(),
            side,
            head,
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn head(&self) -> Oid {
        self.head
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Walk every commit reachable from HEAD exactly once.
    ///
    /// Depth-first, first parent first. Commits without a usable trailer
    /// are recorded as diagnostics and their parents are still walked. A
    /// commit object that cannot be loaded aborts the walk.
    #[instrument(skip(self, cancel), fields(side = %self.side, head = %self.head))]
    pub fn walk(&self, cancel: Option<&AtomicBool>) -> Result<WalkReport, MatchError> {
        let side = self.side;
        let mut seen: HashSet<Oid> = HashSet::new();
        let mut report = WalkReport {
            side,
            head: self.head,
            visited: Vec::new(),
            emitted: Vec::new(),
            diagnostics: Vec::new(),
        };
        let mut stack = vec![self.head];

        while let Some(oid) = stack.pop() {
            if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                warn!(visited = report.visited.len(), "walk cancelled");
                return Err(MatchError::Cancelled { side });
            }
            if !seen.insert(oid) {
                continue;
            }
            report.visited.push(oid);

            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|source| MatchError::CommitUnreadable {
                    side,
                    commit: oid.to_string(),
                    source,
                })?;

            let message = String::from_utf8_lossy(commit.message_bytes());
            match revision_from_commit_message(&message) {
                Ok(rev) => {
                    debug!(%rev, commit = %oid, "matched revision");
                    report.emitted.push((rev, oid));
                }
                Err(error) => {
                    warn!(commit = %oid, %error, "skipping commit without usable git-svn-id");
                    report.diagnostics.push(WalkDiagnostic {
                        side,
                        commit: oid,
                        error,
                    });
                }
            }

            // Reversed so the first parent is popped next.
            let parents: Vec<Oid> = commit.parent_ids().collect();
            stack.extend(parents.into_iter().rev().filter(|p| !seen.contains(p)));
        }

        info!(
            visited = report.visited.len(),
            emitted = report.emitted.len(),
            skipped = report.diagnostics.len(),
            "walk complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use git2::{Oid, Repository, Signature};

    /// Create a commit with an empty tree and the given parents, without
    /// moving any ref.
    pub fn commit(repo: &Repository, message: &str, parents: &[Oid]) -> Oid {
        let sig = Signature::new("Test", "test@test.com", &git2::Time::new(1_700_000_000, 0))
            .unwrap();
        let tree_oid = repo.treebuilder(None).unwrap().write().unwrap();
        let tree = repo.find_tree(tree_oid).unwrap();
        let parents: Vec<git2::Commit> =
            parents.iter().map(|p| repo.find_commit(*p).unwrap()).collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(None, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    pub fn svn_message(subject: &str, rev: u64) -> String {
        format!("{subject}\n\ngit-svn-id: svn+ssh://svn.example.org/svn/proj/trunk@{rev} repo-uuid-1\n")
    }

    pub fn set_head(repo: &Repository, oid: Oid) {
        repo.reference("refs/heads/master", oid, true, "test").unwrap();
        repo.set_head("refs/heads/master").unwrap();
    }
}
