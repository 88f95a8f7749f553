//! The revision → commit correspondence table built from two walks.

use std::collections::BTreeMap;
use std::fmt;

use git2::Oid;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::git::history::WalkReport;
use crate::models::{GitMatch, Side, SvnRevision};

/// One side of the table was overwritten by a later commit claiming the
/// same revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRevision {
    pub side: Side,
    pub revision: SvnRevision,
    pub previous: Oid,
    pub replaced_by: Oid,
}

/// Mapping from Subversion revision to its correlation record, ordered by
/// revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchTable {
    matches: BTreeMap<SvnRevision, GitMatch>,
}

/// Counts for a finished table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub total: usize,
    pub complete: usize,
    pub old_only: usize,
    pub new_only: usize,
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} revisions: {} matched, {} only in old history, {} only in new history",
            self.total, self.complete, self.old_only, self.new_only
        )
    }
}

impl MatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `side` of the record for `rev` to `oid`, creating the record if
    /// needed. The other side is left untouched.
    ///
    /// Returns the commit that was replaced, if this side already held a
    /// different one.
    pub fn record(&mut self, side: Side, rev: SvnRevision, oid: Oid) -> Option<Oid> {
        let entry = self
            .matches
            .entry(rev)
            .or_insert_with(|| GitMatch::new(rev));
        let previous = entry.commit(side);
        entry.set_commit(side, oid);
        (!previous.is_zero() && previous != oid).then_some(previous)
    }

    /// Merge every pair a walk emitted, in emission order. Later pairs win.
    pub fn merge_walk(&mut self, walk: &WalkReport) -> Vec<DuplicateRevision> {
        let mut duplicates = Vec::new();
        for &(revision, oid) in &walk.emitted {
            if let Some(previous) = self.record(walk.side, revision, oid) {
                warn!(
                    side = %walk.side,
                    %revision,
                    %previous,
                    replaced_by = %oid,
                    "revision claimed by more than one commit; keeping the later one"
                );
                duplicates.push(DuplicateRevision {
                    side: walk.side,
                    revision,
                    previous,
                    replaced_by: oid,
                });
            }
        }
        duplicates
    }

    pub fn get(&self, rev: SvnRevision) -> Option<&GitMatch> {
        self.matches.get(&rev)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GitMatch> {
        self.matches.values()
    }

    pub fn complete_count(&self) -> usize {
        self.iter().filter(|m| m.is_complete()).count()
    }

    /// Records present only in the old history.
    pub fn old_only(&self) -> impl Iterator<Item = &GitMatch> {
        self.iter().filter(|m| m.new_git_hash.is_zero())
    }

    /// Records present only in the new history.
    pub fn new_only(&self) -> impl Iterator<Item = &GitMatch> {
        self.iter().filter(|m| m.old_git_hash.is_zero())
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            total: self.len(),
            complete: self.complete_count(),
            old_only: self.old_only().count(),
            new_only: self.new_only().count(),
        }
    }
}
