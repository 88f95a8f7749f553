//! Correlation of an old and a new converted history.
//!
//! Both repositories are opened up front, walked independently (each walk
//! owns its visited set), and their `(revision, commit)` pairs are merged
//! into one [`MatchTable`]: old history first, then new.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::errors::MatchError;
use crate::git::history::{HistoryRepo, WalkDiagnostic, WalkReport};
use crate::match_table::{DuplicateRevision, MatchTable};
use crate::models::Side;

/// Everything the correlation engine needs; nothing is read from ambient
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    pub old_repo_path: PathBuf,
    pub new_repo_path: PathBuf,
    pub match_file_path: PathBuf,
    /// Walk both histories on separate threads.
    pub parallel_walks: bool,
}

/// Result of a successful correlation run.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub table: MatchTable,
    pub old_walk: WalkReport,
    pub new_walk: WalkReport,
    pub duplicates: Vec<DuplicateRevision>,
}

impl MatchReport {
    /// Per-commit trailer problems from both walks.
    pub fn diagnostics(&self) -> impl Iterator<Item = &WalkDiagnostic> {
        self.old_walk
            .diagnostics
            .iter()
            .chain(self.new_walk.diagnostics.iter())
    }
}

/// Builds a [`MatchTable`] from the two repositories named in a
/// [`MatchConfig`].
pub struct Matcher {
    config: MatchConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Abort the walks once `flag` becomes `true`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[instrument(skip(self), fields(
        old = %self.config.old_repo_path.display(),
        new = %self.config.new_repo_path.display(),
        parallel = self.config.parallel_walks
    ))]
    pub fn run(&self) -> Result<MatchReport, MatchError> {
        let old = HistoryRepo::open(Side::Old, &self.config.old_repo_path)?;
        let new = HistoryRepo::open(Side::New, &self.config.new_repo_path)?;
        let cancel = self.cancel.as_deref();

        let (old_walk, new_walk) = if self.config.parallel_walks {
            walk_in_parallel(old, new, cancel)?
        } else {
            (old.walk(cancel)?, new.walk(cancel)?)
        };

        let mut table = MatchTable::new();
        let mut duplicates = table.merge_walk(&old_walk);
        duplicates.extend(table.merge_walk(&new_walk));

        info!(summary = %table.summary(), duplicates = duplicates.len(), "matching complete");
        Ok(MatchReport {
            table,
            old_walk,
            new_walk,
            duplicates,
        })
    }
}

/// Each walk runs on its own scoped thread and owns its repository handle;
/// the results are merged only after both have returned.
fn walk_in_parallel(
    old: HistoryRepo,
    new: HistoryRepo,
    cancel: Option<&AtomicBool>,
) -> Result<(WalkReport, WalkReport), MatchError> {
    std::thread::scope(|s| {
        let old_handle = s.spawn(move || old.walk(cancel));
        let new_handle = s.spawn(move || new.walk(cancel));
        let old_walk = old_handle
            .join()
            .map_err(|_| MatchError::WalkerPanicked { side: Side::Old })?;
        let new_walk = new_handle
            .join()
            .map_err(|_| MatchError::WalkerPanicked { side: Side::New })?;
        Ok((old_walk?, new_walk?))
    })
}
