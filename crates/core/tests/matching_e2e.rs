//! End-to-end tests for correlating two converted histories.
//!
//! These tests build real Git repositories with `git2` in temporary
//! directories, run the real `Matcher`, and write real match files.
//! No network I/O and no external binaries.

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature, Time};
use tempfile::TempDir;

use gitsvnmatch_core::config::MigrateConfig;
use gitsvnmatch_core::errors::{MatchError, TrailerError};
use gitsvnmatch_core::matcher::Matcher;
use gitsvnmatch_core::matchfile::{read_match_file, write_match_file};
use gitsvnmatch_core::models::{Side, SvnRevision};

// ===========================================================================
// Helpers
// ===========================================================================

const UUID: &str = "72102866-910b-0410-8b05-ffd578937521";

/// Builds a history commit by commit; every commit gets a distinct tree so
/// old and new conversions of the same revision hash differently.
struct HistoryBuilder {
    repo: Repository,
    counter: u32,
}

impl HistoryBuilder {
    fn init(path: &Path) -> Self {
        Self {
            repo: Repository::init(path).expect("git init"),
            counter: 0,
        }
    }

    fn commit(&mut self, message: &str, parents: &[Oid]) -> Oid {
        self.counter += 1;
        let sig = Signature::new(
            "GNUstep Developer",
            "dev@gnustep.org",
            &Time::new(1_000_000_000 + i64::from(self.counter), 0),
        )
        .unwrap();
        let blob = self
            .repo
            .blob(format!("content {}", self.counter).as_bytes())
            .unwrap();
        let mut tb = self.repo.treebuilder(None).unwrap();
        tb.insert("file.txt", blob, 0o100644).unwrap();
        let tree = self.repo.find_tree(tb.write().unwrap()).unwrap();
        let parents: Vec<git2::Commit> = parents
            .iter()
            .map(|p| self.repo.find_commit(*p).unwrap())
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        self.repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn svn_commit(&mut self, subject: &str, path: &str, rev: u64, parents: &[Oid]) -> Oid {
        let message = format!("{subject}\n\ngit-svn-id: {path}@{rev} {UUID}\n");
        self.commit(&message, parents)
    }

    fn set_head(&self, oid: Oid) {
        self.repo
            .reference("refs/heads/master", oid, true, "test")
            .unwrap();
        self.repo.set_head("refs/heads/master").unwrap();
    }
}

struct Workspace {
    _dir: TempDir,
    config: MigrateConfig,
    root: PathBuf,
}

const SUBPATH: &str = "libs/gui";

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let mut config = MigrateConfig::default();
    config.paths.old_git_path_base = root.join("oldgit");
    config.paths.output_git_path_base = root.join("git");
    config.paths.match_file_output_path_base = root.join("matchfiles");
    config.stages.svn_clone = false;
    Workspace {
        _dir: dir,
        config,
        root,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_old_has_extra_revision() {
    let ws = workspace();
    let mut old = HistoryBuilder::init(&ws.config.old_repo_path(SUBPATH));
    let o100 = old.svn_commit("first", "trunk", 100, &[]);
    let o101 = old.svn_commit("second", "trunk", 101, &[o100]);
    old.set_head(o101);

    let mut new = HistoryBuilder::init(&ws.config.new_repo_path(SUBPATH));
    let n100 = new.svn_commit("first (regenerated)", "trunk", 100, &[]);
    new.set_head(n100);

    let match_config = ws.config.match_config(SUBPATH).unwrap();
    let report = Matcher::new(match_config.clone()).run().unwrap();
    write_match_file(&report.table, &match_config.match_file_path).unwrap();

    assert_eq!(
        match_config.match_file_path,
        ws.root.join("matchfiles/libs/gui.json")
    );
    let table = read_match_file(&match_config.match_file_path).unwrap();
    assert_eq!(table.len(), 2);

    let r100 = table.get(SvnRevision(100)).unwrap();
    assert_eq!(r100.old_git_hash, o100);
    assert_eq!(r100.new_git_hash, n100);

    let r101 = table.get(SvnRevision(101)).unwrap();
    assert_eq!(r101.old_git_hash, o101);
    assert!(r101.new_git_hash.is_zero());

    let summary = table.summary();
    assert_eq!(summary.complete, 1);
    assert_eq!(summary.old_only, 1);
    assert_eq!(summary.new_only, 0);
}

#[test]
fn test_new_has_extra_revision() {
    let ws = workspace();
    let mut old = HistoryBuilder::init(&ws.config.old_repo_path(SUBPATH));
    let o1 = old.svn_commit("one", "trunk", 1, &[]);
    old.set_head(o1);

    let mut new = HistoryBuilder::init(&ws.config.new_repo_path(SUBPATH));
    let n1 = new.svn_commit("one", "trunk", 1, &[]);
    let n2 = new.svn_commit("two", "trunk", 2, &[n1]);
    new.set_head(n2);

    let report = Matcher::new(ws.config.match_config(SUBPATH).unwrap())
        .run()
        .unwrap();
    let r2 = report.table.get(SvnRevision(2)).unwrap();
    assert!(r2.old_git_hash.is_zero());
    assert_eq!(r2.new_git_hash, n2);
}

#[test]
fn test_commit_without_trailer_is_skipped_and_parents_still_walked() {
    let ws = workspace();
    let mut old = HistoryBuilder::init(&ws.config.old_repo_path(SUBPATH));
    let o1 = old.svn_commit("one", "trunk", 1, &[]);
    let hand = old.commit("hand-written fixup, no trailer\n", &[o1]);
    old.set_head(hand);

    let mut new = HistoryBuilder::init(&ws.config.new_repo_path(SUBPATH));
    let n1 = new.svn_commit("one", "trunk", 1, &[]);
    new.set_head(n1);

    let report = Matcher::new(ws.config.match_config(SUBPATH).unwrap())
        .run()
        .unwrap();
    assert_eq!(report.table.len(), 1);
    assert!(report.table.get(SvnRevision(1)).unwrap().is_complete());

    let diags: Vec<_> = report.diagnostics().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].side, Side::Old);
    assert_eq!(diags[0].commit, hand);
    assert_eq!(diags[0].error, TrailerError::NotFound);
}

#[test]
fn test_branches_and_merges() {
    let ws = workspace();
    let mut old = HistoryBuilder::init(&ws.config.old_repo_path(SUBPATH));
    let o1 = old.svn_commit("import", "trunk", 1, &[]);
    let o2 = old.svn_commit("branch work", "branches/stable", 2, &[o1]);
    let o3 = old.svn_commit("trunk work", "trunk", 3, &[o1]);
    let o4 = old.svn_commit("merge stable", "trunk", 4, &[o3, o2]);
    old.set_head(o4);

    let mut new = HistoryBuilder::init(&ws.config.new_repo_path(SUBPATH));
    let n1 = new.svn_commit("import", "trunk", 1, &[]);
    let n2 = new.svn_commit("branch work", "branches/stable", 2, &[n1]);
    let n3 = new.svn_commit("trunk work", "trunk", 3, &[n1]);
    let n4 = new.svn_commit("merge stable", "trunk", 4, &[n3, n2]);
    new.set_head(n4);

    let mut config = ws.config.match_config(SUBPATH).unwrap();
    config.parallel_walks = true;
    let report = Matcher::new(config).run().unwrap();

    assert_eq!(report.old_walk.visited.len(), 4);
    assert_eq!(report.new_walk.visited.len(), 4);
    assert_eq!(report.table.len(), 4);
    assert_eq!(report.table.complete_count(), 4);
    let r2 = report.table.get(SvnRevision(2)).unwrap();
    assert_eq!((r2.old_git_hash, r2.new_git_hash), (o2, n2));
}

#[test]
fn test_duplicate_revision_is_reported_and_later_commit_wins() {
    let ws = workspace();
    let mut old = HistoryBuilder::init(&ws.config.old_repo_path(SUBPATH));
    let first = old.svn_commit("original", "trunk", 7, &[]);
    let rewritten = old.svn_commit("rewritten copy", "trunk", 7, &[first]);
    old.set_head(rewritten);

    let mut new = HistoryBuilder::init(&ws.config.new_repo_path(SUBPATH));
    let n7 = new.svn_commit("original", "trunk", 7, &[]);
    new.set_head(n7);

    let report = Matcher::new(ws.config.match_config(SUBPATH).unwrap())
        .run()
        .unwrap();
    // Head is processed first, so its parent is the later write.
    assert_eq!(report.table.get(SvnRevision(7)).unwrap().old_git_hash, first);
    assert_eq!(report.duplicates.len(), 1);
    assert_eq!(report.duplicates[0].previous, rewritten);
    assert_eq!(report.duplicates[0].replaced_by, first);
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let ws = workspace();
    let mut old = HistoryBuilder::init(&ws.config.old_repo_path(SUBPATH));
    let mut new = HistoryBuilder::init(&ws.config.new_repo_path(SUBPATH));
    let mut old_tip = old.svn_commit("r1", "trunk", 1, &[]);
    let mut new_tip = new.svn_commit("r1", "trunk", 1, &[]);
    for rev in 2..=40u64 {
        old_tip = old.svn_commit(&format!("r{rev}"), "trunk", rev, &[old_tip]);
        if rev % 3 != 0 {
            new_tip = new.svn_commit(&format!("r{rev}"), "trunk", rev, &[new_tip]);
        }
    }
    old.set_head(old_tip);
    new.set_head(new_tip);

    let match_config = ws.config.match_config(SUBPATH).unwrap();
    let path = &match_config.match_file_path;

    let report = Matcher::new(match_config.clone()).run().unwrap();
    write_match_file(&report.table, path).unwrap();
    let first = std::fs::read(path).unwrap();

    let report = Matcher::new(match_config.clone()).run().unwrap();
    write_match_file(&report.table, path).unwrap();
    let second = std::fs::read(path).unwrap();

    assert_eq!(first, second);
    assert_eq!(report.table.len(), 40);
    assert_eq!(report.table.old_only().count(), 13);
}

#[test]
fn test_missing_new_repository_is_fatal_and_named() {
    let ws = workspace();
    let mut old = HistoryBuilder::init(&ws.config.old_repo_path(SUBPATH));
    let o1 = old.svn_commit("one", "trunk", 1, &[]);
    old.set_head(o1);

    let err = Matcher::new(ws.config.match_config(SUBPATH).unwrap())
        .run()
        .unwrap_err();
    match err {
        MatchError::RepositoryUnreadable { side, path, .. } => {
            assert_eq!(side, Side::New);
            assert!(path.ends_with("git/libs/gui"), "unexpected path {path}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ws.config.match_file_path(SUBPATH).exists());
}
