//! Git operations for gitsvnmatch.

pub mod history;
pub mod refs;

pub use history::{HistoryRepo, WalkDiagnostic, WalkReport};
