//! Persistence of a [`MatchTable`] as a pretty-printed JSON match file.
//!
//! The file maps each revision (as a decimal string key) to its record:
//!
//! ```json
//! {
//!   "100": {
//!     "SubversionRev": 100,
//!     "OldGitHash": "…40 hex…",
//!     "NewGitHash": "0000000000000000000000000000000000000000"
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::errors::MatchError;
use crate::match_table::MatchTable;
use crate::models::{GitMatch, Side, SvnRevision};

/// Write `table` to `path`, creating missing parent directories.
///
/// The content goes to a temporary file beside `path` which is renamed into
/// place once fully written, so a failure never leaves a truncated match
/// file behind.
#[instrument(skip_all, fields(path = %path.display(), records = table.len()))]
pub fn write_match_file(table: &MatchTable, path: &Path) -> Result<(), MatchError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| MatchError::DirectoryCreateFailed {
        path: dir.display().to_string(),
        source,
    })?;

    let write_failed = |source: std::io::Error| MatchError::FileWriteFailed {
        path: path.display().to_string(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".matchfile-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(write_failed)?;
    debug!(tmp = %tmp.path().display(), "writing to temporary file");

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, table)
            .map_err(|e| write_failed(e.into()))?;
        writer.write_all(b"\n").map_err(write_failed)?;
        writer.flush().map_err(write_failed)?;
    }
    tmp.as_file().sync_all().map_err(write_failed)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(write_failed)?;
    }

    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    info!("match file written");
    Ok(())
}

/// Read a match file previously produced by [`write_match_file`].
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_match_file(path: &Path) -> Result<MatchTable, MatchError> {
    let unreadable = |detail: String| MatchError::MatchFileUnreadable {
        path: path.display().to_string(),
        detail,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
    let raw: BTreeMap<SvnRevision, GitMatch> =
        serde_json::from_str(&contents).map_err(|e| unreadable(e.to_string()))?;

    let mut table = MatchTable::new();
    for (key, record) in raw {
        if key != record.subversion_rev {
            return Err(unreadable(format!(
                "key {key} holds a record for revision {}",
                record.subversion_rev
            )));
        }
        if record.old_git_hash.is_zero() && record.new_git_hash.is_zero() {
            return Err(unreadable(format!("revision {key} has no commit on either side")));
        }
        for side in [Side::Old, Side::New] {
            let oid = record.commit(side);
            if !oid.is_zero() {
                table.record(side, key, oid);
            }
        }
    }
    debug!(records = table.len(), "match file read");
    Ok(table)
}
