//! Shared data types for revision correlation.

use std::fmt;

use git2::Oid;
use serde::{Deserialize, Serialize};

/// A Subversion revision number as embedded in a converted commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SvnRevision(pub u64);

impl fmt::Display for SvnRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SvnRevision {
    fn from(rev: u64) -> Self {
        Self(rev)
    }
}

/// Which of the two histories a commit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The previously hand-converted history.
    Old,
    /// The freshly regenerated history.
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => write!(f, "old"),
            Self::New => write!(f, "new"),
        }
    }
}

/// Correlation of one Subversion revision across both histories.
///
/// A side that was never discovered holds [`Oid::zero`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GitMatch {
    pub subversion_rev: SvnRevision,
    #[serde(with = "oid_hex")]
    pub old_git_hash: Oid,
    #[serde(with = "oid_hex")]
    pub new_git_hash: Oid,
}

impl GitMatch {
    /// A record with neither side discovered yet.
    pub fn new(rev: SvnRevision) -> Self {
        Self {
            subversion_rev: rev,
            old_git_hash: Oid::zero(),
            new_git_hash: Oid::zero(),
        }
    }

    pub fn commit(&self, side: Side) -> Oid {
        match side {
            Side::Old => self.old_git_hash,
            Side::New => self.new_git_hash,
        }
    }

    pub fn set_commit(&mut self, side: Side, oid: Oid) {
        match side {
            Side::Old => self.old_git_hash = oid,
            Side::New => self.new_git_hash = oid,
        }
    }

    /// Both histories carry a commit for this revision.
    pub fn is_complete(&self) -> bool {
        !self.old_git_hash.is_zero() && !self.new_git_hash.is_zero()
    }
}

/// Hex (de)serialization of object ids; the zero id renders as 40 zeros and
/// an empty string reads back as zero.
mod oid_hex {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(oid: &Oid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&oid.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Oid, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(Oid::zero());
        }
        Oid::from_str(&s).map_err(serde::de::Error::custom)
    }
}
