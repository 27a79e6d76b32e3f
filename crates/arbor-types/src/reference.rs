use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Sha256Hash;
use crate::error::TypeError;
use crate::identity::{BranchId, DirectoryId, ReferenceId, RepositoryId};

/// The kind of point-in-time marker a [`Reference`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceType {
    Promotion,
    Commit,
    Checkpoint,
    Save,
    Tag,
    External,
    Rebase,
}

impl ReferenceType {
    pub const ALL: [ReferenceType; 7] = [
        ReferenceType::Promotion,
        ReferenceType::Commit,
        ReferenceType::Checkpoint,
        ReferenceType::Save,
        ReferenceType::Tag,
        ReferenceType::External,
        ReferenceType::Rebase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Promotion => "promotion",
            ReferenceType::Commit => "commit",
            ReferenceType::Checkpoint => "checkpoint",
            ReferenceType::Save => "save",
            ReferenceType::Tag => "tag",
            ReferenceType::External => "external",
            ReferenceType::Rebase => "rebase",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownReferenceType(s.to_string()))
    }
}

/// A named point-in-time marker on a branch, pointing at a root snapshot.
///
/// References are written once and never mutated afterwards; they can only
/// be deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub reference_id: ReferenceId,
    pub repository_id: RepositoryId,
    pub branch_id: BranchId,
    /// Root snapshot this reference points at.
    pub directory_id: DirectoryId,
    pub sha256_hash: Sha256Hash,
    pub reference_type: ReferenceType,
    /// Free-text annotation (commit message, tag name, ...).
    pub reference_text: String,
    /// Related references, e.g. the promotion a rebase was based on.
    pub links: Vec<ReferenceId>,
    /// Server-side creation time; `None` until created.
    pub created_at: Option<DateTime<Utc>>,
}

impl Reference {
    pub fn new(
        repository_id: RepositoryId,
        branch_id: BranchId,
        directory_id: DirectoryId,
        sha256_hash: Sha256Hash,
        reference_type: ReferenceType,
        reference_text: impl Into<String>,
    ) -> Self {
        Self {
            reference_id: ReferenceId::new(),
            repository_id,
            branch_id,
            directory_id,
            sha256_hash,
            reference_type,
            reference_text: reference_text.into(),
            links: Vec::new(),
            created_at: None,
        }
    }
}
