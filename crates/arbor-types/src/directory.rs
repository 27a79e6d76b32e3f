use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Sha256Hash;
use crate::identity::{DirectoryId, RepositoryId};

/// A single file inside a directory snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVersion {
    /// Path relative to the repository root.
    pub relative_path: String,
    /// Digest of the file content.
    pub sha256_hash: Sha256Hash,
    /// Whether the content is treated as binary.
    pub is_binary: bool,
    /// Content size in bytes.
    pub size: u64,
}

impl FileVersion {
    pub fn new(relative_path: impl Into<String>, sha256_hash: Sha256Hash, size: u64) -> Self {
        Self {
            relative_path: relative_path.into(),
            sha256_hash,
            is_binary: false,
            size,
        }
    }
}

/// An immutable snapshot of one directory.
///
/// A snapshot names its immediate files and the identifiers of its immediate
/// subdirectories; the subdirectory snapshots live in their own entities.
/// Once created, the only field that ever changes is `recursive_size`, which
/// goes from `None` to its final value at most once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryVersion {
    pub directory_id: DirectoryId,
    pub repository_id: RepositoryId,
    /// Path relative to the repository root (`"."` for the root).
    pub relative_path: String,
    /// Digest covering file and subdirectory identity.
    pub sha256_hash: Sha256Hash,
    /// Immediate subdirectories, in declaration order.
    pub directories: Vec<DirectoryId>,
    /// Immediate files.
    pub files: Vec<FileVersion>,
    /// Sum of the immediate file sizes.
    pub size: u64,
    /// Sum of `size` over the whole subtree; `None` until computed.
    pub recursive_size: Option<u64>,
    /// Server-side creation time; `None` until the snapshot is created.
    pub created_at: Option<DateTime<Utc>>,
}

impl DirectoryVersion {
    /// Build an uncreated snapshot whose `size` is derived from `files`.
    ///
    /// A file list whose sizes overflow `u64` gets `size = u64::MAX`, which
    /// is never consistent.
    pub fn new(
        directory_id: DirectoryId,
        repository_id: RepositoryId,
        relative_path: impl Into<String>,
        sha256_hash: Sha256Hash,
        directories: Vec<DirectoryId>,
        files: Vec<FileVersion>,
    ) -> Self {
        let size = sum_sizes(&files).unwrap_or(u64::MAX);
        Self {
            directory_id,
            repository_id,
            relative_path: relative_path.into(),
            sha256_hash,
            directories,
            files,
            size,
            recursive_size: None,
            created_at: None,
        }
    }

    /// Sum of the declared file sizes, or `None` if it overflows `u64`.
    pub fn files_size(&self) -> Option<u64> {
        sum_sizes(&self.files)
    }

    /// Returns `true` if `size` equals the sum of the file sizes.
    pub fn has_consistent_size(&self) -> bool {
        self.files_size() == Some(self.size)
    }

    /// Returns `true` once the snapshot has been persisted server-side.
    pub fn is_created(&self) -> bool {
        self.created_at.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.directories.is_empty()
    }
}

fn sum_sizes(files: &[FileVersion]) -> Option<u64> {
    files.iter().try_fold(0u64, |total, f| total.checked_add(f.size))
}
