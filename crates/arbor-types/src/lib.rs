//! Foundation types for Arbor.
//!
//! This crate provides the identifiers, digests, and snapshot records shared
//! by every other Arbor crate. Nothing here performs I/O; entities in
//! `arbor-directory` and `arbor-refs` own the persistence of these values.
//!
//! # Key Types
//!
//! - [`DirectoryId`], [`ReferenceId`], [`BranchId`], [`RepositoryId`]: UUID identifiers
//! - [`Sha256Hash`]: opaque 32-byte content digest
//! - [`CorrelationId`]: per-call tracing token
//! - [`DirectoryVersion`]: immutable directory snapshot
//! - [`FileVersion`]: file record inside a snapshot
//! - [`Reference`]: named point-in-time marker pointing at a snapshot

pub mod correlation;
pub mod digest;
pub mod directory;
pub mod error;
pub mod identity;
pub mod reference;

pub use correlation::CorrelationId;
pub use digest::Sha256Hash;
pub use directory::{DirectoryVersion, FileVersion};
pub use error::TypeError;
pub use identity::{BranchId, DirectoryId, ReferenceId, RepositoryId};
pub use reference::{Reference, ReferenceType};
