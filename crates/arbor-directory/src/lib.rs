//! Directory-version entity for Arbor.
//!
//! Each [`DirectoryVersion`](arbor_types::DirectoryVersion) snapshot lives in
//! its own single-writer entity keyed by its [`DirectoryId`](arbor_types::DirectoryId).
//! Besides plain accessors the entity offers two recursive operations that
//! fan out to the entities of its subdirectories:
//!
//! - **recursive size**: memoized permanently in the snapshot, since a
//!   created subtree never changes;
//! - **recursive listing**: the flattened subtree, memoized in a separate
//!   cache slot that a one-shot reminder evicts after
//!   [`DirectoryConfig::cache_ttl`].
//!
//! Creation is guarded: a snapshot is accepted at most once per id and only
//! if its declared size matches its files.
//!
//! Callers go through [`DirectoryVersionClient`]; register the entity type on
//! a runtime with [`register`].

pub mod aggregation;
pub mod cache;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cache::{SubtreeListingCache, CACHE_EVICTION_REMINDER, CACHE_SLOT};
pub use client::DirectoryVersionClient;
pub use config::{DirectoryConfig, ListingFailureMode};
pub use entity::{register, DirectoryVersionActor, DirectoryVersionMessage, STATE_SLOT};
pub use error::{DirectoryError, DirectoryResult};
