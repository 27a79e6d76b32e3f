//! Durable state storage for Arbor entities.
//!
//! Every entity owns a handful of named slots addressed by
//! `(entity-type, entity-id, slot-name)`. The store never interprets slot
//! contents; it is a pure key-value store of serialized values.
//!
//! # Storage Backends
//!
//! All backends implement the [`StateStore`] trait:
//!
//! - [`InMemoryStateStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsStateStore`] -- one file per slot, written atomically
//!
//! # Design Rules
//!
//! 1. Reads observe every completed write to the same key.
//! 2. Writes replace the whole slot value; there are no partial updates.
//! 3. An entity only ever touches slots under its own type and id.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod codec;
pub mod error;
pub mod fs;
pub mod key;
pub mod memory;
pub mod traits;

pub use codec::{decode, encode};
pub use error::{StoreError, StoreResult};
pub use fs::FsStateStore;
pub use key::StateKey;
pub use memory::InMemoryStateStore;
pub use traits::StateStore;
