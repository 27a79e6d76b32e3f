//! Reference entity for Arbor.
//!
//! A [`Reference`](arbor_types::Reference) marks a point in time on a branch
//! (a commit, a save, a promotion, ...) and names the root snapshot it
//! captured. Each reference lives in its own single-writer entity keyed by
//! its [`ReferenceId`](arbor_types::ReferenceId) and is reached through a
//! [`ReferenceClient`].
//!
//! # Modules
//!
//! - [`error`]: [`ReferenceError`] and the [`ReferenceResult`] alias
//! - [`entity`]: the [`ReferenceActor`] and its messages
//! - [`client`]: the typed [`ReferenceClient`]

pub mod client;
pub mod entity;
pub mod error;

pub use client::ReferenceClient;
pub use entity::{register, ReferenceActor, ReferenceMessage, STATE_SLOT};
pub use error::{ReferenceError, ReferenceResult};
