//! Shared foundational types used across the mixcell workspace.
//!
//! This crate provides the arena handles that tie entities and routing
//! matrices together, a content hash for fingerprinting configuration
//! images, and the internal error type used for invariant violations.

#![warn(missing_docs)]

pub mod hash;
pub mod ids;
pub mod result;

pub use hash::ContentHash;
pub use ids::{EntityId, MatrixId};
pub use result::{InternalError, MixResult};
