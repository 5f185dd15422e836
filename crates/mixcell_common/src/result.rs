//! Result type for consistency checks of a device model.

use crate::ids::EntityId;

/// Result of an operation that fails only when a model's own bookkeeping
/// has gone wrong.
///
/// User-facing problems (bad wiring, overlapping layouts, undecodable
/// images) have their own error enums.
pub type MixResult<T> = Result<T, InternalError>;

/// A broken invariant of a device model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    /// Two entities hold intersecting bit reservations.
    #[error("internal error: reservations of {first} and {second} overlap")]
    OverlappingClaims {
        /// The entity with the lower start bit.
        first: EntityId,
        /// The entity whose reservation starts inside the first one's.
        second: EntityId,
    },

    /// An entity's reservation runs past the end of the image.
    #[error("internal error: {0} reserves bits past the end of the image")]
    OutOfImage(EntityId),

    /// The reservation or driver index disagrees with an entity.
    #[error("internal error: index is stale for {entity}: {detail}")]
    StaleIndex {
        /// The entity the index disagrees with.
        entity: EntityId,
        /// What disagrees.
        detail: String,
    },
}
