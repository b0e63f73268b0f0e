use thiserror::Error;

/// Errors surfaced by the tree-growing core. All of these are fatal for
/// the tree currently being built, but never for the engine: the caller's
/// scratch stays valid and can be handed to the next build.
#[derive(Debug, Error)]
pub enum EmberError {
    #[error("size arithmetic overflowed while sizing the {0}")]
    CapacityOverflow(&'static str),
    #[error("unable to allocate memory for the {0}")]
    AllocationFailure(&'static str),
    #[error("dimension {0} is out of range for this model delta")]
    InvalidDimension(usize),
    #[error("internal tree state error: {0}")]
    Internal(&'static str),
    #[error("unable to serialize: {0}")]
    Serialization(#[from] serde_json::Error),
}
