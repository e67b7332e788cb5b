//! Error types for the 2D physics facade

use crate::body::BodyId;
use thiserror::Error;

/// Physics facade errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// The operation needs a body that is currently attached to the world
    #[error("Body {0:?} must be added to the world first")]
    NotAttached(BodyId),

    /// The operation is forbidden once the body has been attached
    #[error("Body {0:?} has already been added to the world")]
    AlreadyAttached(BodyId),

    /// The handle was never created by this world or has been removed
    #[error("Unknown body: {0:?}")]
    UnknownBody(BodyId),

    /// Invalid configuration
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),

    /// Invalid world bounds
    #[error("Invalid world bounds: {0}")]
    InvalidBounds(String),

    /// Shape creation failed
    #[error("Failed to create collision shape: {0}")]
    ShapeCreationFailed(String),
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
