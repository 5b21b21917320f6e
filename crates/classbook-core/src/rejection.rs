//! Refusal taxonomy shared by the policy engine, workflow state machine and
//! membership guard.
//!
//! Nothing here knows about HTTP. The boundary layer decides how each
//! category is rendered (see [`crate::errors::AppError`]).

use thiserror::Error;

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The entity does not exist, or exists outside the actor's visible scope.
    #[error("{0}")]
    NotFound(String),
    /// A policy denied the action. Carries the first failing policy's reason.
    #[error("{0}")]
    Denied(String),
    /// A workflow precondition does not hold (wrong side of a deadline,
    /// missing membership, lesson not offered by the class).
    #[error("{0}")]
    InvalidTransition(String),
    /// A field-level problem with the request payload.
    #[error("{0}")]
    Validation(String),
    /// The requested state already holds (duplicate membership, second
    /// submission when only one is allowed).
    #[error("{0}")]
    Conflict(String),
}

impl Rejection {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn denied(msg: impl Into<String>) -> Self {
        Self::Denied(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Human-readable reason, without the category.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::Denied(msg)
            | Self::InvalidTransition(msg)
            | Self::Validation(msg)
            | Self::Conflict(msg) => msg,
        }
    }
}
