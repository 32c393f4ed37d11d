//! Error taxonomy shared by every entry point.

use thiserror::Error;

use crate::backend::RuntimeError;

/// Result type alias used throughout the core.
pub type ShimResult<T> = std::result::Result<T, ShimError>;

/// Top-level error type surfaced to the compatibility layer.
#[derive(Debug, Error)]
pub enum ShimError {
    /// Null or already-destroyed session handle.
    #[error("invalid session")]
    InvalidSession,

    /// Null required out-pointer or out-of-range index.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// Recenter requested while the head pose had neither a valid
    /// orientation nor a valid position.
    #[error("headset orientation unavailable")]
    InvalidHeadsetOrientation,

    /// The requested feature has no counterpart in the target runtime.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// Legacy service-bus lookup; nothing is emulated behind it.
    #[error("service lookup failed")]
    ServiceError,

    /// An operation was requested in a state that cannot honor it.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Any target-runtime failure that is not specifically interpreted.
    #[error("runtime failure: {0}")]
    RuntimeFailure(#[from] RuntimeError),
}

impl ShimError {
    /// Raw result code of the underlying runtime failure, if any.
    pub fn runtime_code(&self) -> Option<i32> {
        match self {
            ShimError::RuntimeFailure(err) => Some(err.code),
            _ => None,
        }
    }
}
