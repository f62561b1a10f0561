//! Error types for content, algebra and translation failures.

use thiserror::Error;

use super::{UserId, Vector};

/// Errors that can occur while editing content or processing requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Slice or splice range lies outside of the content.
    #[error("range starting at {index} out of bounds for content with length {len}")]
    OutOfRange {
        /// Offending character offset.
        index: usize,
        /// Length of the content.
        len: usize,
    },

    /// Attempted to merge a reversible delete with a non-reversible one.
    #[error("cannot merge reversible delete with non-reversible delete")]
    IrreversibleMerge,

    /// Folds always skip a matched undo/redo pair, so the amount must be even.
    #[error("fold amount {amount} is not a multiple of 2")]
    InvalidFold {
        /// Requested amount.
        amount: u64,
    },

    /// Translation exhausted every participant without finding a path.
    #[error("no translation path for request by user {user} to {target}")]
    NoTranslationPath {
        /// User that issued the request.
        user: UserId,
        /// Vector the request was translated to.
        target: Vector,
    },

    /// Attempted to mirror a delete that only knows how many characters it
    /// removes.
    #[error("cannot mirror non-reversible delete")]
    Irreversible,

    /// Undo or redo request without a matching request in the log.
    #[error("no associated request for user {user} at {vector}")]
    Unassociated {
        /// User that issued the request.
        user: UserId,
        /// Vector of the request.
        vector: Vector,
    },

    /// Duplicate delivery of a delete request that isn't reversible.
    #[error("duplicate delivery of non-reversible delete by user {user} at {vector}")]
    IrreversibleDuplicate {
        /// User that issued the request.
        user: UserId,
        /// Vector of the request.
        vector: Vector,
    },

    /// Malformed compact vector encoding.
    #[error("invalid vector encoding: {0:?}")]
    InvalidVector(String),
}

impl Error {
    /// Returns true if retrying the failed request can never succeed, no
    /// matter which requests arrive later.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Error::IrreversibleDuplicate { .. }
                | Error::InvalidFold { .. }
                | Error::IrreversibleMerge
                | Error::Irreversible
        )
    }
}
