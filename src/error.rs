//! Error type for every fallible boundary in this crate.
//!
//! The kernel algebra itself (`fork`, `event`, `peek`, `leq` and the derived
//! relations) never fails on well-formed stamps. Failures only arise at the
//! edges: joining identities that were never disjoint, parsing untrusted
//! text, decoding untrusted bytes, and deserializing untrusted JSON.

use thiserror::Error;

/// Everything that can go wrong at a boundary of this crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// `join`/`try_sum` was asked to combine two identities that both claim
    /// the same point in `[0, 1]`. This cannot happen for stamps produced
    /// purely by the kernel from a common seed; it can happen if a caller
    /// hands back a stamp that was not actually forked from the other.
    #[error("overlapping identifiers: both operands claim the same region")]
    OverlappingIds,

    /// Textual or binary input did not match the grammar.
    #[error("malformed input at position {position}: {message}")]
    Malformed {
        /// Byte offset (text) or node index (binary) where parsing failed.
        position: usize,
        /// Human-readable reason.
        message: String,
    },

    /// An event-tree leaf value arrived negative. Only reachable from the
    /// `serde` boundary, since the textual grammar has no minus sign and
    /// the binary varint encoding is unsigned.
    #[error("invalid event-tree leaf value: {0} is negative")]
    InvalidLeafValue(i64),
}

impl Error {
    pub(crate) fn malformed(position: usize, message: impl Into<String>) -> Error {
        Error::Malformed {
            position,
            message: message.into(),
        }
    }
}

/// Convenience alias for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
