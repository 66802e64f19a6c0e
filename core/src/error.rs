//! Error types for serial issuance and lifecycle operations.

use thiserror::Error;

/// Result type alias for serial operations.
pub type Result<T> = std::result::Result<T, SerialError>;

/// A single malformed entry in a batch cancellation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatViolation {
    /// Zero-based position of the offending entry in the request list.
    pub index: usize,
    /// The offending value as submitted.
    pub value: String,
}

/// Error taxonomy for the serial engine.
///
/// Validation failures (`DuplicateActivity`, `ActivityNotFound`, the two
/// window variants, `InvalidFormat`) are detected before any mutation and
/// abort the whole call with no partial effect. Lifecycle conflicts are
/// produced by guarded state transitions after row locks are held. Storage
/// failures roll the enclosing transaction back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerialError {
    // ═══════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════

    /// The external activity id already exists.
    #[error("activity unique id already exists: {unique_id}")]
    DuplicateActivity {
        /// The duplicate external key.
        unique_id: String,
    },

    /// No activity carries this external id.
    #[error("activity not found: {unique_id}")]
    ActivityNotFound {
        /// The unknown external key.
        unique_id: String,
    },

    /// The validity window ends before it starts.
    #[error("validity window ends before it starts")]
    WindowEndBeforeStart,

    /// The validity window ends in the past, so every serial issued under it
    /// would be born expired.
    #[error("validity window ends in the past")]
    WindowEndInPast,

    /// One or more submitted codes are not exactly 8 characters after
    /// trimming. Rejects the whole batch before any locking.
    #[error("malformed serial code(s) in request")]
    InvalidFormat {
        /// Every offending entry, in request order.
        violations: Vec<FormatViolation>,
    },

    // ═══════════════════════════════════════════════════════════
    // Lifecycle Conflicts
    // ═══════════════════════════════════════════════════════════

    /// No serial carries this code.
    #[error("serial not found")]
    SerialNotFound,

    /// The serial was already redeemed; redemption is at-most-once.
    #[error("serial already redeemed")]
    AlreadyRedeemed,

    /// The serial was cancelled and can no longer be redeemed.
    #[error("serial already cancelled")]
    AlreadyCancelled,

    /// The current instant precedes the serial's window start.
    #[error("serial not yet valid")]
    NotYetValid,

    /// The current instant is at or past the serial's window end.
    #[error("serial expired")]
    Expired,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// The code generator ran out of draw attempts before reaching the
    /// requested count. Indicates a namespace close to exhaustion.
    #[error("code namespace exhausted after {attempts} draw attempts")]
    CodespaceExhausted {
        /// Number of draws spent before giving up.
        attempts: u32,
    },

    /// Storage operation failed. The enclosing transaction rolls back.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal invariant failure (should not be exposed to users).
    #[error("internal error")]
    Internal,
}

impl SerialError {
    /// Returns `true` if this error was detected by pre-mutation request
    /// validation (no row lock was taken, no state changed).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateActivity { .. }
                | Self::ActivityNotFound { .. }
                | Self::WindowEndBeforeStart
                | Self::WindowEndInPast
                | Self::InvalidFormat { .. }
        )
    }

    /// Returns `true` if this error is a per-serial lifecycle conflict
    /// observed under a row lock.
    #[must_use]
    pub const fn is_lifecycle_conflict(&self) -> bool {
        matches!(
            self,
            Self::SerialNotFound
                | Self::AlreadyRedeemed
                | Self::AlreadyCancelled
                | Self::NotYetValid
                | Self::Expired
        )
    }
}
