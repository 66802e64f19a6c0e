//! Domain types for activities and serials.
//!
//! An **activity** is a time-bounded issuance campaign. Each activity owns a
//! set of **serials**, single-use 8-character redemption codes. Serial
//! validity windows are snapshots taken at issuance time: replacing an
//! activity's window on a later top-up never touches serials that were
//! already issued.

use chrono::{DateTime, Utc};

/// Surrogate identifier for an activity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(pub i64);

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surrogate identifier for a serial row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SerialId(pub i64);

impl std::fmt::Display for SerialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Length of every serial code: one uppercase letter plus seven digits.
pub const CODE_LEN: usize = 8;

/// A serial code as it is stored and compared: trimmed, ASCII-uppercased.
///
/// Construction through [`SerialCode::normalized`] guarantees casing and
/// whitespace never affect lookups. Normalization does **not** enforce the
/// `[A-Z][0-9]{7}` shape; a caller-supplied code that never existed simply
/// fails lookup downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SerialCode(String);

impl SerialCode {
    /// Normalize raw caller input: trim surrounding whitespace, uppercase.
    #[must_use]
    pub fn normalized(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    /// The normalized code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether this code has the generated shape: one uppercase ASCII
    /// letter followed by exactly seven ASCII digits.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let bytes = self.0.as_bytes();
        bytes.len() == CODE_LEN
            && bytes[0].is_ascii_uppercase()
            && bytes[1..].iter().all(u8::is_ascii_digit)
    }
}

impl std::fmt::Display for SerialCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a serial.
///
/// Transitions are one-directional: `Unused → Redeemed` and
/// `Unused → Cancelled`. `Redeemed` and `Cancelled` are absorbing: there
/// is no way back to `Unused` and no transition between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialStatus {
    /// Issued and never consumed.
    Unused,
    /// Consumed exactly once by a redeem call.
    Redeemed,
    /// Administratively invalidated before use.
    Cancelled,
}

impl SerialStatus {
    /// Storage representation (matches the persisted status column).
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Unused => 0,
            Self::Redeemed => 1,
            Self::Cancelled => 2,
        }
    }

    /// Decode the storage representation; `None` for unknown values.
    #[must_use]
    pub const fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::Unused),
            1 => Some(Self::Redeemed),
            2 => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Half-open validity range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    /// First instant at which redemption is allowed.
    pub start: DateTime<Utc>,
    /// First instant at which redemption is no longer allowed.
    pub end: DateTime<Utc>,
}

impl ValidityWindow {
    /// Create a window. No ordering is enforced here; the engines validate
    /// ordering against their own rules before persisting anything.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `instant` falls inside the half-open range.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// A persisted activity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    /// Surrogate id.
    pub id: ActivityId,
    /// Caller-supplied external key, globally unique, immutable.
    pub unique_id: String,
    /// Display name.
    pub name: String,
    /// Current validity window; replaced wholesale by quota top-ups.
    pub window: ValidityWindow,
    /// Cumulative number of serials ever issued. Monotonically
    /// non-decreasing: the sum of the initial batch and every top-up.
    pub quota: u32,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for a new activity.
#[derive(Debug, Clone)]
pub struct NewActivity {
    /// Caller-supplied external key.
    pub unique_id: String,
    /// Display name.
    pub name: String,
    /// Initial validity window.
    pub window: ValidityWindow,
    /// Initial quota.
    pub quota: u32,
    /// Creation instant (also stamps `updated_at`).
    pub created_at: DateTime<Utc>,
}

/// A persisted serial record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Serial {
    /// Surrogate id.
    pub id: SerialId,
    /// Owning activity, immutable for the lifetime of the serial.
    pub activity_id: ActivityId,
    /// Globally unique code.
    pub code: SerialCode,
    /// Lifecycle status.
    pub status: SerialStatus,
    /// Optional note, set at issuance (top-up reason) or at cancellation.
    pub note: Option<String>,
    /// Snapshot of the issuing batch's window.
    pub window: ValidityWindow,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for a freshly allocated serial.
#[derive(Debug, Clone)]
pub struct NewSerial {
    /// Owning activity.
    pub activity_id: ActivityId,
    /// Generated code.
    pub code: SerialCode,
    /// Optional issuance note.
    pub note: Option<String>,
    /// Window snapshot copied from the issuing batch.
    pub window: ValidityWindow,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}
