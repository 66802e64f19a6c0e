//! # Serialkit Core
//!
//! Serial allocation and lifecycle state engine: collision-free batch code
//! generation against a shared global namespace, quota accounting across
//! initial and incremental issuance, and a concurrency-safe redeem/cancel
//! state machine with partial-success batch cancellation.
//!
//! ## Components
//!
//! - [`codegen::CodeGenerator`]: mints candidate codes and resolves
//!   collisions against an injected existence check.
//! - [`store::Store`] / [`store::StoreTx`]: the persistence boundary as an
//!   explicit lock-then-mutate-then-commit transaction abstraction.
//! - [`engine::AllocationEngine`]: mints N unique codes for an activity and
//!   persists them atomically.
//! - [`engine::LifecycleEngine`]: the `Unused → Redeemed` /
//!   `Unused → Cancelled` transitions under exclusive row locks.
//! - [`engine::ActivityEngine`]: activity creation and quota top-ups,
//!   delegating code minting to the allocation engine.
//!
//! ## Invariants
//!
//! - Code uniqueness is global across all activities, enforced by the
//!   generator's existence check and backstopped by a storage constraint.
//! - Redemption is at-most-once; `Redeemed` and `Cancelled` are absorbing.
//! - An activity's cumulative quota is monotonically non-decreasing and
//!   equals the sum of all issuance batches.
//! - Serial validity windows are issuance-time snapshots; replacing an
//!   activity's window never rewrites existing serials.

pub mod clock;
pub mod codegen;
pub mod engine;
pub mod error;
pub mod state;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-exports
pub use clock::{Clock, SystemClock};
pub use codegen::CodeGenerator;
pub use engine::{
    ActivityEngine, AddQuota, AllocationEngine, CancelFailure, CancelOutcome, CreateActivity,
    IssuanceReceipt, LifecycleEngine, Redemption,
};
pub use error::{FormatViolation, Result, SerialError};
pub use state::{
    Activity, ActivityId, NewActivity, NewSerial, Serial, SerialCode, SerialId, SerialStatus,
    ValidityWindow,
};
pub use store::{Store, StoreTx};
