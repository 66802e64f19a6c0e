//! The three engines: allocation, lifecycle, activity.

pub mod activity;
pub mod allocation;
pub mod lifecycle;

pub use activity::{ActivityEngine, AddQuota, CreateActivity, IssuanceReceipt};
pub use allocation::AllocationEngine;
pub use lifecycle::{CancelFailure, CancelOutcome, LifecycleEngine, Redemption};
