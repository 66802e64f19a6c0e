//! Mock implementations for testing.
//!
//! [`MemoryStore`] is an in-memory [`Store`](crate::store::Store) whose
//! transactions hold the whole store under one async mutex, coarser than a
//! database's row locks, but it gives tests the same guarantees the
//! contract asks for: transactions are serialized, a second `*_for_update`
//! blocks until the first transaction ends, and uncommitted transactions
//! roll back. [`FixedClock`] makes time-dependent guards deterministic.

pub mod clock;
pub mod memory;

pub use clock::FixedClock;
pub use memory::{MemoryStore, MemoryTx};
