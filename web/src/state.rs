//! Application state shared across HTTP handlers.

use rand::Rng;
use serialkit_core::{ActivityEngine, Clock, LifecycleEngine, Store};
use std::sync::Arc;

/// Engines shared by every handler.
///
/// Generic over the store, clock, and entropy source so the same router
/// serves production (Postgres, system clock) and tests (in-memory store,
/// fixed clock).
pub struct AppState<S, C, R> {
    /// Issuance: activity creation and quota top-ups.
    pub activities: Arc<ActivityEngine<S, C, R>>,
    /// Redemption and cancellation.
    pub lifecycle: Arc<LifecycleEngine<S, C>>,
}

// Manual impl: `#[derive(Clone)]` would demand `R: Clone`, but the engine
// is only ever shared through the `Arc`.
impl<S, C, R> Clone for AppState<S, C, R> {
    fn clone(&self) -> Self {
        Self {
            activities: Arc::clone(&self.activities),
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }
}

impl<S, C, R> AppState<S, C, R>
where
    S: Store + Clone,
    C: Clock + Clone,
    R: Rng + Send,
{
    /// Build the shared state, wiring both engines to the same store and
    /// clock.
    pub fn new(store: S, clock: C, rng: R) -> Self {
        Self {
            activities: Arc::new(ActivityEngine::new(store.clone(), clock.clone(), rng)),
            lifecycle: Arc::new(LifecycleEngine::new(store, clock)),
        }
    }
}
