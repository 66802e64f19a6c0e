//! Collision-free serial code generation.
//!
//! Codes are one uppercase ASCII letter followed by seven zero-padded
//! decimal digits: 26 × 10,000,000 ≈ 260M possible codes shared globally
//! across all activities.

use crate::error::{Result, SerialError};
use crate::state::SerialCode;
use rand::Rng;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use tracing::debug;

/// Total draw budget per `generate` call. A draw is one random candidate,
/// whether or not it survives deduplication. Exceeding the budget fails
/// with [`SerialError::CodespaceExhausted`] instead of spinning against a
/// near-full namespace.
pub const MAX_DRAW_ATTEMPTS: u32 = 1_000_000;

/// Batch code generator with an explicit entropy source.
///
/// The source is injected rather than global so tests can seed it (e.g.
/// `StdRng::seed_from_u64`) and replay exact draw sequences. It sits behind
/// a mutex because engine callers share the generator across request
/// tasks; the lock is only held during synchronous draw loops, never
/// across an await point.
#[derive(Debug)]
pub struct CodeGenerator<R> {
    rng: Mutex<R>,
}

impl<R: Rng + Send> CodeGenerator<R> {
    /// Create a generator over the given entropy source.
    pub const fn new(rng: R) -> Self {
        Self { rng: Mutex::new(rng) }
    }

    /// Produce exactly `count` unique codes that do not collide with any
    /// code the `check` capability reports as already persisted.
    ///
    /// Algorithm:
    /// 1. draw `count` candidates into a deduplicating set (intra-batch
    ///    collisions are retried by continuing the draw loop);
    /// 2. query `check` once with the full candidate set;
    /// 3. discard persisted collisions;
    /// 4. redraw single candidates against the still-known existing set,
    ///    without re-querying, until the set reaches `count` again.
    ///
    /// The returned codes preserve draw order.
    ///
    /// # Errors
    ///
    /// - [`SerialError::CodespaceExhausted`] if the call's draw budget runs
    ///   out before `count` unique codes are found.
    /// - Any error from the `check` capability.
    /// - [`SerialError::Internal`] if the entropy lock is poisoned.
    pub async fn generate<F, Fut>(&self, count: u32, check: F) -> Result<Vec<SerialCode>>
    where
        F: FnOnce(Vec<SerialCode>) -> Fut + Send,
        Fut: Future<Output = Result<HashSet<SerialCode>>> + Send,
    {
        let target = count as usize;
        if target == 0 {
            return Ok(Vec::new());
        }

        let mut attempts: u32 = 0;
        let mut picked: Vec<SerialCode> = Vec::with_capacity(target);
        let mut seen: HashSet<SerialCode> = HashSet::with_capacity(target);

        {
            let mut rng = self.rng.lock().map_err(|_| SerialError::Internal)?;
            while picked.len() < target {
                let code = Self::draw(&mut *rng, &mut attempts)?;
                if seen.insert(code.clone()) {
                    picked.push(code);
                }
            }
        }

        let persisted = check(picked.clone()).await?;

        if !persisted.is_empty() {
            let collisions = picked.len();
            picked.retain(|code| !persisted.contains(code));
            let collisions = collisions - picked.len();
            debug!(collisions, "candidate codes already persisted, redrawing");

            let mut rng = self.rng.lock().map_err(|_| SerialError::Internal)?;
            while picked.len() < target {
                let code = Self::draw(&mut *rng, &mut attempts)?;
                if persisted.contains(&code) || !seen.insert(code.clone()) {
                    continue;
                }
                picked.push(code);
            }
        }

        debug!(count, attempts, "generated serial codes");
        Ok(picked)
    }

    fn draw(rng: &mut R, attempts: &mut u32) -> Result<SerialCode> {
        *attempts += 1;
        if *attempts > MAX_DRAW_ATTEMPTS {
            return Err(SerialError::CodespaceExhausted { attempts: *attempts });
        }
        let letter = char::from(b'A' + rng.gen_range(0..26u8));
        let digits = rng.gen_range(0..10_000_000u32);
        Ok(SerialCode::normalized(&format!("{letter}{digits:07}")))
    }
}
