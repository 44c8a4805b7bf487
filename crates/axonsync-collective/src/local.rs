//! Local Backend - In-Process Collective Backend
//!
//! Implements the collective contract for a world of threads in one
//! process. Every rank deposits its contribution into shared state, the
//! last arrival reduces, every rank copies the result out, and the last
//! departure resets the round. Rounds are generation-counted so the same
//! backend handles arbitrarily many sequential collectives.
//!
//! Used by the integration tests to drive real multi-rank semantics, and
//! usable as a world-of-threads backend in its own right.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use axonsync_core::{Error, Result};

use crate::backend::{Backend, ReduceOp};

// =============================================================================
// Shared Round State
// =============================================================================

#[derive(Default)]
struct Round {
    expected: Option<usize>,
    acc: Vec<f32>,
    arrived: usize,
    departed: usize,
    error: Option<Error>,
    published: bool,
    generation: u64,
}

struct Shared {
    round: Mutex<Round>,
    cond: Condvar,
    world_size: usize,
}

// =============================================================================
// LocalBackend
// =============================================================================

/// In-process collective backend for a world of threads.
pub struct LocalBackend {
    rank: usize,
    shared: Arc<Shared>,
}

impl LocalBackend {
    /// Creates one backend handle per rank, all joined to the same world.
    #[must_use]
    pub fn create_world(world_size: usize) -> Vec<Self> {
        let shared = Arc::new(Shared {
            round: Mutex::new(Round::default()),
            cond: Condvar::new(),
            world_size,
        });
        (0..world_size)
            .map(|rank| LocalBackend {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Creates a single-rank world.
    #[must_use]
    pub fn single() -> Self {
        LocalBackend::create_world(1).pop().unwrap()
    }
}

impl Backend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.shared.world_size
    }

    fn all_reduce(&self, data: &mut [f32], op: ReduceOp) -> Result<()> {
        let world_size = self.shared.world_size;
        if world_size == 1 {
            return Ok(());
        }

        let mut round = self.shared.round.lock();

        // A published round must fully drain before the next one starts.
        while round.published {
            self.shared.cond.wait(&mut round);
        }

        // Deposit this rank's contribution.
        match round.expected {
            None => {
                round.expected = Some(data.len());
                round.acc = data.to_vec();
            }
            Some(expected) if expected == data.len() => {
                for (acc, &value) in round.acc.iter_mut().zip(data.iter()) {
                    *acc = op.apply(*acc, value);
                }
            }
            Some(expected) => {
                // The round still completes so no rank is left waiting;
                // every participant observes the mismatch.
                round.error = Some(Error::ShapeMismatch {
                    expected,
                    actual: data.len(),
                });
            }
        }

        round.arrived += 1;
        if round.arrived == world_size {
            round.published = true;
            self.shared.cond.notify_all();
        } else {
            while !round.published {
                self.shared.cond.wait(&mut round);
            }
        }

        let outcome = match round.error.clone() {
            Some(error) => Err(error),
            None => {
                data.copy_from_slice(&round.acc);
                Ok(())
            }
        };

        round.departed += 1;
        if round.departed == world_size {
            let generation = round.generation;
            *round = Round::default();
            round.generation = generation + 1;
        }
        self.shared.cond.notify_all();

        outcome
    }

    fn barrier(&self) -> Result<()> {
        self.all_reduce(&mut [], ReduceOp::Sum)
    }
}

// =============================================================================
// Tests
// =============================================================================
