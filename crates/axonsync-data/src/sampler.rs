//! Samplers - Data Access Patterns
//!
//! Provides index samplers, including the distributed sampler that
//! partitions a dataset across ranks without any cross-rank coordination.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use axonsync_core::{Error, Result};

// =============================================================================
// Sampler Trait
// =============================================================================

/// Trait for all samplers.
///
/// A sampler generates indices that define the order of data access.
pub trait Sampler: Send + Sync {
    /// Returns the number of samples.
    fn len(&self) -> usize;

    /// Returns true if empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates an iterator over indices.
    fn iter(&self) -> Box<dyn Iterator<Item = usize> + '_>;
}

// =============================================================================
// SequentialSampler
// =============================================================================

/// Samples elements sequentially.
pub struct SequentialSampler {
    len: usize,
}

impl SequentialSampler {
    /// Creates a new `SequentialSampler`.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Sampler for SequentialSampler {
    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(0..self.len)
    }
}

// =============================================================================
// DistributedSampler
// =============================================================================

/// Deterministically partitions `[0, total_size)` across ranks.
///
/// Every rank independently derives the same permutation of the full index
/// range from `(seed, epoch)`, then slices its own contiguous
/// `1/world_size` fraction, so disjointness needs no communication. The
/// remainder `total_size % world_size` indices are dropped so every rank
/// sees exactly the same number of samples per epoch.
///
/// The same `(seed, epoch)` pair always reproduces the same sequence,
/// which makes training runs replayable for debugging.
pub struct DistributedSampler {
    total_size: usize,
    world_size: usize,
    rank: usize,
    shuffle: bool,
    seed: u64,
    epoch: u64,
}

impl DistributedSampler {
    /// Creates a sampler for one rank's share of the dataset.
    pub fn new(
        total_size: usize,
        world_size: usize,
        rank: usize,
        shuffle: bool,
        seed: u64,
    ) -> Result<Self> {
        if world_size == 0 {
            return Err(Error::config("world size must be at least 1"));
        }
        if rank >= world_size {
            return Err(Error::InvalidRank { rank, world_size });
        }
        Ok(Self {
            total_size,
            world_size,
            rank,
            shuffle,
            seed,
            epoch: 0,
        })
    }

    /// Sets the epoch used to derive the shuffle permutation.
    ///
    /// Must be called with the same value on every rank before iterating,
    /// otherwise the ranks' partitions are no longer slices of one shared
    /// permutation.
    pub fn set_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    /// Returns the current epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns the number of samples per rank, `total_size / world_size`.
    #[must_use]
    pub fn num_samples(&self) -> usize {
        self.total_size / self.world_size
    }

    /// Computes this rank's index sequence for the current epoch.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        let per_rank = self.num_samples();
        let start = self.rank * per_rank;
        if self.shuffle {
            let mut permutation: Vec<usize> = (0..self.total_size).collect();
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.epoch));
            permutation.shuffle(&mut rng);
            permutation[start..start + per_rank].to_vec()
        } else {
            (start..start + per_rank).collect()
        }
    }
}

impl Sampler for DistributedSampler {
    fn len(&self) -> usize {
        self.num_samples()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(self.indices().into_iter())
    }
}

// =============================================================================
// Tests
// =============================================================================
