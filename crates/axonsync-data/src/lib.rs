//! axonsync-data - Data Partitioning and Loading
//!
//! Provides the data side of distributed training:
//! - Dataset trait for defining data sources
//! - `DistributedSampler` for deterministic, disjoint per-rank partitions
//! - `DataLoader` for batched iteration over one rank's partition
//!
//! # Example
//!
//! ```ignore
//! use axonsync_data::prelude::*;
//!
//! let dataset = SyntheticClassification::generate(400, 8, 4, 0);
//! let mut sampler = DistributedSampler::new(dataset.len(), world, rank, true, 0)?;
//! sampler.set_epoch(epoch);
//! for batch in DataLoader::new(&dataset, &sampler, 16).iter() {
//!     // train on batch
//! }
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Data-pipeline allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::iter_without_into_iter)]

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dataloader;
pub mod dataset;
pub mod sampler;

// =============================================================================
// Re-exports
// =============================================================================

pub use dataloader::{Batch, DataLoader, DataLoaderIter};
pub use dataset::{Dataset, InMemoryDataset, SyntheticClassification};
pub use sampler::{DistributedSampler, Sampler, SequentialSampler};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for data loading.
pub mod prelude {
    pub use crate::{
        Batch, DataLoader, DataLoaderIter, Dataset, DistributedSampler, InMemoryDataset, Sampler,
        SequentialSampler, SyntheticClassification,
    };
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rank_sees_same_batch_count() {
        let dataset = SyntheticClassification::generate(403, 8, 4, 0);
        let counts: Vec<usize> = (0..4)
            .map(|rank| {
                let sampler = DistributedSampler::new(dataset.len(), 4, rank, true, 0).unwrap();
                DataLoader::new(&dataset, &sampler, 16).iter().count()
            })
            .collect();
        assert!(counts.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_shuffled_epochs_are_reproducible() {
        let dataset = SyntheticClassification::generate(64, 4, 2, 5);
        let mut sampler = DistributedSampler::new(dataset.len(), 2, 0, true, 5).unwrap();
        sampler.set_epoch(2);
        let first: Vec<Batch> = DataLoader::new(&dataset, &sampler, 8).iter().collect();
        let second: Vec<Batch> = DataLoader::new(&dataset, &sampler, 8).iter().collect();
        assert_eq!(first, second);
    }
}
