//! DataLoader - Batched Data Iteration
//!
//! Provides batched iteration over a dataset through a sampler's index
//! sequence. Items are `(features, label)` pairs; a batch stacks the
//! feature vectors row-major and collects the labels.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use crate::dataset::Dataset;
use crate::sampler::Sampler;

// =============================================================================
// Batch Type
// =============================================================================

/// A batch of data from the `DataLoader`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Batched input features, row-major `[size, features]`.
    pub inputs: Vec<f32>,
    /// Batched target class indices.
    pub targets: Vec<usize>,
    /// Number of samples in this batch.
    pub size: usize,
}

impl Batch {
    /// Returns the batch size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

// =============================================================================
// DataLoader
// =============================================================================

/// Batched iteration over a dataset through a sampler.
///
/// The sampler decides which indices this loader visits and in what
/// order; a rank-bound distributed sampler makes the loader serve exactly
/// one rank's partition.
pub struct DataLoader<'a, D, S>
where
    D: Dataset<Item = (Vec<f32>, usize)>,
    S: Sampler,
{
    dataset: &'a D,
    sampler: &'a S,
    batch_size: usize,
    drop_last: bool,
}

impl<'a, D, S> DataLoader<'a, D, S>
where
    D: Dataset<Item = (Vec<f32>, usize)>,
    S: Sampler,
{
    /// Creates a new `DataLoader` with the specified batch size.
    #[must_use]
    pub fn new(dataset: &'a D, sampler: &'a S, batch_size: usize) -> Self {
        Self {
            dataset,
            sampler,
            batch_size,
            drop_last: false,
        }
    }

    /// Sets whether to drop the last incomplete batch.
    #[must_use]
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// Returns the batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the number of batches per epoch.
    #[must_use]
    pub fn len(&self) -> usize {
        let total = self.sampler.len();
        if self.drop_last {
            total / self.batch_size
        } else {
            total.div_ceil(self.batch_size)
        }
    }

    /// Returns true if the loader yields no batches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates an iterator over batches for the sampler's current epoch.
    #[must_use]
    pub fn iter(&self) -> DataLoaderIter<'_, D> {
        DataLoaderIter {
            dataset: self.dataset,
            indices: self.sampler.iter().collect(),
            batch_size: self.batch_size,
            drop_last: self.drop_last,
            position: 0,
        }
    }
}

// =============================================================================
// DataLoaderIter
// =============================================================================

/// Iterator over batches from a `DataLoader`.
pub struct DataLoaderIter<'a, D>
where
    D: Dataset<Item = (Vec<f32>, usize)>,
{
    dataset: &'a D,
    indices: Vec<usize>,
    batch_size: usize,
    drop_last: bool,
    position: usize,
}

impl<D> Iterator for DataLoaderIter<'_, D>
where
    D: Dataset<Item = (Vec<f32>, usize)>,
{
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.indices.len() {
            return None;
        }

        let end = (self.position + self.batch_size).min(self.indices.len());
        let slice = &self.indices[self.position..end];
        if slice.len() < self.batch_size && self.drop_last {
            self.position = self.indices.len();
            return None;
        }

        let mut inputs = Vec::new();
        let mut targets = Vec::with_capacity(slice.len());
        for &index in slice {
            let (features, label) = self.dataset.get(index)?;
            inputs.extend_from_slice(&features);
            targets.push(label);
        }

        self.position = end;
        Some(Batch {
            size: targets.len(),
            inputs,
            targets,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
