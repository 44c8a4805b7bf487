//! AxonSync - Distributed Data-Parallel Training Runtime
//!
//! AxonSync coordinates independent worker processes training a shared
//! model by averaging their gradients after every step. The pieces:
//!
//! - **Rendezvous** (`axonsync-collective`): rank 0 hosts a key/value
//!   store; ranks discover each other and agree on the world size before
//!   any collective traffic flows.
//! - **Process group** (`axonsync-collective`): owns membership and
//!   issues asynchronous all-reduce collectives through a pluggable
//!   backend (TCP ring or in-process threads).
//! - **Distributed sampler** (`axonsync-data`): deterministic, disjoint
//!   per-rank dataset partitions with no cross-rank coordination.
//! - **Trainer** (this crate): the synchronous per-step protocol
//!   (forward, backward, per-parameter all-reduce, average, optimize),
//!   with rank 0 running the final evaluation pass.
//!
//! # Example
//!
//! ```ignore
//! use axonsync::prelude::*;
//!
//! let config = RunConfig::new("10.0.0.1", 29500, world_size, rank).validate()?;
//! let store = TcpStore::client(config.rendezvous_endpoint());
//! let group = ProcessGroup::connect(&config, &store)?;
//!
//! let model = Mlp::new(features, hidden, classes, 0);
//! let optimizer = SGD::new(model.parameters(), 1e-2);
//! let mut trainer = Trainer::new(model, optimizer, group, TrainSettings::new());
//! trainer.fit(&train_dataset)?;
//! trainer.evaluate(&test_dataset)?;
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Runtime allowances
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

// =============================================================================
// Module Declarations
// =============================================================================

pub mod trainer;

// =============================================================================
// Re-exports
// =============================================================================

pub use axonsync_collective as collective;
pub use axonsync_data as data;
pub use axonsync_nn as nn;
pub use axonsync_optim as optim;

pub use axonsync_core::{BackendKind, Buffer, DeviceAffinity, Error, Result, RunConfig};
pub use trainer::{EpochStats, EvalReport, TrainSettings, Trainer};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for distributed training.
pub mod prelude {
    pub use crate::trainer::{EpochStats, EvalReport, TrainSettings, Trainer};
    pub use axonsync_collective::{
        Backend, LocalBackend, ProcessGroup, ReduceOp, SocketBackend, Store, TcpStore, WorkHandle,
        WorkStatus,
    };
    pub use axonsync_core::{
        buffer_from_vec, zero_buffer, BackendKind, Buffer, DeviceAffinity, Error, Result,
        RunConfig,
    };
    pub use axonsync_data::{
        Batch, DataLoader, Dataset, DistributedSampler, InMemoryDataset, Sampler,
        SequentialSampler, SyntheticClassification,
    };
    pub use axonsync_nn::{correct_predictions, cross_entropy, Linear, Mlp, Model, Parameter};
    pub use axonsync_optim::{Optimizer, ParamState, SGD};
}
