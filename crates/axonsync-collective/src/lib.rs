//! axonsync-collective - Group Formation and Collective Communication
//!
//! The distributed synchronization core of AxonSync:
//! - A rendezvous key/value store for discovering the group before any
//!   collective traffic flows
//! - A [`ProcessGroup`] owning membership and issuing asynchronous
//!   all-reduce collectives through a pluggable [`Backend`]
//! - [`WorkHandle`]s that resolve to success or failure and are awaited
//!   at the per-step synchronization barrier
//!
//! # Formation
//!
//! Rank 0 hosts the [`TcpStore`]; every rank publishes its ring endpoint
//! and confirms world-size agreement before the backend is constructed.
//! The store has no role after formation completes.
//!
//! # Backends
//!
//! The group never names a concrete backend type. [`SocketBackend`] moves
//! bytes over a TCP ring; [`LocalBackend`] serves worlds of threads in one
//! process (and all of the integration tests).
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Runtime-specific allowances
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
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::items_after_statements)]

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod local;
pub mod process_group;
pub mod socket;
pub mod store;
pub mod work;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{Backend, ReduceOp};
pub use local::LocalBackend;
pub use process_group::ProcessGroup;
pub use socket::{default_interface_addr, SocketBackend};
pub use store::{Store, TcpStore, FORMATION_TIMEOUT};
pub use work::{WorkHandle, WorkStatus};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for collective communication.
pub mod prelude {
    pub use crate::{
        Backend, LocalBackend, ProcessGroup, ReduceOp, SocketBackend, Store, TcpStore, WorkHandle,
        WorkStatus,
    };
    pub use axonsync_core::{Buffer, Error, Result, RunConfig};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axonsync_core::buffer_from_vec;
    use std::time::Duration;

    #[test]
    fn test_sum_then_average_workflow() {
        // The canonical gradient-averaging protocol: all-reduce the sum,
        // then the consumer divides by the world size.
        let world_size = 4;
        let threads: Vec<_> = ProcessGroup::local_world(world_size)
            .into_iter()
            .map(|group| {
                std::thread::spawn(move || {
                    let contribution = (group.rank() + 1) as f32;
                    let buffer = buffer_from_vec(vec![contribution; 6]);
                    let handle = group.all_reduce(buffer.clone(), ReduceOp::Sum);
                    handle.wait(Duration::from_secs(5)).unwrap();

                    let mut data = buffer.lock();
                    for value in data.iter_mut() {
                        *value /= world_size as f32;
                    }
                    // mean of 1, 2, 3, 4
                    for value in data.iter() {
                        assert!((value - 2.5).abs() < 1e-6);
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
    }

    #[test]
    fn test_per_parameter_handle_collection() {
        // One all-reduce per parameter, all handles awaited afterwards:
        // the shape of the training loop's synchronize step.
        let threads: Vec<_> = ProcessGroup::local_world(2)
            .into_iter()
            .map(|group| {
                std::thread::spawn(move || {
                    let buffers: Vec<_> = (0..3)
                        .map(|i| buffer_from_vec(vec![(group.rank() + i) as f32; 4]))
                        .collect();
                    let handles: Vec<_> = buffers
                        .iter()
                        .map(|b| group.all_reduce(b.clone(), ReduceOp::Sum))
                        .collect();
                    for handle in &handles {
                        handle.wait(Duration::from_secs(5)).unwrap();
                    }
                    for (i, buffer) in buffers.iter().enumerate() {
                        // rank0 contributes i, rank1 contributes i+1
                        let expected = (2 * i + 1) as f32;
                        assert_eq!(*buffer.lock(), vec![expected; 4]);
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
    }
}
