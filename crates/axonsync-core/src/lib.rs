//! axonsync-core - Core Types for AxonSync
//!
//! Foundation crate for the AxonSync distributed training runtime:
//! - Unified error type shared by every crate in the workspace
//! - The `Buffer` type for numeric data mutated in place by collectives
//! - The immutable `RunConfig` describing one rank's view of the world
//!
//! Every other `axonsync-*` crate builds on these types; nothing in here
//! performs communication or training itself.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// ML/runtime-specific allowances
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

// =============================================================================
// Module Declarations
// =============================================================================

pub mod buffer;
pub mod config;
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

pub use buffer::{buffer_from_vec, zero_buffer, Buffer};
pub use config::{BackendKind, DeviceAffinity, RunConfig};
pub use error::{Error, Result};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for AxonSync crates.
pub mod prelude {
    pub use crate::{
        buffer_from_vec, zero_buffer, BackendKind, Buffer, DeviceAffinity, Error, Result,
        RunConfig,
    };
}
