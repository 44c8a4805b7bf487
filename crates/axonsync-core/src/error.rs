//! Error Types - AxonSync Core Error Handling
//!
//! Provides the unified error type for the AxonSync runtime: group
//! formation failures, collective transport failures, and configuration
//! problems.
//!
//! # Key Features
//! - One error type shared across the workspace
//! - Cloneable, so work handles can re-surface the same failure on
//!   every `wait` call
//! - Integration with `std::error::Error` via `thiserror`
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// The main error type for AxonSync operations.
///
/// Formation-time variants (`Rendezvous`, `WorldSizeMismatch`,
/// `InvalidRank`, `Config`) are fatal and terminate the process before
/// training starts. `Transport` and `CollectiveTimeout` are surfaced
/// through work handles and handled at the synchronization barrier.
/// `ShapeMismatch` is always fatal: a mismatched buffer must never be
/// silently summed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A rendezvous key never appeared within the bounded wait window.
    #[error("rendezvous timed out waiting for key `{key}` after {waited:?}")]
    Rendezvous {
        /// The key that never appeared.
        key: String,
        /// How long the caller waited.
        waited: Duration,
    },

    /// The ranks disagree on the size of the group.
    #[error("world size mismatch: rank 0 published {expected}, this rank was configured with {actual}")]
    WorldSizeMismatch {
        /// World size published by rank 0.
        expected: usize,
        /// World size this rank was configured with.
        actual: usize,
    },

    /// A rank outside `[0, world_size)`.
    #[error("invalid rank {rank} for world size {world_size}")]
    InvalidRank {
        /// The offending rank.
        rank: usize,
        /// The size of the group.
        world_size: usize,
    },

    /// Buffers across ranks disagree in element count.
    #[error("shape mismatch in collective: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        /// Element count established by the first contribution.
        expected: usize,
        /// Element count of the disagreeing contribution.
        actual: usize,
    },

    /// A backend-level send/receive failure during a collective.
    #[error("collective transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// A bounded wait on a work handle elapsed before the handle resolved.
    #[error("collective did not complete within {waited:?}")]
    CollectiveTimeout {
        /// How long the caller waited.
        waited: Duration,
    },

    /// Invalid or unsupported configuration.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

// =============================================================================
// Result Type
// =============================================================================

/// A specialized Result type for AxonSync operations.
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Helper Functions
// =============================================================================

impl Error {
    /// Creates a new transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new rendezvous timeout error.
    #[must_use]
    pub fn rendezvous(key: impl Into<String>, waited: Duration) -> Self {
        Self::Rendezvous {
            key: key.into(),
            waited,
        }
    }

    /// Returns true if this error is fatal at group-formation time.
    #[must_use]
    pub fn is_formation_fatal(&self) -> bool {
        matches!(
            self,
            Error::Rendezvous { .. }
                | Error::WorldSizeMismatch { .. }
                | Error::InvalidRank { .. }
                | Error::Config { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport {
            message: e.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::rendezvous("rank/1/addr", Duration::from_secs(30));
        assert!(err.to_string().contains("rank/1/addr"));

        let err = Error::ShapeMismatch {
            expected: 10,
            actual: 12,
        };
        assert!(err.to_string().contains("expected 10"));
    }

    #[test]
    fn test_error_equality() {
        let a = Error::transport("connection reset");
        let b = Error::transport("connection reset");
        assert_eq!(a, b);
    }

    #[test]
    fn test_formation_fatal() {
        assert!(Error::config("bad port").is_formation_fatal());
        assert!(Error::InvalidRank {
            rank: 4,
            world_size: 4
        }
        .is_formation_fatal());
        assert!(!Error::transport("broken pipe").is_formation_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: Error = io.into();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
