//! Work Handles - Asynchronous Collective Completion
//!
//! A collective call returns immediately with a [`WorkHandle`]; the actual
//! exchange runs on the process group's background worker. Callers block
//! at the synchronization barrier with [`WorkHandle::wait`], which surfaces
//! failure instead of panicking.
//!
//! A handle is terminal once resolved: it never transitions again, and
//! `wait` on a terminal handle returns the same result on every call.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use axonsync_core::{Error, Result};

// =============================================================================
// Work Status
// =============================================================================

/// The state of an in-flight or completed collective.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkStatus {
    /// The collective is enqueued or executing.
    Pending,
    /// The collective completed and the buffer holds the reduced result.
    Succeeded,
    /// The collective failed; the buffer contents are unspecified.
    Failed(Error),
}

impl WorkStatus {
    /// Returns true if the status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkStatus::Pending)
    }
}

// =============================================================================
// Work Handle
// =============================================================================

struct WorkState {
    status: Mutex<WorkStatus>,
    cond: Condvar,
}

/// An asynchronous token for one collective operation.
///
/// Cloning a handle yields another view of the same operation.
#[derive(Clone)]
pub struct WorkHandle {
    state: Arc<WorkState>,
}

impl WorkHandle {
    /// Creates a handle in the pending state.
    #[must_use]
    pub(crate) fn pending() -> Self {
        Self {
            state: Arc::new(WorkState {
                status: Mutex::new(WorkStatus::Pending),
                cond: Condvar::new(),
            }),
        }
    }

    /// Creates an already-succeeded handle for trivially-satisfied calls.
    #[must_use]
    pub fn completed() -> Self {
        Self {
            state: Arc::new(WorkState {
                status: Mutex::new(WorkStatus::Succeeded),
                cond: Condvar::new(),
            }),
        }
    }

    /// Resolves the handle to `Succeeded`. No effect if already terminal.
    pub(crate) fn complete(&self) {
        let mut status = self.state.status.lock();
        if !status.is_terminal() {
            *status = WorkStatus::Succeeded;
            self.state.cond.notify_all();
        }
    }

    /// Resolves the handle to `Failed`. No effect if already terminal.
    pub(crate) fn fail(&self, error: Error) {
        let mut status = self.state.status.lock();
        if !status.is_terminal() {
            *status = WorkStatus::Failed(error);
            self.state.cond.notify_all();
        }
    }

    /// Returns a snapshot of the current status.
    #[must_use]
    pub fn status(&self) -> WorkStatus {
        self.state.status.lock().clone()
    }

    /// Returns true if the handle has resolved.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state.status.lock().is_terminal()
    }

    /// Blocks the calling thread until the handle resolves or the timeout
    /// elapses.
    ///
    /// A timeout leaves the handle pending: the collective may still
    /// resolve later, and a subsequent `wait` will observe it.
    pub fn wait(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut status = self.state.status.lock();
        loop {
            match &*status {
                WorkStatus::Succeeded => return Ok(()),
                WorkStatus::Failed(error) => return Err(error.clone()),
                WorkStatus::Pending => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::CollectiveTimeout { waited: timeout });
                    }
                    self.state.cond.wait_for(&mut status, deadline - now);
                }
            }
        }
    }
}

impl std::fmt::Debug for WorkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkHandle")
            .field("status", &self.status())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_handle_returns_immediately() {
        let handle = WorkHandle::completed();
        assert!(handle.is_completed());
        assert!(handle.wait(Duration::from_millis(1)).is_ok());
    }

    #[test]
    fn test_pending_handle_times_out() {
        let handle = WorkHandle::pending();
        let err = handle.wait(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, Error::CollectiveTimeout { .. }));
        // Still pending; a later completion is observed.
        handle.complete();
        assert!(handle.wait(Duration::from_millis(1)).is_ok());
    }

    #[test]
    fn test_terminal_handle_never_transitions() {
        let handle = WorkHandle::pending();
        handle.fail(Error::transport("broken ring"));
        handle.complete();
        let err = handle.wait(Duration::from_millis(1)).unwrap_err();
        assert_eq!(err, Error::transport("broken ring"));
        // Repeated waits return the same result.
        let err = handle.wait(Duration::from_millis(1)).unwrap_err();
        assert_eq!(err, Error::transport("broken ring"));
    }

    #[test]
    fn test_wait_across_threads() {
        let handle = WorkHandle::pending();
        let resolver = handle.clone();
        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            resolver.complete();
        });
        assert!(handle.wait(Duration::from_secs(5)).is_ok());
        thread.join().unwrap();
    }
}
