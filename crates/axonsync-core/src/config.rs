//! Run Configuration - One Rank's View of the World
//!
//! The immutable configuration object constructed once at startup and
//! passed by reference into every component. There are no ambient
//! process-wide globals: rank, world size, backend choice, and device
//! placement all live here.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Backend Kind
// =============================================================================

/// Which collective backend a rank should use.
///
/// Decided once at startup from configuration, never mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Socket-based ring collective over TCP.
    Socket,
    /// Accelerator-fabric collective (requires an accelerator runtime).
    Fabric,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "socket" => Ok(BackendKind::Socket),
            "fabric" => Ok(BackendKind::Fabric),
            other => Err(Error::config(format!(
                "unknown backend `{other}` (expected `socket` or `fabric`)"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Socket => write!(f, "socket"),
            BackendKind::Fabric => write!(f, "fabric"),
        }
    }
}

// =============================================================================
// Device Affinity
// =============================================================================

/// Where a rank's buffers live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceAffinity {
    /// Host memory.
    Cpu,
    /// Accelerator memory.
    Accelerator,
}

impl FromStr for DeviceAffinity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(DeviceAffinity::Cpu),
            "accelerator" => Ok(DeviceAffinity::Accelerator),
            other => Err(Error::config(format!(
                "unknown device `{other}` (expected `cpu` or `accelerator`)"
            ))),
        }
    }
}

impl fmt::Display for DeviceAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceAffinity::Cpu => write!(f, "cpu"),
            DeviceAffinity::Accelerator => write!(f, "accelerator"),
        }
    }
}

// =============================================================================
// RunConfig
// =============================================================================

/// Immutable per-rank run configuration.
///
/// Built once at startup, validated, and shared by reference with every
/// component for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Host or address of the rendezvous store (rank 0 binds it).
    pub rendezvous_addr: String,
    /// Port of the rendezvous store.
    pub rendezvous_port: u16,
    /// Total number of cooperating ranks. Fixed at group formation.
    pub world_size: usize,
    /// This process's rank in `[0, world_size)`.
    pub rank: usize,
    /// Collective backend to construct.
    pub backend: BackendKind,
    /// Device placement for buffers.
    pub device: DeviceAffinity,
    /// Optional local address to bind the socket backend to.
    ///
    /// When absent, the default-route interface is auto-selected.
    pub interface: Option<String>,
}

impl RunConfig {
    /// Creates a configuration with CPU device and socket backend defaults.
    #[must_use]
    pub fn new(rendezvous_addr: impl Into<String>, rendezvous_port: u16, world_size: usize, rank: usize) -> Self {
        Self {
            rendezvous_addr: rendezvous_addr.into(),
            rendezvous_port,
            world_size,
            rank,
            backend: BackendKind::Socket,
            device: DeviceAffinity::Cpu,
            interface: None,
        }
    }

    /// Builder method to set the backend kind.
    #[must_use]
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Builder method to set the device affinity.
    #[must_use]
    pub fn device(mut self, device: DeviceAffinity) -> Self {
        self.device = device;
        self
    }

    /// Builder method to set the interface hint.
    #[must_use]
    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Returns the rendezvous endpoint as `addr:port`.
    #[must_use]
    pub fn rendezvous_endpoint(&self) -> String {
        format!("{}:{}", self.rendezvous_addr, self.rendezvous_port)
    }

    /// Returns true if this rank is the main process (rank 0).
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.rank == 0
    }

    /// Validates the configuration and normalizes device placement.
    ///
    /// A fabric backend always implies accelerator placement, so the
    /// device field is promoted when necessary.
    pub fn validate(mut self) -> Result<Self> {
        if self.world_size == 0 {
            return Err(Error::config("world size must be at least 1"));
        }
        if self.rank >= self.world_size {
            return Err(Error::InvalidRank {
                rank: self.rank,
                world_size: self.world_size,
            });
        }
        if self.rendezvous_port == 0 {
            return Err(Error::config("rendezvous port must be non-zero"));
        }
        if self.backend == BackendKind::Fabric {
            self.device = DeviceAffinity::Accelerator;
        }
        Ok(self)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("socket".parse::<BackendKind>().unwrap(), BackendKind::Socket);
        assert_eq!("FABRIC".parse::<BackendKind>().unwrap(), BackendKind::Fabric);
        assert!("gloo".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_device_affinity_parse() {
        assert_eq!("cpu".parse::<DeviceAffinity>().unwrap(), DeviceAffinity::Cpu);
        assert!("tpu".parse::<DeviceAffinity>().is_err());
    }

    #[test]
    fn test_config_validate_ok() {
        let config = RunConfig::new("127.0.0.1", 29500, 4, 3).validate().unwrap();
        assert_eq!(config.rendezvous_endpoint(), "127.0.0.1:29500");
        assert!(!config.is_main());
    }

    #[test]
    fn test_config_rejects_bad_rank() {
        let err = RunConfig::new("127.0.0.1", 29500, 4, 4).validate().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidRank {
                rank: 4,
                world_size: 4
            }
        );
    }

    #[test]
    fn test_config_rejects_empty_world() {
        assert!(RunConfig::new("127.0.0.1", 29500, 0, 0).validate().is_err());
    }

    #[test]
    fn test_fabric_promotes_device() {
        let config = RunConfig::new("127.0.0.1", 29500, 2, 0)
            .backend(BackendKind::Fabric)
            .validate()
            .unwrap();
        assert_eq!(config.device, DeviceAffinity::Accelerator);
    }
}
