//! CLI - Command Line Interface Definitions
//!
//! Defines the worker binary's arguments using clap derive macros. Every
//! group-formation option falls back to the environment variables a
//! launcher typically exports (`MASTER_ADDR`, `MASTER_PORT`, `RANK`,
//! `WORLD_SIZE`, `BACKEND`, `DEVICE`, `SOCKET_IFNAME`).
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::PathBuf;

use clap::Parser;

// =============================================================================
// Main CLI Structure
// =============================================================================

/// AxonSync - distributed data-parallel training worker
#[derive(Parser, Debug)]
#[command(
    name = "axonsync",
    author = "AutomataNexus Development Team",
    version,
    about = "AxonSync worker - joins a training group and trains its partition",
    long_about = "Launch one axonsync process per rank. Rank 0 hosts the rendezvous \
                  store; all ranks discover each other through it, form a process \
                  group, and train synchronously with per-step gradient averaging."
)]
pub struct Cli {
    /// Address of the rendezvous store (rank 0 hosts it)
    #[arg(long, env = "MASTER_ADDR", default_value = "127.0.0.1")]
    pub master_addr: String,

    /// Port of the rendezvous store
    #[arg(long, env = "MASTER_PORT", default_value_t = 29500)]
    pub master_port: u16,

    /// Total number of cooperating ranks
    #[arg(long, env = "WORLD_SIZE", default_value_t = 1)]
    pub world_size: usize,

    /// This process's rank in [0, world_size)
    #[arg(long, env = "RANK", default_value_t = 0)]
    pub rank: usize,

    /// Collective backend: socket | fabric
    #[arg(long, env = "BACKEND", default_value = "socket")]
    pub backend: String,

    /// Device placement: cpu | accelerator
    #[arg(long, env = "DEVICE", default_value = "cpu")]
    pub device: String,

    /// Local address to bind the ring to (default-route auto-selected)
    #[arg(long, env = "SOCKET_IFNAME")]
    pub ifname: Option<String>,

    /// Optional axonsync.toml with training defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of training epochs
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Total batch size across the group
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Learning rate
    #[arg(long)]
    pub lr: Option<f32>,

    /// Shared seed for init and shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable per-epoch shuffling
    #[arg(long)]
    pub no_shuffle: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["axonsync"]).unwrap();
        assert_eq!(cli.master_addr, "127.0.0.1");
        assert_eq!(cli.master_port, 29500);
        assert_eq!(cli.world_size, 1);
        assert_eq!(cli.rank, 0);
        assert_eq!(cli.backend, "socket");
        assert!(!cli.no_shuffle);
    }

    #[test]
    fn test_flags_override() {
        let cli = Cli::try_parse_from([
            "axonsync",
            "--master-addr",
            "10.0.0.1",
            "--world-size",
            "4",
            "--rank",
            "2",
            "--epochs",
            "3",
            "--no-shuffle",
        ])
        .unwrap();
        assert_eq!(cli.master_addr, "10.0.0.1");
        assert_eq!(cli.world_size, 4);
        assert_eq!(cli.rank, 2);
        assert_eq!(cli.epochs, Some(3));
        assert!(cli.no_shuffle);
    }
}
