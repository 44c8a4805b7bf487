//! AxonSync CLI - Distributed Training Worker
//!
//! The entry point for one rank of a training group. The process:
//! 1. Builds and validates the immutable run configuration
//! 2. Opens the rendezvous store (rank 0 hosts it)
//! 3. Forms the process group over the configured backend
//! 4. Trains its dataset partition for the configured epochs
//! 5. On rank 0, evaluates the held-out set and reports test accuracy
//!
//! Exit status is zero on normal completion; group-formation failures and
//! unrecoverable backend errors exit non-zero.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// CLI-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

use clap::Parser;
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;

use axonsync::prelude::*;
use cli::Cli;
use config::FileConfig;
use error::{CliError, CliResult};

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let run_config = build_run_config(&cli)?;
    info!(
        master = %run_config.rendezvous_addr,
        port = run_config.rendezvous_port,
        world_size = run_config.world_size,
        rank = run_config.rank,
        backend = %run_config.backend,
        device = %run_config.device,
        "starting worker"
    );

    let store: Box<dyn Store> = if run_config.is_main() {
        Box::new(TcpStore::serve(
            run_config.rendezvous_addr.clone(),
            run_config.rendezvous_port,
        )?)
    } else {
        Box::new(TcpStore::client(run_config.rendezvous_endpoint()))
    };
    let group = ProcessGroup::connect(&run_config, store.as_ref())?;

    let settings = TrainSettings::new()
        .epochs(cli.epochs.unwrap_or(file.training.epochs))
        .batch_size(cli.batch_size.unwrap_or(file.training.batch_size))
        .learning_rate(cli.lr.unwrap_or(file.training.learning_rate))
        .seed(cli.seed.unwrap_or(file.training.seed))
        .shuffle(!cli.no_shuffle && file.training.shuffle);

    let train_set = SyntheticClassification::generate(
        file.data.train_size,
        file.data.features,
        file.data.classes,
        settings.seed,
    );
    let test_set = SyntheticClassification::generate(
        file.data.test_size,
        file.data.features,
        file.data.classes,
        settings.seed.wrapping_add(1),
    );

    let model = Mlp::new(
        file.data.features,
        file.data.hidden,
        file.data.classes,
        settings.seed,
    );
    let optimizer = SGD::new(model.parameters(), settings.learning_rate);
    let mut trainer = Trainer::new(model, optimizer, group, settings);

    trainer.fit(&train_set)?;
    if let Some(report) = trainer.evaluate(&test_set)? {
        info!(
            accuracy = %format!("{:.2}%", 100.0 * report.accuracy()),
            "final test accuracy"
        );
    }
    Ok(())
}

fn build_run_config(cli: &Cli) -> CliResult<RunConfig> {
    let backend: BackendKind = cli
        .backend
        .parse()
        .map_err(|e: Error| CliError::InvalidArgument(e.to_string()))?;
    let device: DeviceAffinity = cli
        .device
        .parse()
        .map_err(|e: Error| CliError::InvalidArgument(e.to_string()))?;

    let mut run_config = RunConfig::new(
        cli.master_addr.clone(),
        cli.master_port,
        cli.world_size,
        cli.rank,
    )
    .backend(backend)
    .device(device);
    if let Some(ifname) = &cli.ifname {
        run_config = run_config.interface(ifname.clone());
    }
    Ok(run_config.validate()?)
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
