//! TypeGraph Command-Line Tool
//!
//! Manage type definitions and convert values against a local store.

mod commands;
mod config;
mod error;
mod formatter;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Args;
use typegraph_core::TypeDefStore;

fn main() {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_env("TYPEGRAPH_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| "typegraph=info,typegraph_core=info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.config();
    tracing::debug!(
        path = %config.data_path.display(),
        temporary = config.temporary,
        "opening store"
    );

    let store = TypeDefStore::open(config.storage_config())?;
    let output = commands::execute(&args.command, &store, config.format);
    store.flush()?;

    println!("{}", output?);
    Ok(())
}
