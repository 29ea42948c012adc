//! CLI configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use typegraph_core::StorageConfig;

use crate::formatter::OutputFormat;

/// Default data directory.
pub const DEFAULT_DATA_PATH: &str = "./typegraph_data";

/// Default page cache size in megabytes.
pub const DEFAULT_CACHE_MB: u64 = 256;

/// Default background flush interval in milliseconds.
pub const DEFAULT_FLUSH_MS: u64 = 500;

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path to the store directory.
    pub data_path: PathBuf,

    /// Use a throwaway store that is removed on exit.
    pub temporary: bool,

    /// Page cache size in bytes.
    pub cache_capacity: u64,

    /// Background flush interval. None flushes only on exit.
    pub flush_every: Option<Duration>,

    /// Output format for listings.
    pub format: OutputFormat,
}

impl CliConfig {
    /// Create a configuration for the store at `data_path`.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            temporary: false,
            cache_capacity: DEFAULT_CACHE_MB * 1024 * 1024,
            flush_every: Some(Duration::from_millis(DEFAULT_FLUSH_MS)),
            format: OutputFormat::Json,
        }
    }

    /// Use a temporary store.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// Set the page cache size in bytes.
    pub fn with_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Set the flush interval.
    pub fn with_flush_every(mut self, interval: Duration) -> Self {
        self.flush_every = Some(interval);
        self
    }

    /// Disable background flushing.
    pub fn without_background_flush(mut self) -> Self {
        self.flush_every = None;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Storage configuration for the store.
    pub fn storage_config(&self) -> StorageConfig {
        let config = if self.temporary {
            StorageConfig::temporary()
        } else {
            StorageConfig::new(&self.data_path)
        };
        config
            .with_cache_capacity(self.cache_capacity)
            .with_flush_every_ms(self.flush_every.map(|d| d.as_millis() as u64))
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_PATH)
    }
}

/// TypeGraph command-line tool.
#[derive(Parser, Debug)]
#[command(name = "typegraph")]
#[command(version, about = "Manage TypeGraph type definitions", long_about = None)]
pub struct Args {
    /// Path to the store directory.
    #[arg(short, long, default_value = DEFAULT_DATA_PATH, global = true)]
    pub data_path: PathBuf,

    /// Use a temporary store (nothing is kept).
    #[arg(long, global = true)]
    pub temporary: bool,

    /// Page cache size in megabytes.
    #[arg(long, default_value_t = DEFAULT_CACHE_MB, global = true)]
    pub cache_mb: u64,

    /// Flush interval in milliseconds. Set to 0 to flush only on exit.
    #[arg(long, default_value_t = DEFAULT_FLUSH_MS, global = true)]
    pub flush_ms: u64,

    /// Output format for listings.
    #[arg(long, default_value = "json", value_enum, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Manage type definitions.
    #[command(subcommand)]
    Types(TypesCommand),

    /// Convert values between the legacy and current models.
    #[command(subcommand)]
    Convert(ConvertCommand),
}

/// Type definition commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TypesCommand {
    /// Create every definition in a types bundle file.
    Create {
        /// Types bundle JSON file.
        file: PathBuf,
    },
    /// Update every definition in a types bundle file.
    Update {
        /// Types bundle JSON file.
        file: PathBuf,
    },
    /// Delete every definition named in a types bundle file.
    Delete {
        /// Types bundle JSON file.
        file: PathBuf,
    },
    /// List definitions, optionally filtered.
    List {
        /// Category to include (repeatable).
        #[arg(long = "type")]
        categories: Vec<String>,
        /// Exact name.
        #[arg(long)]
        name: Option<String>,
        /// Name substring.
        #[arg(long)]
        name_contains: Option<String>,
        /// Only definitions inheriting from this type.
        #[arg(long)]
        supertype: Option<String>,
        /// Only definitions not inheriting from this type.
        #[arg(long)]
        not_supertype: Option<String>,
    },
    /// Show one definition.
    Get {
        /// Definition name.
        name: String,
    },
}

/// Conversion commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConvertCommand {
    /// Convert a legacy value to the current model.
    ToCurrent {
        /// Declared type of the value.
        #[arg(long = "type")]
        type_name: String,
        /// Value JSON file.
        file: PathBuf,
    },
    /// Convert a current value to the legacy model.
    ToLegacy {
        /// Declared type of the value.
        #[arg(long = "type")]
        type_name: String,
        /// Value JSON file.
        file: PathBuf,
    },
}

impl Args {
    /// Resolve the global options into a configuration.
    pub fn config(&self) -> CliConfig {
        let mut config = CliConfig::new(&self.data_path)
            .with_cache_capacity(self.cache_mb * 1024 * 1024)
            .with_format(self.format);
        if self.temporary {
            config = config.temporary();
        }
        if self.flush_ms == 0 {
            config = config.without_background_flush();
        } else {
            config = config.with_flush_every(Duration::from_millis(self.flush_ms));
        }
        config
    }
}
