//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Broadcaster - periodic signal broadcaster for monitoring consumers
#[derive(Parser, Debug)]
#[command(
    name = "broadcaster",
    author,
    version,
    about = "Periodic signal broadcaster",
    long_about = "Broadcasts a declarative catalogue of monitoring signals on a fixed\n\
                  clock tick. Each item carries its own update frequency; due items are\n\
                  published to a STOMP message broker or written through PostgreSQL\n\
                  stored procedures."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BROADCASTER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "BROADCASTER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "BROADCASTER_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Broadcast to a STOMP message broker
    Broker(BrokerArgs),

    /// Broadcast through PostgreSQL stored procedures
    Database(DatabaseArgs),

    /// Validate catalogue files without broadcasting
    Validate(ValidateArgs),
}

/// Arguments for the `broker` command
#[derive(Parser, Debug, Clone)]
pub struct BrokerArgs {
    /// Broker login
    #[arg(short, long, default_value = "icat", env = "BROKER_USER")]
    pub user: String,

    /// Broker passcode
    #[arg(short, long, default_value = "icat", env = "BROKER_PASS")]
    pub password: String,

    /// Broker address as host:port
    #[arg(short, long, default_value = "localhost:61613", env = "BROKER_ADDR")]
    pub broker: String,

    /// Comma-separated catalogue files (default: all *.json in the
    /// catalogue directory)
    #[arg(short = 'm', long, env = "BROADCASTER_CONTENT_FILES")]
    pub catalogue_files: Option<String>,

    /// Directory scanned for catalogue files when none are given
    #[arg(long, default_value = "services/broker", env = "BROADCASTER_BROKER_DIR")]
    pub catalogue_dir: PathBuf,

    #[command(flatten)]
    pub run: RunControlArgs,
}

/// Arguments for the `database` command
#[derive(Parser, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database user
    #[arg(long, default_value = "postgres", env = "DATABASE_USER")]
    pub user: String,

    /// Database password
    #[arg(long, default_value = "postgres", env = "DATABASE_PASS")]
    pub password: String,

    /// Database host
    #[arg(long, default_value = "localhost", env = "DATABASE_HOST")]
    pub host: String,

    /// Database port
    #[arg(long, default_value = "5432", env = "DATABASE_PORT")]
    pub port: u16,

    /// Database name
    #[arg(long, default_value = "workflow", env = "DATABASE_NAME")]
    pub database_name: String,

    /// Comma-separated catalogue files (default: all *.json in the
    /// catalogue directory)
    #[arg(short = 'f', long, env = "BROADCASTER_PV_FILES")]
    pub catalogue_files: Option<String>,

    /// Directory scanned for catalogue files when none are given
    #[arg(long, default_value = "services/database", env = "BROADCASTER_DATABASE_DIR")]
    pub catalogue_dir: PathBuf,

    #[command(flatten)]
    pub run: RunControlArgs,
}

/// Connection-retry and run-bound options shared by both run variants
#[derive(Parser, Debug, Clone)]
pub struct RunControlArgs {
    /// Connection attempts before failing fatally
    #[arg(long, default_value = "3", env = "BROADCASTER_CONNECT_ATTEMPTS")]
    pub connect_attempts: u32,

    /// Seconds between connection attempts
    #[arg(long, default_value = "5", env = "BROADCASTER_CONNECT_INTERVAL")]
    pub connect_interval: f64,

    /// Stop after this many records (0 = run indefinitely)
    #[arg(long, default_value = "0", env = "BROADCASTER_MAX_RECORDS")]
    pub max_records: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Comma-separated catalogue files (default: all *.json in the
    /// catalogue directories)
    #[arg(short = 'm', long)]
    pub catalogue_files: Option<String>,

    /// Directory scanned for catalogue files (default: every shipped
    /// service directory)
    #[arg(long)]
    pub catalogue_dir: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
