//! logkv benchmark driver
//!
//! Drives CRUD workloads against a file-backed log through the shared
//! client, in two phases:
//!
//! - `load` - populate the log with a fixed key range
//! - `run` - execute a weighted mix of operations over that range

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// logkv benchmark workload driver.
#[derive(Parser)]
#[command(name = "logkv-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the log files
    #[arg(global = true, short, long, default_value = "bench-data")]
    dir: PathBuf,

    /// Name of the log to benchmark against
    #[arg(global = true, long, default_value = "benchmark")]
    log_name: String,

    /// Table name used for every row
    #[arg(global = true, long, default_value = "usertable")]
    table: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the log with sequential rows
    Load {
        /// Number of rows to insert
        #[arg(short, long, default_value = "1000")]
        records: usize,

        /// Fields per row
        #[arg(short, long, default_value = "10")]
        fields: usize,

        /// Bytes per field value
        #[arg(long, default_value = "100")]
        field_len: usize,

        /// Number of loader threads
        #[arg(short, long, default_value = "1")]
        threads: usize,
    },

    /// Execute a weighted operation mix over loaded rows
    Run {
        /// Total operations to execute across all threads
        #[arg(short, long, default_value = "1000")]
        operations: usize,

        /// Size of the loaded key range
        #[arg(short, long, default_value = "1000")]
        records: usize,

        /// Number of worker threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Relative weight of read operations
        #[arg(long, default_value = "70")]
        reads: u32,

        /// Relative weight of update operations
        #[arg(long, default_value = "20")]
        updates: u32,

        /// Relative weight of insert operations
        #[arg(long, default_value = "5")]
        inserts: u32,

        /// Relative weight of scan operations
        #[arg(long, default_value = "5")]
        scans: u32,

        /// Relative weight of delete operations
        #[arg(long, default_value = "0")]
        deletes: u32,

        /// Rows fetched per scan
        #[arg(long, default_value = "10")]
        scan_len: usize,

        /// Fields per row for inserts and updates
        #[arg(short, long, default_value = "10")]
        fields: usize,

        /// Bytes per field value
        #[arg(long, default_value = "100")]
        field_len: usize,

        /// Seconds between periodic stats reports (0 disables)
        #[arg(long, default_value = "10")]
        report_interval: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Load {
            records,
            fields,
            field_len,
            threads,
        } => {
            let options = commands::load::LoadOptions {
                dir: cli.dir,
                log_name: cli.log_name,
                table: cli.table,
                records,
                fields,
                field_len,
                threads,
            };
            commands::load::run(options)?;
        }
        Commands::Run {
            operations,
            records,
            threads,
            reads,
            updates,
            inserts,
            scans,
            deletes,
            scan_len,
            fields,
            field_len,
            report_interval,
        } => {
            let options = commands::run::RunOptions {
                dir: cli.dir,
                log_name: cli.log_name,
                table: cli.table,
                operations,
                records,
                threads,
                mix: commands::run::OperationMix {
                    reads,
                    updates,
                    inserts,
                    scans,
                    deletes,
                },
                scan_len,
                fields,
                field_len,
                report_interval,
            };
            commands::run::run(options)?;
        }
    }

    Ok(())
}
