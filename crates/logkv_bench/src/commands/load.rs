//! Load phase: populate the log with sequential rows.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use logkv_client::{Client, Config, ConnectionManager};
use logkv_store::Backend;
use tracing::info;

use super::{random_row, row_key, shares};

/// Options for the load phase.
pub struct LoadOptions {
    /// Directory holding the log files.
    pub dir: PathBuf,
    /// Log to populate.
    pub log_name: String,
    /// Table name for every row.
    pub table: String,
    /// Number of rows to insert.
    pub records: usize,
    /// Fields per row.
    pub fields: usize,
    /// Bytes per field value.
    pub field_len: usize,
    /// Loader threads.
    pub threads: usize,
}

/// Runs the load phase.
pub fn run(options: LoadOptions) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::Local {
        dir: options.dir.clone(),
    };
    let manager = Arc::new(ConnectionManager::new());

    // The anchor client holds the connection open across worker
    // lifetimes so the final stats survive their shutdowns.
    let mut anchor = Client::new(
        Arc::clone(&manager),
        Config::new(backend.clone(), &options.log_name),
    );
    anchor.init()?;

    info!(
        records = options.records,
        threads = options.threads,
        dir = %options.dir.display(),
        "starting load phase"
    );
    let started = Instant::now();

    let mut next_row = 0;
    let mut handles = Vec::new();
    for share in shares(options.records, options.threads) {
        let range = next_row..next_row + share;
        next_row += share;

        let manager = Arc::clone(&manager);
        let config = Config::new(backend.clone(), &options.log_name);
        let table = options.table.clone();
        let fields = options.fields;
        let field_len = options.field_len;

        handles.push(std::thread::spawn(move || -> Result<(), String> {
            let mut client = Client::new(manager, config);
            client.init().map_err(|e| e.to_string())?;
            let mut rng = rand::thread_rng();
            for row_id in range {
                let row = random_row(&mut rng, fields, field_len);
                if !client.insert(&table, &row_key(row_id), &row).is_ok() {
                    return Err(format!("insert of row {row_id} failed"));
                }
            }
            client.shutdown();
            Ok(())
        }));
    }

    for handle in handles {
        handle.join().map_err(|_| "loader thread panicked")??;
    }

    let elapsed = started.elapsed();
    let snapshot = anchor
        .stats()
        .map(logkv_client::ClientStats::snapshot)
        .unwrap_or_default();
    anchor.shutdown();

    println!("Load complete:");
    println!("  Rows inserted:  {}", snapshot.inserts);
    println!("  Errors:         {}", snapshot.errors);
    println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
    println!(
        "  Throughput:     {:.0} ops/s",
        snapshot.inserts as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}
