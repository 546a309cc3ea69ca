//! Run phase: a weighted mix of operations over loaded rows.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use logkv_client::{Client, Config, ConnectionManager};
use logkv_store::Backend;
use rand::Rng;
use tracing::info;

use super::{random_row, row_key, shares};

/// Relative weights of the five operation kinds.
#[derive(Clone, Copy)]
pub struct OperationMix {
    /// Weight of reads.
    pub reads: u32,
    /// Weight of updates.
    pub updates: u32,
    /// Weight of inserts.
    pub inserts: u32,
    /// Weight of scans.
    pub scans: u32,
    /// Weight of deletes.
    pub deletes: u32,
}

impl OperationMix {
    fn total(&self) -> u32 {
        self.reads + self.updates + self.inserts + self.scans + self.deletes
    }

    /// Picks one operation kind according to the weights.
    fn pick<R: Rng>(&self, rng: &mut R) -> Operation {
        let mut roll = rng.gen_range(0..self.total());
        for (weight, op) in [
            (self.reads, Operation::Read),
            (self.updates, Operation::Update),
            (self.inserts, Operation::Insert),
            (self.scans, Operation::Scan),
        ] {
            if roll < weight {
                return op;
            }
            roll -= weight;
        }
        Operation::Delete
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    Read,
    Update,
    Insert,
    Scan,
    Delete,
}

/// Options for the run phase.
pub struct RunOptions {
    /// Directory holding the log files.
    pub dir: PathBuf,
    /// Log to drive.
    pub log_name: String,
    /// Table name for every row.
    pub table: String,
    /// Total operations across all threads.
    pub operations: usize,
    /// Size of the loaded key range.
    pub records: usize,
    /// Worker threads.
    pub threads: usize,
    /// Operation weights.
    pub mix: OperationMix,
    /// Rows fetched per scan.
    pub scan_len: usize,
    /// Fields per row for inserts and updates.
    pub fields: usize,
    /// Bytes per field value.
    pub field_len: usize,
    /// Seconds between periodic stats reports, zero to disable.
    pub report_interval: u64,
}

/// Runs the workload phase.
pub fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    if options.mix.total() == 0 {
        return Err("operation mix has zero total weight".into());
    }
    if options.records == 0 {
        return Err("run phase needs a non-empty key range".into());
    }

    let backend = Backend::Local {
        dir: options.dir.clone(),
    };
    let manager = Arc::new(ConnectionManager::new());

    // The anchor client opens the connection first so the reporting
    // interval from its config takes effect for every worker.
    let mut anchor_config =
        Config::new(backend.clone(), &options.log_name).create_if_missing(false);
    if options.report_interval > 0 {
        anchor_config =
            anchor_config.stats_interval(Duration::from_secs(options.report_interval));
    }
    let mut anchor = Client::new(Arc::clone(&manager), anchor_config);
    anchor.init()?;

    info!(
        operations = options.operations,
        threads = options.threads,
        records = options.records,
        "starting run phase"
    );
    let started = Instant::now();

    // Inserts during the run extend the key range past the loaded rows.
    let next_insert = Arc::new(AtomicUsize::new(options.records));

    let mut handles = Vec::new();
    for share in shares(options.operations, options.threads) {
        let manager = Arc::clone(&manager);
        let config = Config::new(backend.clone(), &options.log_name);
        let table = options.table.clone();
        let mix = options.mix;
        let next_insert = Arc::clone(&next_insert);
        let records = options.records;
        let scan_len = options.scan_len;
        let fields = options.fields;
        let field_len = options.field_len;

        handles.push(std::thread::spawn(move || -> Result<(), String> {
            let mut client = Client::new(manager, config);
            client.init().map_err(|e| e.to_string())?;
            let mut rng = rand::thread_rng();

            for _ in 0..share {
                let key = row_key(rng.gen_range(0..records));
                match mix.pick(&mut rng) {
                    Operation::Read => {
                        let _ = client.read(&table, &key, None);
                    }
                    Operation::Update => {
                        let delta = random_row(&mut rng, fields, field_len);
                        let _ = client.update(&table, &key, &delta);
                    }
                    Operation::Insert => {
                        let row_id = next_insert.fetch_add(1, Ordering::Relaxed);
                        let row = random_row(&mut rng, fields, field_len);
                        let _ = client.insert(&table, &row_key(row_id), &row);
                    }
                    Operation::Scan => {
                        let _ = client.scan(&table, &key, scan_len, None);
                    }
                    Operation::Delete => {
                        let _ = client.delete(&table, &key);
                    }
                }
            }

            client.shutdown();
            Ok(())
        }));
    }

    for handle in handles {
        handle.join().map_err(|_| "worker thread panicked")??;
    }

    let elapsed = started.elapsed();
    let snapshot = anchor
        .stats()
        .map(logkv_client::ClientStats::snapshot)
        .unwrap_or_default();
    anchor.shutdown();

    let operations = snapshot.reads
        + snapshot.scans
        + snapshot.inserts
        + snapshot.updates
        + snapshot.deletes;

    println!("Run complete:");
    println!("  Operations:     {operations}");
    println!("  Reads:          {}", snapshot.reads);
    println!("  Scans:          {}", snapshot.scans);
    println!("  Inserts:        {}", snapshot.inserts);
    println!("  Updates:        {}", snapshot.updates);
    println!("  Deletes:        {}", snapshot.deletes);
    println!("  Not found:      {}", snapshot.not_found);
    println!("  Errors:         {}", snapshot.errors);
    println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
    println!(
        "  Throughput:     {:.0} ops/s",
        operations as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_respects_zeroed_weights() {
        let mix = OperationMix {
            reads: 1,
            updates: 0,
            inserts: 0,
            scans: 0,
            deletes: 0,
        };
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert_eq!(mix.pick(&mut rng), Operation::Read);
        }
    }

    #[test]
    fn pick_reaches_every_weighted_kind() {
        let mix = OperationMix {
            reads: 1,
            updates: 1,
            inserts: 1,
            scans: 1,
            deletes: 1,
        };
        let mut rng = rand::thread_rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(format!("{:?}", mix.pick(&mut rng)));
        }
        assert_eq!(seen.len(), 5);
    }
}
