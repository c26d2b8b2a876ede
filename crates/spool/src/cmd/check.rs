//! `spool check-config`

use anyhow::Result;
use spool_config::{Config, StoreKind};

/// Print the effective settings of an already validated config
pub fn run(config: &Config) -> Result<()> {
    println!("{}", summary(config));
    Ok(())
}

fn summary(config: &Config) -> String {
    let writer = &config.writer;
    let store = &config.store;

    let mut lines = vec![
        "config ok".to_string(),
        format!(
            "  writer: batch_size={} interval={:?} delivery_attempts={} max_attempts={}",
            writer.batch_size, writer.write_interval, writer.max_delivery_attempts, writer.max_attempts
        ),
        format!(
            "  retry: base={:?} max={:?}",
            writer.retry_base_delay, writer.retry_max_delay
        ),
        format!(
            "  truncation: threshold={} prefix={}",
            writer.truncation.threshold, writer.truncation.prefix_length
        ),
    ];

    lines.push(match store.kind {
        StoreKind::Clickhouse => format!(
            "  store: clickhouse url={} database={} timeout={:?}",
            store.url, store.database, store.timeout
        ),
        StoreKind::Stdout => "  store: stdout".to_string(),
    });

    let mut overrides: Vec<_> = store.tables.iter().collect();
    overrides.sort();
    for (destination, table) in overrides {
        lines.push(format!("  table: {destination} -> {table}"));
    }

    lines.join("\n")
}
