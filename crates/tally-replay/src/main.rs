//! Tally replay binary.
//!
//! Reads an operation file, applies it to a fresh ledger, and prints one
//! JSON outcome per line on stdout followed by a summary line. Logs go to
//! stderr.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tally_ledger::Ledger;
use tally_replay::{ReplaySummary, load_operations};
use tally_types::{LedgerConfig, constants};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "tally-replay")]
#[command(version, about = "Replay a stream of ledger operations")]
struct Args {
    /// Operation file: a JSON array or one JSON object per line
    input: PathBuf,

    /// Ledger config file (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Check ledger invariants after every operation
    #[arg(long)]
    verify: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<LedgerConfig> {
    let Some(path) = path else {
        return Ok(LedgerConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    LedgerConfig::from_json_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = load_config(args.config.as_ref())?;
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let ops = load_operations(&raw).with_context(|| format!("parsing {}", args.input.display()))?;

    info!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        operations = ops.len(),
        cashback_delay_ms = config.cashback_delay_ms,
        cashback_rate_bps = config.cashback_rate_bps,
        "Starting replay"
    );

    let mut ledger = Ledger::with_config(config)?;
    let mut outcomes = Vec::with_capacity(ops.len());
    let mut out = BufWriter::new(io::stdout().lock());

    for (idx, op) in ops.iter().enumerate() {
        let outcome = op.apply(&mut ledger);
        serde_json::to_writer(&mut out, &outcome)?;
        writeln!(out)?;
        outcomes.push(outcome);

        if args.verify {
            ledger
                .verify_invariants()
                .with_context(|| format!("invariant violated after operation {} ({op:?})", idx + 1))?;
        }
    }

    let summary = ReplaySummary::new(&ledger, &outcomes);
    serde_json::to_writer(&mut out, &summary)?;
    writeln!(out)?;
    out.flush()?;

    info!(
        operations = summary.operations,
        rejected = summary.rejected,
        digest = %summary.state_digest,
        "Replay finished"
    );
    Ok(())
}
