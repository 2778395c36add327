use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use lob_events::{logging, ExtractorConfig, Replay, DEFAULT_MAX_DEPTH};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Extract LOB events from an NDJSON snapshot/delta file")]
struct Args {
    /// Input NDJSON LOB file
    input: PathBuf,

    /// Only report events with depth < max-depth
    #[arg(long, env = "LOB_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

/// Stream every reported event to `out` as one JSON object per line.
fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let config = ExtractorConfig { max_depth: args.max_depth };
    let replay = Replay::open(&args.input, config).with_context(|| format!("open {:?}", args.input))?;
    for step in replay {
        let step = step.with_context(|| format!("replay {:?}", args.input))?;
        for ev in &step.events {
            serde_json::to_writer(&mut *out, ev).context("encode event")?;
            out.write_all(b"\n").context("write event")?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();
    logging::init();
    let args = Args::parse();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = run(&args, &mut out);
    // events written before a failure still reach stdout
    out.flush().context("flush stdout")?;
    result
}
