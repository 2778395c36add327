use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use lob_events::book::{PriceLevel, Side};
use lob_events::{logging, ExtractorConfig, MidPrice, Replay, DEFAULT_MAX_DEPTH};
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(about = "Replay an NDJSON snapshot/delta file and print the mid-price trace")]
struct Args {
    /// Input NDJSON LOB file
    input: PathBuf,

    /// Only count events with depth < max-depth
    #[arg(long, env = "LOB_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Dump top-of-book after each mid change (written to stderr, stdout
    /// keeps only the JSON trace)
    #[arg(long, default_value_t = false)]
    dump: bool,

    /// Number of levels to print when dumping
    #[arg(long, default_value_t = 5)]
    top: usize,
}

#[derive(Debug, Serialize)]
struct TracePoint {
    index: usize,
    mid_price: MidPrice,
    events: usize,
}

fn dump_book(index: usize, top: usize, bids: &[PriceLevel], asks: &[PriceLevel]) {
    eprintln!("line={} | top{} bids / asks:", index, top);
    for i in 0..top.min(bids.len().max(asks.len())) {
        let b = bids.get(i).map(|l| format!("{:>3}: {:>12.4} x {:>10.4}", i, l.price, l.volume)).unwrap_or_else(|| format!("{:>3}: -", i));
        let a = asks.get(i).map(|l| format!("{:>12.4} x {:>10.4}", l.price, l.volume)).unwrap_or_else(|| "-".to_string());
        eprintln!("{} | {}", b, a);
    }
    eprintln!("---");
}

fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let config = ExtractorConfig { max_depth: args.max_depth };
    let mut replay = Replay::open(&args.input, config).with_context(|| format!("open {:?}", args.input))?;
    while let Some(step) = replay.next() {
        let step = step.with_context(|| format!("replay {:?}", args.input))?;
        let point = TracePoint { index: step.index, mid_price: step.mid, events: step.events.len() };
        serde_json::to_writer(&mut *out, &point).context("encode trace point")?;
        out.write_all(b"\n").context("write trace point")?;
        if args.dump {
            let book = replay.engine().book();
            dump_book(step.index, args.top, &book.top_levels(Side::Bid, args.top), &book.top_levels(Side::Ask, args.top));
        }
    }
    let stats = replay.stats();
    eprintln!(
        "Read {} lines ({} snapshots, {} deltas). {} mid changes, {} events.",
        stats.lines, stats.snapshots, stats.deltas, stats.mid_changes, stats.events_reported
    );
    Ok(())
}

fn main() -> Result<()> {
    let _ = dotenv();
    logging::init();
    let args = Args::parse();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = run(&args, &mut out);
    out.flush().context("flush stdout")?;
    result
}
