//! Line-by-line replay of an NDJSON snapshot/delta stream.
//!
//! [`Replay`] decodes each line, applies it to an [`ExtractionEngine`] and
//! observes the mid price afterwards. A [`ReplayStep`] is only yielded for
//! lines where the mid changed (first line always counts). Snapshots yield no
//! events; deltas yield the events they produced. Errors stop the replay.
//!
//! Lines are read as raw bytes so that an encoding problem is reported as a
//! decode error for that line rather than a read failure.
use std::fs::File;
use std::io::{self, BufRead, BufReader, Split};
use std::path::Path;

use tracing::{debug, info};

use crate::engine::{ExtractionEngine, ExtractorConfig};
use crate::error::ExtractError;
use crate::event::{MarketEvent, MidPrice};
use crate::record::{decode_line, Message};

/// Output for one input line whose mid price changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    /// 0-based line number.
    pub index: usize,
    pub events: Vec<MarketEvent>,
    pub mid: MidPrice,
}

/// Running totals of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub lines: usize,
    pub snapshots: usize,
    pub deltas: usize,
    pub events_reported: usize,
    pub mid_changes: usize,
}

pub struct Replay<I> {
    lines: I,
    engine: ExtractionEngine,
    config: ExtractorConfig,
    next_index: usize,
    stats: ReplayStats,
    done: bool,
}

impl Replay<Split<BufReader<File>>> {
    /// Replay a file from disk.
    pub fn open(path: impl AsRef<Path>, config: ExtractorConfig) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file), config))
    }
}

impl<R: BufRead> Replay<Split<R>> {
    pub fn from_reader(reader: R, config: ExtractorConfig) -> Self {
        Self::new(reader.split(b'\n'), config)
    }
}

impl<I> Replay<I>
where
    I: Iterator<Item = io::Result<Vec<u8>>>,
{
    pub fn new(lines: I, config: ExtractorConfig) -> Self {
        info!(max_depth = config.max_depth, "starting replay");
        Self {
            lines,
            engine: ExtractionEngine::new(),
            config,
            next_index: 0,
            stats: ReplayStats::default(),
            done: false,
        }
    }

    pub fn engine(&self) -> &ExtractionEngine {
        &self.engine
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Apply one line. Returns a step when the mid changed.
    fn process(&mut self, index: usize, bytes: &[u8]) -> Result<Option<ReplayStep>, ExtractError> {
        let events = match decode_line(bytes, index)? {
            Message::Snapshot { asks, bids } => {
                self.stats.snapshots += 1;
                self.engine.apply_snapshot(&asks, &bids);
                Vec::new()
            }
            Message::Delta { asks, bids } => {
                self.stats.deltas += 1;
                self.engine.apply_delta(&asks, &bids, index, self.config.max_depth)
            }
            Message::Other => {
                debug!(line = index, "skipping message without snapshot/delta type");
                Vec::new()
            }
        };
        Ok(self.engine.record_mid().map(|mid| {
            self.stats.mid_changes += 1;
            self.stats.events_reported += events.len();
            ReplayStep { index, events, mid }
        }))
    }
}

impl<I> Iterator for Replay<I>
where
    I: Iterator<Item = io::Result<Vec<u8>>>,
{
    type Item = Result<ReplayStep, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(line) = self.lines.next() else {
                self.done = true;
                let s = self.stats;
                info!(
                    lines = s.lines,
                    snapshots = s.snapshots,
                    deltas = s.deltas,
                    mid_changes = s.mid_changes,
                    events = s.events_reported,
                    "replay finished"
                );
                break;
            };
            let index = self.next_index;
            self.next_index += 1;
            self.stats.lines += 1;
            let step = line.map_err(ExtractError::from).and_then(|bytes| self.process(index, &bytes));
            match step {
                Ok(Some(step)) => return Some(Ok(step)),
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Replay in-memory lines and gather every reported event plus the mid trace.
pub fn collect_all<I, S>(lines: I, config: ExtractorConfig) -> Result<(Vec<MarketEvent>, Vec<MidPrice>), ExtractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut events = Vec::new();
    let mut mids = Vec::new();
    let lines = lines.into_iter().map(|l| Ok::<_, io::Error>(l.as_ref().as_bytes().to_vec()));
    for step in Replay::new(lines, config) {
        let step = step?;
        events.extend(step.events);
        mids.push(step.mid);
    }
    Ok((events, mids))
}
