use std::{
    fmt,
    fs::File,
    io::Read,
    path::Path,
    sync::{atomic::AtomicBool, Arc},
    time::Instant,
};

pub use anyhow::Result;
use anyhow::{anyhow, Context};
use csv::ReaderBuilder;
use log::{info, warn};

use crate::{
    core::time::{Clock, SystemClock},
    parameters::StreamConfig,
    stream::{Cancelled, FramePacer, Sequencer, Transport, UdpTransport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rows_skipped: usize,
    pub rows_failed: usize,
    pub frames_sent: usize,
    pub send_failures: usize,
    pub cancelled: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows read ({} accepted, {} other device, {} failed), {} frames sent ({} failed)",
            self.rows_read,
            self.rows_accepted,
            self.rows_skipped,
            self.rows_failed,
            self.frames_sent,
            self.send_failures
        )?;

        if self.cancelled {
            write!(f, ", cancelled")?;
        }

        Ok(())
    }
}

/// Streams a whole track log, one row at a time, on the calling thread.
pub struct StreamRunner {
    config: StreamConfig,
    cancel: Arc<AtomicBool>,
}

impl StreamRunner {
    pub fn new(config: StreamConfig, cancel: Arc<AtomicBool>) -> Result<Self> {
        config.validate()?;

        Ok(Self { config, cancel })
    }

    /// Streams the configured input file to the configured UDP destination.
    pub fn run_blocking(&self) -> Result<RunSummary> {
        let input = self
            .config
            .input
            .as_deref()
            .ok_or_else(|| anyhow!("No input file given"))?;

        // Open the input before binding anything, a missing file sends nothing
        let file = open_input(input)?;

        let transport = UdpTransport::new(self.config.destination()?)?;

        info!(
            "Streaming '{}' to {} at {} frames per sample",
            input.display(),
            transport.destination(),
            self.config.frame_rate
        );

        self.run(file, transport, SystemClock::default())
    }

    pub fn run<R, T, C>(&self, input: R, transport: T, clock: C) -> Result<RunSummary>
    where
        R: Read,
        T: Transport,
        C: Clock,
    {
        let mut reader = ReaderBuilder::new()
            .has_headers(self.config.has_headers)
            .flexible(true)
            .from_reader(input);

        if self.config.has_headers {
            match reader.headers() {
                Ok(headers) if !headers.is_empty() => {
                    info!("Headers: {:?}", headers.iter().collect::<Vec<_>>());

                    let needed = self.config.schema.min_columns();
                    if headers.len() < needed {
                        warn!(
                            "Header row has {} columns, rows need at least {needed}",
                            headers.len()
                        );
                    }
                }
                Ok(_) => info!("No headers found in the input"),
                Err(err) => warn!("Could not read header row: {err}"),
            }
        }

        let pacer = FramePacer::new(
            transport,
            clock,
            self.config.frame_interval(),
            self.cancel.clone(),
        );
        let mut sequencer = Sequencer::new(self.config.schema.clone(), self.config.steps(), pacer);

        let start_time = Instant::now();
        let mut cancelled = false;

        for (i, record) in reader.records().enumerate() {
            let ordinal = i + 1;

            let record = match record {
                Ok(record) => record,
                Err(err) if err.is_io_error() => {
                    return Err(err).with_context(|| format!("Error reading row {ordinal}"));
                }
                Err(err) => {
                    sequencer.record_failure(ordinal, &err);
                    continue;
                }
            };

            if let Err(Cancelled) = sequencer.process_row(ordinal, &record) {
                info!("Stream cancelled at row {ordinal}");
                cancelled = true;
                break;
            }
        }

        let rows = sequencer.stats();
        let frames = sequencer.pacer_stats();
        let summary = RunSummary {
            rows_read: rows.rows_read,
            rows_accepted: rows.rows_accepted,
            rows_skipped: rows.rows_skipped,
            rows_failed: rows.rows_failed,
            frames_sent: frames.frames_sent,
            send_failures: frames.send_failures,
            cancelled,
        };

        let duration = start_time.elapsed().as_secs_f64();
        info!("Stream ended after {duration:.3} s: {summary}");

        Ok(summary)
    }
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("The file '{}' does not exist", path.display()))
}
