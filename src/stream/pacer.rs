use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::TimeDelta;
use log::{debug, warn};
use thiserror::Error;

use super::{channels::ChannelVector, frame, transport::Transport};
use crate::core::time::Clock;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Stream cancelled")]
pub struct Cancelled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacerStats {
    pub frames_sent: usize,
    pub send_failures: usize,
}

/// Transmits frames at a fixed cadence: each `emit` returns no earlier than
/// one frame interval after it started, however long the send took.
pub struct FramePacer<T, C> {
    transport: T,
    clock: C,
    frame_interval: TimeDelta,
    cancel: Arc<AtomicBool>,
    stats: PacerStats,
}

impl<T: Transport, C: Clock> FramePacer<T, C> {
    pub fn new(transport: T, clock: C, frame_interval: TimeDelta, cancel: Arc<AtomicBool>) -> Self {
        Self {
            transport,
            clock,
            frame_interval,
            cancel,
            stats: PacerStats::default(),
        }
    }

    pub fn emit(&mut self, frame: &ChannelVector) -> Result<(), Cancelled> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(Cancelled);
        }

        let start = self.clock.monotonic();
        let payload = frame::encode(frame);

        match self.transport.send(payload.as_bytes()) {
            Ok(()) => debug!("SENT {}", payload.trim_end()),
            Err(err) => {
                self.stats.send_failures += 1;
                warn!("{}", error_chain(&err));
            }
        }
        self.stats.frames_sent += 1;

        let elapsed = self.clock.monotonic().duration_since(&start);
        if elapsed < self.frame_interval {
            self.clock.sleep(self.frame_interval - elapsed);
        }

        Ok(())
    }

    pub fn stats(&self) -> PacerStats {
        self.stats
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut causes = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes.join(": ")
}
