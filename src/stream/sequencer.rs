use std::fmt;

use csv::StringRecord;
use log::{trace, warn};

use super::{
    channels::ChannelVector,
    pacer::{Cancelled, FramePacer, PacerStats},
    sample::{self, ChannelSchema, DeviceTag},
    transport::Transport,
};
use crate::{
    core::time::Clock,
    math::{
        angles::DerivedAngles,
        interp::{interpolate, StateSample},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// First accepted sample, emitted on its own.
    Primed,
    /// Gap to the previous sample filled and the sample emitted.
    Streamed,
    /// Row belongs to another device.
    Skipped,
    /// Row could not be read, state untouched.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum SequenceState {
    #[default]
    Init,
    Streaming(StateSample),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceStats {
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rows_skipped: usize,
    pub rows_failed: usize,
}

/// Drives a row stream through extraction, angle derivation, interpolation
/// and paced emission. Only rows from the first seen device are accepted.
pub struct Sequencer<T, C> {
    schema: ChannelSchema,
    steps: usize,
    device: Option<DeviceTag>,
    state: SequenceState,
    pacer: FramePacer<T, C>,
    stats: SequenceStats,
}

impl<T: Transport, C: Clock> Sequencer<T, C> {
    pub fn new(schema: ChannelSchema, steps: usize, pacer: FramePacer<T, C>) -> Self {
        Self {
            schema,
            steps,
            device: None,
            state: SequenceState::Init,
            pacer,
            stats: SequenceStats::default(),
        }
    }

    /// Handles one data row. `ordinal` is the 1-based position of the row in
    /// the input and only used for reporting.
    pub fn process_row(
        &mut self,
        ordinal: usize,
        row: &StringRecord,
    ) -> Result<RowOutcome, Cancelled> {
        trace!("Row {ordinal}");
        self.stats.rows_read += 1;

        let outcome = match self.accept(row) {
            Ok(Some(vector)) => {
                self.stats.rows_accepted += 1;
                self.advance(vector)?
            }
            Ok(None) => {
                self.stats.rows_skipped += 1;
                RowOutcome::Skipped
            }
            Err(err) => {
                warn!("Error parsing value at row {ordinal}: {err}");
                self.stats.rows_failed += 1;
                RowOutcome::Failed
            }
        };

        Ok(outcome)
    }

    /// Counts a row the reader could not decode at all. The state is left
    /// as it was.
    pub fn record_failure(&mut self, ordinal: usize, err: &dyn fmt::Display) -> RowOutcome {
        warn!("Error parsing value at row {ordinal}: {err}");
        self.stats.rows_read += 1;
        self.stats.rows_failed += 1;
        RowOutcome::Failed
    }

    /// Device filter followed by extraction. `Ok(None)` for rows of other
    /// devices.
    fn accept(&mut self, row: &StringRecord) -> Result<Option<ChannelVector>, sample::Error> {
        let tag = self.schema.device_tag(row)?;

        let device = self.device.get_or_insert(tag.clone());
        if *device != tag {
            return Ok(None);
        }

        self.schema.extract(row).map(Some)
    }

    fn advance(&mut self, vector: ChannelVector) -> Result<RowOutcome, Cancelled> {
        match self.state {
            SequenceState::Init => {
                let current = StateSample::new(vector, DerivedAngles::default());
                self.pacer.emit(&current.frame())?;

                self.state = SequenceState::Streaming(current);
                Ok(RowOutcome::Primed)
            }
            SequenceState::Streaming(previous) => {
                let angles = DerivedAngles::derive(&previous.vector, previous.angles, &vector);
                let current = StateSample::new(vector, angles);

                // The previous sample only moves forward once its whole gap
                // has gone out, a cancelled run keeps the last complete state.
                for frame in interpolate(&previous, &current, self.steps) {
                    self.pacer.emit(&frame)?;
                }
                self.pacer.emit(&current.frame())?;

                self.state = SequenceState::Streaming(current);
                Ok(RowOutcome::Streamed)
            }
        }
    }

    pub fn device(&self) -> Option<&DeviceTag> {
        self.device.as_ref()
    }

    pub fn previous(&self) -> Option<&StateSample> {
        match &self.state {
            SequenceState::Init => None,
            SequenceState::Streaming(previous) => Some(previous),
        }
    }

    pub fn stats(&self) -> SequenceStats {
        self.stats
    }

    pub fn pacer_stats(&self) -> PacerStats {
        self.pacer.stats()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::*;
    use crate::{
        core::time::{frame_interval, SimulatedClock},
        stream::{channels::Channel, transport::recording::RecordingTransport},
    };
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn row(tag: &str, speed: &str, heading: &str, altitude: &str) -> StringRecord {
        let mut cols = vec!["0"; 28];
        cols[1] = tag;
        cols[4] = "41.3";
        cols[5] = "2.08";
        cols[6] = speed;
        cols[7] = heading;
        cols[8] = altitude;
        StringRecord::from(cols)
    }

    fn headings(payloads: &[String]) -> Vec<f64> {
        payloads
            .iter()
            .map(|p| {
                p.split('\t').nth(Channel::Heading.index()).unwrap().parse().unwrap()
            })
            .collect()
    }

    fn sequencer(
        steps: usize,
        cancel: Arc<AtomicBool>,
    ) -> (Sequencer<RecordingTransport, SimulatedClock>, RecordingTransport) {
        let transport = RecordingTransport::default();
        let pacer = FramePacer::new(
            transport.clone(),
            SimulatedClock::default(),
            frame_interval(steps as u32),
            cancel,
        );
        (
            Sequencer::new(ChannelSchema::default(), steps, pacer),
            transport,
        )
    }

    #[test]
    fn test_first_sample_is_held() {
        let (mut seq, transport) = sequencer(4, Arc::default());

        assert_eq!(
            seq.process_row(1, &row("A", "100", "350", "1000")),
            Ok(RowOutcome::Primed)
        );

        assert_eq!(transport.payloads().len(), 1);
        let previous = seq.previous().unwrap();
        assert_eq!(previous.angles, DerivedAngles::default());
        assert_eq!(previous.vector[Channel::Heading], 350.0);
    }

    #[test]
    fn test_gap_through_north() {
        let (mut seq, transport) = sequencer(4, Arc::default());

        seq.process_row(1, &row("A", "100", "350", "1000")).unwrap();
        assert_eq!(
            seq.process_row(2, &row("A", "100", "10", "1010")),
            Ok(RowOutcome::Streamed)
        );

        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 5);
        assert_eq!(headings(&payloads), vec![350.0, 355.0, 0.0, 5.0, 10.0]);

        let previous = seq.previous().unwrap();
        assert!(previous.angles.bank > 0.0);
        assert_relative_eq!(previous.angles.pitch, 0.1f64.atan().to_degrees());
    }

    #[test]
    fn test_other_device_is_ignored() {
        let (mut seq, transport) = sequencer(4, Arc::default());

        seq.process_row(1, &row("A", "100", "90", "1000")).unwrap();
        let before = *seq.previous().unwrap();

        assert_eq!(
            seq.process_row(2, &row("B", "300", "180", "5000")),
            Ok(RowOutcome::Skipped)
        );
        // Other device rows are not even parsed
        assert_eq!(
            seq.process_row(3, &row("B", "x", "y", "z")),
            Ok(RowOutcome::Skipped)
        );

        assert_eq!(transport.payloads().len(), 1);
        assert_eq!(seq.previous(), Some(&before));
        assert_eq!(seq.device().unwrap().as_str(), "A");
    }

    #[test]
    fn test_tag_comes_from_first_row_even_if_it_fails() {
        let (mut seq, transport) = sequencer(4, Arc::default());

        assert_eq!(
            seq.process_row(1, &row("A", "fast", "90", "1000")),
            Ok(RowOutcome::Failed)
        );
        assert_eq!(
            seq.process_row(2, &row("B", "100", "90", "1000")),
            Ok(RowOutcome::Skipped)
        );
        assert_eq!(
            seq.process_row(3, &row("A", "100", "90", "1000")),
            Ok(RowOutcome::Primed)
        );
        assert_eq!(transport.payloads().len(), 1);
    }

    #[test]
    fn test_bad_row_keeps_last_valid_state() {
        let (mut seq, transport) = sequencer(4, Arc::default());

        seq.process_row(1, &row("A", "100", "0", "1000")).unwrap();
        seq.process_row(2, &row("A", "100", "20", "1000")).unwrap();
        let before = *seq.previous().unwrap();

        assert_eq!(
            seq.process_row(3, &row("A", "100", "north", "1000")),
            Ok(RowOutcome::Failed)
        );
        assert_eq!(seq.previous(), Some(&before));

        seq.process_row(4, &row("A", "100", "40", "1000")).unwrap();

        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 9);
        assert_eq!(
            headings(&payloads),
            vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0]
        );
        assert_eq!(
            seq.stats(),
            SequenceStats {
                rows_read: 4,
                rows_accepted: 3,
                rows_skipped: 0,
                rows_failed: 1
            }
        );
    }

    #[test]
    fn test_undecodable_row_is_counted() {
        let (mut seq, transport) = sequencer(2, Arc::default());

        seq.process_row(1, &row("A", "100", "0", "1000")).unwrap();
        let before = *seq.previous().unwrap();

        assert_eq!(
            seq.record_failure(2, &"invalid utf-8 sequence"),
            RowOutcome::Failed
        );
        assert_eq!(seq.previous(), Some(&before));

        seq.process_row(3, &row("A", "100", "10", "1000")).unwrap();

        assert_eq!(headings(&transport.payloads()), vec![0.0, 5.0, 10.0]);
        assert_eq!(
            seq.stats(),
            SequenceStats {
                rows_read: 3,
                rows_accepted: 2,
                rows_skipped: 0,
                rows_failed: 1
            }
        );
    }

    #[test]
    fn test_unchanged_heading_keeps_bank() {
        let (mut seq, _) = sequencer(4, Arc::default());

        seq.process_row(1, &row("A", "100", "0", "1000")).unwrap();
        seq.process_row(2, &row("A", "100", "10", "1000")).unwrap();
        let bank = seq.previous().unwrap().angles.bank;
        assert!(bank > 0.0);

        seq.process_row(3, &row("A", "120", "10", "1000")).unwrap();
        assert_eq!(seq.previous().unwrap().angles.bank, bank);
    }

    #[test]
    fn test_five_rows_emit_four_gaps() {
        let steps = 6;
        let (mut seq, transport) = sequencer(steps, Arc::default());

        for (i, hdg) in ["90", "95", "100", "100", "110"].iter().enumerate() {
            seq.process_row(i + 1, &row("A", "60", hdg, "1500")).unwrap();
        }

        assert_eq!(transport.payloads().len(), 4 * steps + 1);
        assert_eq!(
            seq.pacer_stats(),
            PacerStats {
                frames_sent: 4 * steps + 1,
                send_failures: 0
            }
        );
    }

    #[test]
    fn test_cancel_stops_mid_gap_without_advancing() {
        let cancel = Arc::new(AtomicBool::new(false));
        let (mut seq, transport) = sequencer(4, cancel.clone());

        seq.process_row(1, &row("A", "100", "0", "1000")).unwrap();
        let before = *seq.previous().unwrap();

        cancel.store(true, Ordering::Relaxed);
        assert_eq!(
            seq.process_row(2, &row("A", "100", "20", "1000")),
            Err(Cancelled)
        );

        assert_eq!(transport.payloads().len(), 1);
        assert_eq!(seq.previous(), Some(&before));
    }
}
