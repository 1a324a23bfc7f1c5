use strum::IntoEnumIterator;

use super::angles::{shortest_heading_path, DerivedAngles};
use crate::stream::channels::{Channel, ChannelVector};

/// A channel vector paired with the attitude derived for it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateSample {
    pub vector: ChannelVector,
    pub angles: DerivedAngles,
}

impl StateSample {
    pub fn new(vector: ChannelVector, angles: DerivedAngles) -> Self {
        Self { vector, angles }
    }

    /// The vector with the derived channels filled in.
    pub fn frame(&self) -> ChannelVector {
        let mut frame = self.vector;
        frame[Channel::Pitch] = self.angles.pitch;
        frame[Channel::Bank] = self.angles.bank;
        frame
    }

    fn start(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Pitch => self.angles.pitch,
            Channel::Bank => self.angles.bank,
            _ => self.vector[channel],
        }
    }
}

/// Keeps a heading inside [0, 360) as rendered on the wire: anything the
/// heading format would print as 360 goes out as 0.
pub fn wrap_heading(heading: f64) -> f64 {
    let wrapped = heading.rem_euclid(360.0);
    if Channel::Heading.format().round(wrapped) >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Per-frame increment of every channel when bridging `prev` to `curr` in
/// `steps` frames.
fn increments(prev: &StateSample, curr: &StateSample, steps: usize) -> ChannelVector {
    let n = steps as f64;
    let mut inc = ChannelVector::default();

    for channel in Channel::iter() {
        let delta = match channel {
            Channel::Heading => shortest_heading_path(prev.start(channel), curr.start(channel)),
            _ => curr.start(channel) - prev.start(channel),
        };
        inc[channel] = delta / n;
    }

    inc
}

/// Frames strictly between `prev` and `curr`: for `steps` subdivisions this
/// yields `steps - 1` frames, the endpoints themselves are not included.
/// Frames are computed as they are pulled.
pub fn interpolate(
    prev: &StateSample,
    curr: &StateSample,
    steps: usize,
) -> impl Iterator<Item = ChannelVector> + use<> {
    let prev = *prev;
    let inc = increments(&prev, curr, steps.max(1));

    (1..steps).map(move |t| {
        let t = t as f64;
        let mut frame = ChannelVector::default();

        for channel in Channel::iter() {
            let value = prev.start(channel) + inc[channel] * t;

            frame[channel] = match channel {
                Channel::Heading => wrap_heading(value),
                _ => value,
            };
        }

        frame
    })
}
