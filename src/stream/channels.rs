use std::ops::{Index, IndexMut};

use strum::{Display, EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

/// Output channels, in wire order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    Latitude,
    Longitude,
    GroundSpeed,
    Heading,
    Altitude,
    Elevation,
    Pitch,
    Aux1,
    Bank,
    Aux2,
    Aux3,
    HeightAboveGround,
}

pub const CHANNEL_COUNT: usize = Channel::COUNT;

/// Raw value meaning "no data".
pub const SENTINEL: f64 = 999.0;

impl Channel {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn format(self) -> FieldFormat {
        match self {
            Channel::Latitude | Channel::Longitude => FieldFormat::new(3, 10),
            Channel::Altitude | Channel::Elevation | Channel::HeightAboveGround => {
                FieldFormat::new(5, 2)
            }
            _ => FieldFormat::new(3, 2),
        }
    }
}

/// Zero padded fixed-point rendering: minimum width and decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFormat {
    pub width: usize,
    pub precision: usize,
}

impl FieldFormat {
    pub const fn new(width: usize, precision: usize) -> Self {
        Self { width, precision }
    }

    /// `value` rounded to the decimal places it is rendered with. Never below
    /// what `render` shows, so a rendered limit is reached here too.
    pub fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.precision as i32);
        (value * scale).round() / scale
    }

    pub fn render(&self, value: f64) -> String {
        format!(
            "{:0width$.precision$}",
            value,
            width = self.width,
            precision = self.precision
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelVector([f64; CHANNEL_COUNT]);

impl ChannelVector {
    pub fn new(values: [f64; CHANNEL_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; CHANNEL_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::iter().zip(self.0.iter().copied())
    }

    pub fn heading(&self) -> f64 {
        self[Channel::Heading]
    }

    pub fn altitude(&self) -> f64 {
        self[Channel::Altitude]
    }

    pub fn ground_speed(&self) -> f64 {
        self[Channel::GroundSpeed]
    }
}

impl Index<Channel> for ChannelVector {
    type Output = f64;

    fn index(&self, channel: Channel) -> &Self::Output {
        &self.0[channel.index()]
    }
}

impl IndexMut<Channel> for ChannelVector {
    fn index_mut(&mut self, channel: Channel) -> &mut Self::Output {
        &mut self.0[channel.index()]
    }
}
