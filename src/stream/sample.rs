use std::fmt;

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;

use super::channels::{Channel, ChannelVector, SENTINEL};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Row has {len} columns, device tag column {column} is missing")]
    MissingTag { column: usize, len: usize },

    #[error("Row has {len} columns, column {column} is required for '{channel}'")]
    MissingColumn {
        channel: Channel,
        column: usize,
        len: usize,
    },

    #[error("Cannot parse '{value}' in column {column} ('{channel}') as a number")]
    NotNumeric {
        channel: Channel,
        column: usize,
        value: String,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Channel '{channel}' subtracts column {column} from itself")]
    DegenerateDifference { channel: Channel, column: usize },

    #[error("Channel '{channel}' reads column {column}, which holds the device tag")]
    TagColumnOverlap { channel: Channel, column: usize },
}

/// Identifies the device a row was logged by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceTag(String);

impl DeviceTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSource {
    Column(usize),
    Difference { minuend: usize, subtrahend: usize },
}

impl ColumnSource {
    fn columns(&self) -> Vec<usize> {
        match *self {
            ColumnSource::Column(c) => vec![c],
            ColumnSource::Difference {
                minuend,
                subtrahend,
            } => vec![minuend, subtrahend],
        }
    }
}

/// Maps every non-derived channel to the input columns it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelSchema {
    pub device_tag: usize,
    pub latitude: ColumnSource,
    pub longitude: ColumnSource,
    pub ground_speed: ColumnSource,
    pub heading: ColumnSource,
    pub altitude: ColumnSource,
    pub elevation: ColumnSource,
    pub aux_1: ColumnSource,
    pub aux_2: ColumnSource,
    pub aux_3: ColumnSource,
    pub height_above_ground: ColumnSource,
}

impl Default for ChannelSchema {
    fn default() -> Self {
        ChannelSchema {
            device_tag: 1,
            latitude: ColumnSource::Column(4),
            longitude: ColumnSource::Column(5),
            ground_speed: ColumnSource::Column(6),
            heading: ColumnSource::Column(7),
            altitude: ColumnSource::Column(8),
            elevation: ColumnSource::Column(10),
            aux_1: ColumnSource::Column(23),
            aux_2: ColumnSource::Column(25),
            aux_3: ColumnSource::Column(27),
            height_above_ground: ColumnSource::Difference {
                minuend: 8,
                subtrahend: 10,
            },
        }
    }
}

impl ChannelSchema {
    /// `None` for derived channels.
    pub fn source(&self, channel: Channel) -> Option<ColumnSource> {
        match channel {
            Channel::Latitude => Some(self.latitude),
            Channel::Longitude => Some(self.longitude),
            Channel::GroundSpeed => Some(self.ground_speed),
            Channel::Heading => Some(self.heading),
            Channel::Altitude => Some(self.altitude),
            Channel::Elevation => Some(self.elevation),
            Channel::Pitch => None,
            Channel::Aux1 => Some(self.aux_1),
            Channel::Bank => None,
            Channel::Aux2 => Some(self.aux_2),
            Channel::Aux3 => Some(self.aux_3),
            Channel::HeightAboveGround => Some(self.height_above_ground),
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        for channel in Channel::iter() {
            let Some(source) = self.source(channel) else {
                continue;
            };

            if let ColumnSource::Difference {
                minuend,
                subtrahend,
            } = source
            {
                if minuend == subtrahend {
                    return Err(SchemaError::DegenerateDifference {
                        channel,
                        column: minuend,
                    });
                }
            }

            if let Some(&column) = source.columns().iter().find(|&&c| c == self.device_tag) {
                return Err(SchemaError::TagColumnOverlap { channel, column });
            }
        }

        Ok(())
    }

    /// Smallest row width able to satisfy every channel.
    pub fn min_columns(&self) -> usize {
        Channel::iter()
            .filter_map(|c| self.source(c))
            .flat_map(|s| s.columns())
            .chain(std::iter::once(self.device_tag))
            .max()
            .map_or(0, |c| c + 1)
    }

    pub fn device_tag(&self, row: &StringRecord) -> Result<DeviceTag, Error> {
        row.get(self.device_tag)
            .map(|tag| DeviceTag(tag.to_string()))
            .ok_or(Error::MissingTag {
                column: self.device_tag,
                len: row.len(),
            })
    }

    /// Reads every non-derived channel of `row`. Derived channels are left at
    /// zero and sentinel values are replaced by zero.
    pub fn extract(&self, row: &StringRecord) -> Result<ChannelVector, Error> {
        let mut vector = ChannelVector::default();

        for channel in Channel::iter() {
            let value = match self.source(channel) {
                None => continue,
                Some(ColumnSource::Column(column)) => field(row, channel, column)?,
                Some(ColumnSource::Difference {
                    minuend,
                    subtrahend,
                }) => field(row, channel, minuend)? - field(row, channel, subtrahend)?,
            };

            vector[channel] = if value == SENTINEL { 0.0 } else { value };
        }

        Ok(vector)
    }
}

fn field(row: &StringRecord, channel: Channel, column: usize) -> Result<f64, Error> {
    let raw = row.get(column).ok_or(Error::MissingColumn {
        channel,
        column,
        len: row.len(),
    })?;

    raw.trim().parse::<f64>().map_err(|_| Error::NotNumeric {
        channel,
        column,
        value: raw.to_string(),
    })
}
