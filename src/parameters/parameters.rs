use std::{
    fs,
    net::{SocketAddr, ToSocketAddrs},
    path::{Path, PathBuf},
};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    core::time::frame_interval,
    stream::sample::{ChannelSchema, SchemaError},
};

pub const DEFAULT_FRAME_RATE: u32 = 60;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 49003;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error deserializing configuration")]
    Deserialize(#[from] toml::de::Error),

    #[error("Error reading configuration file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Frame rate must be at least 1, got {0}")]
    InvalidFrameRate(u32),

    #[error("Invalid channel schema")]
    Schema(#[from] SchemaError),

    #[error("Cannot resolve destination '{host}:{port}'")]
    UnresolvedDestination { host: String, port: u16 },
}

/// Everything a streaming run needs. Fields missing from the TOML take their
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    /// Frames emitted per gap between two samples, also frames per second.
    pub frame_rate: u32,
    pub host: String,
    pub port: u16,
    pub input: Option<PathBuf>,
    pub has_headers: bool,
    pub schema: ChannelSchema,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            frame_rate: DEFAULT_FRAME_RATE,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            input: None,
            has_headers: true,
            schema: ChannelSchema::default(),
        }
    }
}

impl StreamConfig {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let toml = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        parse_string(toml)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.frame_rate == 0 {
            return Err(Error::InvalidFrameRate(self.frame_rate));
        }

        self.schema.validate()?;

        Ok(())
    }

    pub fn steps(&self) -> usize {
        self.frame_rate as usize
    }

    pub fn frame_interval(&self) -> TimeDelta {
        frame_interval(self.frame_rate)
    }

    pub fn destination(&self) -> Result<SocketAddr, Error> {
        let unresolved = || Error::UnresolvedDestination {
            host: self.host.clone(),
            port: self.port,
        };

        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| unresolved())?
            .next()
            .ok_or_else(unresolved)
    }
}

pub fn parse_string(toml: String) -> Result<StreamConfig, Error> {
    let config: StreamConfig = toml::from_str(&toml)?;
    Ok(config)
}
