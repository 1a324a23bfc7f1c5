pub mod parameters;

pub use parameters::{Error, StreamConfig};
