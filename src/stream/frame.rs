use itertools::Itertools;

use super::channels::ChannelVector;

pub const FIELD_SEPARATOR: &str = "\t";
pub const RECORD_TERMINATOR: &str = "\n";

/// Text line for one frame: every channel in its fixed-point format,
/// tab separated and newline terminated.
pub fn encode(frame: &ChannelVector) -> String {
    let mut line = frame
        .iter()
        .map(|(channel, value)| channel.format().render(value))
        .join(FIELD_SEPARATOR);

    line.push_str(RECORD_TERMINATOR);
    line
}
