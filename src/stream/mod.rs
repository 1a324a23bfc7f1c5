pub mod channels;
pub mod frame;
pub mod pacer;
pub mod sample;
pub mod sequencer;
pub mod transport;

pub use pacer::{Cancelled, FramePacer};
pub use sequencer::{RowOutcome, Sequencer};
pub use transport::{Transport, UdpTransport};
