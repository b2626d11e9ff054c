#![no_std]

mod bridge;
mod codec;
mod config;
mod frame;
mod gateway;
mod message;
mod queue;
mod registry;

/// Capacity of a classic CAN data payload in bytes.
pub const FRAME_DATA_CAPACITY: usize = 8;

/// Upper bound on one JSON line written to the host, terminator included.
pub const JSON_LINE_CAPACITY: usize = 512;

/// Capacity of the serial input accumulator. A line that does not terminate
/// within this many bytes is discarded.
pub const INPUT_CAPACITY: usize = 256;

/// Largest chunk handed to the serial driver in a single write.
pub const OUTPUT_CAPACITY: usize = 256;

/// Protocol ceiling on pending frames (8-bit counter on the bus controller).
pub const MAX_QUEUE_CEILING: usize = 255;

/// Bound on the software transmit queue, well under [`MAX_QUEUE_CEILING`].
pub const TX_QUEUE_DEPTH: usize = 16;

pub use bridge::*;
pub use config::*;
pub use frame::*;
pub use gateway::*;
pub use message::*;
pub use queue::*;
pub use registry::*;

pub use embedded_can::StandardId;
