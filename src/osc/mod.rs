//! # OSC Output Module
//!
//! One-way transport for the mapped signals. Each value goes out as a single
//! OSC message in its own UDP datagram, with no acknowledgement and no retry.
//! The receiver is level driven, so a lost datagram is corrected by the next
//! tick.
//!
//! ```text
//! osc/
//! └── transmitter.rs  - Transmitter capability and the UDP implementation
//! ```

pub mod transmitter;

pub use transmitter::{OscTransmitter, SignalValue, Transmitter};
