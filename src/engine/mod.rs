//! Transmission engine
//!
//! Runs the fixed-rate loop that turns controller state into OSC messages:
//!
//! ```text
//! EngineHandle (worker thread)
//!   └─ TransmissionLoop<Running>
//!        ├─ ConfigSource      reload on change
//!        ├─ ForegroundProbe   suppression
//!        ├─ DeviceAdapter     poll / reacquire, FailsafeMonitor
//!        ├─ map_state + VoiceSignal
//!        └─ Transmitter       one burst per tick
//! ```

pub mod clock;
pub mod engine_handle;
pub mod failsafe;
pub mod suppression;
pub mod transmission_loop;

#[cfg(test)]
mod testing;

pub use clock::{Clock, SystemClock};
pub use engine_handle::{EngineError, EngineHandle, EngineSettings};
pub use failsafe::FailsafeMonitor;
pub use suppression::{process_matches, SuppressionController, SuppressionTransition};
pub use transmission_loop::{
    Collaborators, Initializing, OutputFrame, Running, TransmissionLoop, POLL_RETRY_PAUSE,
    REACQUIRE_PAUSE, SUPPRESSED_PAUSE,
};
