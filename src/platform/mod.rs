//! OS-specific probes used by the engine

pub mod foreground;

pub use foreground::{default_probe, ForegroundProbe, UnsupportedForegroundProbe};
#[cfg(windows)]
pub use foreground::Win32ForegroundProbe;
