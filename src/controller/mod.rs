//! Controller subsystem for gamepad input
//!
//! 1. [`device`] - Raw state snapshot, button vocabulary and the [`DeviceAdapter`] capability
//! 2. [`gilrs_adapter`] - gilrs backed adapter used by the binary
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► gilrs ──► GilrsAdapter::poll_state(slot) ──► RawControllerState
//! ```
//!
//! The transmission loop owns exactly one tracked slot and polls it once per tick.

pub mod device;
pub mod gilrs_adapter;

pub use device::{
    ButtonType, DeviceAdapter, DeviceError, NoDeviceAdapter, RawControllerState, MAX_DEVICE_SLOTS,
};
pub use gilrs_adapter::GilrsAdapter;
