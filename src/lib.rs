//! pad2osc: gamepad input to OSC over UDP
//!
//! Polls a gamepad at a fixed rate, normalizes sticks and triggers, and sends
//! the result as OSC messages. Outputs fall back to neutral when the controller
//! goes silent or when the configured application has focus.

pub mod controller;
pub mod engine;
pub mod mapping;
pub mod osc;
pub mod persistence;
pub mod platform;
