//! In-memory collaborators for driving the loop tick by tick

use crate::controller::{DeviceAdapter, RawControllerState};
use crate::engine::clock::Clock;
use crate::engine::transmission_loop::{Collaborators, Running, TransmissionLoop};
use crate::osc::{SignalValue, Transmitter};
use crate::persistence::{BridgeConfig, ConfigError, ConfigSource};
use crate::platform::ForegroundProbe;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

pub type Sent = (String, SignalValue);

#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

pub struct ScriptedDevice {
    slot: usize,
    connected: Rc<Cell<bool>>,
    state: Rc<Cell<RawControllerState>>,
}

impl DeviceAdapter for ScriptedDevice {
    fn poll_state(&mut self, slot: usize) -> Option<RawControllerState> {
        (self.connected.get() && slot == self.slot).then(|| self.state.get())
    }
}

pub struct FixedProbe {
    name: Rc<RefCell<String>>,
}

impl ForegroundProbe for FixedProbe {
    fn foreground_process_name(&mut self) -> String {
        self.name.borrow().clone()
    }
}

pub struct RecordingTransmitter {
    sent: Rc<RefCell<Vec<Sent>>>,
    destinations: Rc<RefCell<Vec<(String, u16)>>>,
}

impl Transmitter for RecordingTransmitter {
    fn set_destination(&mut self, host: &str, port: u16) {
        self.destinations.borrow_mut().push((host.to_string(), port));
    }

    fn send(&mut self, address: &str, value: SignalValue) {
        self.sent.borrow_mut().push((address.to_string(), value));
    }
}

pub struct MemoryConfigSource {
    text: Rc<RefCell<String>>,
    changed: Rc<Cell<bool>>,
}

impl ConfigSource for MemoryConfigSource {
    fn has_changed(&mut self) -> bool {
        self.changed.get()
    }

    fn load(&mut self) -> Result<BridgeConfig, ConfigError> {
        self.changed.set(false);
        BridgeConfig::from_toml_str(&self.text.borrow())
    }
}

/// Shared handles onto the fakes handed to a loop
pub struct Harness {
    now: Rc<Cell<Instant>>,
    connected: Rc<Cell<bool>>,
    state: Rc<Cell<RawControllerState>>,
    foreground: Rc<RefCell<String>>,
    sent: Rc<RefCell<Vec<Sent>>>,
    destinations: Rc<RefCell<Vec<(String, u16)>>>,
    config_text: Rc<RefCell<String>>,
    config_changed: Rc<Cell<bool>>,
}

impl Harness {
    /// Connected controller in slot 0, idle input, unrelated foreground window
    pub fn new(config: &str) -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
            connected: Rc::new(Cell::new(true)),
            state: Rc::new(Cell::new(RawControllerState::default())),
            foreground: Rc::new(RefCell::new("explorer.exe".to_string())),
            sent: Rc::new(RefCell::new(Vec::new())),
            destinations: Rc::new(RefCell::new(Vec::new())),
            config_text: Rc::new(RefCell::new(config.to_string())),
            config_changed: Rc::new(Cell::new(false)),
        }
    }

    pub fn start(config: &str) -> (Self, TransmissionLoop<Running>) {
        let harness = Self::new(config);
        let lp = harness.build();
        (harness, lp)
    }

    pub fn build(&self) -> TransmissionLoop<Running> {
        TransmissionLoop::create(Collaborators {
            config_source: Box::new(MemoryConfigSource {
                text: self.config_text.clone(),
                changed: self.config_changed.clone(),
            }),
            device: Box::new(ScriptedDevice {
                slot: 0,
                connected: self.connected.clone(),
                state: self.state.clone(),
            }),
            foreground: Box::new(FixedProbe {
                name: self.foreground.clone(),
            }),
            transmitter: Box::new(RecordingTransmitter {
                sent: self.sent.clone(),
                destinations: self.destinations.clone(),
            }),
            clock: Box::new(ManualClock {
                now: self.now.clone(),
            }),
        })
        .start()
    }

    pub fn now(&self) -> Instant {
        self.now.get()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set_state(&self, state: RawControllerState) {
        self.state.set(state);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.set(connected);
    }

    pub fn set_foreground(&self, name: &str) {
        *self.foreground.borrow_mut() = name.to_string();
    }

    /// Replaces the stored document and flags it as changed
    pub fn push_config(&self, config: &str) {
        *self.config_text.borrow_mut() = config.to_string();
        self.config_changed.set(true);
    }

    pub fn take_sent(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }

    pub fn destinations(&self) -> Vec<(String, u16)> {
        self.destinations.borrow().clone()
    }
}
