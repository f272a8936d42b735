//! Transmission loop with statum typestate
//!
//! # State Machine
//!
//! ```text
//! Initializing ──start()──► Running ──run() until stop──► (final neutral burst)
//! ```
//!
//! # Tick
//!
//! ```text
//! reload? ──► suppression ──► acquire/poll ──► failsafe ──► map ──► voice ──► send
//!                 │                  │
//!                 └─ skip tick       └─ neutral after timeout, retry at reduced cadence
//! ```
//!
//! The loop owns every piece of cross-tick state (config snapshot, tracked slot,
//! voice, failsafe, suppression). Nothing else touches it.

use crate::controller::DeviceAdapter;
use crate::engine::clock::Clock;
use crate::engine::failsafe::FailsafeMonitor;
use crate::engine::suppression::{SuppressionController, SuppressionTransition};
use crate::mapping::{map_state, MappedInput, VoiceSignal};
use crate::osc::{SignalValue, Transmitter};
use crate::persistence::{BridgeConfig, ConfigSource};
use crate::platform::ForegroundProbe;
use chrono::Local;
use statum::{machine, state};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Pause while the target application has focus
pub const SUPPRESSED_PAUSE: Duration = Duration::from_millis(20);
/// Pause after a search that found no controller
pub const REACQUIRE_PAUSE: Duration = Duration::from_millis(200);
/// Pause after a failed poll of the tracked controller
pub const POLL_RETRY_PAUSE: Duration = Duration::from_millis(100);

const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// External capabilities the loop is wired to
pub struct Collaborators {
    pub config_source: Box<dyn ConfigSource>,
    pub device: Box<dyn DeviceAdapter>,
    pub foreground: Box<dyn ForegroundProbe>,
    pub transmitter: Box<dyn Transmitter>,
    pub clock: Box<dyn Clock>,
}

/// Values for one send burst, in wire order
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputFrame {
    pub move_x: f32,
    pub move_y: f32,
    pub look_x: f32,
    pub look_y: f32,
    pub jump: i32,
    pub voice: i32,
    /// `None` when grab triggers are disabled; nothing is sent for them then
    pub grab: Option<(f32, f32)>,
}

impl OutputFrame {
    pub fn neutral(grab_enabled: bool) -> Self {
        Self {
            move_x: 0.0,
            move_y: 0.0,
            look_x: 0.0,
            look_y: 0.0,
            jump: 0,
            voice: 0,
            grab: grab_enabled.then_some((0.0, 0.0)),
        }
    }

    pub fn from_mapped(mapped: &MappedInput, voice: i32, grab_enabled: bool) -> Self {
        Self {
            move_x: mapped.move_x,
            move_y: mapped.move_y,
            look_x: mapped.look_x,
            look_y: mapped.look_y,
            jump: i32::from(mapped.jump),
            voice,
            grab: grab_enabled.then_some((mapped.grab_left, mapped.grab_right)),
        }
    }
}

#[derive(Clone, Debug)]
struct LoopStats {
    ticks: u64,
    frames: u64,
    failsafe_bursts: u64,
    since: Instant,
}

impl LoopStats {
    fn new(now: Instant) -> Self {
        Self {
            ticks: 0,
            frames: 0,
            failsafe_bursts: 0,
            since: now,
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum LoopState {
    Initializing,
    Running,
}

#[machine]
pub struct TransmissionLoop<S: LoopState> {
    config_source: Box<dyn ConfigSource>,
    device: Box<dyn DeviceAdapter>,
    foreground: Box<dyn ForegroundProbe>,
    transmitter: Box<dyn Transmitter>,
    clock: Box<dyn Clock>,

    // Current snapshot, replaced wholesale on reload
    config: BridgeConfig,

    active_slot: Option<usize>,
    voice: VoiceSignal,
    failsafe: FailsafeMonitor,
    suppression: SuppressionController,
    stats: LoopStats,
}

impl<S: LoopState> TransmissionLoop<S> {
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn active_slot(&self) -> Option<usize> {
        self.active_slot
    }
}

impl TransmissionLoop<Initializing> {
    /// Wires the collaborators and loads the first snapshot.
    ///
    /// A missing or broken config file is not an error: the defaults are used
    /// until a valid file shows up.
    pub fn create(collaborators: Collaborators) -> Self {
        let Collaborators {
            mut config_source,
            device,
            foreground,
            transmitter,
            clock,
        } = collaborators;

        let config = match config_source.load() {
            Ok(config) => {
                info!("Loaded configuration");
                config
            }
            Err(e) => {
                warn!("Could not load configuration, using defaults: {}", e);
                BridgeConfig::default()
            }
        };
        debug!("Initial configuration: {:?}", config);

        let now = clock.now();
        Self::new(
            config_source,
            device,
            foreground,
            transmitter,
            clock,
            config,
            None,                          // active_slot
            VoiceSignal::new(),            // voice
            FailsafeMonitor::new(now),     // failsafe
            SuppressionController::new(),  // suppression
            LoopStats::new(now),           // stats
        )
    }

    /// Opens the destination, searches for a controller and transitions to Running
    pub fn start(mut self) -> TransmissionLoop<Running> {
        let network = self.config.network.clone();
        info!(
            "Starting transmission loop: {}:{} at {} Hz",
            network.host, network.port, network.send_rate_hz
        );
        self.transmitter.set_destination(&network.host, network.port);

        self.active_slot = self.device.enumerate();
        match self.active_slot {
            Some(slot) => info!("Controller found in slot {}", slot),
            None => warn!("No controller found yet, will keep searching"),
        }
        self.transition()
    }
}

impl TransmissionLoop<Running> {
    /// Runs ticks until `stop` is cancelled, then sends one final neutral burst.
    ///
    /// The token is checked at the top of every tick; a tick in progress always completes.
    pub fn run(mut self, stop: &CancellationToken) {
        info!("Transmission loop running");
        while !stop.is_cancelled() {
            let pause = self.tick();
            self.clock.sleep(pause);
        }
        info!("Stop requested, releasing all outputs");
        self.send_neutral();
    }

    /// Executes one iteration and returns how long to sleep before the next
    pub fn tick(&mut self) -> Duration {
        let started = self.clock.now();
        self.stats.ticks += 1;
        self.log_stats(started);

        self.reload_if_changed();

        match self
            .suppression
            .evaluate(&self.config.suppression, self.foreground.as_mut())
        {
            SuppressionTransition::Began => {
                self.send_neutral();
                self.voice.reset();
                return SUPPRESSED_PAUSE;
            }
            SuppressionTransition::Held => return SUPPRESSED_PAUSE,
            SuppressionTransition::Ended | SuppressionTransition::Inactive => {}
        }

        let slot = match self.active_slot {
            Some(slot) => slot,
            None => match self.acquire_device() {
                Some(slot) => slot,
                None => return self.handle_device_absent(started, REACQUIRE_PAUSE),
            },
        };

        let Some(raw) = self.device.poll_state(slot) else {
            warn!("Controller in slot {} stopped responding", slot);
            self.active_slot = None;
            let pause = self.handle_device_absent(started, POLL_RETRY_PAUSE);
            self.acquire_device();
            return pause;
        };

        self.failsafe.record_success(started);
        let mapped = map_state(&raw, &self.config);
        let voice = self
            .voice
            .update(self.config.buttons.voice_mode, mapped.voice_down, started);
        trace!("Mapped input: {:?}, voice {}", mapped, voice);

        let frame =
            OutputFrame::from_mapped(&mapped, voice, self.config.buttons.enable_grab_triggers);
        self.send_frame(&frame);

        let elapsed = self.clock.now().saturating_duration_since(started);
        self.config.tick_period().saturating_sub(elapsed)
    }

    fn reload_if_changed(&mut self) {
        if !self.config_source.has_changed() {
            return;
        }
        match self.config_source.load() {
            Ok(config) => {
                info!("Configuration changed, reloading");
                debug!("New configuration: {:?}", config);
                self.config = config;
                let network = &self.config.network;
                self.transmitter.set_destination(&network.host, network.port);
            }
            Err(e) => warn!("Config reload failed, keeping previous settings: {}", e),
        }
    }

    fn acquire_device(&mut self) -> Option<usize> {
        self.active_slot = self.device.enumerate();
        if let Some(slot) = self.active_slot {
            info!("Controller acquired in slot {}", slot);
        }
        self.active_slot
    }

    // Neutral once the timeout has passed; before that, never sleep past the
    // deadline by more than one tick period.
    fn handle_device_absent(&mut self, now: Instant, pause: Duration) -> Duration {
        let timeout = self.config.failsafe_timeout();
        if self.failsafe.check(now, timeout) {
            self.send_neutral();
            self.stats.failsafe_bursts += 1;
            return pause;
        }
        let until_trip = self.failsafe.time_until_trip(now, timeout);
        pause.min(until_trip.saturating_add(self.config.tick_period()))
    }

    fn send_neutral(&mut self) {
        let frame = OutputFrame::neutral(self.config.buttons.enable_grab_triggers);
        self.send_frame(&frame);
    }

    fn send_frame(&mut self, frame: &OutputFrame) {
        let addresses = &self.config.addresses;
        let tx = self.transmitter.as_mut();

        tx.send(&addresses.move_x, SignalValue::Float(frame.move_x));
        tx.send(&addresses.move_y, SignalValue::Float(frame.move_y));
        tx.send(&addresses.look_x, SignalValue::Float(frame.look_x));
        tx.send(&addresses.look_y, SignalValue::Float(frame.look_y));
        tx.send(&addresses.jump, SignalValue::Int(frame.jump));
        tx.send(&addresses.voice, SignalValue::Int(frame.voice));
        if let Some((left, right)) = frame.grab {
            tx.send(&addresses.grab_left, SignalValue::Float(left));
            tx.send(&addresses.grab_right, SignalValue::Float(right));
        }
        self.stats.frames += 1;
    }

    fn log_stats(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.stats.since);
        if elapsed < STATS_INTERVAL {
            return;
        }
        info!(
            "Transmission stats at {}: {} ticks, {} frames, {} failsafe bursts in last {} seconds",
            Local::now().format("%H:%M:%S"),
            self.stats.ticks,
            self.stats.frames,
            self.stats.failsafe_bursts,
            elapsed.as_secs()
        );
        self.stats = LoopStats::new(now);
    }
}
