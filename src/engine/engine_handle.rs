//! Engine Handle - owns the worker thread running the transmission loop
//!
//! gilrs handles are not `Send`, so every collaborator is built inside the
//! worker thread. The caller only keeps the join handle and the stop token.

use std::path::PathBuf;
use std::thread::JoinHandle;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::controller::{DeviceAdapter, GilrsAdapter, NoDeviceAdapter};
use crate::engine::clock::SystemClock;
use crate::engine::transmission_loop::{Collaborators, TransmissionLoop};
use crate::osc::OscTransmitter;
use crate::persistence::FileConfigStore;
use crate::platform::default_probe;

const WORKER_NAME: &str = "pad2osc-engine";

#[derive(Clone, Debug)]
pub struct EngineSettings {
    /// TOML file watched for changes while running
    pub config_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to spawn engine thread: {0}")]
    SpawnError(String),

    #[error("Engine thread panicked")]
    WorkerPanicked,
}

pub struct EngineHandle {
    thread: JoinHandle<()>,
    stop: CancellationToken,
}

impl EngineHandle {
    /// Starts the transmission loop on a dedicated thread.
    ///
    /// The loop runs until `stop` is cancelled (or [`stop`](Self::stop) is called).
    pub fn spawn(settings: EngineSettings, stop: CancellationToken) -> Result<Self, EngineError> {
        info!("Spawning engine with settings: {:?}", settings);

        let worker_stop = stop.clone();
        let thread = std::thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || run_worker(settings, worker_stop))
            .map_err(|e| EngineError::SpawnError(e.to_string()))?;

        info!("Engine thread started");
        Ok(Self { thread, stop })
    }

    /// Requests a stop. The loop finishes its current tick and sends a final neutral burst.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Blocks until the worker thread has exited
    pub fn join(self) -> Result<(), EngineError> {
        self.thread.join().map_err(|_| EngineError::WorkerPanicked)
    }
}

fn run_worker(settings: EngineSettings, stop: CancellationToken) {
    let device: Box<dyn DeviceAdapter> = match GilrsAdapter::create() {
        Ok(adapter) => Box::new(adapter),
        Err(e) => {
            error!("Gamepad backend unavailable: {}", e);
            warn!("Continuing without controller input, outputs stay neutral");
            Box::new(NoDeviceAdapter)
        }
    };

    let collaborators = Collaborators {
        config_source: Box::new(FileConfigStore::new(settings.config_path)),
        device,
        foreground: default_probe(),
        transmitter: Box::new(OscTransmitter::new()),
        clock: Box::new(SystemClock),
    };

    TransmissionLoop::create(collaborators).start().run(&stop);
    info!("Engine thread finished");
}
