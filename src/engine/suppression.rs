//! Foreground-application suppression
//!
//! While the configured target process owns the focused window nothing but a
//! single neutral burst may be sent. The controller only decides; the loop
//! does the sending.

use crate::persistence::SuppressionConfig;
use crate::platform::ForegroundProbe;
use tracing::{debug, info};

/// Outcome of one evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuppressionTransition {
    /// Not suppressed, was not suppressed
    Inactive,
    /// Suppression starts this tick: send neutral once and reset voice
    Began,
    /// Still suppressed: skip the tick
    Held,
    /// Suppression ended this tick: resume normal polling
    Ended,
}

#[derive(Clone, Debug, Default)]
pub struct SuppressionController {
    suppressed: bool,
}

impl SuppressionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn evaluate(
        &mut self,
        config: &SuppressionConfig,
        probe: &mut dyn ForegroundProbe,
    ) -> SuppressionTransition {
        let now_suppressed = config.enabled && {
            let foreground = probe.foreground_process_name();
            debug!("Foreground process: '{}'", foreground);
            process_matches(&foreground, &config.process_name)
        };

        let transition = match (self.suppressed, now_suppressed) {
            (false, false) => SuppressionTransition::Inactive,
            (false, true) => {
                info!(
                    "{} is in the foreground, suppressing output",
                    config.process_name
                );
                SuppressionTransition::Began
            }
            (true, true) => SuppressionTransition::Held,
            (true, false) => {
                info!("Suppression ended, resuming output");
                SuppressionTransition::Ended
            }
        };
        self.suppressed = now_suppressed;
        transition
    }
}

/// Case-insensitive name comparison. An unknown foreground or an empty target never matches.
pub fn process_matches(foreground: &str, target: &str) -> bool {
    !foreground.is_empty() && !target.is_empty() && foreground.to_lowercase() == target.to_lowercase()
}
