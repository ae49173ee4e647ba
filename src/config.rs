//! Sequencer configuration parameters
//!
//! All tunable parameters for the switch sequencer.
//! Values can be overridden from a JSON config file (see
//! [`JsonFileConfig`](crate::adapters::config_file::JsonFileConfig)).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// GATT service UUID advertised by stack peripherals.
pub const DEFAULT_RADIO_SERVICE_UUID: &str = "ADE3D529-C784-4F63-A987-EB69F70EE816";

/// Core sequencer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    // --- Matching ---
    /// Resource type a candidate must declare to be driven
    pub target_resource_type: String,
    /// Boolean attribute read by GET and written by PUT
    pub target_attribute: String,
    /// Service UUID a radio peer must advertise before unicast discovery
    pub radio_service_uuid: String,

    // --- Interaction timing ---
    /// Delay from GET success to the toggling PUT (milliseconds)
    pub put_delay_ms: u64,
    /// Length of the observation window started at GET success (milliseconds)
    pub observe_window_ms: u64,

    // --- Runtime (binary only) ---
    /// Wait before starting discovery, giving the stack time to settle
    pub startup_delay_ms: u64,
    /// Sequencer loop interval (milliseconds)
    pub loop_interval_ms: u64,
    /// How long the demo runs before exiting (milliseconds)
    pub run_duration_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            // Matching
            target_resource_type: "oic.r.switch.binary".into(),
            target_attribute: "value".into(),
            radio_service_uuid: DEFAULT_RADIO_SERVICE_UUID.into(),

            // Interaction timing
            put_delay_ms: 2_000,
            observe_window_ms: 5_000,

            // Runtime
            startup_delay_ms: 1_000,
            loop_interval_ms: 50, // 20 Hz
            run_duration_ms: 15_000,
        }
    }
}

impl SequencerConfig {
    /// Range-check every field.
    ///
    /// The PUT must land inside the observation window, otherwise a slot
    /// would be asked to write after its cycle already closed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_resource_type.is_empty() {
            return Err(ConfigError::ValidationFailed("target_resource_type is empty"));
        }
        if self.target_attribute.is_empty() {
            return Err(ConfigError::ValidationFailed("target_attribute is empty"));
        }
        if self.radio_service_uuid.len() != 36 {
            return Err(ConfigError::ValidationFailed(
                "radio_service_uuid must be a 36-char UUID string",
            ));
        }
        if self.put_delay_ms == 0 {
            return Err(ConfigError::ValidationFailed("put_delay_ms must be > 0"));
        }
        if self.observe_window_ms == 0 {
            return Err(ConfigError::ValidationFailed("observe_window_ms must be > 0"));
        }
        if self.put_delay_ms >= self.observe_window_ms {
            return Err(ConfigError::ValidationFailed(
                "put_delay_ms must be shorter than observe_window_ms",
            ));
        }
        if self.loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop_interval_ms must be > 0"));
        }
        Ok(())
    }
}
