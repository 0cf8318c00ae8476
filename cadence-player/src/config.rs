//! Configuration management for cadence-player
//!
//! Bootstrap configuration is a single TOML file. Every key has a built-in
//! default, so an absent file or an absent section is never an error.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--port, --telemetry-url, ...)
//! 2. Environment variables (CADENCE_CONFIG names the file)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! # Example
//!
//! ```toml
//! [server]
//! port = 5750
//!
//! [audio]
//! duck_level = 0.10
//! duck_fade_ms = 500
//!
//! [telemetry]
//! enabled = true
//! endpoint = "https://collector.example.com/v1"
//! ```

use std::path::Path;
use std::time::Duration;

use cadence_common::config::ConfigResolver;
use cadence_common::FadeCurve;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Complete bootstrap configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub audio: AudioConfig,
    pub scroll: ScrollConfig,
    pub video: VideoConfig,
    pub telemetry: TelemetryConfig,
    pub runtime: RuntimeConfig,
}

/// HTTP control API
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is not set
    pub fn default_filter(&self) -> String {
        format!("cadence_player={0},cadence_common={0},tower_http={0}", self.level)
    }
}

/// Music/voice-over mixing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Music volume while a voice-over plays, as a fraction of nominal
    pub duck_level: f32,
    /// Duration of the duck and restore ramps
    pub duck_fade_ms: u64,
    /// Volume update interval while a ramp runs
    pub fade_step_ms: u64,
    /// Nominal music volume (0.0-1.0)
    pub music_volume: f32,
    /// Voice-over volume (0.0-1.0)
    pub voiceover_volume: f32,
    pub fade_curve: FadeCurve,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duck_level: 0.10,
            duck_fade_ms: 500,
            fade_step_ms: 50,
            music_volume: 1.0,
            voiceover_volume: 1.0,
            fade_curve: FadeCurve::Linear,
        }
    }
}

impl AudioConfig {
    /// Absolute music volume while ducked
    pub fn ducked_music_volume(&self) -> f32 {
        self.music_volume * self.duck_level
    }
}

/// Narrative auto-scroll
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Stretch applied to nominal duration when no voice-over narrates the text
    pub readability_factor: f64,
    /// Pause before the first scroll frame of a segment
    pub lead_in_ms: u64,
    /// Scroll animation frame interval
    pub frame_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            readability_factor: 1.19,
            lead_in_ms: 2000,
            frame_ms: 50,
        }
    }
}

/// Demonstration video reveal
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Thumbnail phase length for exercise segments
    pub reveal_delay_ms: u64,
    /// Discrete progress increments across the reveal delay
    pub reveal_steps: u32,
    /// Final-frame hold after the clip ends
    pub hold_ms: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            reveal_delay_ms: 5000,
            reveal_steps: 5,
            hold_ms: 3000,
        }
    }
}

impl VideoConfig {
    /// Interval between reveal progress steps
    pub fn reveal_step_ms(&self) -> u64 {
        self.reveal_delay_ms / u64::from(self.reveal_steps.max(1))
    }
}

/// Remote session/section collector
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    /// Collector base URL, e.g. `https://collector.example.com/v1`
    pub endpoint: Option<String>,
    pub heartbeat_interval_secs: u64,
    pub request_timeout_ms: u64,
    /// Reports buffered between the engine and the dispatcher
    pub queue_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            heartbeat_interval_secs: 30,
            request_timeout_ms: 5000,
            queue_capacity: 256,
        }
    }
}

impl TelemetryConfig {
    pub fn heartbeat_interval_ms(&self) -> u64 {
        self.heartbeat_interval_secs * 1000
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Endpoint to post to, when telemetry is switched on
    pub fn active_endpoint(&self) -> Option<&str> {
        if self.enabled {
            self.endpoint.as_deref().filter(|e| !e.trim().is_empty())
        } else {
            None
        }
    }
}

/// Cooperative clock driving the engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Real-time interval between engine advances
    pub tick_ms: u64,
    /// Upper bound on media signal latency inside one advance
    pub media_poll_ms: u64,
    /// EventBus capacity per subscriber
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            media_poll_ms: 50,
            event_capacity: 256,
        }
    }
}

fn default_port() -> u16 {
    5750
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PlayerConfig {
    /// Resolve, load and validate the bootstrap file
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let config: PlayerConfig = ConfigResolver::new("cadence-player").load(cli_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: PlayerConfig = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make timing undefined
    pub fn validate(&self) -> Result<()> {
        let audio = &self.audio;
        if !(0.0..=1.0).contains(&audio.duck_level) {
            return Err(Error::Config(format!(
                "audio.duck_level must be within [0, 1], got {}",
                audio.duck_level
            )));
        }
        for (name, volume) in [
            ("audio.music_volume", audio.music_volume),
            ("audio.voiceover_volume", audio.voiceover_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(Error::Config(format!("{} must be within [0, 1], got {}", name, volume)));
            }
        }

        let intervals = [
            ("audio.fade_step_ms", audio.fade_step_ms),
            ("scroll.frame_ms", self.scroll.frame_ms),
            ("runtime.tick_ms", self.runtime.tick_ms),
            ("runtime.media_poll_ms", self.runtime.media_poll_ms),
            ("telemetry.heartbeat_interval_secs", self.telemetry.heartbeat_interval_secs),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(Error::Config(format!("{} must be greater than zero", name)));
        }

        if self.video.reveal_steps == 0 {
            return Err(Error::Config("video.reveal_steps must be at least 1".to_string()));
        }
        let factor = self.scroll.readability_factor;
        if factor.is_nan() || factor <= 0.0 {
            return Err(Error::Config(format!(
                "scroll.readability_factor must be positive, got {}",
                self.scroll.readability_factor
            )));
        }
        if self.runtime.event_capacity == 0 || self.telemetry.queue_capacity == 0 {
            return Err(Error::Config("channel capacities must be greater than zero".to_string()));
        }
        if self.telemetry.enabled && self.telemetry.active_endpoint().is_none() {
            return Err(Error::Config(
                "telemetry.enabled requires telemetry.endpoint".to_string(),
            ));
        }
        Ok(())
    }
}
