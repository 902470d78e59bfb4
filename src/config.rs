use crate::common::PoseSequence;
use crate::engine::{EngineConfig, SessionMode};
use crate::error::ConfigError;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

const DEFAULT_FILE: &str = "surya";
const ENV_PREFIX: &str = "SURYA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub progress_step: f32,
    pub hold_threshold: f32,
    pub advance_delay_ms: u64,
    pub match_confidence_floor: f32,
    /// `sequence` (or `practice`) walks the flow, `learn` holds `learn_pose`.
    pub mode: SessionMode,
    pub learn_pose: Option<String>,
    /// Overrides the built-in flow when set.
    pub sequence: Option<Vec<String>>,
    pub command_buffer: usize,
    pub frame_buffer: usize,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            poll_interval_ms: 500,
            request_timeout_ms: 2000,
            progress_step: 5.0,
            hold_threshold: 100.0,
            advance_delay_ms: 1000,
            match_confidence_floor: 0.0,
            mode: SessionMode::Sequence,
            learn_pose: None,
            sequence: None,
            command_buffer: 16,
            frame_buffer: 4,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then `surya.toml` (or `path`), then `SURYA_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = match path {
            Some(path) => Config::builder().add_source(File::from(path)),
            None => Config::builder().add_source(File::with_name(DEFAULT_FILE).required(false)),
        };
        Self::from_builder(
            builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            ),
        )
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Self::from_builder(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidSetting {
                field: "api_url",
                reason: format!("'{}' is not an http(s) URL", self.api_url),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid_zero("poll_interval_ms"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid_zero("request_timeout_ms"));
        }
        if self.command_buffer == 0 {
            return Err(invalid_zero("command_buffer"));
        }
        if self.frame_buffer == 0 {
            return Err(invalid_zero("frame_buffer"));
        }
        if Level::from_str(&self.log_level).is_err() {
            return Err(ConfigError::InvalidSetting {
                field: "log_level",
                reason: format!("unknown level '{}'", self.log_level),
            });
        }
        self.engine_config()?.validate()
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let base = match self.mode {
            SessionMode::Sequence => match &self.sequence {
                Some(poses) => EngineConfig::practice(PoseSequence::new(poses.iter().map(String::as_str))),
                None => EngineConfig::practice(PoseSequence::suryanamaskara()),
            },
            SessionMode::Learn => match self.learn_pose.as_deref().map(str::trim) {
                Some(pose) if !pose.is_empty() => EngineConfig::learn(pose),
                _ => return Err(ConfigError::MissingLearnPose),
            },
        };
        Ok(base
            .with_progress_step(self.progress_step)
            .with_hold_threshold(self.hold_threshold)
            .with_advance_delay(self.advance_delay())
            .with_confidence_floor(self.match_confidence_floor))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

fn invalid_zero(field: &'static str) -> ConfigError {
    ConfigError::InvalidSetting {
        field,
        reason: "must be greater than 0".to_string(),
    }
}
