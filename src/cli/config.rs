//! Configuration management for penlight
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.penlight/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{ExamError, Result};
use crate::exam::diagnosis::PERMANENT_BLINDNESS_THRESHOLD;
use crate::exam::orchestrator::ExamConfig;
use crate::exam::skill::SkillKind;

/// Complete configuration for penlight
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exam: ExamSection,
    pub simulation: SimulationConfig,
    pub telemetry: TelemetryConfig,
}

/// Examination behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamSection {
    /// Default exam duration for instruments that do not set their own
    pub duration_ms: u64,
    pub blindness_threshold: u32,
    pub skill: SkillKind,
}

/// Simulation driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_ms: u64,
    /// Seed for the dice skill checker
    pub seed: u64,
    /// Pace ticks against the wall clock
    pub realtime: bool,
}

/// Telemetry display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub default_verbosity: String,
    pub color_output: bool,
}

impl Default for ExamSection {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            blindness_threshold: PERMANENT_BLINDNESS_THRESHOLD,
            skill: SkillKind::FirstAid,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            seed: 0x5eed,
            realtime: false,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            color_output: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&Self::expand_path(&config_path.to_string_lossy()))
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ExamError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config location, if a home directory exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".penlight").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.exam.duration_ms == 0 {
            return Err(ExamError::ConfigError(
                "duration_ms must be greater than 0".to_string(),
            ));
        }

        if self.exam.blindness_threshold < 2 {
            return Err(ExamError::ConfigError(
                "blindness_threshold must leave room for partial eye damage (>= 2)".to_string(),
            ));
        }

        if self.simulation.tick_ms == 0 {
            return Err(ExamError::ConfigError(
                "tick_ms must be greater than 0".to_string(),
            ));
        }

        match self.telemetry.default_verbosity.as_str() {
            "quiet" | "normal" | "verbose" | "very_verbose" => {}
            _ => {
                return Err(ExamError::ConfigError(format!(
                    "Invalid verbosity level: {}",
                    self.telemetry.default_verbosity
                )))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ExamError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Orchestrator settings derived from this config
    pub fn exam_config(&self) -> ExamConfig {
        ExamConfig {
            skill: self.exam.skill,
            blindness_threshold: self.exam.blindness_threshold,
        }
    }

    pub fn default_exam_duration(&self) -> Duration {
        Duration::from_millis(self.exam.duration_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.simulation.tick_ms)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }
}
