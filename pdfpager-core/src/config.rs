//! Viewer configuration.
//!
//! Every field has a default so a config file only needs the values it
//! changes. Command line flags are layered on top by the binary.

use crate::error::{ConfigError, ConfigResult};
use crate::queue::QueuePolicy;
use crate::state::ZoomLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub document: PathBuf,
    pub initial_scale: f32,
    pub zoom_step: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub queue_policy: QueuePolicy,
    /// Space kept free around the page when fitting it to the view.
    pub container_margin: f32,
    pub controls_timeout_ms: u64,
    pub auto_hide_controls: bool,
    pub slide_transition: bool,
    pub slide_duration_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            document: PathBuf::from("document.pdf"),
            initial_scale: 1.5,
            zoom_step: 0.2,
            min_scale: 0.4,
            max_scale: 4.0,
            queue_policy: QueuePolicy::Queue,
            container_margin: 40.0,
            controls_timeout_ms: 2500,
            auto_hide_controls: false,
            slide_transition: false,
            slide_duration_ms: 300,
        }
    }
}

impl ViewerConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!("Loaded viewer config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("zoom_step", self.zoom_step),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.min_scale > self.max_scale {
            return Err(ConfigError::Invalid(format!(
                "min_scale {} exceeds max_scale {}",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.min_scale..=self.max_scale).contains(&self.initial_scale) {
            return Err(ConfigError::Invalid(format!(
                "initial_scale {} outside [{}, {}]",
                self.initial_scale, self.min_scale, self.max_scale
            )));
        }
        if !(self.container_margin >= 0.0) {
            return Err(ConfigError::Invalid("container_margin must not be negative".into()));
        }
        Ok(())
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.min_scale,
            max: self.max_scale,
            step: self.zoom_step,
        }
    }

    pub fn controls_timeout(&self) -> Duration {
        Duration::from_millis(self.controls_timeout_ms)
    }

    pub fn slide_duration(&self) -> Duration {
        Duration::from_millis(self.slide_duration_ms)
    }
}
