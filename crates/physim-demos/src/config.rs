//! Demo configuration loaded from TOML.
//!
//! Every section is optional; missing keys take the demo defaults.
//!
//! ```toml
//! seed = 42
//!
//! [display]
//! width = 640
//! height = 480
//!
//! [spring]
//! connectivity = "full"
//! gravity = 0.01
//! floor = 400.0
//! ```

use crate::simulation::{FountainParams, GravityParams, SpringParams, WaveParams};
use physim_core::{ColorRange, Result, SimError};
use serde::Deserialize;
use std::path::Path;

/// Screen and presentation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Surface width in pixels.
    pub width: usize,
    /// Surface height in pixels.
    pub height: usize,
    /// Present every n-th frame (0 disables). Each demo has its own default.
    pub display_every: Option<u64>,
    /// Fixed `[min, max]` rescale range; scanned per frame when unset.
    pub range: Option<(f32, f32)>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            display_every: None,
            range: None,
        }
    }
}

impl DisplayConfig {
    /// The rescale mode for the framebuffer.
    pub fn color_range(&self) -> ColorRange {
        match self.range {
            Some((min, max)) => ColorRange::Fixed(min, max),
            None => ColorRange::Auto,
        }
    }
}

/// Configuration for all demos.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// RNG seed for the initial state; drawn from the OS when unset.
    pub seed: Option<u64>,
    /// Frames to run; each demo has its own default.
    pub frames: Option<u64>,
    /// Display settings.
    pub display: DisplayConfig,
    /// Wave demo.
    pub wave: WaveParams,
    /// Gravity demo.
    pub gravity: GravityParams,
    /// Spring mesh demo.
    pub spring: SpringParams,
    /// Fountain demo.
    pub fountain: FountainParams,
}

impl DemoConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SimError::config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Reject parameters no demo can run with.
    ///
    /// Display dimensions are left to the framebuffer, which reports them
    /// as a display initialization failure.
    pub fn validate(&self) -> Result<()> {
        if let Some((min, max)) = self.display.range {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(SimError::config(format!(
                    "display.range must be increasing, got [{min}, {max}]"
                )));
            }
        }

        if !self.wave.scale.is_finite() || self.wave.scale < 0.0 {
            return Err(SimError::config(format!(
                "wave.scale must be a non-negative number, got {}",
                self.wave.scale
            )));
        }

        if self.gravity.particles == 0 {
            return Err(SimError::config("gravity.particles must be at least 1"));
        }
        if self.gravity.with_mass && self.gravity.anchor_mass <= 0.0 {
            return Err(SimError::config("gravity.anchor_mass must be positive"));
        }

        let spring = &self.spring;
        if spring.mesh_width < 2 || spring.mesh_height < 2 {
            return Err(SimError::config(format!(
                "spring mesh must be at least 2x2, got {}x{}",
                spring.mesh_width, spring.mesh_height
            )));
        }
        if let Some(row) = spring.drive_row {
            if row >= spring.mesh_height {
                return Err(SimError::config(format!(
                    "spring.drive_row {row} is outside a mesh of {} rows",
                    spring.mesh_height
                )));
            }
            if spring.drive_period == 0.0 || !spring.drive_period.is_finite() {
                return Err(SimError::config("spring.drive_period must be non-zero"));
            }
        }

        if self.fountain.particles == 0 {
            return Err(SimError::config("fountain.particles must be at least 1"));
        }
        if !self.fountain.timescale.is_finite() || self.fountain.timescale <= 0.0 {
            return Err(SimError::config("fountain.timescale must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Connectivity, RespawnPolicy};

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = DemoConfig::from_toml_str("").unwrap();
        assert_eq!(config.display.width, 1280);
        assert_eq!(config.display.height, 720);
        assert_eq!(config.wave.scale, 0.3);
        assert_eq!(config.gravity.particles, 512);
        assert_eq!(config.spring.mesh_width, 32);
        assert_eq!(config.fountain.particles, 100_000);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sections_override() {
        let config = DemoConfig::from_toml_str(
            r#"
            seed = 7
            frames = 12

            [display]
            width = 320
            height = 200
            range = [-1.0, 1.0]

            [spring]
            connectivity = "full"
            floor = 150.0

            [fountain]
            respawn = "off-screen"
            source = [10.0, 20.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.frames, Some(12));
        assert_eq!(config.display.width, 320);
        assert_eq!(config.display.color_range(), ColorRange::Fixed(-1.0, 1.0));
        assert_eq!(config.spring.connectivity, Connectivity::Full);
        assert_eq!(config.spring.floor, Some(150.0));
        assert_eq!(config.spring.stiffness, 0.02);
        assert_eq!(config.fountain.respawn, RespawnPolicy::OffScreen);
        assert_eq!(config.fountain.source, Some((10.0, 20.0)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = DemoConfig::from_toml_str("[wave]\nspeed = 2.0\n").unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let mut config = DemoConfig::default();
        config.gravity.particles = 0;
        assert!(matches!(config.validate(), Err(SimError::Config(_))));

        let mut config = DemoConfig::default();
        config.spring.drive_period = 0.0;
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.spring.drive_row = Some(32);
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.display.range = Some((1.0, 1.0));
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.wave = WaveParams::default().with_scale(-0.1);
        assert_eq!(config.wave.scale, -0.1);
        assert!(matches!(config.validate(), Err(SimError::Config(_))));

        // Zero display size is the framebuffer's concern
        let mut config = DemoConfig::default();
        config.display.width = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = DemoConfig::load("/nonexistent/physim.toml").unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
