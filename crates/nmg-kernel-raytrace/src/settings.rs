//! Shot settings.

use nmg_kernel_math::Tolerance;
use serde::{Deserialize, Serialize};

use crate::error::{RaytraceError, Result};

/// Parameters for shooting rays at a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotSettings {
    /// Distance tolerance.
    pub tolerance: f64,
    /// Perpendicularity tolerance, as a cosine.
    pub perp: f64,
    /// Shoot ray batches on the rayon thread pool.
    pub parallel: bool,
    /// Stop classifying a face at the first boundary touch.
    pub first_touch: bool,
}

impl Default for ShotSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            perp: 1e-6,
            parallel: true,
            first_touch: true,
        }
    }
}

impl ShotSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(RaytraceError::InvalidSettings(
                "tolerance must be positive".into(),
            ));
        }
        if !self.perp.is_finite() || self.perp <= 0.0 || self.perp >= 1.0 {
            return Err(RaytraceError::InvalidSettings(
                "perp must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate settings from TOML. Missing keys take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(s).map_err(|e| RaytraceError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// The tolerance every geometric comparison is made against.
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.tolerance, self.perp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_valid() {
        let settings = ShotSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.tolerance(), Tolerance::DEFAULT);
    }

    #[test]
    fn test_invalid_settings() {
        let settings = ShotSettings {
            tolerance: -1.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = ShotSettings {
            perp: 1.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = ShotSettings {
            tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_from_toml() {
        let settings = ShotSettings::from_toml_str("tolerance = 0.001\nparallel = false\n").unwrap();
        assert_eq!(settings.tolerance, 0.001);
        assert!(!settings.parallel);
        assert!(settings.first_touch);

        assert!(ShotSettings::from_toml_str("perp = 2.0").is_err());
        assert!(ShotSettings::from_toml_str("tolerance = \"x\"").is_err());
    }
}
