// src/config.rs

use crate::error::{PipelineError, Result};
use crate::types::PipelineConfig;
use std::fs;

impl PipelineConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Fail-fast sanity checks; every downstream computation assumes these.
    pub fn validate(&self) -> Result<()> {
        if self.possession.min_frames == 0 {
            return Err(PipelineError::Configuration(
                "possession.min_frames must be at least 1".to_string(),
            ));
        }
        if self.possession.possession_threshold <= 0.0 {
            return Err(PipelineError::Configuration(
                "possession.possession_threshold must be positive".to_string(),
            ));
        }
        if self.possession.containment_threshold <= 0.0 || self.possession.containment_threshold > 1.0 {
            return Err(PipelineError::Configuration(format!(
                "possession.containment_threshold must be in (0, 1], got {}",
                self.possession.containment_threshold
            )));
        }
        if self.court.canvas_width <= 0.0 || self.court.canvas_height <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "tactical canvas must have positive size, got {}x{}",
                self.court.canvas_width, self.court.canvas_height
            )));
        }
        if self.court.court_width_meters <= 0.0 || self.court.court_height_meters <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "court dimensions must be positive, got {}x{} m",
                self.court.court_width_meters, self.court.court_height_meters
            )));
        }
        if self.kinematics.fps <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "kinematics.fps must be positive, got {}",
                self.kinematics.fps
            )));
        }
        if self.kinematics.window_size == 0 {
            return Err(PipelineError::Configuration(
                "kinematics.window_size must be at least 1".to_string(),
            ));
        }
        if self.kinematics.distance_correction <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "kinematics.distance_correction must be positive, got {}",
                self.kinematics.distance_correction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::types::PipelineConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_fps_rejected() {
        let mut config = PipelineConfig::default();
        config.kinematics.fps = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_min_frames_rejected() {
        let mut config = PipelineConfig::default();
        config.possession.min_frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let yaml = "possession:\n  possession_threshold: 40.0\n  containment_threshold: 0.8\n  min_frames: 5\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.possession.min_frames, 5);
        assert_eq!(config.kinematics.window_size, 5);
    }
}
