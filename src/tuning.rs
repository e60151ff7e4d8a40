//! Data-driven game balance
//!
//! Every gameplay number the simulation reads lives here. Defaults come from
//! [`crate::consts`]; a JSON document can override any subset of fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level threshold table is empty")]
    EmptyThresholds,
    #[error("level {level} requires {required} layers, need at least 2")]
    ThresholdTooSmall { level: usize, required: usize },
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },
}

/// Gameplay constants for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub box_height: f32,
    pub original_box_size: f32,
    pub base_speed: f32,
    pub speed_per_level: f32,
    pub far_travel_limit: f32,
    pub removal_height: f32,
    pub camera_offset: f32,
    pub spawn_offset: f32,
    pub base_fall_mass: f32,
    pub fall_mass_falloff: f32,
    pub gravity: f32,
    pub solver_iterations: u32,
    pub autopilot_precision_range: f32,
    /// Layers required to finish each level (index = level - 1)
    pub level_thresholds: Vec<usize>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            box_height: BOX_HEIGHT,
            original_box_size: ORIGINAL_BOX_SIZE,
            base_speed: BASE_SPEED,
            speed_per_level: SPEED_PER_LEVEL,
            far_travel_limit: FAR_TRAVEL_LIMIT,
            removal_height: REMOVAL_HEIGHT,
            camera_offset: CAMERA_OFFSET,
            spawn_offset: SPAWN_OFFSET,
            base_fall_mass: BASE_FALL_MASS,
            fall_mass_falloff: FALL_MASS_FALLOFF,
            gravity: GRAVITY,
            solver_iterations: SOLVER_ITERATIONS,
            autopilot_precision_range: AUTOPILOT_PRECISION_RANGE,
            level_thresholds: BLOCKS_TO_LEVEL_UP.to_vec(),
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.level_thresholds.is_empty() {
            return Err(TuningError::EmptyThresholds);
        }
        // A level starts with foundation + first layer
        if let Some((i, &required)) = self
            .level_thresholds
            .iter()
            .enumerate()
            .find(|(_, required)| **required < 2)
        {
            return Err(TuningError::ThresholdTooSmall {
                level: i + 1,
                required,
            });
        }
        for (field, value) in [
            ("box_height", self.box_height),
            ("original_box_size", self.original_box_size),
            ("base_speed", self.base_speed),
        ] {
            if value <= 0.0 {
                return Err(TuningError::NonPositive { field, value });
            }
        }
        Ok(())
    }

    /// Number of playable levels
    pub fn level_count(&self) -> u32 {
        self.level_thresholds.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_consts() {
        let tuning = Tuning::default();
        assert_eq!(tuning.level_thresholds, vec![11, 13, 15, 17, 19]);
        assert_eq!(tuning.level_count(), 5);
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "base_speed": 0.01 }"#).unwrap();
        assert_eq!(tuning.base_speed, 0.01);
        assert_eq!(tuning.original_box_size, ORIGINAL_BOX_SIZE);
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(matches!(
            Tuning::from_json(r#"{ "level_thresholds": [] }"#),
            Err(TuningError::EmptyThresholds)
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "level_thresholds": [11, 1] }"#),
            Err(TuningError::ThresholdTooSmall { level: 2, required: 1 })
        ));
        assert!(matches!(
            Tuning::from_json("not json"),
            Err(TuningError::Parse(_))
        ));
    }
}
