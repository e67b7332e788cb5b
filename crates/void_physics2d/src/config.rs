//! Physics configuration and display/physics unit conversion

use crate::bounds::BoundingBox;
use crate::error::{PhysicsError, Result};
use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Default gravity along Y (display units per second squared)
pub const DEFAULT_GRAVITY: f32 = -10.0;
/// Default solver iteration count
pub const DEFAULT_ITERATIONS: usize = 10;

/// Physics world configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Gravity vector in display units
    pub gravity: [f32; 2],

    /// Solver iterations per step
    pub iterations: usize,

    /// Display units per engine meter
    pub pixels_per_meter: f32,

    /// Enable sleeping for resting bodies
    pub sleeping_enabled: bool,

    /// World rectangle to enforce from the start
    pub bounds: Option<BoundingBox>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, DEFAULT_GRAVITY],
            iterations: DEFAULT_ITERATIONS,
            pixels_per_meter: 1.0,
            sleeping_enabled: true,
            bounds: None,
        }
    }
}

impl PhysicsConfig {
    /// Configuration for high-precision simulation
    pub fn high_precision() -> Self {
        Self {
            iterations: 20,
            ..Default::default()
        }
    }

    /// Configuration without gravity (top-down games)
    pub fn top_down() -> Self {
        Self {
            gravity: [0.0, 0.0],
            ..Default::default()
        }
    }

    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = [x, y];
        self
    }

    /// Set iterations
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the display-to-engine ratio
    pub fn with_pixels_per_meter(mut self, pixels_per_meter: f32) -> Self {
        self.pixels_per_meter = pixels_per_meter;
        self
    }

    /// Set initial world bounds
    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Check the configuration before building a world from it
    pub fn validate(&self) -> Result<()> {
        if !self.pixels_per_meter.is_finite() || self.pixels_per_meter <= 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "pixels_per_meter must be positive, got {}",
                self.pixels_per_meter
            )));
        }
        if self.iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "iterations must be at least 1".to_string(),
            ));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        Ok(())
    }

    /// Unit conversion for this configuration
    pub fn scale(&self) -> UnitScale {
        UnitScale::new(self.pixels_per_meter)
    }
}

/// Conversion between display units and engine meters.
///
/// Owned by each world; nothing here is process-wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    pixels_per_meter: f32,
}

impl UnitScale {
    /// Create a scale from a display/engine ratio
    pub fn new(pixels_per_meter: f32) -> Self {
        Self { pixels_per_meter }
    }

    /// Display units per engine meter
    pub fn pixels_per_meter(&self) -> f32 {
        self.pixels_per_meter
    }

    /// Display length to engine length
    #[inline]
    pub fn to_physics(&self, value: f32) -> f32 {
        value / self.pixels_per_meter
    }

    /// Engine length to display length
    #[inline]
    pub fn to_display(&self, value: f32) -> f32 {
        value * self.pixels_per_meter
    }

    pub(crate) fn vector_to_physics(&self, v: [f32; 2]) -> rapier::Vector<f32> {
        rapier::Vector::new(self.to_physics(v[0]), self.to_physics(v[1]))
    }

    pub(crate) fn point_to_physics(&self, p: [f32; 2]) -> rapier::Point<f32> {
        rapier::Point::new(self.to_physics(p[0]), self.to_physics(p[1]))
    }

    pub(crate) fn vector_to_display(&self, v: &rapier::Vector<f32>) -> [f32; 2] {
        [self.to_display(v.x), self.to_display(v.y)]
    }

    pub(crate) fn point_to_display(&self, p: &rapier::Point<f32>) -> [f32; 2] {
        [self.to_display(p.x), self.to_display(p.y)]
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_valid() {
        assert!(PhysicsConfig::default().validate().is_ok());
        assert!(PhysicsConfig::high_precision().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_ratio() {
        let config = PhysicsConfig::default().with_pixels_per_meter(0.0);
        assert!(matches!(
            config.validate(),
            Err(PhysicsError::InvalidConfig(_))
        ));

        let config = PhysicsConfig::default().with_pixels_per_meter(f32::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scale_round_trip() {
        let scale = UnitScale::new(50.0);
        assert_relative_eq!(scale.to_physics(100.0), 2.0);
        assert_relative_eq!(scale.to_display(2.0), 100.0);

        let p = scale.point_to_physics([25.0, -50.0]);
        assert_relative_eq!(p.x, 0.5);
        assert_relative_eq!(p.y, -1.0);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "gravity": [0.0, -20.0],
            "iterations": 8,
            "pixels_per_meter": 32.0,
            "sleeping_enabled": false,
            "bounds": null
        }"#;
        let config: PhysicsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.iterations, 8);
        assert_relative_eq!(config.scale().pixels_per_meter(), 32.0);
        assert!(config.validate().is_ok());
    }
}
