//! Surface properties applied to every collision primitive of a body

use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Density applied when none is given
pub const DEFAULT_DENSITY: f32 = 25.0;
/// Restitution applied when none is given
pub const DEFAULT_RESTITUTION: f32 = 0.9;
/// Friction applied when none is given
pub const DEFAULT_FRICTION: f32 = 0.1;

/// Physics material defining density, friction and restitution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Density for mass calculation
    pub density: f32,
    /// Friction coefficient (0 = frictionless)
    pub friction: f32,
    /// Restitution/bounciness (0 = no bounce, 1 = perfect bounce)
    pub restitution: f32,
    /// How friction is combined between two primitives
    pub friction_combine: CombineRule,
    /// How restitution is combined between two primitives
    pub restitution_combine: CombineRule,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
            friction_combine: CombineRule::Average,
            restitution_combine: CombineRule::Average,
        }
    }
}

impl PhysicsMaterial {
    /// Create a new material
    pub fn new(density: f32, friction: f32, restitution: f32) -> Self {
        Self {
            density,
            friction,
            restitution,
            ..Default::default()
        }
    }

    /// Material that neither slides nor bounces much
    pub fn dull() -> Self {
        Self::new(DEFAULT_DENSITY, 0.8, 0.1)
    }

    /// Set friction
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    /// Set restitution
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    /// Set density
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density.max(0.001);
        self
    }
}

/// Rule for combining material properties of two touching primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombineRule {
    /// Use the average of both values
    #[default]
    Average,
    /// Use the minimum value
    Min,
    /// Use the maximum value
    Max,
    /// Multiply the values
    Multiply,
}

impl From<CombineRule> for rapier::CoefficientCombineRule {
    fn from(rule: CombineRule) -> Self {
        match rule {
            CombineRule::Average => rapier::CoefficientCombineRule::Average,
            CombineRule::Min => rapier::CoefficientCombineRule::Min,
            CombineRule::Max => rapier::CoefficientCombineRule::Max,
            CombineRule::Multiply => rapier::CoefficientCombineRule::Multiply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let material = PhysicsMaterial::default();
        assert_eq!(material.density, DEFAULT_DENSITY);
        assert_eq!(material.friction, DEFAULT_FRICTION);
        assert_eq!(material.restitution, DEFAULT_RESTITUTION);
    }

    #[test]
    fn test_setters_clamp() {
        let material = PhysicsMaterial::default()
            .with_restitution(3.0)
            .with_friction(-1.0)
            .with_density(0.0);
        assert_eq!(material.restitution, 1.0);
        assert_eq!(material.friction, 0.0);
        assert!(material.density > 0.0);
    }
}
