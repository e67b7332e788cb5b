//! Collision shapes: circles, rectangles, convex polygons and compounds
//!
//! A [`Shape`] is a flat list of [`Primitive`]s. Each primitive becomes one
//! engine collider when its body is attached, so a compound body owns one
//! shape handle per primitive.

use crate::config::UnitScale;
use crate::error::{PhysicsError, Result};
use crate::material::PhysicsMaterial;
use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Geometry of a single primitive, in display units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Circle with radius
    Circle { radius: f32 },
    /// Axis-aligned rectangle (before offset rotation) with full extents
    Rectangle { width: f32, height: f32 },
    /// Convex polygon, points in counter-clockwise order
    Polygon { points: Vec<[f32; 2]> },
}

/// A single collision primitive placed relative to its body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Geometry
    pub geometry: Geometry,
    /// Offset from the body origin
    pub offset: [f32; 2],
    /// Rotation around the offset, radians
    pub angle: f32,
    /// Surface material
    pub material: PhysicsMaterial,
}

impl Primitive {
    /// Create a primitive centred on the body
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            offset: [0.0, 0.0],
            angle: 0.0,
            material: PhysicsMaterial::default(),
        }
    }

    pub(crate) fn to_rapier_shape(&self, scale: &UnitScale) -> Result<rapier::SharedShape> {
        match &self.geometry {
            Geometry::Circle { radius } => {
                if *radius <= 0.0 {
                    return Err(PhysicsError::ShapeCreationFailed(format!(
                        "circle radius must be positive, got {radius}"
                    )));
                }
                Ok(rapier::SharedShape::ball(scale.to_physics(*radius)))
            }
            Geometry::Rectangle { width, height } => {
                if *width <= 0.0 || *height <= 0.0 {
                    return Err(PhysicsError::ShapeCreationFailed(format!(
                        "rectangle extents must be positive, got {width}x{height}"
                    )));
                }
                Ok(rapier::SharedShape::cuboid(
                    scale.to_physics(width * 0.5),
                    scale.to_physics(height * 0.5),
                ))
            }
            Geometry::Polygon { points } => {
                let scaled: Vec<_> = points.iter().map(|p| scale.point_to_physics(*p)).collect();
                rapier::SharedShape::convex_hull(&scaled)
                    .filter(|hull| {
                        hull.as_convex_polygon()
                            .is_some_and(|polygon| polygon.points().len() >= 3)
                    })
                    .ok_or_else(|| {
                        PhysicsError::ShapeCreationFailed(format!(
                            "{} points do not form a convex polygon",
                            points.len()
                        ))
                    })
            }
        }
    }

    /// Build a Rapier collider for this primitive
    pub(crate) fn to_rapier_collider(&self, scale: &UnitScale) -> Result<rapier::Collider> {
        let shape = self.to_rapier_shape(scale)?;
        Ok(rapier::ColliderBuilder::new(shape)
            .position(rapier::Isometry::new(
                scale.vector_to_physics(self.offset),
                self.angle,
            ))
            .density(self.material.density)
            .friction(self.material.friction)
            .restitution(self.material.restitution)
            .friction_combine_rule(self.material.friction_combine.into())
            .restitution_combine_rule(self.material.restitution_combine.into())
            .build())
    }
}

/// Collision shape of a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    primitives: Vec<Primitive>,
}

impl Shape {
    /// Circle centred on the body
    pub fn circle(radius: f32) -> Self {
        Self::from_primitive(Primitive::new(Geometry::Circle { radius }))
    }

    /// Rectangle centred on the body
    pub fn rectangle(width: f32, height: f32) -> Self {
        Self::from_primitive(Primitive::new(Geometry::Rectangle { width, height }))
    }

    /// Convex polygon, points in counter-clockwise order
    pub fn polygon(points: impl Into<Vec<[f32; 2]>>) -> Self {
        Self::from_primitive(Primitive::new(Geometry::Polygon {
            points: points.into(),
        }))
    }

    /// Compound shape built from other shapes
    pub fn compound(children: impl IntoIterator<Item = Shape>) -> Self {
        Self {
            primitives: children.into_iter().flat_map(|s| s.primitives).collect(),
        }
    }

    /// Shape made of a single primitive
    pub fn from_primitive(primitive: Primitive) -> Self {
        Self {
            primitives: vec![primitive],
        }
    }

    /// Move every primitive away from the body centre and rotate it
    pub fn with_offset(mut self, x: f32, y: f32, angle: f32) -> Self {
        for primitive in &mut self.primitives {
            primitive.offset = [primitive.offset[0] + x, primitive.offset[1] + y];
            primitive.angle += angle;
        }
        self
    }

    /// Apply one material to every primitive
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.set_material(|m| *m = material);
        self
    }

    pub(crate) fn set_material(&mut self, mut edit: impl FnMut(&mut PhysicsMaterial)) {
        for primitive in &mut self.primitives {
            edit(&mut primitive.material);
        }
    }

    /// Primitives making up this shape
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Number of primitives (engine colliders once attached)
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Check if this shape has no primitives
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Build every collider, failing on the first invalid primitive
    pub(crate) fn to_rapier_colliders(&self, scale: &UnitScale) -> Result<Vec<rapier::Collider>> {
        if self.primitives.is_empty() {
            return Err(PhysicsError::ShapeCreationFailed(
                "shape has no primitives".to_string(),
            ));
        }
        self.primitives
            .iter()
            .map(|p| p.to_rapier_collider(scale))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_flattens() {
        let shape = Shape::compound([
            Shape::rectangle(20.0, 10.0).with_offset(-5.0, 0.0, 0.0),
            Shape::compound([Shape::circle(3.0), Shape::rectangle(10.0, 10.0)]),
        ]);
        assert_eq!(shape.len(), 3);
        assert_eq!(shape.primitives()[0].offset, [-5.0, 0.0]);
    }

    #[test]
    fn test_colliders_built_per_primitive() {
        let shape = Shape::compound([Shape::circle(1.0), Shape::rectangle(2.0, 2.0)]);
        let colliders = shape.to_rapier_colliders(&UnitScale::default()).unwrap();
        assert_eq!(colliders.len(), 2);
    }

    #[test]
    fn test_degenerate_polygon_fails() {
        let shape = Shape::polygon(vec![[0.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(
            shape.to_rapier_colliders(&UnitScale::default()),
            Err(PhysicsError::ShapeCreationFailed(_))
        ));
    }

    #[test]
    fn test_empty_compound_fails() {
        let shape = Shape::compound(Vec::new());
        assert!(shape.is_empty());
        assert!(shape.to_rapier_colliders(&UnitScale::default()).is_err());
    }

    #[test]
    fn test_material_applies_to_all() {
        let shape = Shape::compound([Shape::circle(1.0), Shape::circle(2.0)])
            .with_material(PhysicsMaterial::dull());
        assert!(shape
            .primitives()
            .iter()
            .all(|p| p.material == PhysicsMaterial::dull()));
    }
}
