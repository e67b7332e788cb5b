//! Spatial queries answering in bodies rather than engine colliders

use crate::body::BodyId;
use crate::bounds::BoundingBox;
use crate::config::UnitScale;
use crate::registry::ShapeRegistry;
use rapier2d::parry::bounding_volume::Aabb;
use rapier2d::prelude as rapier;
use std::collections::HashSet;

/// Query interface over a world's attached, active bodies
pub struct BodyQuery<'a> {
    pub(crate) query_pipeline: &'a rapier::QueryPipeline,
    pub(crate) colliders: &'a rapier::ColliderSet,
    pub(crate) bodies: &'a rapier::RigidBodySet,
    pub(crate) registry: &'a ShapeRegistry,
    pub(crate) scale: UnitScale,
}

impl<'a> BodyQuery<'a> {
    /// Bodies with at least one shape whose bounding box overlaps `area`.
    ///
    /// Each body is reported once, in the order its first matching shape
    /// was found.
    pub fn bodies_in(&self, area: &BoundingBox) -> Vec<BodyId> {
        let query_aabb = Aabb::new(
            self.clamped_point(area.lower_left),
            self.clamped_point(area.upper_right),
        );

        let mut seen = HashSet::new();
        let mut found = Vec::new();

        self.query_pipeline
            .colliders_with_aabb_intersecting_aabb(&query_aabb, |handle| {
                if let Some(body) = self.resolve_active(*handle) {
                    if self.collider_overlaps(*handle, area) && seen.insert(body) {
                        found.push(body);
                    }
                }
                true // Continue
            });

        found
    }

    /// Bodies with a shape containing the point `(x, y)`
    pub fn bodies_at_point(&self, x: f32, y: f32) -> Vec<BodyId> {
        let point = self.clamped_point([x, y]);
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        self.query_pipeline.intersections_with_point(
            self.bodies,
            self.colliders,
            &point,
            rapier::QueryFilter::new(),
            |handle| {
                if let Some(body) = self.resolve_active(handle) {
                    if seen.insert(body) {
                        found.push(body);
                    }
                }
                true // Continue
            },
        );

        found
    }

    /// Bounding box of one engine collider, in display units
    pub(crate) fn collider_bounds(&self, handle: rapier::ColliderHandle) -> Option<BoundingBox> {
        self.colliders
            .get(handle)
            .map(|collider| aabb_to_bounds(&collider.compute_aabb(), &self.scale))
    }

    fn collider_overlaps(&self, handle: rapier::ColliderHandle, area: &BoundingBox) -> bool {
        self.collider_bounds(handle)
            .is_some_and(|bounds| bounds.overlaps(area))
    }

    /// Owning body of a collider, if it is registered and its body is enabled
    fn resolve_active(&self, handle: rapier::ColliderHandle) -> Option<BodyId> {
        let collider = self.colliders.get(handle)?;
        let enabled = collider.is_enabled()
            && collider
                .parent()
                .and_then(|parent| self.bodies.get(parent))
                .map_or(true, |body| body.is_enabled());
        if !enabled {
            return None;
        }
        let owner = self.registry.resolve(handle)?;
        debug_assert!(
            collider
                .parent()
                .and_then(|parent| self.bodies.get(parent))
                .map_or(true, |body| body.user_data == owner.user_data()),
            "collider {handle:?} registered to {owner:?} but attached to another body"
        );
        Some(owner)
    }

    fn clamped_point(&self, p: [f32; 2]) -> rapier::Point<f32> {
        let p = self.scale.point_to_physics(p);
        rapier::Point::new(
            p.x.clamp(-f32::MAX, f32::MAX),
            p.y.clamp(-f32::MAX, f32::MAX),
        )
    }
}

/// Engine bounding box to display-unit rectangle
pub(crate) fn aabb_to_bounds(aabb: &Aabb, scale: &UnitScale) -> BoundingBox {
    let [x1, y1] = scale.point_to_display(&aabb.mins);
    let [x2, y2] = scale.point_to_display(&aabb.maxs);
    BoundingBox::new(x1, y1, x2, y2)
}
