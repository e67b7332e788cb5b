//! World boundaries and out-of-bounds enforcement

use crate::body::BodyId;
use crate::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Axis-aligned rectangle in display units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner
    pub lower_left: [f32; 2],
    /// Maximum corner
    pub upper_right: [f32; 2],
}

impl BoundingBox {
    /// Create from two opposite corners in any order
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            lower_left: [x1.min(x2), y1.min(y2)],
            upper_right: [x1.max(x2), y1.max(y2)],
        }
    }

    /// Rectangle of the given size centred on the origin
    pub fn centered(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(-hw, -hh, hw, hh)
    }

    /// Width
    pub fn width(&self) -> f32 {
        self.upper_right[0] - self.lower_left[0]
    }

    /// Height
    pub fn height(&self) -> f32 {
        self.upper_right[1] - self.lower_left[1]
    }

    /// Centre point
    pub fn center(&self) -> [f32; 2] {
        [
            (self.lower_left[0] + self.upper_right[0]) * 0.5,
            (self.lower_left[1] + self.upper_right[1]) * 0.5,
        ]
    }

    /// Smallest rectangle containing both
    pub fn merged(&self, other: &BoundingBox) -> BoundingBox {
        Self {
            lower_left: [
                self.lower_left[0].min(other.lower_left[0]),
                self.lower_left[1].min(other.lower_left[1]),
            ],
            upper_right: [
                self.upper_right[0].max(other.upper_right[0]),
                self.upper_right[1].max(other.upper_right[1]),
            ],
        }
    }

    /// Check if the interiors of two rectangles intersect.
    ///
    /// Rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.lower_left[0] < other.upper_right[0]
            && self.upper_right[0] > other.lower_left[0]
            && self.lower_left[1] < other.upper_right[1]
            && self.upper_right[1] > other.lower_left[1]
    }

    /// Check if a point lies inside or on the edge
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.lower_left[0]
            && x <= self.upper_right[0]
            && y >= self.lower_left[1]
            && y <= self.upper_right[1]
    }

    /// Check that the rectangle is finite and has a positive area
    pub fn validate(&self) -> Result<()> {
        let finite = self
            .lower_left
            .iter()
            .chain(self.upper_right.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(PhysicsError::InvalidBounds(format!(
                "bounds must be finite, got {self:?}"
            )));
        }
        if self.width() <= 0.0 || self.height() <= 0.0 {
            return Err(PhysicsError::InvalidBounds(format!(
                "bounds must have a positive area, got {} x {}",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }
}

/// What happens to a body found outside the world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutOfBoundsPolicy {
    /// Leave it alone
    #[default]
    None,
    /// Stop simulating it; it stays in the world and can be reactivated
    Deactivate,
    /// Remove it from the world
    Destroy,
}

/// Hook offered the out-of-bounds candidates before the policy runs.
///
/// It may drop entries from the list. Returning `false` skips the policy
/// for this step.
pub type OutOfBoundsVeto = Box<dyn FnMut(&mut Vec<BodyId>) -> bool + Send>;

/// A world rectangle and the four unbounded regions surrounding it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    area: BoundingBox,
    outside: [BoundingBox; 4],
}

impl WorldBounds {
    /// Derive the outside regions of `area`
    pub fn new(area: BoundingBox) -> Result<Self> {
        area.validate()?;
        let [x1, y1] = area.lower_left;
        let [x2, y2] = area.upper_right;
        let far = f32::MAX;

        let outside = [
            // left, full height
            BoundingBox::new(-far, -far, x1, far),
            // right, full height
            BoundingBox::new(x2, -far, far, far),
            // below, between left and right
            BoundingBox::new(x1, -far, x2, y1),
            // above, between left and right
            BoundingBox::new(x1, y2, x2, far),
        ];

        Ok(Self { area, outside })
    }

    /// The playable rectangle
    pub fn area(&self) -> &BoundingBox {
        &self.area
    }

    /// Left, right, bottom and top outside regions
    pub fn outside_regions(&self) -> &[BoundingBox; 4] {
        &self.outside
    }
}

/// Bounds, policy and veto of a world
#[derive(Default)]
pub(crate) struct BoundaryResolver {
    bounds: Option<WorldBounds>,
    policy: OutOfBoundsPolicy,
    veto: Option<OutOfBoundsVeto>,
}

impl BoundaryResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_bounds(&mut self, area: BoundingBox) -> Result<()> {
        self.bounds = Some(WorldBounds::new(area)?);
        Ok(())
    }

    pub(crate) fn clear_bounds(&mut self) {
        self.bounds = None;
    }

    pub(crate) fn bounds(&self) -> Option<&WorldBounds> {
        self.bounds.as_ref()
    }

    pub(crate) fn set_behavior(
        &mut self,
        policy: OutOfBoundsPolicy,
        veto: Option<OutOfBoundsVeto>,
    ) {
        self.policy = policy;
        self.veto = veto;
    }

    pub(crate) fn policy(&self) -> OutOfBoundsPolicy {
        self.policy
    }

    /// Check if nothing would be done this step, so the queries can be skipped
    pub(crate) fn is_idle(&self) -> bool {
        self.bounds.is_none() || (self.policy == OutOfBoundsPolicy::None && self.veto.is_none())
    }

    /// Run `query` once per outside region and merge the hits.
    ///
    /// A body overlapping several regions appears once, at its first hit.
    pub(crate) fn candidates<F>(&self, mut query: F) -> Vec<BodyId>
    where
        F: FnMut(&BoundingBox) -> Vec<BodyId>,
    {
        let Some(bounds) = &self.bounds else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for region in bounds.outside_regions() {
            for body in query(region) {
                if seen.insert(body) {
                    candidates.push(body);
                }
            }
        }
        candidates
    }

    /// Offer the candidates to the veto, returning the bodies the policy
    /// applies to, or `None` when the step is skipped.
    pub(crate) fn filter(&mut self, mut candidates: Vec<BodyId>) -> Option<Vec<BodyId>> {
        if let Some(veto) = &mut self.veto {
            if !veto(&mut candidates) {
                log::debug!("out-of-bounds action vetoed for this step");
                return None;
            }
        }
        if self.policy == OutOfBoundsPolicy::None || candidates.is_empty() {
            return None;
        }
        Some(candidates)
    }
}
