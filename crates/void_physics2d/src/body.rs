//! Body handles, descriptions and the arena holding per-body state

use crate::config::UnitScale;
use crate::shape::Shape;
use crate::touch::TouchLedger;
use rapier2d::data::{Arena, Index};
use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Handle to a body owned by a [`World`](crate::world::World)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub(crate) Index);

impl BodyId {
    /// Create from a raw arena index
    pub fn from_raw(index: Index) -> Self {
        Self(index)
    }

    /// Get the raw arena index
    pub fn raw(&self) -> Index {
        self.0
    }

    /// Packed form stored in the engine body's user data
    pub(crate) fn user_data(&self) -> u128 {
        let (index, generation) = self.0.into_raw_parts();
        (u128::from(generation) << 32) | u128::from(index)
    }
}

/// Type of body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves, infinite mass
    Static,
    /// Fully simulated
    #[default]
    Dynamic,
    /// Moved by the user, pushes dynamic bodies
    Kinematic,
}

impl From<BodyType> for rapier::RigidBodyType {
    fn from(t: BodyType) -> Self {
        match t {
            BodyType::Static => rapier::RigidBodyType::Fixed,
            BodyType::Dynamic => rapier::RigidBodyType::Dynamic,
            BodyType::Kinematic => rapier::RigidBodyType::KinematicVelocityBased,
        }
    }
}

/// Description for creating a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    /// Type of body
    pub body_type: BodyType,
    /// Collision shape
    pub shape: Shape,
    /// Initial position (display units)
    pub position: [f32; 2],
    /// Initial rotation, radians
    pub rotation: f32,
    /// Linear damping
    pub linear_damping: f32,
    /// Angular damping
    pub angular_damping: f32,
    /// Prevent rotation
    pub fixed_rotation: bool,
    /// Continuous collision detection for fast movers
    pub bullet: bool,
}

impl BodyDesc {
    /// Create a description of the given type
    pub fn new(body_type: BodyType, shape: Shape) -> Self {
        Self {
            body_type,
            shape,
            position: [0.0, 0.0],
            rotation: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
            bullet: false,
        }
    }

    /// Create a static body description
    pub fn fixed(shape: Shape) -> Self {
        Self::new(BodyType::Static, shape)
    }

    /// Create a dynamic body description
    pub fn dynamic(shape: Shape) -> Self {
        Self::new(BodyType::Dynamic, shape)
    }

    /// Create a kinematic body description
    pub fn kinematic(shape: Shape) -> Self {
        Self::new(BodyType::Kinematic, shape)
    }

    /// Set position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set rotation
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Build a Rapier rigid body
    pub(crate) fn to_rapier_body(
        &self,
        scale: &UnitScale,
        user_data: u128,
        can_sleep: bool,
    ) -> rapier::RigidBody {
        let mut builder = rapier::RigidBodyBuilder::new(self.body_type.into())
            .translation(scale.vector_to_physics(self.position))
            .rotation(self.rotation)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .ccd_enabled(self.bullet)
            .can_sleep(can_sleep)
            .user_data(user_data);

        if self.fixed_rotation {
            builder = builder.lock_rotations();
        }

        builder.build()
    }
}

/// Attachment state of a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Attachment {
    /// Created but not yet added to the world
    Unattached,
    /// Living in the engine
    Attached {
        handle: rapier::RigidBodyHandle,
        colliders: Vec<rapier::ColliderHandle>,
    },
}

/// Everything the world tracks for one body
#[derive(Debug, Clone)]
pub(crate) struct BodyEntry {
    pub(crate) desc: BodyDesc,
    pub(crate) attachment: Attachment,
    pub(crate) ledger: TouchLedger,
}

impl BodyEntry {
    pub(crate) fn new(desc: BodyDesc) -> Self {
        Self {
            desc,
            attachment: Attachment::Unattached,
            ledger: TouchLedger::new(),
        }
    }

    pub(crate) fn rigid_body(&self) -> Option<rapier::RigidBodyHandle> {
        match &self.attachment {
            Attachment::Attached { handle, .. } => Some(*handle),
            Attachment::Unattached => None,
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        matches!(self.attachment, Attachment::Attached { .. })
    }
}

/// Arena of bodies with pair-symmetric touch bookkeeping
#[derive(Debug)]
pub(crate) struct BodySet {
    entries: Arena<BodyEntry>,
}

impl BodySet {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arena::new(),
        }
    }

    pub(crate) fn insert(&mut self, desc: BodyDesc) -> BodyId {
        BodyId(self.entries.insert(BodyEntry::new(desc)))
    }

    pub(crate) fn remove(&mut self, id: BodyId) -> Option<BodyEntry> {
        self.entries.remove(id.0)
    }

    pub(crate) fn get(&self, id: BodyId) -> Option<&BodyEntry> {
        self.entries.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: BodyId) -> Option<&mut BodyEntry> {
        self.entries.get_mut(id.0)
    }

    /// Add one contact point between `a` and `b` on both sides.
    ///
    /// Returns the new pair count, or `None` when either body is unknown or
    /// both handles are the same body.
    pub(crate) fn touch_pair(&mut self, a: BodyId, b: BodyId) -> Option<u32> {
        if a == b {
            return None;
        }
        let (Some(first), Some(second)) = self.entries.get2_mut(a.0, b.0) else {
            return None;
        };
        let count = first.ledger.touch(b);
        let mirrored = second.ledger.touch(a);
        debug_assert_eq!(count, mirrored, "touch counts diverged for {a:?}/{b:?}");
        Some(count)
    }

    /// Remove one contact point between `a` and `b` on both sides.
    ///
    /// Returns the new pair count, or `None` when either body is unknown,
    /// both handles are the same body or the pair was not touching.
    pub(crate) fn untouch_pair(&mut self, a: BodyId, b: BodyId) -> Option<u32> {
        if a == b {
            return None;
        }
        let (Some(first), Some(second)) = self.entries.get2_mut(a.0, b.0) else {
            return None;
        };
        if !first.ledger.is_touching(b) || !second.ledger.is_touching(a) {
            return None;
        }
        let count = first.ledger.untouch(b);
        let mirrored = second.ledger.untouch(a);
        debug_assert_eq!(count, mirrored, "touch counts diverged for {a:?}/{b:?}");
        Some(count)
    }

    /// Clear `id`'s ledger and remove the reciprocal entry from every
    /// partner. Fires nothing.
    pub(crate) fn reset_touching(&mut self, id: BodyId) {
        let partners = match self.get_mut(id) {
            Some(entry) => entry.ledger.take_partners(),
            None => return,
        };
        for partner in partners {
            if let Some(entry) = self.get_mut(partner) {
                entry.ledger.forget(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(n: usize) -> (BodySet, Vec<BodyId>) {
        let mut set = BodySet::new();
        let ids = (0..n)
            .map(|_| set.insert(BodyDesc::dynamic(Shape::circle(1.0))))
            .collect();
        (set, ids)
    }

    #[test]
    fn test_touch_pair_is_symmetric() {
        let (mut set, ids) = set_with(2);
        assert_eq!(set.touch_pair(ids[0], ids[1]), Some(1));
        assert_eq!(set.touch_pair(ids[1], ids[0]), Some(2));

        let a = &set.get(ids[0]).unwrap().ledger;
        let b = &set.get(ids[1]).unwrap().ledger;
        assert_eq!(a.touch_count(ids[1]), 2);
        assert_eq!(b.touch_count(ids[0]), 2);
    }

    #[test]
    fn test_same_body_pair_ignored() {
        let (mut set, ids) = set_with(1);
        assert_eq!(set.touch_pair(ids[0], ids[0]), None);
        assert!(set.get(ids[0]).unwrap().ledger.is_empty());
    }

    #[test]
    fn test_untouch_unknown_pair_ignored() {
        let (mut set, ids) = set_with(2);
        assert_eq!(set.untouch_pair(ids[0], ids[1]), None);
    }

    #[test]
    fn test_reset_touching_clears_partners() {
        let (mut set, ids) = set_with(3);
        set.touch_pair(ids[0], ids[1]);
        set.touch_pair(ids[0], ids[1]);
        set.touch_pair(ids[0], ids[2]);
        set.touch_pair(ids[1], ids[2]);

        set.reset_touching(ids[0]);

        assert!(set.get(ids[0]).unwrap().ledger.is_empty());
        assert!(!set.get(ids[1]).unwrap().ledger.is_touching(ids[0]));
        assert!(!set.get(ids[2]).unwrap().ledger.is_touching(ids[0]));
        assert!(set.get(ids[1]).unwrap().ledger.is_touching(ids[2]));
    }

    #[test]
    fn test_removed_id_is_stale() {
        let (mut set, ids) = set_with(1);
        set.remove(ids[0]);
        let fresh = set.insert(BodyDesc::fixed(Shape::rectangle(1.0, 1.0)));
        assert!(set.get(ids[0]).is_none());
        assert_ne!(fresh, ids[0]);
    }
}
