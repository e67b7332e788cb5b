//! Contact lifecycle: per-point engine notifications to pair-level events
//!
//! ```text
//!  NarrowPhase ──► ContactTracker ──► RawContact (begin/end per point)
//!                                        │
//!                                        ▼
//!            ShapeRegistry ──► ContactTranslator ──► BodySet ledgers
//!                                        │ 0→1 / 1→0
//!                                        ▼
//!                                ListenerRegistry::dispatch
//! ```

use crate::body::{BodyId, BodySet};
use crate::commands::WorldCommands;
use crate::config::UnitScale;
use crate::events::{CollisionEvent, ContactEventType, ContactGeometry, ListenerRegistry};
use crate::registry::ShapeRegistry;
use rapier2d::prelude as rapier;
use std::collections::{HashMap, HashSet};

/// Kind of low-level contact notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawContactKind {
    /// A new contact point appeared between two shapes
    Begin,
    /// A contact point between two shapes vanished
    End,
}

/// One contact point appearing or vanishing between two shapes
#[derive(Debug, Clone, PartialEq)]
pub struct RawContact {
    /// Begin or end
    pub kind: RawContactKind,
    /// First shape
    pub shape1: rapier::ColliderHandle,
    /// Second shape
    pub shape2: rapier::ColliderHandle,
    /// Geometry of the pair at the time of the notification
    pub geometry: ContactGeometry,
}

/// Unordered collider pair
type PairKey = (rapier::ColliderHandle, rapier::ColliderHandle);

fn pair_key(h1: rapier::ColliderHandle, h2: rapier::ColliderHandle) -> PairKey {
    if h1.into_raw_parts() <= h2.into_raw_parts() {
        (h1, h2)
    } else {
        (h2, h1)
    }
}

#[derive(Debug, Clone)]
struct TrackedPair {
    shape1: rapier::ColliderHandle,
    shape2: rapier::ColliderHandle,
    geometry: ContactGeometry,
}

/// Turns narrow-phase contact manifolds into per-point notifications by
/// diffing active point counts between steps.
#[derive(Debug, Default)]
pub(crate) struct ContactTracker {
    active: HashMap<PairKey, TrackedPair>,
}

impl ContactTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Notifications for everything that changed since the previous call,
    /// in narrow-phase order followed by vanished pairs in handle order.
    pub(crate) fn collect(
        &mut self,
        narrow_phase: &rapier::NarrowPhase,
        scale: &UnitScale,
    ) -> Vec<RawContact> {
        let mut notifications = Vec::new();
        let mut seen = HashSet::new();

        for pair in narrow_phase.contact_pairs() {
            let key = pair_key(pair.collider1, pair.collider2);
            let geometry = active_geometry(pair, scale);
            let current = geometry.point_count();
            let previous = self
                .active
                .get(&key)
                .map_or(0, |tracked| tracked.geometry.point_count());

            if current == 0 && previous == 0 {
                continue;
            }
            seen.insert(key);

            if current > previous {
                for _ in previous..current {
                    notifications.push(RawContact {
                        kind: RawContactKind::Begin,
                        shape1: pair.collider1,
                        shape2: pair.collider2,
                        geometry: geometry.clone(),
                    });
                }
            } else if current < previous {
                for _ in current..previous {
                    notifications.push(RawContact {
                        kind: RawContactKind::End,
                        shape1: pair.collider1,
                        shape2: pair.collider2,
                        geometry: geometry.clone(),
                    });
                }
            }

            if current == 0 {
                self.active.remove(&key);
            } else {
                self.active.insert(
                    key,
                    TrackedPair {
                        shape1: pair.collider1,
                        shape2: pair.collider2,
                        geometry,
                    },
                );
            }
        }

        let mut vanished: Vec<PairKey> = self
            .active
            .keys()
            .filter(|key| !seen.contains(*key))
            .copied()
            .collect();
        vanished.sort_by_key(|(h1, h2)| (h1.into_raw_parts(), h2.into_raw_parts()));

        for key in vanished {
            if let Some(tracked) = self.active.remove(&key) {
                for _ in 0..tracked.geometry.point_count() {
                    notifications.push(RawContact {
                        kind: RawContactKind::End,
                        shape1: tracked.shape1,
                        shape2: tracked.shape2,
                        geometry: tracked.geometry.clone(),
                    });
                }
            }
        }

        notifications
    }

    /// Number of shape pairs with at least one active point
    pub(crate) fn active_pairs(&self) -> usize {
        self.active.len()
    }
}

/// Active solver contact points of a pair, in display units
fn active_geometry(pair: &rapier::ContactPair, scale: &UnitScale) -> ContactGeometry {
    let mut geometry = ContactGeometry::default();
    if !pair.has_any_active_contact {
        return geometry;
    }
    for manifold in &pair.manifolds {
        if manifold.data.solver_contacts.is_empty() {
            continue;
        }
        if geometry.points.is_empty() {
            geometry.normal = [manifold.data.normal.x, manifold.data.normal.y];
        }
        geometry.points.extend(
            manifold
                .data
                .solver_contacts
                .iter()
                .map(|contact| scale.point_to_display(&contact.point)),
        );
    }
    geometry
}

/// Applies raw notifications to touch ledgers and fires pair-level events
/// on 0→1 and 1→0 transitions.
pub(crate) struct ContactTranslator<'w> {
    pub(crate) registry: &'w ShapeRegistry,
    pub(crate) bodies: &'w mut BodySet,
    pub(crate) listeners: &'w ListenerRegistry,
    pub(crate) commands: &'w mut WorldCommands,
}

impl ContactTranslator<'_> {
    /// Apply one notification, returning the event it fired, if any
    pub(crate) fn apply(&mut self, contact: &RawContact) -> Option<ContactEventType> {
        let Some((body_a, body_b)) = self.resolve(contact) else {
            log::trace!(
                "dropping {:?} for unregistered shape pair {:?}/{:?}",
                contact.kind,
                contact.shape1,
                contact.shape2
            );
            return None;
        };

        let fired = match contact.kind {
            RawContactKind::Begin => {
                let count = self.bodies.touch_pair(body_a, body_b)?;
                log::trace!("begin {body_a:?}/{body_b:?} -> {count} points");
                (count == 1).then_some(ContactEventType::Collided)
            }
            RawContactKind::End => {
                let count = self.bodies.untouch_pair(body_a, body_b)?;
                log::trace!("end {body_a:?}/{body_b:?} -> {count} points");
                (count == 0).then_some(ContactEventType::Separated)
            }
        }?;

        let event = CollisionEvent {
            event_type: fired,
            body_a,
            body_b,
            contact: &contact.geometry,
        };
        self.listeners.dispatch(&event, self.commands);
        Some(fired)
    }

    fn resolve(&self, contact: &RawContact) -> Option<(BodyId, BodyId)> {
        let body_a = self.registry.resolve(contact.shape1)?;
        let body_b = self.registry.resolve(contact.shape2)?;
        Some((body_a, body_b))
    }
}
