//! Collision/separation events and the listeners that receive them

use crate::body::BodyId;
use crate::commands::WorldCommands;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Contact geometry supplied by the engine for one shape pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactGeometry {
    /// Contact points in world space (display units)
    pub points: Vec<[f32; 2]>,
    /// Contact normal, pointing from the first shape to the second
    pub normal: [f32; 2],
}

impl ContactGeometry {
    /// Number of contact points
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Centroid of the contact points
    pub fn reference_point(&self) -> Option<[f32; 2]> {
        if self.points.is_empty() {
            return None;
        }
        let mut sum = [0.0f32; 2];
        for point in &self.points {
            sum[0] += point[0];
            sum[1] += point[1];
        }
        let n = self.points.len() as f32;
        Some([sum[0] / n, sum[1] / n])
    }
}

/// Type of pair-level contact event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactEventType {
    /// The pair went from zero contact points to one
    Collided,
    /// The pair went from one contact point to zero
    Separated,
}

/// A collision or separation between two bodies.
///
/// The geometry is borrowed from the step that produced it and cannot
/// outlive the listener call.
#[derive(Debug, Clone, Copy)]
pub struct CollisionEvent<'a> {
    /// Event type
    pub event_type: ContactEventType,
    /// Body owning the first shape of the pair
    pub body_a: BodyId,
    /// Body owning the second shape of the pair
    pub body_b: BodyId,
    /// Geometry of the contact that caused the transition
    pub contact: &'a ContactGeometry,
}

impl CollisionEvent<'_> {
    /// Check if this is a collision event
    pub fn is_collision(&self) -> bool {
        self.event_type == ContactEventType::Collided
    }

    /// Check if this is a separation event
    pub fn is_separation(&self) -> bool {
        self.event_type == ContactEventType::Separated
    }

    /// Check if `body` is one of the pair
    pub fn involves(&self, body: BodyId) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// The other body of the pair, if `body` is part of it
    pub fn other(&self, body: BodyId) -> Option<BodyId> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }
}

/// Observer of pair-level contact events.
///
/// Listeners may queue world changes through `commands`; they are applied
/// once the step's contact dispatch has finished.
pub trait ContactListener: Send {
    /// Called when two bodies start touching
    fn collided(&mut self, event: &CollisionEvent<'_>, commands: &mut WorldCommands);

    /// Called when two bodies stop touching
    fn separated(&mut self, event: &CollisionEvent<'_>, commands: &mut WorldCommands);
}

/// Listener shared between the world and its owner
pub type SharedListener = Arc<Mutex<dyn ContactListener>>;

/// Wrap a listener so it can be registered and still inspected by the caller
pub fn shared<L: ContactListener + 'static>(listener: L) -> Arc<Mutex<L>> {
    Arc::new(Mutex::new(listener))
}

/// Identity of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(usize);

impl ListenerKey {
    /// Key of a shared listener, independent of its concrete type
    pub fn of<L: ContactListener + ?Sized>(listener: &Arc<Mutex<L>>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

/// Global and per-body listener registrations
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    global: Vec<SharedListener>,
    per_body: HashMap<BodyId, Vec<SharedListener>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a global listener; a second registration is ignored
    pub(crate) fn add_global(&mut self, listener: SharedListener) -> bool {
        insert_unique(&mut self.global, listener)
    }

    pub(crate) fn remove_global(&mut self, key: ListenerKey) -> bool {
        remove_key(&mut self.global, key)
    }

    /// Register a listener scoped to `body`; a second registration is ignored
    pub(crate) fn add_for_body(&mut self, body: BodyId, listener: SharedListener) -> bool {
        insert_unique(self.per_body.entry(body).or_default(), listener)
    }

    pub(crate) fn remove_for_body(&mut self, body: BodyId, key: ListenerKey) -> bool {
        let Some(listeners) = self.per_body.get_mut(&body) else {
            return false;
        };
        let removed = remove_key(listeners, key);
        if listeners.is_empty() {
            self.per_body.remove(&body);
        }
        removed
    }

    /// Forget every listener scoped to a detached body
    pub(crate) fn remove_body(&mut self, body: BodyId) {
        self.per_body.remove(&body);
    }

    pub(crate) fn global_count(&self) -> usize {
        self.global.len()
    }

    pub(crate) fn body_listener_count(&self, body: BodyId) -> usize {
        self.per_body.get(&body).map_or(0, Vec::len)
    }

    /// Deliver an event to global listeners, then listeners of `body_a`,
    /// then listeners of `body_b`, each in registration order.
    ///
    /// Delivery iterates over a snapshot taken before the first call.
    pub(crate) fn dispatch(&self, event: &CollisionEvent<'_>, commands: &mut WorldCommands) {
        let snapshot: Vec<SharedListener> = self
            .global
            .iter()
            .chain(self.per_body.get(&event.body_a).into_iter().flatten())
            .chain(self.per_body.get(&event.body_b).into_iter().flatten())
            .cloned()
            .collect();

        for listener in snapshot {
            let mut listener = listener.lock();
            match event.event_type {
                ContactEventType::Collided => listener.collided(event, commands),
                ContactEventType::Separated => listener.separated(event, commands),
            }
        }
    }
}

fn insert_unique(listeners: &mut Vec<SharedListener>, listener: SharedListener) -> bool {
    let key = ListenerKey::of(&listener);
    if listeners.iter().any(|l| ListenerKey::of(l) == key) {
        return false;
    }
    listeners.push(listener);
    true
}

fn remove_key(listeners: &mut Vec<SharedListener>, key: ListenerKey) -> bool {
    let before = listeners.len();
    listeners.retain(|l| ListenerKey::of(l) != key);
    listeners.len() != before
}

/// Owned copy of an event, as kept by [`EventCollector`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Event type
    pub event_type: ContactEventType,
    /// First body
    pub body_a: BodyId,
    /// Second body
    pub body_b: BodyId,
    /// Contact geometry at the time of the event
    pub contact: ContactGeometry,
}

impl From<&CollisionEvent<'_>> for RecordedEvent {
    fn from(event: &CollisionEvent<'_>) -> Self {
        Self {
            event_type: event.event_type,
            body_a: event.body_a,
            body_b: event.body_b,
            contact: event.contact.clone(),
        }
    }
}

/// Listener that records every event it receives
#[derive(Debug, Default)]
pub struct EventCollector {
    /// Events in delivery order
    pub events: Vec<RecordedEvent>,
}

impl EventCollector {
    /// Create a new event collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all collected events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Collision events
    pub fn collisions(&self) -> impl Iterator<Item = &RecordedEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type == ContactEventType::Collided)
    }

    /// Separation events
    pub fn separations(&self) -> impl Iterator<Item = &RecordedEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type == ContactEventType::Separated)
    }
}

impl ContactListener for EventCollector {
    fn collided(&mut self, event: &CollisionEvent<'_>, _commands: &mut WorldCommands) {
        self.events.push(event.into());
    }

    fn separated(&mut self, event: &CollisionEvent<'_>, _commands: &mut WorldCommands) {
        self.events.push(event.into());
    }
}

/// Callback type for contact events
pub type ContactCallback = Box<dyn FnMut(&CollisionEvent<'_>, &mut WorldCommands) + Send>;

/// Listener built from optional closures
#[derive(Default)]
pub struct ContactHandler {
    /// Callback for collision events
    pub on_collided: Option<ContactCallback>,
    /// Callback for separation events
    pub on_separated: Option<ContactCallback>,
}

impl ContactHandler {
    /// Create a handler with no callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collision callback
    pub fn on_collided<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&CollisionEvent<'_>, &mut WorldCommands) + Send + 'static,
    {
        self.on_collided = Some(Box::new(callback));
        self
    }

    /// Set the separation callback
    pub fn on_separated<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&CollisionEvent<'_>, &mut WorldCommands) + Send + 'static,
    {
        self.on_separated = Some(Box::new(callback));
        self
    }
}

impl ContactListener for ContactHandler {
    fn collided(&mut self, event: &CollisionEvent<'_>, commands: &mut WorldCommands) {
        if let Some(callback) = &mut self.on_collided {
            callback(event, commands);
        }
    }

    fn separated(&mut self, event: &CollisionEvent<'_>, commands: &mut WorldCommands) {
        if let Some(callback) = &mut self.on_separated {
            callback(event, commands);
        }
    }
}
