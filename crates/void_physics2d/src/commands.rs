//! Deferred world changes requested from inside listener callbacks

use crate::body::BodyId;
use crate::events::{ContactListener, ListenerKey, SharedListener};
use parking_lot::Mutex;
use std::sync::Arc;

/// A change to apply once the current dispatch has finished
pub enum WorldCommand {
    /// Detach and drop a body
    RemoveBody(BodyId),
    /// Activate or deactivate a body
    SetActive(BodyId, bool),
    /// Register a global listener
    AddListener(SharedListener),
    /// Deregister a global listener
    RemoveListener(ListenerKey),
    /// Register a listener scoped to a body
    AddBodyListener(BodyId, SharedListener),
    /// Deregister a listener scoped to a body
    RemoveBodyListener(BodyId, ListenerKey),
}

/// Queue of world changes handed to listeners
#[derive(Default)]
pub struct WorldCommands {
    queue: Vec<WorldCommand>,
}

impl WorldCommands {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a body from the world
    pub fn remove_body(&mut self, body: BodyId) {
        self.queue.push(WorldCommand::RemoveBody(body));
    }

    /// Activate or deactivate a body
    pub fn set_active(&mut self, body: BodyId, active: bool) {
        self.queue.push(WorldCommand::SetActive(body, active));
    }

    /// Register a global listener
    pub fn add_listener(&mut self, listener: SharedListener) {
        self.queue.push(WorldCommand::AddListener(listener));
    }

    /// Deregister a global listener
    pub fn remove_listener<L: ContactListener + ?Sized>(&mut self, listener: &Arc<Mutex<L>>) {
        self.queue
            .push(WorldCommand::RemoveListener(ListenerKey::of(listener)));
    }

    /// Register a listener scoped to `body`
    pub fn add_body_listener(&mut self, body: BodyId, listener: SharedListener) {
        self.queue.push(WorldCommand::AddBodyListener(body, listener));
    }

    /// Deregister a listener scoped to `body`
    pub fn remove_body_listener<L: ContactListener + ?Sized>(
        &mut self,
        body: BodyId,
        listener: &Arc<Mutex<L>>,
    ) {
        self.queue
            .push(WorldCommand::RemoveBodyListener(body, ListenerKey::of(listener)));
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every queued command in submission order
    pub(crate) fn take(&mut self) -> Vec<WorldCommand> {
        std::mem::take(&mut self.queue)
    }
}
