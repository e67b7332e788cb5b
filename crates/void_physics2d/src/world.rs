//! Physics world - bodies, stepping, contact events and boundaries

use crate::body::{Attachment, BodyDesc, BodyId, BodySet};
use crate::bounds::{
    BoundaryResolver, BoundingBox, OutOfBoundsPolicy, OutOfBoundsVeto, WorldBounds,
};
use crate::commands::{WorldCommand, WorldCommands};
use crate::config::{PhysicsConfig, UnitScale};
use crate::contact::{ContactTracker, ContactTranslator};
use crate::error::{PhysicsError, Result};
use crate::events::{ContactListener, ListenerKey, ListenerRegistry, SharedListener};
use crate::material::PhysicsMaterial;
use crate::query::{aabb_to_bounds, BodyQuery};
use crate::registry::ShapeRegistry;
use parking_lot::Mutex;
use rapier2d::prelude as rapier;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// The main physics world containing all simulation state
pub struct World {
    /// Configuration
    config: PhysicsConfig,

    /// Display/engine unit conversion
    scale: UnitScale,

    /// Rapier physics pipeline
    pipeline: rapier::PhysicsPipeline,

    /// Gravity, engine units
    gravity: rapier::Vector<f32>,

    /// Integration parameters
    integration_params: rapier::IntegrationParameters,

    /// Island manager
    islands: rapier::IslandManager,

    /// Broad phase
    broad_phase: rapier::DefaultBroadPhase,

    /// Narrow phase
    narrow_phase: rapier::NarrowPhase,

    /// Impulse joint set
    impulse_joints: rapier::ImpulseJointSet,

    /// Multibody joint set
    multibody_joints: rapier::MultibodyJointSet,

    /// CCD solver
    ccd_solver: rapier::CCDSolver,

    /// Query pipeline
    query_pipeline: rapier::QueryPipeline,

    /// Engine rigid bodies
    rigid_bodies: rapier::RigidBodySet,

    /// Engine colliders
    colliders: rapier::ColliderSet,

    /// Every created body, attached or not
    bodies: BodySet,

    /// Attached bodies in attachment order
    attached: Vec<BodyId>,

    /// Collider handle to owning body
    registry: ShapeRegistry,

    /// Global and per-body listeners
    listeners: ListenerRegistry,

    /// Per-point contact diffing
    tracker: ContactTracker,

    /// World bounds and out-of-bounds policy
    boundary: BoundaryResolver,

    /// Changes queued by listeners during the current step
    commands: WorldCommands,
}

impl World {
    /// Create a new physics world
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        let scale = config.scale();
        let gravity = scale.vector_to_physics(config.gravity);

        let mut integration_params = rapier::IntegrationParameters::default();
        integration_params.num_solver_iterations = NonZeroUsize::new(config.iterations)
            .ok_or_else(|| PhysicsError::InvalidConfig("iterations must be at least 1".into()))?;

        let mut boundary = BoundaryResolver::new();
        if let Some(area) = config.bounds {
            boundary.set_bounds(area)?;
        }

        log::debug!(
            "physics world created: gravity {:?}, {} iterations, {} px/m",
            config.gravity,
            config.iterations,
            config.pixels_per_meter
        );

        Ok(Self {
            config,
            scale,
            pipeline: rapier::PhysicsPipeline::new(),
            gravity,
            integration_params,
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            rigid_bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            bodies: BodySet::new(),
            attached: Vec::new(),
            registry: ShapeRegistry::new(),
            listeners: ListenerRegistry::new(),
            tracker: ContactTracker::new(),
            boundary,
            commands: WorldCommands::new(),
        })
    }

    /// Get the physics configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Unit conversion used by this world
    pub fn scale(&self) -> UnitScale {
        self.scale
    }

    /// Set gravity (display units)
    pub fn set_gravity(&mut self, x: f32, y: f32) {
        self.gravity = self.scale.vector_to_physics([x, y]);
    }

    /// Get gravity (display units)
    pub fn gravity(&self) -> [f32; 2] {
        self.scale.vector_to_display(&self.gravity)
    }

    // ==================== Attachment ====================

    /// Create an unattached body from a description
    pub fn create_body(&mut self, desc: BodyDesc) -> BodyId {
        let id = self.bodies.insert(desc);
        log::trace!("created {id:?}");
        id
    }

    /// Attach a created body, building its engine body and shapes
    pub fn add(&mut self, id: BodyId) -> Result<()> {
        let entry = self.bodies.get(id).ok_or(PhysicsError::UnknownBody(id))?;
        if entry.is_attached() {
            return Err(PhysicsError::AlreadyAttached(id));
        }

        let built = entry.desc.shape.to_rapier_colliders(&self.scale)?;
        let rigid_body =
            entry
                .desc
                .to_rapier_body(&self.scale, id.user_data(), self.config.sleeping_enabled);

        let handle = self.rigid_bodies.insert(rigid_body);
        let colliders: Vec<_> = built
            .into_iter()
            .map(|collider| {
                self.colliders
                    .insert_with_parent(collider, handle, &mut self.rigid_bodies)
            })
            .collect();

        self.registry.register(id, &colliders);
        log::debug!("attached {id:?} with {} shapes", colliders.len());

        if let Some(entry) = self.bodies.get_mut(id) {
            entry.attachment = Attachment::Attached { handle, colliders };
        }
        self.attached.push(id);
        self.query_pipeline.update(&self.colliders);
        Ok(())
    }

    /// Create and attach a body in one call
    pub fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId> {
        let id = self.create_body(desc);
        if let Err(err) = self.add(id) {
            self.bodies.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Detach and drop a body.
    ///
    /// Its shapes leave the registry, its touch ledger is cleared on both
    /// sides and its listeners are dropped. No events fire. The handle is
    /// dead afterwards.
    pub fn remove(&mut self, id: BodyId) -> Result<()> {
        match self.bodies.get(id) {
            None => Err(PhysicsError::UnknownBody(id)),
            Some(entry) if !entry.is_attached() => Err(PhysicsError::NotAttached(id)),
            Some(_) => {
                self.detach(id);
                Ok(())
            }
        }
    }

    fn detach(&mut self, id: BodyId) {
        self.bodies.reset_touching(id);
        let Some(entry) = self.bodies.remove(id) else {
            return;
        };

        if let Attachment::Attached { handle, colliders } = &entry.attachment {
            self.registry.deregister(colliders);
            self.rigid_bodies.remove(
                *handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true, // Remove attached colliders
            );
        }

        self.listeners.remove_body(id);
        self.attached.retain(|b| *b != id);
        self.query_pipeline.update(&self.colliders);
        log::debug!("detached {id:?}");
    }

    /// Check if a body is currently attached
    pub fn is_attached(&self, id: BodyId) -> bool {
        self.bodies.get(id).is_some_and(|entry| entry.is_attached())
    }

    /// Check if a handle refers to a live body, attached or not
    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.get(id).is_some()
    }

    /// Description a body was created from, with any later configuration
    pub fn body_desc(&self, id: BodyId) -> Option<&BodyDesc> {
        self.bodies.get(id).map(|entry| &entry.desc)
    }

    /// Number of attached bodies
    pub fn body_count(&self) -> usize {
        self.attached.len()
    }

    /// Attached body by position in attachment order
    pub fn body(&self, index: usize) -> Option<BodyId> {
        self.attached.get(index).copied()
    }

    /// Attached bodies in attachment order
    pub fn bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.attached.iter().copied()
    }

    // ==================== Simulation ====================

    /// Advance the simulation by `time_step` seconds.
    ///
    /// Contact events are dispatched after the engine step, then commands
    /// queued by listeners are applied, then world bounds are enforced.
    pub fn update(&mut self, time_step: f32) {
        if !time_step.is_finite() || time_step <= 0.0 {
            log::warn!("ignoring update with non-positive time step {time_step}");
            return;
        }
        self.integration_params.dt = time_step;

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.query_pipeline.update(&self.colliders);

        self.dispatch_contacts();
        self.apply_commands();
        self.enforce_bounds();
    }

    fn dispatch_contacts(&mut self) {
        let notifications = self.tracker.collect(&self.narrow_phase, &self.scale);
        if notifications.is_empty() {
            return;
        }

        let mut translator = ContactTranslator {
            registry: &self.registry,
            bodies: &mut self.bodies,
            listeners: &self.listeners,
            commands: &mut self.commands,
        };
        let fired = notifications
            .iter()
            .filter_map(|contact| translator.apply(contact))
            .count();

        log::trace!(
            "{} contact notifications, {fired} events, {} touching pairs",
            notifications.len(),
            self.tracker.active_pairs()
        );
    }

    fn apply_commands(&mut self) {
        for command in self.commands.take() {
            match command {
                WorldCommand::RemoveBody(id) => {
                    if let Err(err) = self.remove(id) {
                        log::debug!("queued removal skipped: {err}");
                    }
                }
                WorldCommand::SetActive(id, active) => {
                    if let Err(err) = self.set_active(id, active) {
                        log::debug!("queued activation change skipped: {err}");
                    }
                }
                WorldCommand::AddListener(listener) => {
                    self.listeners.add_global(listener);
                }
                WorldCommand::RemoveListener(key) => {
                    self.listeners.remove_global(key);
                }
                WorldCommand::AddBodyListener(id, listener) => {
                    if self.contains(id) {
                        self.listeners.add_for_body(id, listener);
                    }
                }
                WorldCommand::RemoveBodyListener(id, key) => {
                    self.listeners.remove_for_body(id, key);
                }
            }
        }
    }

    fn enforce_bounds(&mut self) {
        if self.boundary.is_idle() {
            return;
        }

        let mut candidates = {
            let query = self.query();
            self.boundary.candidates(|region| query.bodies_in(region))
        };
        candidates.sort_by_key(|id| self.attached.iter().position(|b| b == id));

        let Some(targets) = self.boundary.filter(candidates) else {
            return;
        };

        match self.boundary.policy() {
            OutOfBoundsPolicy::None => {}
            OutOfBoundsPolicy::Deactivate => {
                for id in targets {
                    log::debug!("deactivating out-of-bounds {id:?}");
                    if let Err(err) = self.set_active(id, false) {
                        log::debug!("deactivation skipped: {err}");
                    }
                }
            }
            OutOfBoundsPolicy::Destroy => {
                for id in targets {
                    log::debug!("destroying out-of-bounds {id:?}");
                    if self.is_attached(id) {
                        self.detach(id);
                    }
                }
            }
        }
    }

    // ==================== Bounds ====================

    /// Enforce the rectangle spanned by two opposite corners
    pub fn set_bounds(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<()> {
        self.boundary.set_bounds(BoundingBox::new(x1, y1, x2, y2))
    }

    /// Enforce a `width` by `height` rectangle centred on the origin
    pub fn set_bounds_centered(&mut self, width: f32, height: f32) -> Result<()> {
        self.boundary.set_bounds(BoundingBox::centered(width, height))
    }

    /// Stop enforcing bounds
    pub fn clear_bounds(&mut self) {
        self.boundary.clear_bounds();
    }

    /// Current bounds, if any
    pub fn bounds(&self) -> Option<&WorldBounds> {
        self.boundary.bounds()
    }

    /// Set what happens to bodies leaving the bounds, with an optional veto
    pub fn set_out_of_bounds_behavior(
        &mut self,
        policy: OutOfBoundsPolicy,
        veto: Option<OutOfBoundsVeto>,
    ) {
        self.boundary.set_behavior(policy, veto);
    }

    /// Current out-of-bounds policy
    pub fn out_of_bounds_policy(&self) -> OutOfBoundsPolicy {
        self.boundary.policy()
    }

    // ==================== Listeners ====================

    /// Register a listener for every event; returns false if already registered
    pub fn add_listener(&mut self, listener: SharedListener) -> bool {
        self.listeners.add_global(listener)
    }

    /// Deregister a global listener
    pub fn remove_listener<L: ContactListener + ?Sized>(
        &mut self,
        listener: &Arc<Mutex<L>>,
    ) -> bool {
        self.listeners.remove_global(ListenerKey::of(listener))
    }

    /// Register a listener for events involving `id`
    pub fn add_body_listener(&mut self, id: BodyId, listener: SharedListener) -> Result<bool> {
        if !self.contains(id) {
            return Err(PhysicsError::UnknownBody(id));
        }
        Ok(self.listeners.add_for_body(id, listener))
    }

    /// Deregister a listener scoped to `id`
    pub fn remove_body_listener<L: ContactListener + ?Sized>(
        &mut self,
        id: BodyId,
        listener: &Arc<Mutex<L>>,
    ) -> bool {
        self.listeners.remove_for_body(id, ListenerKey::of(listener))
    }

    /// Number of global listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.global_count()
    }

    /// Number of listeners scoped to `id`
    pub fn body_listener_count(&self, id: BodyId) -> usize {
        self.listeners.body_listener_count(id)
    }

    // ==================== Queries ====================

    /// Get a query interface for spatial queries
    pub fn query(&self) -> BodyQuery<'_> {
        BodyQuery {
            query_pipeline: &self.query_pipeline,
            colliders: &self.colliders,
            bodies: &self.rigid_bodies,
            registry: &self.registry,
            scale: self.scale,
        }
    }

    /// Active bodies overlapping the rectangle spanned by two corners
    pub fn bodies_at(&self, x1: f32, y1: f32, x2: f32, y2: f32) -> Vec<BodyId> {
        self.query().bodies_in(&BoundingBox::new(x1, y1, x2, y2))
    }

    /// Check if two bodies currently touch
    pub fn is_touching(&self, a: BodyId, b: BodyId) -> bool {
        self.bodies
            .get(a)
            .is_some_and(|entry| entry.ledger.is_touching(b))
    }

    /// Contact points currently shared by two bodies
    pub fn touch_count(&self, a: BodyId, b: BodyId) -> u32 {
        self.bodies
            .get(a)
            .map_or(0, |entry| entry.ledger.touch_count(b))
    }

    /// Bodies currently touching `id`
    pub fn touching(&self, id: BodyId) -> Vec<BodyId> {
        self.bodies
            .get(id)
            .map(|entry| entry.ledger.touching().collect())
            .unwrap_or_default()
    }

    // ==================== Body state ====================

    fn rigid_body(&self, id: BodyId) -> Result<&rapier::RigidBody> {
        self.bodies
            .get(id)
            .and_then(|entry| entry.rigid_body())
            .and_then(|handle| self.rigid_bodies.get(handle))
            .ok_or(PhysicsError::NotAttached(id))
    }

    fn rigid_body_mut(&mut self, id: BodyId) -> Result<&mut rapier::RigidBody> {
        self.bodies
            .get(id)
            .and_then(|entry| entry.rigid_body())
            .and_then(|handle| self.rigid_bodies.get_mut(handle))
            .ok_or(PhysicsError::NotAttached(id))
    }

    /// Get body position
    pub fn position(&self, id: BodyId) -> Result<[f32; 2]> {
        let body = self.rigid_body(id)?;
        Ok(self.scale.vector_to_display(body.translation()))
    }

    /// Set body position
    pub fn set_position(&mut self, id: BodyId, x: f32, y: f32) -> Result<()> {
        let translation = self.scale.vector_to_physics([x, y]);
        self.rigid_body_mut(id)?.set_translation(translation, true);
        Ok(())
    }

    /// Get body rotation, radians
    pub fn rotation(&self, id: BodyId) -> Result<f32> {
        Ok(self.rigid_body(id)?.rotation().angle())
    }

    /// Set body rotation, radians
    pub fn set_rotation(&mut self, id: BodyId, angle: f32) -> Result<()> {
        self.rigid_body_mut(id)?
            .set_rotation(rapier::Rotation::new(angle), true);
        Ok(())
    }

    /// Get linear velocity
    pub fn linear_velocity(&self, id: BodyId) -> Result<[f32; 2]> {
        let body = self.rigid_body(id)?;
        Ok(self.scale.vector_to_display(body.linvel()))
    }

    /// Set linear velocity
    pub fn set_linear_velocity(&mut self, id: BodyId, x: f32, y: f32) -> Result<()> {
        let velocity = self.scale.vector_to_physics([x, y]);
        self.rigid_body_mut(id)?.set_linvel(velocity, true);
        Ok(())
    }

    /// Get angular velocity, radians per second
    pub fn angular_velocity(&self, id: BodyId) -> Result<f32> {
        Ok(self.rigid_body(id)?.angvel())
    }

    /// Set angular velocity, radians per second
    pub fn set_angular_velocity(&mut self, id: BodyId, angvel: f32) -> Result<()> {
        self.rigid_body_mut(id)?.set_angvel(angvel, true);
        Ok(())
    }

    /// Apply a force at the centre of mass until the next step
    pub fn apply_force(&mut self, id: BodyId, force: [f32; 2]) -> Result<()> {
        let force = self.scale.vector_to_physics(force);
        self.rigid_body_mut(id)?.add_force(force, true);
        Ok(())
    }

    /// Apply a torque until the next step
    pub fn apply_torque(&mut self, id: BodyId, torque: f32) -> Result<()> {
        let torque = self.scale.to_physics(self.scale.to_physics(torque));
        self.rigid_body_mut(id)?.add_torque(torque, true);
        Ok(())
    }

    /// Apply an impulse at the centre of mass
    pub fn apply_impulse(&mut self, id: BodyId, impulse: [f32; 2]) -> Result<()> {
        let impulse = self.scale.vector_to_physics(impulse);
        self.rigid_body_mut(id)?.apply_impulse(impulse, true);
        Ok(())
    }

    /// Check if a body takes part in the simulation
    pub fn is_active(&self, id: BodyId) -> Result<bool> {
        Ok(self.rigid_body(id)?.is_enabled())
    }

    /// Include or exclude a body from the simulation.
    ///
    /// An inactive body keeps its place in the world; its contacts end on
    /// the next step.
    pub fn set_active(&mut self, id: BodyId, active: bool) -> Result<()> {
        self.rigid_body_mut(id)?.set_enabled(active);
        self.query_pipeline.update(&self.colliders);
        Ok(())
    }

    /// Bounding box of all of a body's shapes
    pub fn bounding_box(&self, id: BodyId) -> Result<BoundingBox> {
        let Some(Attachment::Attached { colliders, .. }) =
            self.bodies.get(id).map(|entry| &entry.attachment)
        else {
            return Err(PhysicsError::NotAttached(id));
        };

        colliders
            .iter()
            .filter_map(|handle| self.colliders.get(*handle))
            .map(|collider| aabb_to_bounds(&collider.compute_aabb(), &self.scale))
            .reduce(|a, b| a.merged(&b))
            .ok_or(PhysicsError::NotAttached(id))
    }

    // ==================== Configuration ====================

    fn desc_before_attach(&mut self, id: BodyId) -> Result<&mut BodyDesc> {
        let entry = self
            .bodies
            .get_mut(id)
            .ok_or(PhysicsError::UnknownBody(id))?;
        if entry.is_attached() {
            return Err(PhysicsError::AlreadyAttached(id));
        }
        Ok(&mut entry.desc)
    }

    /// Set linear damping; only before attachment
    pub fn set_linear_damping(&mut self, id: BodyId, damping: f32) -> Result<()> {
        self.desc_before_attach(id)?.linear_damping = damping;
        Ok(())
    }

    /// Set angular damping; only before attachment
    pub fn set_angular_damping(&mut self, id: BodyId, damping: f32) -> Result<()> {
        self.desc_before_attach(id)?.angular_damping = damping;
        Ok(())
    }

    /// Prevent rotation; only before attachment
    pub fn set_fixed_rotation(&mut self, id: BodyId, fixed: bool) -> Result<()> {
        self.desc_before_attach(id)?.fixed_rotation = fixed;
        Ok(())
    }

    /// Enable continuous collision detection; only before attachment
    pub fn set_bullet(&mut self, id: BodyId, bullet: bool) -> Result<()> {
        self.desc_before_attach(id)?.bullet = bullet;
        Ok(())
    }

    /// Replace the material of every shape of a body
    pub fn set_material(&mut self, id: BodyId, material: PhysicsMaterial) -> Result<()> {
        self.edit_material(id, |m| *m = material)
    }

    /// Set density on every shape of a body
    pub fn set_density(&mut self, id: BodyId, density: f32) -> Result<()> {
        self.edit_material(id, |m| m.density = density)
    }

    /// Set friction on every shape of a body
    pub fn set_friction(&mut self, id: BodyId, friction: f32) -> Result<()> {
        self.edit_material(id, |m| m.friction = friction)
    }

    /// Set restitution on every shape of a body
    pub fn set_restitution(&mut self, id: BodyId, restitution: f32) -> Result<()> {
        self.edit_material(id, |m| m.restitution = restitution)
    }

    /// Edit the stored material and, when attached, the live colliders
    fn edit_material(&mut self, id: BodyId, edit: impl Fn(&mut PhysicsMaterial)) -> Result<()> {
        let entry = self
            .bodies
            .get_mut(id)
            .ok_or(PhysicsError::UnknownBody(id))?;
        entry.desc.shape.set_material(&edit);

        if let Attachment::Attached { colliders, .. } = &entry.attachment {
            for (handle, primitive) in colliders.iter().zip(entry.desc.shape.primitives()) {
                if let Some(collider) = self.colliders.get_mut(*handle) {
                    let material = &primitive.material;
                    collider.set_density(material.density);
                    collider.set_friction(material.friction);
                    collider.set_restitution(material.restitution);
                    collider.set_friction_combine_rule(material.friction_combine.into());
                    collider.set_restitution_combine_rule(material.restitution_combine.into());
                }
            }
        }
        Ok(())
    }
}
