//! Void Physics 2D - Rapier 2D with pair-level contact events
//!
//! This crate wraps Rapier 2D behind a world of bodies that reports one
//! collision and one separation per touching pair of bodies, however many
//! contact points the pair shares, and optionally enforces world bounds.
//!
//! # Features
//!
//! - Static, dynamic and kinematic bodies with circle, rectangle, polygon and
//!   compound shapes
//! - Deduplicated collision/separation events with global and per-body
//!   listeners
//! - World bounds with a deactivate/destroy policy and a veto hook
//! - Display units scaled per world to engine meters
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                        World                          │
//! │  ┌──────────┐  ┌───────────────┐  ┌───────────────┐  │
//! │  │ BodySet  │  │ ShapeRegistry │  │   Listeners   │  │
//! │  │ (ledgers)│  │ collider→body │  │ global / body │  │
//! │  └──────────┘  └───────────────┘  └───────────────┘  │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │  PhysicsPipeline → ContactTracker → Translator │  │
//! │  └────────────────────────────────────────────────┘  │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │  WorldCommands → BoundaryResolver (QueryPipeline) │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_physics2d::prelude::*;
//!
//! let mut world = World::new(PhysicsConfig::default())?;
//!
//! let floor = world.add_body(BodyDesc::fixed(Shape::rectangle(20.0, 1.0)))?;
//! let ball = world.add_body(
//!     BodyDesc::dynamic(Shape::circle(0.5)).with_position(0.0, 5.0),
//! )?;
//!
//! let events = shared(EventCollector::new());
//! world.add_listener(events.clone());
//!
//! for _ in 0..120 {
//!     world.update(1.0 / 60.0);
//! }
//! assert!(world.is_touching(ball, floor));
//! ```

pub mod body;
pub mod bounds;
pub mod commands;
pub mod config;
pub mod contact;
pub mod error;
pub mod events;
pub mod material;
pub mod query;
pub mod registry;
pub mod shape;
pub mod touch;
pub mod world;

pub mod prelude {
    //! Common imports for 2D physics
    pub use crate::body::{BodyDesc, BodyId, BodyType};
    pub use crate::bounds::{BoundingBox, OutOfBoundsPolicy, OutOfBoundsVeto, WorldBounds};
    pub use crate::commands::{WorldCommand, WorldCommands};
    pub use crate::config::{PhysicsConfig, UnitScale};
    pub use crate::error::{PhysicsError, Result};
    pub use crate::events::{
        shared, CollisionEvent, ContactEventType, ContactGeometry, ContactHandler,
        ContactListener, EventCollector, ListenerKey, RecordedEvent, SharedListener,
    };
    pub use crate::material::{CombineRule, PhysicsMaterial};
    pub use crate::query::BodyQuery;
    pub use crate::shape::{Geometry, Primitive, Shape};
    pub use crate::touch::TouchLedger;
    pub use crate::world::World;
}

pub use prelude::*;
