//! Simulation core of the arena server.
//!
//! Entities are bundles of optional field groups owned by an
//! [`EntityManager`] and addressed by weak `(id, hash)` references. A
//! [`World`] advances them one fixed-order tick at a time: spatial
//! indexing, physics, behaviors, AI controllers, and one compiled update
//! packet per viewer.
//!
//! # Features
//!
//! - Typed field groups with per-field dirty tracking
//! - Lowest-free slot allocation with generation hashes
//! - Uniform grid and quad tree broad phase behind [`SpatialIndex`]
//! - Circle and rectangle collisions with knockback and friction
//! - Tick-indexed deferred events
//!
//! # Example
//!
//! ```
//! use world::{Entity, GameConfig, World};
//!
//! let mut world = World::new(GameConfig::default())?;
//! let mut shape = Entity::object();
//! shape.attach_physics().set_size(30.0);
//! let shape = world.insert(shape)?;
//! world.tick()?;
//! assert!(world.exists(shape));
//! # Ok::<(), world::WorldError>(())
//! ```

mod behavior;
mod client;
mod config;
mod entity;
mod error;
mod events;
pub mod fields;
pub mod flags;
mod manager;
pub mod physics;
pub mod spatial;
mod world;

pub use behavior::{AiController, EntityBehavior, GameHooks};
pub use client::{Client, ClientId};
pub use config::{GameConfig, SpatialStrategy, MAX_QUAD_TREE_DEPTH};
pub use entity::{DeletionAnimation, Entity, ObjectState, DELETION_ANIMATION_TICKS};
pub use error::{WorldError, WorldResult};
pub use events::{Event, EventQueue};
pub use manager::EntityManager;
pub use spatial::{Aabb, QuadTree, SpatialIndex, UniformGrid};
pub use world::World;

pub use codec::{EntityRef, Tick};
pub use repgraph::EntityState;
