//! Sprig ECS - Entity Component System runtime
//!
//! A fixed-capacity ECS built around an explicit [`World`]:
//! - generational entity handles with LIFO slot recycling
//! - one dense mapper per component type, dispatched by capability
//! - fixed or variable timestep updates, per-frame render sweeps
//! - deferred deletion and structural changes, applied by [`World::maintain`]
//! - set-intersection queries and a tagged resource registry

mod command;
mod component;
mod config;
mod context;
mod entity;
mod query;
mod registry;
mod render;
mod resource;
mod schedule;
mod world;

pub use component::{Component, ComponentMapper, ComponentType};
pub use config::{ConfigError, WorldConfig};
pub use context::{RenderContext, UpdateContext};
pub use entity::{EntityArena, EntityHandle};
pub use query::QueryResult;
pub use render::{RenderTarget, SpriteDraw, SpriteId};
pub use resource::Resources;
pub use schedule::FixedStepScheduler;
pub use world::{World, TIME_TAG};

pub use sprig_core::{Color, Rect, TimeConfig, TimeResource, Transform, Vec2};
