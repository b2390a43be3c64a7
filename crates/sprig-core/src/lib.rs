//! Sprig Core - Core types shared by the Sprig ECS and its hosts
//!
//! This crate provides the foundational types used throughout the runtime:
//! - Mathematical primitives (re-exported from glam)
//! - Transform carried by every entity
//! - Time resource with scaled and fixed deltas
//! - Color and rectangle types passed to render targets

pub mod time;
pub mod types;

pub use glam::{Vec2, Vec3};
pub use time::{TimeConfig, TimeResource};
pub use types::{Color, Rect, Transform};
