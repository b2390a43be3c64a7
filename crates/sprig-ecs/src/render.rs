//! The draw hook consumed by renderable components.
//!
//! The runtime never draws anything itself. Hosts implement [`RenderTarget`]
//! over their graphics backend and pass it to [`World::render`](crate::World::render).

use sprig_core::{Color, Rect, Vec2};

/// Host-defined sprite or texture identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpriteId(pub u32);

/// One textured quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw {
    pub sprite: SpriteId,
    /// Region of the sprite sheet to sample
    pub source: Rect,
    /// Destination rectangle on screen
    pub dest: Rect,
    /// Rotation pivot, relative to `dest`
    pub origin: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
    pub tint: Color,
}

/// Draw primitive supplied by the host rendering layer.
pub trait RenderTarget {
    fn draw_sprite(&mut self, draw: &SpriteDraw);
}
