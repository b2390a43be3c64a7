//! Headless render target.

use sprig_ecs::{Rect, RenderTarget, SpriteDraw};

/// Records sprite draws instead of rasterizing them.
///
/// Draws of the current frame are kept until the next [`FrameRecorder::begin_frame`].
pub struct FrameRecorder {
    viewport: Rect,
    draws: Vec<SpriteDraw>,
    offscreen: usize,
    total_draws: u64,
}

impl FrameRecorder {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Rect::new(0.0, 0.0, width, height),
            draws: Vec::new(),
            offscreen: 0,
            total_draws: 0,
        }
    }

    pub fn begin_frame(&mut self) {
        self.draws.clear();
        self.offscreen = 0;
    }

    /// Draws recorded this frame
    pub fn draws(&self) -> &[SpriteDraw] {
        &self.draws
    }

    /// Draws this frame whose anchor fell outside the viewport
    pub fn offscreen(&self) -> usize {
        self.offscreen
    }

    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }

    fn contains(&self, x: f32, y: f32) -> bool {
        let v = &self.viewport;
        x >= v.x && y >= v.y && x <= v.x + v.width && y <= v.y + v.height
    }
}

impl RenderTarget for FrameRecorder {
    fn draw_sprite(&mut self, draw: &SpriteDraw) {
        if !self.contains(draw.dest.x, draw.dest.y) {
            self.offscreen += 1;
        }
        self.draws.push(*draw);
        self.total_draws += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_ecs::{Color, SpriteId, Vec2};

    fn draw_at(x: f32, y: f32) -> SpriteDraw {
        SpriteDraw {
            sprite: SpriteId(0),
            source: Rect::new(0.0, 0.0, 32.0, 32.0),
            dest: Rect::new(x, y, 32.0, 32.0),
            origin: Vec2::splat(16.0),
            rotation: 0.0,
            tint: Color::WHITE,
        }
    }

    #[test]
    fn frames_reset_draws_but_keep_totals() {
        let mut recorder = FrameRecorder::new(100.0, 100.0);
        recorder.begin_frame();
        recorder.draw_sprite(&draw_at(10.0, 10.0));
        recorder.draw_sprite(&draw_at(200.0, 10.0));
        assert_eq!(recorder.draws().len(), 2);
        assert_eq!(recorder.offscreen(), 1);

        recorder.begin_frame();
        assert!(recorder.draws().is_empty());
        assert_eq!(recorder.offscreen(), 0);
        assert_eq!(recorder.total_draws(), 2);
    }
}
