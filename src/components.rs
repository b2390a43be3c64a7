//! Demo components: bouncing sprites and their helpers.

use std::f32::consts::{FRAC_PI_2, PI};

use rand::Rng;
use sprig_ecs::{
    Color, Component, Rect, RenderContext, RenderTarget, SpriteDraw, SpriteId, Transform,
    UpdateContext, Vec2,
};

/// Sprites are square cells of this size in the sheet.
pub const CELL_SIZE: f32 = 32.0;
/// Number of sprite variants in the sheet.
pub const SPRITE_VARIANTS: u32 = 5;

/// Marker that keeps an entity out of the pulse pass.
#[derive(Debug, Default)]
pub struct Inert;

impl Component for Inert {}

/// Gravity-and-bounce motion, stepped by whoever owns it.
#[derive(Debug, Clone)]
pub struct Ballistic {
    pub velocity: Vec2,
    pub gravity: f32,
    pub jump_speed: f32,
    /// Area the owner's position is kept in
    pub bounds: Rect,
}

impl Ballistic {
    const H_SPEED: i32 = 60;
    const JUMP_SPEED: i32 = 820;
    const GRAVITY: f32 = 480.0;

    pub fn new(rng: &mut impl Rng, bounds: Rect) -> Self {
        Self {
            velocity: Vec2::new(
                rng.gen_range(-Self::H_SPEED..Self::H_SPEED) as f32,
                0.0,
            ),
            gravity: Self::GRAVITY,
            jump_speed: rng.gen_range(Self::JUMP_SPEED / 8..Self::JUMP_SPEED) as f32,
            bounds,
        }
    }

    /// Advance `transform` by `dt` seconds, bouncing off the bounds and
    /// turning the sprite to face its direction of travel.
    pub fn advance(&mut self, transform: &mut Transform, dt: f32) {
        let min = Vec2::new(self.bounds.x, self.bounds.y);
        let max = min + self.bounds.size();

        self.velocity.y += self.gravity * dt;
        transform.translate(self.velocity * dt);

        let position = &mut transform.position;
        if position.x > max.x || position.x < min.x {
            self.velocity.x = -self.velocity.x;
            position.x = position.x.clamp(min.x, max.x);
        }
        if position.y > max.y {
            self.velocity.y = -self.jump_speed;
            position.y = position.y.clamp(min.y, max.y);
        }
        if position.y < min.y {
            self.velocity.y = self.gravity;
            position.y = position.y.clamp(min.y, max.y);
        }

        let mut rotation = fast_atan2(self.velocity.y, self.velocity.x).to_degrees() + 90.0;
        if self.velocity.y > 0.0 {
            rotation += 180.0;
        }
        transform.rotation = rotation;
    }
}

impl Component for Ballistic {}

/// Self-driven [`Ballistic`] motion through the update hook.
#[derive(Debug, Clone)]
pub struct Mover(pub Ballistic);

impl Component for Mover {
    const UPDATES: bool = true;

    fn update(&mut self, ctx: &mut UpdateContext<'_>, dt: f32) {
        self.0.advance(ctx.transform_mut(), dt);
    }
}

/// A sheet cell drawn centered on the owner's transform.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub sprite: SpriteId,
    pub source: Rect,
    pub tint: Color,
}

impl Sprite {
    pub fn new(variant: u32, tint: Color) -> Self {
        let variant = variant % SPRITE_VARIANTS;
        Self {
            sprite: SpriteId(0),
            source: Rect::new(variant as f32 * CELL_SIZE, 0.0, CELL_SIZE, CELL_SIZE),
            tint,
        }
    }

    pub fn draw(&self, transform: &Transform) -> SpriteDraw {
        let size = self.source.size() * transform.scale;
        SpriteDraw {
            sprite: self.sprite,
            source: self.source,
            dest: Rect::new(transform.position.x, transform.position.y, size.x, size.y),
            origin: size / 2.0,
            rotation: transform.rotation,
            tint: self.tint,
        }
    }
}

impl Component for Sprite {
    const RENDERS: bool = true;

    fn render(&self, ctx: &RenderContext<'_>, target: &mut dyn RenderTarget) {
        target.draw_sprite(&self.draw(ctx.transform()));
    }
}

/// Grows and shrinks its owner between two scales. Driven by a host pass.
#[derive(Debug, Clone)]
pub struct Pulse {
    pub growing: bool,
    /// Scale change per second
    pub rate: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for Pulse {
    fn default() -> Self {
        Self {
            growing: true,
            rate: 1.0,
            min_scale: 0.2,
            max_scale: 4.9,
        }
    }
}

impl Pulse {
    pub fn advance(&mut self, transform: &mut Transform, dt: f32) {
        if self.growing {
            if transform.scale.x < self.max_scale {
                transform.scale += Vec2::ONE * self.rate * dt;
            } else {
                self.growing = false;
            }
        } else if transform.scale.x > self.min_scale {
            transform.scale -= Vec2::ONE * self.rate * dt;
        } else {
            self.growing = true;
        }
    }
}

impl Component for Pulse {}

/// Approximate `atan2`, accurate to about 0.005 radians.
pub fn fast_atan2(y: f32, x: f32) -> f32 {
    if x == 0.0 {
        return if y > 0.0 {
            FRAC_PI_2
        } else if y == 0.0 {
            0.0
        } else {
            -FRAC_PI_2
        };
    }

    let z = y / x;
    if z.abs() < 1.0 {
        let atan = z / (1.0 + 0.28 * z * z);
        if x < 0.0 {
            return if y < 0.0 { atan - PI } else { atan + PI };
        }
        atan
    } else {
        let atan = FRAC_PI_2 - z / (z * z + 0.28);
        if y < 0.0 {
            atan - PI
        } else {
            atan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bounds() -> Rect {
        Rect::new(16.0, 16.0, 1248.0, 688.0)
    }

    #[test]
    fn fast_atan2_close_to_std() {
        for i in 0..64 {
            let angle = i as f32 / 64.0 * 2.0 * PI - PI + 0.01;
            let (y, x) = angle.sin_cos();
            let diff = (fast_atan2(y, x) - y.atan2(x)).abs();
            assert!(diff < 0.01, "angle {angle}: {diff}");
        }
        assert_eq!(fast_atan2(0.0, 0.0), 0.0);
        assert_eq!(fast_atan2(1.0, 0.0), FRAC_PI_2);
        assert_eq!(fast_atan2(-1.0, 0.0), -FRAC_PI_2);
    }

    #[test]
    fn ballistic_falls_under_gravity() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut motion = Ballistic::new(&mut rng, bounds());
        motion.velocity = Vec2::ZERO;
        let mut transform = Transform::from_position(Vec2::new(100.0, 100.0));
        motion.advance(&mut transform, 0.5);
        assert_eq!(motion.velocity.y, 240.0);
        assert_eq!(transform.position, Vec2::new(100.0, 220.0));
    }

    #[test]
    fn ballistic_bounces_off_walls_and_floor() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut motion = Ballistic::new(&mut rng, bounds());
        motion.velocity = Vec2::new(100.0, 0.0);
        let mut transform = Transform::from_position(Vec2::new(1263.0, 703.0));
        motion.advance(&mut transform, 0.1);
        assert_eq!(motion.velocity.x, -100.0);
        assert_eq!(motion.velocity.y, -motion.jump_speed);
        assert_eq!(transform.position, Vec2::new(1264.0, 704.0));
    }

    #[test]
    fn ballistic_faces_travel_direction() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut motion = Ballistic::new(&mut rng, bounds());
        motion.gravity = 0.0;
        motion.velocity = Vec2::new(0.0, -10.0);
        let mut transform = Transform::from_position(Vec2::new(300.0, 300.0));
        motion.advance(&mut transform, 0.01);
        assert!(transform.rotation.abs() < 0.01);
    }

    #[test]
    fn spawn_speeds_in_range() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let motion = Ballistic::new(&mut rng, bounds());
            assert!(motion.velocity.x >= -60.0 && motion.velocity.x < 60.0);
            assert!(motion.jump_speed >= 102.0 && motion.jump_speed < 820.0);
        }
    }

    #[test]
    fn pulse_turns_at_limits() {
        let mut pulse = Pulse::default();
        let mut transform = Transform::default();
        transform.scale = Vec2::splat(5.0);
        pulse.advance(&mut transform, 0.1);
        assert!(!pulse.growing);
        pulse.advance(&mut transform, 0.5);
        assert_eq!(transform.scale, Vec2::splat(4.5));

        transform.scale = Vec2::splat(0.1);
        pulse.advance(&mut transform, 0.1);
        assert!(pulse.growing);
    }

    #[test]
    fn sprite_draw_centered_and_scaled() {
        let sprite = Sprite::new(2, Color::WHITE);
        let transform = Transform::new(Vec2::new(50.0, 60.0), Vec2::splat(2.0), 90.0);
        let draw = sprite.draw(&transform);
        assert_eq!(draw.source.x, 64.0);
        assert_eq!(draw.dest, Rect::new(50.0, 60.0, 64.0, 64.0));
        assert_eq!(draw.origin, Vec2::splat(32.0));
        assert_eq!(draw.rotation, 90.0);
    }
}
