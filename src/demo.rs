//! Headless bouncing-sprite simulation.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprig_ecs::{Color, EntityHandle, Rect, TimeResource, Vec2, World};
use tracing::{debug, info};

use crate::components::{Ballistic, Inert, Mover, Pulse, Sprite, SPRITE_VARIANTS};
use crate::headless::FrameRecorder;
use crate::passes;
use crate::settings::{DemoMode, DemoOptions, DemoSettings};

/// Sprites are kept this far inside the playfield edges.
const MARGIN: f32 = 16.0;
const LEADER_TAG: &str = "leader";

/// Simulated frame timer with random jitter around a nominal frame rate.
pub struct FrameClock {
    nominal: f64,
    jitter: f64,
}

impl FrameClock {
    pub fn new(frame_rate: f32, jitter: f32) -> Self {
        Self {
            nominal: 1.0 / f64::from(frame_rate.max(1.0)),
            jitter: f64::from(jitter.clamp(0.0, 1.0)),
        }
    }

    /// Duration of the next frame in seconds.
    pub fn tick(&self, rng: &mut impl Rng) -> f64 {
        self.nominal * (1.0 + self.jitter * rng.gen_range(-1.0..=1.0))
    }
}

/// Totals reported when a run ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u32,
    pub seconds: f64,
    pub spawned: u64,
    pub despawned: u64,
    pub entities: usize,
    pub draws: u64,
}

#[derive(Default)]
struct SecondStats {
    elapsed: f64,
    frames: u32,
}

pub struct Demo {
    world: World,
    options: DemoOptions,
    rng: StdRng,
    clock: FrameClock,
    recorder: FrameRecorder,
    bounds: Rect,
    stats: SecondStats,
    summary: RunSummary,
}

impl Demo {
    pub fn new(settings: DemoSettings) -> Result<Self> {
        let DemoSettings {
            world: mut config,
            demo: options,
        } = settings;
        if options.mode == DemoMode::Fixed {
            config.fixed_update = true;
        }

        let mut world = World::new(config).context("Invalid world configuration")?;
        world.register_component::<Inert>();
        match options.mode {
            DemoMode::Query => world.register_component::<Ballistic>(),
            DemoMode::Components | DemoMode::Fixed => world.register_component::<Mover>(),
        };
        world.register_component::<Pulse>();
        world.register_component::<Sprite>();

        let bounds = Rect::new(
            MARGIN,
            MARGIN,
            (options.width - 2.0 * MARGIN).max(0.0),
            (options.height - 2.0 * MARGIN).max(0.0),
        );

        let mut demo = Self {
            rng: StdRng::seed_from_u64(options.seed),
            clock: FrameClock::new(options.frame_rate, options.frame_jitter),
            recorder: FrameRecorder::new(options.width, options.height),
            world,
            bounds,
            stats: SecondStats::default(),
            summary: RunSummary::default(),
            options,
        };

        let center = demo.bounds.center();
        for _ in 0..demo.options.initial_entities {
            if demo.spawn(center).is_null() {
                break;
            }
        }
        demo.world.init();

        info!(
            mode = demo.options.mode.name(),
            entities = demo.world.active_entities(),
            "Demo ready"
        );
        Ok(demo)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn recorder(&self) -> &FrameRecorder {
        &self.recorder
    }

    /// Run the configured number of frames.
    pub fn run(&mut self) -> RunSummary {
        for _ in 0..self.options.frames {
            self.frame();
        }
        self.summary()
    }

    /// One host frame: spawn or despawn, update, passes, render, maintain.
    pub fn frame(&mut self) {
        let delta = self.clock.tick(&mut self.rng);
        self.wave();

        self.world.update(delta);

        let dt = self.world.time().map_or(delta as f32, TimeResource::delta);
        if self.options.mode == DemoMode::Query {
            passes::move_bodies(&mut self.world, dt);
        }
        passes::pulse(&mut self.world, dt);

        self.recorder.begin_frame();
        self.world.render(&mut self.recorder);
        self.world.maintain();

        self.summary.frames += 1;
        self.summary.seconds += delta;
        self.record_second(delta);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            entities: self.world.active_entities(),
            draws: self.recorder.total_draws(),
            ..self.summary.clone()
        }
    }

    fn wave(&mut self) {
        let wave_frames = self.options.wave_frames.max(1);
        let spawning = (self.summary.frames / wave_frames) % 2 == 0;
        let count = self.options.spawn_per_frame;

        if spawning {
            for _ in 0..count {
                if self.world.active_entities() >= self.world.max_entities() {
                    break;
                }
                let at = Vec2::new(
                    self.rng.gen_range(self.bounds.x..=self.bounds.x + self.bounds.width),
                    self.bounds.y,
                );
                self.spawn(at);
            }
        } else {
            let victims: Vec<EntityHandle> = self
                .world
                .active_handles()
                .iter()
                .rev()
                .filter(|&&handle| !self.world.is_pending_delete(handle))
                .take(count)
                .copied()
                .collect();
            for handle in victims {
                if self.world.delete_entity(handle) {
                    self.summary.despawned += 1;
                }
            }
        }
    }

    fn spawn(&mut self, at: Vec2) -> EntityHandle {
        let entity = self.world.create_entity_at(at, Vec2::ONE, 0.0);
        if entity.is_null() {
            return entity;
        }

        let motion = Ballistic::new(&mut self.rng, self.bounds);
        match self.options.mode {
            DemoMode::Query => self.world.attach_component(entity, motion),
            DemoMode::Components | DemoMode::Fixed => {
                self.world.attach_component(entity, Mover(motion))
            }
        };

        if self.rng.gen_range(0..100) < self.options.pulse_chance {
            self.world.attach_component(entity, Pulse::default());
            if self.rng.gen_range(0..100) < self.options.inert_chance {
                self.world.attach_component(entity, Inert);
            }
        }

        let variant = self.rng.gen_range(0..SPRITE_VARIANTS);
        self.world
            .attach_component(entity, Sprite::new(variant, Color::WHITE));

        if self.world.tagged_entity(LEADER_TAG).is_null() {
            self.world.tag_entity(entity, LEADER_TAG);
            debug!("{entity:?} is the new leader");
        }

        self.summary.spawned += 1;
        entity
    }

    fn record_second(&mut self, delta: f64) {
        self.stats.elapsed += delta;
        self.stats.frames += 1;
        if self.stats.elapsed < 1.0 {
            return;
        }

        let leader = self.world.tagged_entity(LEADER_TAG);
        let leader_position = self
            .world
            .transform(leader)
            .map(|transform| transform.position);
        let time = self
            .world
            .time()
            .map(ToString::to_string)
            .unwrap_or_default();

        info!(
            fps = self.stats.frames,
            entities = self.world.active_entities(),
            draws = self.recorder.draws().len(),
            offscreen = self.recorder.offscreen(),
            "{time} | leader {leader_position:?}"
        );
        if self.world.is_fixed_update() {
            info!("{}", self.world.debug_update_string());
        }

        self.stats = SecondStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_ecs::{ComponentType, WorldConfig};

    fn settings(mode: DemoMode) -> DemoSettings {
        DemoSettings {
            world: WorldConfig::with_capacity(64),
            demo: DemoOptions {
                mode,
                frames: 30,
                initial_entities: 8,
                spawn_per_frame: 2,
                wave_frames: 1000,
                ..Default::default()
            },
        }
    }

    #[test]
    fn every_mode_runs_and_draws_each_entity() {
        for mode in [DemoMode::Components, DemoMode::Fixed, DemoMode::Query] {
            let mut demo = Demo::new(settings(mode)).unwrap();
            let summary = demo.run();
            assert_eq!(summary.frames, 30);
            assert_eq!(summary.entities, 64, "{mode:?}");
            assert_eq!(demo.recorder().draws().len(), 64, "{mode:?}");
            assert_eq!(demo.world().is_fixed_update(), mode == DemoMode::Fixed);
        }
    }

    #[test]
    fn spawning_stops_at_capacity() {
        let mut demo = Demo::new(settings(DemoMode::Components)).unwrap();
        for _ in 0..100 {
            demo.frame();
        }
        assert_eq!(demo.world().active_entities(), 64);
        assert_eq!(demo.summary().spawned, 64);
    }

    #[test]
    fn despawn_wave_removes_entities() {
        let mut options = settings(DemoMode::Components);
        options.demo.wave_frames = 1;
        options.demo.spawn_per_frame = 3;
        let mut demo = Demo::new(options).unwrap();

        demo.frame();
        assert_eq!(demo.world().active_entities(), 11);
        demo.frame();
        assert_eq!(demo.world().active_entities(), 8);
        assert_eq!(demo.summary().despawned, 3);
    }

    #[test]
    fn leader_is_retagged_after_despawn() {
        let mut options = settings(DemoMode::Components);
        options.demo.initial_entities = 0;
        options.demo.spawn_per_frame = 1;
        options.demo.wave_frames = 1;
        let mut demo = Demo::new(options).unwrap();
        assert!(demo.world().tagged_entity(LEADER_TAG).is_null());

        demo.frame();
        let first = demo.world().tagged_entity(LEADER_TAG);
        assert!(demo.world().is_live(first));

        demo.frame();
        assert!(!demo.world().is_live(first));
        assert!(demo.world().tagged_entity(LEADER_TAG).is_null());

        demo.frame();
        let second = demo.world().tagged_entity(LEADER_TAG);
        assert!(demo.world().is_live(second));
        assert_ne!(first, second);
    }

    #[test]
    fn query_mode_moves_bodies() {
        let mut demo = Demo::new(settings(DemoMode::Query)).unwrap();
        let before: Vec<Vec2> = demo
            .world()
            .active_handles()
            .iter()
            .map(|&h| demo.world().transform(h).unwrap().position)
            .collect();
        demo.frame();
        let moved = demo
            .world()
            .active_handles()
            .iter()
            .zip(&before)
            .filter(|(handle, start)| demo.world().transform(**handle).unwrap().position != **start)
            .count();
        assert_eq!(moved, before.len());
    }

    #[test]
    fn pulses_respect_inert() {
        let mut options = settings(DemoMode::Components);
        options.demo.pulse_chance = 100;
        options.demo.inert_chance = 100;
        options.demo.spawn_per_frame = 0;
        let mut demo = Demo::new(options).unwrap();
        demo.frame();

        let world = demo.world();
        let pulsing = world.query(&[ComponentType::of::<Pulse>()], &[]);
        assert_eq!(pulsing.len(), 8);
        for &handle in pulsing.entities() {
            assert_eq!(world.transform(handle).unwrap().scale, Vec2::ONE);
        }
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = Demo::new(settings(DemoMode::Fixed)).unwrap();
        let mut b = Demo::new(settings(DemoMode::Fixed)).unwrap();
        a.run();
        b.run();
        assert_eq!(a.summary(), b.summary());
        assert_eq!(a.world().transforms(), b.world().transforms());
    }

    #[test]
    fn clock_stays_within_jitter() {
        let clock = FrameClock::new(50.0, 0.5);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let delta = clock.tick(&mut rng);
            assert!((0.01..=0.03).contains(&delta));
        }
    }

    #[test]
    fn invalid_world_config_is_an_error() {
        let mut options = settings(DemoMode::Components);
        options.world.max_entities = 0;
        assert!(Demo::new(options).is_err());
    }
}
