use tracing::{trace, warn};

/// Slack allowed when comparing accumulated time against the step, so deltas
/// that sum to a whole number of steps produce exactly that many steps
/// regardless of how they were chunked.
const STEP_TOLERANCE: f64 = 1e-9;

/// Fixed-timestep accumulator.
///
/// Frame deltas are accumulated and consumed in whole steps; a frame may run
/// zero, one, or several steps. The counters are diagnostics only.
#[derive(Debug, Clone)]
pub struct FixedStepScheduler {
    enabled: bool,
    fixed_fps: u32,
    step: f64,
    accumulated: f64,
    frames_without_step: u32,
    steps_last_frame: u32,
}

impl FixedStepScheduler {
    pub fn new(enabled: bool, fixed_fps: u32) -> Self {
        Self {
            enabled,
            fixed_fps,
            step: Self::step_for(fixed_fps),
            accumulated: 0.0,
            frames_without_step: 0,
            steps_last_frame: 0,
        }
    }

    /// Add a frame delta and return how many whole steps are due. Negative or
    /// non-finite deltas are ignored.
    pub fn advance(&mut self, delta: f64) -> u32 {
        if !delta.is_finite() || delta < 0.0 {
            warn!("Ignoring invalid frame delta {delta}");
            return 0;
        }
        self.accumulated += delta;
        if self.accumulated + STEP_TOLERANCE < self.step {
            self.frames_without_step += 1;
            trace!(
                accumulated = self.accumulated,
                frames_without_step = self.frames_without_step,
                "No fixed step due"
            );
            return 0;
        }

        self.frames_without_step = 0;
        self.steps_last_frame = 0;
        while self.accumulated + STEP_TOLERANCE >= self.step {
            self.accumulated = (self.accumulated - self.step).max(0.0);
            self.steps_last_frame += 1;
        }
        trace!(steps = self.steps_last_frame, "Fixed steps due");
        self.steps_last_frame
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle fixed stepping. Any leftover accumulated time is discarded.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.reset();
    }

    /// Change the step rate. Any leftover accumulated time is discarded.
    pub fn set_fixed_fps(&mut self, fixed_fps: u32) {
        self.fixed_fps = fixed_fps;
        self.step = Self::step_for(fixed_fps);
        self.reset();
    }

    fn step_for(fixed_fps: u32) -> f64 {
        1.0 / f64::from(fixed_fps.max(1))
    }

    pub fn fixed_fps(&self) -> u32 {
        self.fixed_fps
    }

    /// Step length in seconds.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Time carried over to the next frame.
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    /// Consecutive frames that ran no step.
    pub fn frames_without_step(&self) -> u32 {
        self.frames_without_step
    }

    /// Steps run by the most recent frame that ran any.
    pub fn steps_last_frame(&self) -> u32 {
        self.steps_last_frame
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
        self.frames_without_step = 0;
        self.steps_last_frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_frames_stall() {
        let mut scheduler = FixedStepScheduler::new(true, 60);
        assert_eq!(scheduler.advance(0.005), 0);
        assert_eq!(scheduler.advance(0.005), 0);
        assert_eq!(scheduler.frames_without_step(), 2);
        assert_eq!(scheduler.advance(0.01), 1);
        assert_eq!(scheduler.frames_without_step(), 0);
        assert_eq!(scheduler.steps_last_frame(), 1);
    }

    #[test]
    fn long_frame_runs_several_steps() {
        let mut scheduler = FixedStepScheduler::new(true, 60);
        assert_eq!(scheduler.advance(3.5 / 60.0), 3);
        assert!((scheduler.accumulated() - 0.5 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn chunking_does_not_change_step_count() {
        let chunkings: [&[f64]; 3] = [
            &[1.0 / 60.0; 10],
            &[10.0 / 60.0],
            &[3.0 / 60.0, 0.5 / 60.0, 4.5 / 60.0, 2.0 / 60.0],
        ];
        for deltas in chunkings {
            let mut scheduler = FixedStepScheduler::new(true, 60);
            let total: u32 = deltas.iter().map(|&delta| scheduler.advance(delta)).sum();
            assert_eq!(total, 10, "deltas {deltas:?}");
        }
    }

    #[test]
    fn invalid_deltas_are_ignored() {
        let mut scheduler = FixedStepScheduler::new(true, 60);
        scheduler.advance(0.5 / 60.0);
        assert_eq!(scheduler.advance(f64::NAN), 0);
        assert_eq!(scheduler.advance(f64::INFINITY), 0);
        assert_eq!(scheduler.advance(-1.0), 0);
        assert!((scheduler.accumulated() - 0.5 / 60.0).abs() < 1e-12);
        assert_eq!(scheduler.advance(2.5 / 60.0), 3);
    }

    #[test]
    fn changing_rate_changes_step() {
        let mut scheduler = FixedStepScheduler::new(true, 60);
        scheduler.advance(0.01);
        scheduler.set_fixed_fps(30);
        assert_eq!(scheduler.accumulated(), 0.0);
        assert!((scheduler.step() - 1.0 / 30.0).abs() < 1e-12);
        assert_eq!(scheduler.advance(1.0), 30);
    }

    #[test]
    fn toggling_discards_accumulated_time() {
        let mut scheduler = FixedStepScheduler::new(true, 60);
        scheduler.advance(0.01);
        scheduler.set_enabled(false);
        assert_eq!(scheduler.accumulated(), 0.0);
        assert!(!scheduler.is_enabled());
    }
}
