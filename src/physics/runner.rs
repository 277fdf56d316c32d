//! Fixed-step runner
//!
//! Frame deltas are accumulated and drained in `PHYSICS_DT` steps, capped per
//! frame to prevent a spiral of death after a stall.

use super::world::World;
use crate::consts::{MAX_SUBSTEPS, PHYSICS_DT};

/// Longest frame delta the runner will try to catch up on
const MAX_FRAME_DELTA: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct Runner {
    step: f32,
    max_substeps: u32,
    accumulator: f32,
    steps: u64,
    running: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(PHYSICS_DT, MAX_SUBSTEPS)
    }
}

impl Runner {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step,
            max_substeps,
            accumulator: 0.0,
            steps: 0,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Total fixed steps taken
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Run as many fixed steps as `dt` covers, returning the count
    pub fn advance(&mut self, world: &mut World, dt: f32) -> u32 {
        if !self.running {
            return 0;
        }
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DELTA);

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            world.step(self.step);
            self.accumulator -= self.step;
            substeps += 1;
        }
        // Drop the backlog rather than carry it into the next frame
        if substeps == self.max_substeps {
            self.accumulator = self.accumulator.min(self.step);
        }
        self.steps += u64::from(substeps);
        substeps
    }

    /// Halt stepping and drop any accumulated time
    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_accumulates_partial_frames() {
        let mut world = World::new(Vec2::ZERO);
        let mut runner = Runner::new(0.01, 8);
        assert_eq!(runner.advance(&mut world, 0.004), 0);
        assert_eq!(runner.advance(&mut world, 0.004), 0);
        assert_eq!(runner.advance(&mut world, 0.004), 1);
        assert_eq!(runner.advance(&mut world, 0.025), 2);
        assert_eq!(runner.steps(), 3);
    }

    #[test]
    fn test_long_stall_is_capped() {
        let mut world = World::new(Vec2::new(0.0, 100.0));
        let mut runner = Runner::new(0.01, 4);
        assert_eq!(runner.advance(&mut world, 5.0), 4);
        // Backlog is not carried forward
        assert_eq!(runner.advance(&mut world, 0.005), 1);
    }

    #[test]
    fn test_stopped_runner_does_not_step() {
        let mut world = World::new(Vec2::new(0.0, 100.0));
        let id = world.add_rectangle(Vec2::ZERO, Vec2::splat(10.0), Default::default());
        let mut runner = Runner::default();
        runner.stop();
        assert_eq!(runner.advance(&mut world, 0.5), 0);
        assert_eq!(world.body(id).unwrap().position, Vec2::ZERO);
        assert!(!runner.is_running());
    }
}
