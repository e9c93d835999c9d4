//! Frame scheduler.
//!
//! The host calls [`Scheduler::tick`] once per animation frame. A tick steps
//! the simulation when it is running and a full update interval has passed,
//! then always draws so agents keep moving between updates.

use crate::simulation::Simulation;

/// What a single tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Scheduler is stopped; nothing ran
    Skipped,
    /// Frame drawn without advancing the simulation
    Drawn,
    /// Simulation advanced one generation, then the frame was drawn
    Stepped,
}

#[derive(Debug)]
pub struct Scheduler {
    active: bool,
    frames: u64,
    steps: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            active: true,
            frames: 0,
            steps: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop scheduling further ticks. A tick already in progress finishes.
    pub fn stop(&mut self) {
        if self.active {
            log::debug!("Scheduler stopped after {} frames", self.frames);
        }
        self.active = false;
    }

    pub fn resume(&mut self) {
        self.active = true;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Run one frame against `sim` at host time `now_ms`
    pub fn tick(&mut self, sim: &mut dyn Simulation, now_ms: f64) -> Tick {
        if !self.active {
            return Tick::Skipped;
        }

        let engine = sim.engine();
        let due = now_ms - engine.last_update_ms() >= engine.update_interval();
        let stepped = sim.is_running() && due;
        if stepped {
            sim.update();
            sim.engine_mut().mark_updated(now_ms);
            self.steps += 1;
        }

        sim.draw(now_ms);
        self.frames += 1;

        if stepped {
            Tick::Stepped
        } else {
            Tick::Drawn
        }
    }
}
