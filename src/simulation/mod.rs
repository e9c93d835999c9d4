//! Simulations and the contract they share.
//!
//! A simulation owns an [`Engine`] (surface, layout, clock, brightness ledger,
//! colours) plus its own grid and agents. Variants implement the rule-specific
//! hooks of [`Simulation`]; the public life-cycle (`init`, `update`, `draw`,
//! `resize_preserve_state`, pointer strokes, ...) comes from provided methods.

mod ant;
mod brightness;
mod engine;
mod grid;
mod life;
mod termites;

pub use ant::{Ant, AntSimulation, ArcPath, Direction, Turn, CLASSIC_RULE};
pub use brightness::BrightnessLedger;
pub use engine::{line_cells, Engine, Fps, FpsCounter, GridLayout};
pub use grid::Grid;
pub use life::LifeSimulation;
pub use termites::{Termite, TermiteSimulation, TrailPoint};

use crate::error::{LifecycleEvent, SimulationError};

/// Snapshot returned by [`Simulation::get_stats`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stats {
    pub generation: u64,
    pub cell_count: usize,
    pub fps: Fps,
}

/// Variant-specific payload of a [`SimState`].
#[derive(Clone, Debug, PartialEq)]
pub enum StateData {
    Life {
        grid: Grid,
    },
    Termites {
        chips: Grid,
        termites: Vec<Termite>,
    },
    Ant {
        grid: Grid,
        ants: Vec<Ant>,
        rule: [Turn; 2],
    },
}

/// In-memory capture of a simulation, used to carry it across a resize.
#[derive(Clone, Debug, PartialEq)]
pub struct SimState {
    pub simulation: &'static str,
    pub generation: u64,
    pub cell_count: usize,
    /// Surface size the captured layout was computed for
    pub surface: (u32, u32),
    pub data: StateData,
}

/// Contract between the host and a simulation variant.
///
/// The required methods are the variant's rule: how its grid is rebuilt, seeded
/// and cleared, one generation of its transition rule, its drawing, and how it
/// captures and restores its own state. Everything else is provided.
pub trait Simulation {
    /// Identifier accepted by [`create_simulation`]
    fn name(&self) -> &'static str;

    fn engine(&self) -> &Engine;

    fn engine_mut(&mut self) -> &mut Engine;

    /// Recreate grids for the engine's current layout, keeping what overlaps
    fn rebuild(&mut self);

    /// Populate a fresh initial state
    fn seed(&mut self);

    /// Empty the world
    fn clear_state(&mut self);

    /// Apply the transition rule for one generation. Runs after the ledger
    /// decayed and the generation counter advanced; must relight active cells.
    fn step(&mut self);

    /// Paint the current state
    fn render(&mut self, now_ms: f64);

    /// Flip one grid cell and reconcile its brightness
    fn toggle_cell(&mut self, row: usize, col: usize);

    fn live_cells(&self) -> usize;

    fn capture_state(&self) -> StateData;

    fn restore_state(&mut self, data: StateData, surface: (u32, u32)) -> Result<(), SimulationError>;

    /// Named tuning parameter
    fn set_param(&mut self, name: &str, _value: f64) -> Result<(), SimulationError> {
        Err(SimulationError::UnknownParameter {
            simulation: self.name(),
            name: name.to_string(),
        })
    }

    fn agent_count(&self) -> usize {
        0
    }

    fn set_agent_count(&mut self, _count: usize) -> Result<(), SimulationError> {
        Err(SimulationError::Unsupported {
            simulation: self.name(),
            operation: "agents",
        })
    }

    /// Add one agent at a surface-local point
    fn add_actor_at(&mut self, _x: f64, _y: f64) -> Result<(), SimulationError> {
        Err(SimulationError::Unsupported {
            simulation: self.name(),
            operation: "agents",
        })
    }

    // ============================================
    // Life-cycle
    // ============================================

    fn init(&mut self) {
        self.resize();
        self.engine_mut().ledger_mut().clear();
        self.engine_mut().set_generation(0);
        self.seed();
        self.refresh_count();
        log::info!(
            "Initialized {} on a {}x{} grid",
            self.name(),
            self.engine().layout().cols,
            self.engine().layout().rows
        );
        self.engine_mut().notify(LifecycleEvent::Initialized);
    }

    /// Recompute the layout from the current surface size and rebuild grids
    fn resize(&mut self) {
        self.engine_mut().resize();
        self.rebuild();
    }

    /// Set a new surface size, then [`resize`](Self::resize)
    fn resize_to(&mut self, width: u32, height: u32) {
        self.engine_mut().surface_mut().set_size(width, height);
        self.resize();
    }

    /// Capture, resize, restore
    fn resize_preserve_state(&mut self) {
        let state = self.get_state();
        self.resize();
        self.set_state(state);
    }

    fn start(&mut self) {
        if !self.engine().is_running() {
            self.engine_mut().set_running(true);
            log::info!("{} started", self.name());
            self.engine_mut().notify(LifecycleEvent::Started);
        }
    }

    fn pause(&mut self) {
        if self.engine().is_running() {
            self.engine_mut().set_running(false);
            log::info!("{} paused", self.name());
            self.engine_mut().notify(LifecycleEvent::Paused);
        }
    }

    fn is_running(&self) -> bool {
        self.engine().is_running()
    }

    fn reset(&mut self) {
        self.engine_mut().ledger_mut().clear();
        self.engine_mut().set_generation(0);
        self.seed();
        self.refresh_count();
        log::info!("{} reset", self.name());
        self.engine_mut().notify(LifecycleEvent::Reset);
    }

    fn clear(&mut self) {
        self.engine_mut().ledger_mut().clear();
        self.engine_mut().set_generation(0);
        self.clear_state();
        self.refresh_count();
        log::info!("{} cleared", self.name());
        self.engine_mut().notify(LifecycleEvent::Cleared);
    }

    /// Advance one generation
    fn update(&mut self) {
        self.engine_mut().begin_generation();
        self.step();
        self.refresh_count();
        let generation = self.engine().generation();
        self.engine_mut().notify(LifecycleEvent::Generation(generation));
    }

    /// Paint a frame and count it
    fn draw(&mut self, now_ms: f64) {
        self.render(now_ms);
        self.engine_mut().record_frame(now_ms);
    }

    fn refresh_count(&mut self) {
        let live = self.live_cells();
        self.engine_mut().set_cell_count(live);
    }

    fn get_stats(&self) -> Stats {
        let engine = self.engine();
        Stats {
            generation: engine.generation(),
            cell_count: engine.cell_count(),
            fps: engine.fps(),
        }
    }

    // ============================================
    // Configuration
    // ============================================

    /// Steps per second, clamped to [1, 60]
    fn set_speed(&mut self, steps_per_second: u32) -> u32 {
        self.engine_mut().set_speed(steps_per_second)
    }

    fn set_brightness(&mut self, brightness: f32) -> f32 {
        self.engine_mut().set_brightness(brightness)
    }

    fn set_fade_out_cycles(&mut self, cycles: u32) -> u32 {
        self.engine_mut().ledger_mut().set_fade_out_cycles(cycles)
    }

    fn set_fade_decrement(&mut self, decrement: f32) -> f32 {
        self.engine_mut().ledger_mut().set_decrement(decrement)
    }

    fn set_show_direction_indicator(&mut self, show: bool) {
        self.engine_mut().set_show_direction_indicator(show);
    }

    /// Brightness of a cell in [0, 1]; 0 for cells never lit
    fn cell_brightness(&self, row: usize, col: usize) -> f32 {
        self.engine().ledger().brightness(row, col)
    }

    // ============================================
    // State capture
    // ============================================

    fn get_state(&self) -> SimState {
        let engine = self.engine();
        SimState {
            simulation: self.name(),
            generation: engine.generation(),
            cell_count: engine.cell_count(),
            surface: engine.layout_surface(),
            data: self.capture_state(),
        }
    }

    /// Restore a capture; counters are always restored, and a payload that
    /// cannot be applied is reported rather than raised
    fn set_state(&mut self, state: SimState) {
        if let Err(error) = self.restore_state(state.data, state.surface) {
            self.engine().report("restoring state", &error);
        }
        let engine = self.engine_mut();
        engine.set_generation(state.generation);
        engine.set_cell_count(state.cell_count);
    }

    // ============================================
    // Pointer input
    // ============================================

    /// Toggle the cell under a surface-local point
    fn toggle_at(&mut self, x: f64, y: f64) {
        if let Some((row, col)) = self.engine().layout().cell_at(x, y) {
            self.toggle_cell(row, col);
            self.refresh_count();
        }
    }

    fn handle_mouse_down(&mut self, x: f64, y: f64) {
        if let Some((row, col)) = self.engine_mut().begin_stroke(x, y) {
            self.toggle_cell(row, col);
            self.refresh_count();
        }
    }

    fn handle_mouse_move(&mut self, x: f64, y: f64) {
        let cells = self.engine_mut().continue_stroke(x, y);
        if cells.is_empty() {
            return;
        }
        for (row, col) in cells {
            self.toggle_cell(row, col);
        }
        self.refresh_count();
    }

    fn handle_mouse_up(&mut self) {
        self.engine_mut().end_stroke();
    }
}

/// Identifiers accepted by [`create_simulation`]
pub const SIMULATIONS: [&str; 3] = ["life", "termites", "ant"];

/// Build a simulation by identifier; unknown identifiers are an error
pub fn create_simulation(
    id: &str,
    engine: Engine,
) -> Result<Box<dyn Simulation>, SimulationError> {
    match id.trim().to_ascii_lowercase().as_str() {
        "life" | "game-of-life" | "conway" => Ok(Box::new(LifeSimulation::new(engine))),
        "termites" | "termite" | "sorter" => Ok(Box::new(TermiteSimulation::new(engine))),
        "ant" | "langton" | "langtons-ant" => Ok(Box::new(AntSimulation::new(engine))),
        _ => Err(SimulationError::UnknownSimulation(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_builds_every_variant() {
        for id in SIMULATIONS {
            let sim = create_simulation(id, Engine::with_seed(200, 100, 1)).unwrap();
            assert_eq!(sim.name(), id);
        }
        let sim = create_simulation(" Langton ", Engine::with_seed(200, 100, 1)).unwrap();
        assert_eq!(sim.name(), "ant");
    }

    #[test]
    fn test_selector_rejects_unknown() {
        let err = create_simulation("boids", Engine::with_seed(200, 100, 1)).err();
        assert_eq!(err, Some(SimulationError::UnknownSimulation("boids".into())));
    }
}
