use crate::config::DEFAULT_LIFE_DENSITY;
use crate::error::SimulationError;
use crate::simulation::engine::Engine;
use crate::simulation::grid::Grid;
use crate::simulation::{Simulation, StateData};

/// Conway's Game of Life (B3/S23) on a toroidal grid.
pub struct LifeSimulation {
    engine: Engine,
    /// Double buffer: `next` is scratch space for the transition
    current: Grid,
    next: Grid,
    density: f64,
}

impl LifeSimulation {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            current: Grid::new(0, 0),
            next: Grid::new(0, 0),
            density: DEFAULT_LIFE_DENSITY,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.current
    }

    /// Reseed with independent draws per cell; restarts at generation 0
    pub fn randomize(&mut self, density: f64) {
        self.current.randomize(density, self.engine.rng());
        self.engine.set_generation(0);
        self.engine.ledger_mut().seed(&self.current);
        self.refresh_count();
    }

    /// Replace the board with `pattern`, placed at the top-left corner and
    /// cropped to the current grid
    pub fn load_grid(&mut self, pattern: &Grid) {
        self.current.clear();
        self.current.transplant(pattern);
        self.engine.set_generation(0);
        self.engine.ledger_mut().seed(&self.current);
        self.refresh_count();
    }

    /// B3/S23
    fn next_state(alive: bool, neighbours: u8) -> bool {
        matches!((alive, neighbours), (true, 2) | (true, 3) | (false, 3))
    }
}

impl Simulation for LifeSimulation {
    fn name(&self) -> &'static str {
        "life"
    }

    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    fn rebuild(&mut self) {
        let layout = self.engine.layout();
        self.current = self.current.resized(layout.rows, layout.cols);
        self.next = Grid::new(layout.rows, layout.cols);
    }

    fn seed(&mut self) {
        self.randomize(self.density);
    }

    fn clear_state(&mut self) {
        self.current.clear();
        self.next.clear();
    }

    fn step(&mut self) {
        for row in 0..self.current.rows() {
            for col in 0..self.current.cols() {
                let alive = self.current.get(row, col);
                let neighbours = self.current.live_neighbours(row, col);
                self.next.set(row, col, Self::next_state(alive, neighbours));
            }
        }
        std::mem::swap(&mut self.current, &mut self.next);
        self.engine.ledger_mut().relight(&self.current);
    }

    fn render(&mut self, now_ms: f64) {
        self.engine.paint_cells(&self.current, now_ms);
    }

    fn toggle_cell(&mut self, row: usize, col: usize) {
        if row >= self.current.rows() || col >= self.current.cols() {
            return;
        }
        let active = self.current.toggle(row, col);
        self.engine.ledger_mut().reconcile(row, col, active);
    }

    fn live_cells(&self) -> usize {
        self.current.live_count()
    }

    fn capture_state(&self) -> StateData {
        StateData::Life {
            grid: self.current.clone(),
        }
    }

    fn restore_state(&mut self, data: StateData, _surface: (u32, u32)) -> Result<(), SimulationError> {
        let grid = match data {
            StateData::Life { grid } => grid,
            other => {
                return Err(SimulationError::StateMismatch {
                    expected: "life",
                    found: data_name(&other),
                })
            }
        };
        self.current.clear();
        self.current.transplant(&grid);
        Ok(())
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<(), SimulationError> {
        match name {
            "density" if (0.0..=1.0).contains(&value) => {
                self.density = value;
                Ok(())
            }
            "density" => Err(SimulationError::InvalidParameter {
                name: name.to_string(),
                value,
            }),
            _ => Err(SimulationError::UnknownParameter {
                simulation: self.name(),
                name: name.to_string(),
            }),
        }
    }
}

/// Identifier of the simulation a payload came from
pub(crate) fn data_name(data: &StateData) -> &'static str {
    match data {
        StateData::Life { .. } => "life",
        StateData::Termites { .. } => "termites",
        StateData::Ant { .. } => "ant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn life() -> LifeSimulation {
        let mut sim = LifeSimulation::new(Engine::with_seed(200, 100, 42));
        sim.init();
        sim.clear();
        sim
    }

    #[test]
    fn test_layout_after_init() {
        let sim = life();
        assert_eq!(sim.grid().rows(), 100);
        assert_eq!(sim.grid().cols(), 200);
        assert_eq!(sim.get_stats().cell_count, 0);
    }

    #[test]
    fn test_birth_and_death() {
        let mut sim = life();
        // Three live cells around (5, 5)
        sim.toggle_cell(4, 4);
        sim.toggle_cell(4, 6);
        sim.toggle_cell(6, 5);
        // A loner far away
        sim.toggle_cell(50, 50);
        sim.toggle_cell(50, 51);

        sim.update();
        assert!(sim.grid().get(5, 5), "dead cell with 3 neighbours is born");
        assert!(!sim.grid().get(50, 50), "live cell with 1 neighbour dies");
        assert!(!sim.grid().get(50, 51));
        assert_eq!(sim.get_stats().generation, 1);
    }

    #[test]
    fn test_blinker_wraps_top_edge() {
        let mut sim = life();
        let last = sim.grid().rows() - 1;
        // Vertical blinker centred on row 0, spilling onto the last row
        sim.toggle_cell(last, 10);
        sim.toggle_cell(0, 10);
        sim.toggle_cell(1, 10);

        sim.update();
        assert!(sim.grid().get(0, 9));
        assert!(sim.grid().get(0, 10));
        assert!(sim.grid().get(0, 11));
        assert_eq!(sim.get_stats().cell_count, 3);

        sim.update();
        assert!(sim.grid().get(last, 10));
        assert!(sim.grid().get(1, 10));
    }

    #[test]
    fn test_active_cells_fully_bright_after_update() {
        let mut sim = life();
        sim.randomize(0.3);
        sim.update();
        for row in 0..sim.grid().rows() {
            for col in 0..sim.grid().cols() {
                if sim.grid().get(row, col) {
                    assert_eq!(sim.cell_brightness(row, col), 1.0);
                }
            }
        }
    }

    #[test]
    fn test_toggle_off_fades_instead_of_snapping() {
        let mut sim = life();
        sim.toggle_cell(20, 20);
        assert_eq!(sim.cell_brightness(20, 20), 1.0);
        sim.toggle_cell(20, 20);
        assert!(!sim.grid().get(20, 20));
        assert_eq!(sim.cell_brightness(20, 20), 1.0);

        sim.update();
        assert!(sim.cell_brightness(20, 20) < 1.0);
    }

    #[test]
    fn test_randomize_resets_generation() {
        let mut sim = life();
        sim.update();
        sim.update();
        sim.randomize(0.5);
        assert_eq!(sim.get_stats().generation, 0);
        assert_eq!(sim.get_stats().cell_count, sim.grid().live_count());
        assert!(sim.grid().live_count() > 0);
    }

    #[test]
    fn test_load_grid_crops_pattern() {
        let mut sim = life();
        let mut glider = Grid::new(3, 3);
        for (r, c) in [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)] {
            glider.set(r, c, true);
        }
        sim.load_grid(&glider);
        assert_eq!(sim.get_stats().cell_count, 5);
        for _ in 0..4 {
            sim.update();
        }
        // A glider translates by (1, 1) every four generations
        assert!(sim.grid().get(1, 2));
        assert!(sim.grid().get(3, 3));
        assert_eq!(sim.grid().live_count(), 5);
    }

    #[test]
    fn test_density_param() {
        let mut sim = life();
        assert!(sim.set_param("density", 0.4).is_ok());
        assert!(matches!(
            sim.set_param("density", 4.0),
            Err(SimulationError::InvalidParameter { .. })
        ));
        assert!(matches!(
            sim.set_param("gravity", 1.0),
            Err(SimulationError::UnknownParameter { .. })
        ));
    }
}
