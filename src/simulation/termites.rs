use std::collections::VecDeque;
use std::f64::consts::TAU;

use rand::Rng;

use crate::colour::Rgb;
use crate::config::{
    AGENT_GLOW_CELLS, DEFAULT_CHIP_DENSITY, DEFAULT_TERMITE_COUNT, DEFAULT_TERMITE_STEP,
    DEFAULT_TRAIL_LENGTH, DEFAULT_TURN_PROBABILITY, MAX_AGENTS, MAX_TRAIL_LENGTH,
    MAX_WANDER_ANGLE,
};
use crate::error::SimulationError;
use crate::simulation::engine::Engine;
use crate::simulation::grid::Grid;
use crate::simulation::life::data_name;
use crate::simulation::{Simulation, StateData};
use crate::surface::Shadow;

/// Position a termite occupied `age` ticks ago.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub x: f64,
    pub y: f64,
    pub age: u32,
}

/// A wandering agent that picks up and drops wood chips.
#[derive(Clone, Debug, PartialEq)]
pub struct Termite {
    /// Surface-local pixel position
    pub x: f64,
    pub y: f64,
    /// Heading in radians, screen coordinates
    pub angle: f64,
    pub carrying: bool,
    /// Oldest sample first
    pub trail: VecDeque<TrailPoint>,
    /// Cell of the last interaction; a termite only acts on entering a new cell
    last_cell: Option<(usize, usize)>,
}

impl Termite {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self {
            x,
            y,
            angle,
            carrying: false,
            trail: VecDeque::new(),
            last_cell: None,
        }
    }

    fn record_trail(&mut self, limit: usize) {
        for point in &mut self.trail {
            point.age += 1;
        }
        if limit == 0 {
            self.trail.clear();
            return;
        }
        self.trail.push_back(TrailPoint {
            x: self.x,
            y: self.y,
            age: 0,
        });
        while self.trail.len() > limit {
            self.trail.pop_front();
        }
    }
}

/// Stigmergic chip sorting: termites wander the surface, pick up a chip when
/// they walk onto one empty-handed and drop it on the next empty cell. Piles
/// emerge without the termites ever interacting directly.
pub struct TermiteSimulation {
    engine: Engine,
    chips: Grid,
    termites: Vec<Termite>,
    /// Population restored by `seed`
    target_count: usize,
    chip_density: f64,
    /// Stride as a fraction of the cell size
    step_fraction: f64,
    turn_probability: f64,
    trail_length: usize,
}

impl TermiteSimulation {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            chips: Grid::new(0, 0),
            termites: Vec::new(),
            target_count: DEFAULT_TERMITE_COUNT,
            chip_density: DEFAULT_CHIP_DENSITY,
            step_fraction: DEFAULT_TERMITE_STEP,
            turn_probability: DEFAULT_TURN_PROBABILITY,
            trail_length: DEFAULT_TRAIL_LENGTH,
        }
    }

    pub fn chips(&self) -> &Grid {
        &self.chips
    }

    pub fn termites(&self) -> &[Termite] {
        &self.termites
    }

    /// Grow with random termites or truncate from the end
    pub fn set_termite_count(&mut self, count: usize) {
        let count = count.min(MAX_AGENTS);
        while self.termites.len() < count {
            let termite = self.random_termite();
            self.termites.push(termite);
        }
        while self.termites.len() > count {
            if let Some(termite) = self.termites.pop() {
                self.release(&termite);
            }
        }
        self.target_count = count;
    }

    /// A removed termite puts its chip down if the cell under it is free
    fn release(&mut self, termite: &Termite) {
        if !termite.carrying {
            return;
        }
        let (row, col) = self.engine.layout().clamped_cell(termite.x, termite.y);
        if !self.chips.get(row, col) {
            self.chips.set(row, col, true);
            self.engine.ledger_mut().light(row, col);
        }
    }

    fn random_termite(&mut self) -> Termite {
        let width = self.engine.surface().width().max(1) as f64;
        let height = self.engine.surface().height().max(1) as f64;
        let rng = self.engine.rng();
        Termite::new(
            rng.gen_range(0.0..width),
            rng.gen_range(0.0..height),
            rng.gen_range(0.0..TAU),
        )
    }

    /// Move one termite and apply the pick-up/drop rule
    fn advance(&mut self, index: usize) -> Result<(), SimulationError> {
        let width = self.engine.surface().width() as f64;
        let height = self.engine.surface().height() as f64;
        let layout = self.engine.layout();
        let stride = self.step_fraction * layout.cell_size as f64;
        let trail_length = self.trail_length;

        let wander = if self.engine.rng().gen_bool(self.turn_probability) {
            self.engine
                .rng()
                .gen_range(-MAX_WANDER_ANGLE..=MAX_WANDER_ANGLE)
        } else {
            0.0
        };

        let termite = &mut self.termites[index];
        termite.record_trail(trail_length);
        termite.x = (termite.x + termite.angle.cos() * stride).rem_euclid(width);
        termite.y = (termite.y + termite.angle.sin() * stride).rem_euclid(height);

        if !termite.x.is_finite() || !termite.y.is_finite() {
            return Err(SimulationError::AgentLost {
                index,
                x: termite.x,
                y: termite.y,
            });
        }

        let cell = layout.clamped_cell(termite.x, termite.y);
        if termite.last_cell != Some(cell) {
            let (row, col) = cell;
            match (termite.carrying, self.chips.get(row, col)) {
                (true, false) => {
                    self.chips.set(row, col, true);
                    termite.carrying = false;
                }
                (false, true) => {
                    self.chips.set(row, col, false);
                    termite.carrying = true;
                }
                _ => {}
            }
            termite.last_cell = Some(cell);
        }

        termite.angle = (termite.angle + wander).rem_euclid(TAU);
        Ok(())
    }
}

impl Simulation for TermiteSimulation {
    fn name(&self) -> &'static str {
        "termites"
    }

    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    fn rebuild(&mut self) {
        let layout = self.engine.layout();
        self.chips = self.chips.resized(layout.rows, layout.cols);

        let width = self.engine.surface().width() as f64;
        let height = self.engine.surface().height() as f64;
        for termite in &mut self.termites {
            termite.x = termite.x.rem_euclid(width);
            termite.y = termite.y.rem_euclid(height);
            termite.trail.clear();
            termite.last_cell = None;
        }
    }

    fn seed(&mut self) {
        let layout = self.engine.layout();
        self.chips = Grid::random(layout.rows, layout.cols, self.chip_density, self.engine.rng());
        self.engine.ledger_mut().seed(&self.chips);

        self.termites.clear();
        let count = self.target_count;
        self.set_termite_count(count);
    }

    fn clear_state(&mut self) {
        self.chips.clear();
        for termite in &mut self.termites {
            termite.carrying = false;
            termite.trail.clear();
            termite.last_cell = None;
        }
    }

    fn step(&mut self) {
        for index in 0..self.termites.len() {
            if let Err(error) = self.advance(index) {
                self.engine.report("termite step", &error);
                let fresh = self.random_termite();
                self.termites[index] = fresh;
            }
        }
        self.engine.ledger_mut().relight(&self.chips);
    }

    fn render(&mut self, now_ms: f64) {
        self.engine.paint_cells(&self.chips, now_ms);

        let cell = self.engine.layout().cell_size as f64;
        let radius = (cell * 0.6).max(1.5);
        let glow = cell * AGENT_GLOW_CELLS;
        let show_heading = self.engine.settings().show_direction_indicator;
        let trail_span = self.trail_length.max(1) as f32;

        for termite in &self.termites {
            let colour = self.engine.colour_at(termite.x, termite.y, now_ms);
            let surface = self.engine.surface_mut();

            for point in &termite.trail {
                let fade = 1.0 - (point.age as f32 + 1.0) / (trail_span + 1.0);
                surface.fill_circle(point.x, point.y, radius * 0.4, colour.scale(fade * 0.6));
            }

            surface.set_shadow(Some(Shadow { colour, blur: glow }));
            surface.fill_circle(termite.x, termite.y, radius, colour.mix(Rgb::WHITE, 0.5));
            surface.set_shadow(None);

            if termite.carrying {
                surface.fill_circle(termite.x, termite.y, radius * 0.5, colour);
            }
            if show_heading {
                let reach = radius * 2.0;
                surface.stroke_line(
                    termite.x,
                    termite.y,
                    termite.x + termite.angle.cos() * reach,
                    termite.y + termite.angle.sin() * reach,
                    1.0,
                    Rgb::WHITE,
                );
            }
        }
    }

    fn toggle_cell(&mut self, row: usize, col: usize) {
        if row >= self.chips.rows() || col >= self.chips.cols() {
            return;
        }
        let active = self.chips.toggle(row, col);
        self.engine.ledger_mut().reconcile(row, col, active);
    }

    fn live_cells(&self) -> usize {
        self.chips.live_count()
    }

    fn capture_state(&self) -> StateData {
        StateData::Termites {
            chips: self.chips.clone(),
            termites: self.termites.clone(),
        }
    }

    fn restore_state(&mut self, data: StateData, surface: (u32, u32)) -> Result<(), SimulationError> {
        let (chips, termites) = match data {
            StateData::Termites { chips, termites } => (chips, termites),
            other => {
                return Err(SimulationError::StateMismatch {
                    expected: "termites",
                    found: data_name(&other),
                })
            }
        };

        self.chips.clear();
        self.chips.transplant(&chips);

        let width = self.engine.surface().width() as f64;
        let height = self.engine.surface().height() as f64;
        let scale_x = if surface.0 > 0 { width / surface.0 as f64 } else { 1.0 };
        let scale_y = if surface.1 > 0 { height / surface.1 as f64 } else { 1.0 };

        self.termites = termites
            .into_iter()
            .map(|mut termite| {
                termite.x = (termite.x * scale_x).rem_euclid(width);
                termite.y = (termite.y * scale_y).rem_euclid(height);
                termite.trail.clear();
                termite.last_cell = None;
                termite
            })
            .collect();
        self.target_count = self.termites.len();
        Ok(())
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<(), SimulationError> {
        let invalid = || SimulationError::InvalidParameter {
            name: name.to_string(),
            value,
        };
        match name {
            "step_length" => {
                if !(value > 0.0 && value <= 1.0) {
                    return Err(invalid());
                }
                self.step_fraction = value;
            }
            "turn_probability" => {
                if !(0.0..=1.0).contains(&value) {
                    return Err(invalid());
                }
                self.turn_probability = value;
            }
            "trail_length" => {
                if !(0.0..=MAX_TRAIL_LENGTH as f64).contains(&value) {
                    return Err(invalid());
                }
                self.trail_length = value as usize;
                for termite in &mut self.termites {
                    while termite.trail.len() > self.trail_length {
                        termite.trail.pop_front();
                    }
                }
            }
            "chip_density" => {
                if !(0.0..=1.0).contains(&value) {
                    return Err(invalid());
                }
                self.chip_density = value;
            }
            _ => {
                return Err(SimulationError::UnknownParameter {
                    simulation: self.name(),
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn agent_count(&self) -> usize {
        self.termites.len()
    }

    fn set_agent_count(&mut self, count: usize) -> Result<(), SimulationError> {
        self.set_termite_count(count);
        Ok(())
    }

    fn add_actor_at(&mut self, x: f64, y: f64) -> Result<(), SimulationError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(SimulationError::AgentLost {
                index: self.termites.len(),
                x,
                y,
            });
        }
        if self.termites.len() >= MAX_AGENTS {
            return Err(SimulationError::InvalidParameter {
                name: "termite_count".to_string(),
                value: (self.termites.len() + 1) as f64,
            });
        }
        let width = self.engine.surface().width().max(1) as f64;
        let height = self.engine.surface().height().max(1) as f64;
        let angle = self.engine.rng().gen_range(0.0..TAU);
        self.termites
            .push(Termite::new(x.rem_euclid(width), y.rem_euclid(height), angle));
        self.target_count = self.termites.len();
        Ok(())
    }
}
