use std::f64::consts::{FRAC_PI_2, PI};

use rand::Rng;

use crate::colour::Rgb;
use crate::config::{AGENT_GLOW_CELLS, DEFAULT_ANT_COUNT, MAX_AGENTS};
use crate::error::SimulationError;
use crate::simulation::engine::Engine;
use crate::simulation::grid::Grid;
use crate::simulation::life::data_name;
use crate::simulation::{Simulation, StateData};
use crate::surface::Shadow;

/// Facing on the grid, clockwise from up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    pub fn turned(self, turn: Turn) -> Self {
        match turn {
            Turn::Right => Self::from_index(self.index() + 1),
            Turn::Left => Self::from_index(self.index() + 3),
        }
    }

    /// (row, col) step
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
        }
    }

    /// Screen-space angle in radians (y grows downwards)
    pub fn angle(self) -> f64 {
        match self {
            Direction::Up => -FRAC_PI_2,
            Direction::Right => 0.0,
            Direction::Down => FRAC_PI_2,
            Direction::Left => PI,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    /// Arc sweep on screen for this turn
    fn sweep(self) -> f64 {
        match self {
            Turn::Right => -FRAC_PI_2,
            Turn::Left => FRAC_PI_2,
        }
    }
}

/// Turn taken on an inactive cell, then on an active one
pub const CLASSIC_RULE: [Turn; 2] = [Turn::Right, Turn::Left];

/// Quarter circle an ant follows across the cell it just left: from the
/// midpoint of the edge it entered by to the midpoint of the edge it exits by.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcPath {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub start: f64,
    pub end: f64,
}

impl ArcPath {
    fn angle_at(&self, t: f64) -> f64 {
        self.start + (self.end - self.start) * t.clamp(0.0, 1.0)
    }

    pub fn point_at(&self, t: f64) -> (f64, f64) {
        let theta = self.angle_at(t);
        (
            self.cx + self.radius * theta.cos(),
            self.cy + self.radius * theta.sin(),
        )
    }

    /// Direction of travel along the arc at `t`
    pub fn heading_at(&self, t: f64) -> f64 {
        let theta = self.angle_at(t);
        let sign = (self.end - self.start).signum();
        (theta.cos() * sign).atan2(-theta.sin() * sign)
    }
}

/// An ant on a grid cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Ant {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    /// Arc traced by the last move, for drawing between updates
    pub path: Option<ArcPath>,
}

impl Ant {
    pub fn new(row: usize, col: usize, direction: Direction) -> Self {
        Self {
            row,
            col,
            direction,
            path: None,
        }
    }
}

/// Langton's ant: on each step an ant turns according to the state of the
/// cell under it, flips that cell, and moves forward one cell.
pub struct AntSimulation {
    engine: Engine,
    grid: Grid,
    ants: Vec<Ant>,
    /// Indexed by the cell state before the flip
    rule: [Turn; 2],
    target_count: usize,
}

impl AntSimulation {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            grid: Grid::new(0, 0),
            ants: Vec::new(),
            rule: CLASSIC_RULE,
            target_count: DEFAULT_ANT_COUNT,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ants(&self) -> &[Ant] {
        &self.ants
    }

    pub fn rule(&self) -> [Turn; 2] {
        self.rule
    }

    pub fn set_rule(&mut self, rule: [Turn; 2]) {
        self.rule = rule;
    }

    /// Grow with randomly placed ants or truncate from the end
    pub fn set_ant_count(&mut self, count: usize) {
        let count = count.min(MAX_AGENTS);
        while self.ants.len() < count {
            let ant = self.random_ant();
            self.ants.push(ant);
        }
        self.ants.truncate(count);
        self.target_count = count;
    }

    fn random_ant(&mut self) -> Ant {
        let rows = self.grid.rows().max(1);
        let cols = self.grid.cols().max(1);
        let rng = self.engine.rng();
        Ant::new(
            rng.gen_range(0..rows),
            rng.gen_range(0..cols),
            Direction::from_index(rng.gen_range(0..4)),
        )
    }

    fn centre_ant(&self) -> Ant {
        Ant::new(self.grid.rows() / 2, self.grid.cols() / 2, Direction::Up)
    }

    /// Turn, flip and move one ant
    fn advance(&mut self, index: usize) -> Result<(), SimulationError> {
        let layout = self.engine.layout();
        let ant = &mut self.ants[index];

        if ant.row >= self.grid.rows() || ant.col >= self.grid.cols() {
            let lost = SimulationError::AgentLost {
                index,
                x: ant.col as f64,
                y: ant.row as f64,
            };
            if self.grid.is_empty() {
                return Err(lost);
            }
            let (row, col) = self.grid.wrap(ant.row as isize, ant.col as isize);
            ant.row = row;
            ant.col = col;
            self.engine.report("ant step", &lost);
        }

        let state = self.grid.get(ant.row, ant.col);
        let turn = self.rule[state as usize];

        let (cx, cy) = layout.cell_centre(ant.row, ant.col);
        let start = ant.direction.angle() + PI;
        ant.path = Some(ArcPath {
            cx,
            cy,
            radius: layout.cell_size as f64 / 2.0,
            start,
            end: start + turn.sweep(),
        });

        self.grid.toggle(ant.row, ant.col);
        ant.direction = ant.direction.turned(turn);
        let (dr, dc) = ant.direction.offset();
        let (row, col) = self
            .grid
            .wrap(ant.row as isize + dr, ant.col as isize + dc);
        ant.row = row;
        ant.col = col;
        Ok(())
    }
}

impl Simulation for AntSimulation {
    fn name(&self) -> &'static str {
        "ant"
    }

    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    fn rebuild(&mut self) {
        let layout = self.engine.layout();
        self.grid = self.grid.resized(layout.rows, layout.cols);
        if self.grid.is_empty() {
            return;
        }
        for ant in &mut self.ants {
            let (row, col) = self.grid.wrap(ant.row as isize, ant.col as isize);
            ant.row = row;
            ant.col = col;
            ant.path = None;
        }
    }

    fn seed(&mut self) {
        self.grid.clear();
        self.engine.ledger_mut().seed(&self.grid);

        self.ants.clear();
        if self.target_count > 0 {
            let first = self.centre_ant();
            self.ants.push(first);
        }
        let count = self.target_count;
        self.set_ant_count(count);
    }

    fn clear_state(&mut self) {
        self.grid.clear();
        for ant in &mut self.ants {
            ant.path = None;
        }
    }

    fn step(&mut self) {
        for index in 0..self.ants.len() {
            if let Err(error) = self.advance(index) {
                self.engine.report("ant step", &error);
            }
        }
        self.engine.ledger_mut().relight(&self.grid);
    }

    fn render(&mut self, now_ms: f64) {
        self.engine.paint_cells(&self.grid, now_ms);

        let layout = self.engine.layout();
        let cell = layout.cell_size as f64;
        let radius = (cell * 0.45).max(1.5);
        let glow = cell * AGENT_GLOW_CELLS;
        let show_heading = self.engine.settings().show_direction_indicator;
        let fraction = self.engine.update_fraction(now_ms);

        for ant in &self.ants {
            let (x, y, heading) = match ant.path {
                Some(path) => {
                    let (x, y) = path.point_at(fraction);
                    (x, y, path.heading_at(fraction))
                }
                None => {
                    let (x, y) = layout.cell_centre(ant.row, ant.col);
                    (x, y, ant.direction.angle())
                }
            };

            let colour = self.engine.colour_at(x, y, now_ms);
            let surface = self.engine.surface_mut();
            surface.set_shadow(Some(Shadow { colour, blur: glow }));
            surface.fill_circle(x, y, radius, colour.mix(Rgb::WHITE, 0.6));
            surface.set_shadow(None);

            if show_heading {
                let reach = radius * 1.8;
                surface.stroke_line(
                    x,
                    y,
                    x + heading.cos() * reach,
                    y + heading.sin() * reach,
                    1.0,
                    Rgb::WHITE,
                );
            }
        }
    }

    fn toggle_cell(&mut self, row: usize, col: usize) {
        if row >= self.grid.rows() || col >= self.grid.cols() {
            return;
        }
        let active = self.grid.toggle(row, col);
        self.engine.ledger_mut().reconcile(row, col, active);
    }

    fn live_cells(&self) -> usize {
        self.grid.live_count()
    }

    fn capture_state(&self) -> StateData {
        StateData::Ant {
            grid: self.grid.clone(),
            ants: self.ants.clone(),
            rule: self.rule,
        }
    }

    fn restore_state(&mut self, data: StateData, _surface: (u32, u32)) -> Result<(), SimulationError> {
        let (grid, ants, rule) = match data {
            StateData::Ant { grid, ants, rule } => (grid, ants, rule),
            other => {
                return Err(SimulationError::StateMismatch {
                    expected: "ant",
                    found: data_name(&other),
                })
            }
        };

        self.grid.clear();
        self.grid.transplant(&grid);
        self.rule = rule;
        self.ants = ants;
        self.target_count = self.ants.len();
        if !self.grid.is_empty() {
            for ant in &mut self.ants {
                let (row, col) = self.grid.wrap(ant.row as isize, ant.col as isize);
                ant.row = row;
                ant.col = col;
                ant.path = None;
            }
        }
        Ok(())
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<(), SimulationError> {
        match name {
            "rule" if value == 0.0 => self.set_rule(CLASSIC_RULE),
            "rule" if value == 1.0 => self.set_rule([Turn::Left, Turn::Right]),
            "rule" => {
                return Err(SimulationError::InvalidParameter {
                    name: name.to_string(),
                    value,
                })
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
        self.ants.len()
    }

    fn set_agent_count(&mut self, count: usize) -> Result<(), SimulationError> {
        self.set_ant_count(count);
        Ok(())
    }

    fn add_actor_at(&mut self, x: f64, y: f64) -> Result<(), SimulationError> {
        let Some((row, col)) = self.engine.layout().cell_at(x, y) else {
            return Err(SimulationError::AgentLost {
                index: self.ants.len(),
                x,
                y,
            });
        };
        if self.ants.len() >= MAX_AGENTS {
            return Err(SimulationError::InvalidParameter {
                name: "ant_count".to_string(),
                value: (self.ants.len() + 1) as f64,
            });
        }
        self.ants.push(Ant::new(row, col, Direction::Up));
        self.target_count = self.ants.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ants() -> AntSimulation {
        let mut sim = AntSimulation::new(Engine::with_seed(200, 100, 5));
        sim.init();
        sim
    }

    #[test]
    fn test_direction_turns() {
        assert_eq!(Direction::Up.turned(Turn::Right), Direction::Right);
        assert_eq!(Direction::Left.turned(Turn::Right), Direction::Up);
        assert_eq!(Direction::Up.turned(Turn::Left), Direction::Left);
        assert_eq!(Direction::from_index(6), Direction::Down);
    }

    #[test]
    fn test_starts_centred_on_empty_grid() {
        let sim = ants();
        assert_eq!(sim.ants(), &[Ant::new(50, 100, Direction::Up)]);
        assert_eq!(sim.get_stats().cell_count, 0);
    }

    #[test]
    fn test_turns_right_on_inactive_cell() {
        let mut sim = ants();
        sim.update();
        let ant = &sim.ants()[0];
        assert_eq!(ant.direction, Direction::Right);
        assert_eq!((ant.row, ant.col), (50, 101));
        assert!(sim.grid().get(50, 100));
        assert_eq!(sim.cell_brightness(50, 100), 1.0);
    }

    #[test]
    fn test_turns_left_on_active_cell() {
        let mut sim = ants();
        sim.toggle_cell(50, 100);
        sim.update();
        let ant = &sim.ants()[0];
        assert_eq!(ant.direction, Direction::Left);
        assert_eq!((ant.row, ant.col), (50, 99));
        assert!(!sim.grid().get(50, 100));
    }

    #[test]
    fn test_swapped_rule() {
        let mut sim = ants();
        sim.set_param("rule", 1.0).unwrap();
        sim.update();
        assert_eq!(sim.ants()[0].direction, Direction::Left);
        assert!(sim.set_param("rule", 2.0).is_err());
    }

    #[test]
    fn test_set_rule_reverses_turns() {
        let mut sim = ants();
        sim.set_rule([Turn::Right, Turn::Right]);
        sim.toggle_cell(50, 100);
        sim.update();
        // Active cell, but both entries of the rule turn right
        assert_eq!(sim.ants()[0].direction, Direction::Right);
        assert_eq!(sim.rule(), [Turn::Right, Turn::Right]);
    }

    #[test]
    fn test_wraps_at_edge() {
        let mut sim = ants();
        let last = sim.grid().cols() - 1;
        sim.ants[0] = Ant::new(0, last, Direction::Up);
        sim.update();
        assert_eq!((sim.ants()[0].row, sim.ants()[0].col), (0, 0));
    }

    #[test]
    fn test_records_turning_arc() {
        let mut sim = ants();
        sim.update();
        let path = sim.ants()[0].path.expect("arc recorded");
        let (cx, cy) = sim.engine().layout().cell_centre(50, 100);
        let r = path.radius;

        let (x0, y0) = path.point_at(0.0);
        assert!((x0 - cx).abs() < 1e-9 && (y0 - (cy + r)).abs() < 1e-9);
        let (x1, y1) = path.point_at(1.0);
        assert!((x1 - (cx + r)).abs() < 1e-9 && (y1 - cy).abs() < 1e-9);
        // Halfway round the corner the ant heads up and to the right
        let heading = path.heading_at(0.5);
        assert!(heading.cos() > 0.0 && heading.sin() < 0.0);
    }

    #[test]
    fn test_draw_interpolates_between_updates() {
        let mut sim = ants();
        sim.update();
        sim.engine_mut().mark_updated(1000.0);
        let interval = sim.engine().update_interval();
        assert_eq!(sim.engine().update_fraction(1000.0 + interval / 2.0), 0.5);
        assert_eq!(sim.engine().update_fraction(1000.0 + interval * 3.0), 1.0);
        sim.draw(1000.0 + interval / 2.0);
    }

    #[test]
    fn test_ant_count() {
        let mut sim = ants();
        sim.set_ant_count(4);
        assert_eq!(sim.agent_count(), 4);
        assert_eq!(sim.ants()[0], Ant::new(50, 100, Direction::Up));
        sim.set_ant_count(1);
        assert_eq!(sim.ants(), &[Ant::new(50, 100, Direction::Up)]);
    }

    #[test]
    fn test_add_actor_outside_grid() {
        let mut sim = ants();
        assert!(sim.add_actor_at(-10.0, 5.0).is_err());
        sim.add_actor_at(10.5, 20.5).unwrap();
        assert_eq!(sim.ants()[1], Ant::new(20, 10, Direction::Up));
    }

    #[test]
    fn test_resize_preserves_ants() {
        let mut sim = ants();
        for _ in 0..20 {
            sim.update();
        }
        let before = sim.get_stats();
        sim.engine_mut().surface_mut().set_size(120, 60);
        sim.resize_preserve_state();
        assert_eq!(sim.get_stats().generation, before.generation);
        assert_eq!(sim.get_stats().cell_count, before.cell_count);
        let ant = &sim.ants()[0];
        assert!(ant.row < sim.grid().rows() && ant.col < sim.grid().cols());
    }
}
