//! End-to-end scenarios against the public API.

use std::cell::RefCell;
use std::rc::Rc;

use canvas_automata::colour::Corner;
use canvas_automata::simulation::{Direction, Fps, Grid};
use canvas_automata::{
    create_simulation, AntSimulation, ColourField, Engine, ErrorReporter, LifeSimulation,
    LifecycleEvent, LifecycleHook, Rgb, Scheduler, Simulation, SimulationError, TermiteSimulation,
    Tick,
};

fn life(width: u32, height: u32) -> LifeSimulation {
    let mut sim = LifeSimulation::new(Engine::with_seed(width, height, 11));
    sim.init();
    sim.clear();
    sim
}

#[test]
fn test_row_zero_sees_last_row() {
    let mut sim = life(200, 100);
    let last = sim.grid().rows() - 1;
    sim.toggle_cell(0, 5);
    sim.toggle_cell(last, 5);
    assert_eq!(sim.grid().live_neighbours(0, 5), 1);
}

#[test]
fn test_birth_and_survival() {
    let mut sim = life(200, 100);
    for (row, col) in [(10, 10), (10, 12), (12, 11)] {
        sim.toggle_cell(row, col);
    }
    sim.toggle_cell(40, 40);

    sim.update();
    assert!(sim.grid().get(11, 11));
    assert!(!sim.grid().get(40, 40));
}

#[test]
fn test_brightness_fades_monotonically_to_zero() {
    for decrement in [0.1_f32, 0.3, 0.07, 0.02, 0.01] {
        let mut sim = life(200, 100);
        sim.set_fade_decrement(decrement);
        sim.toggle_cell(30, 30);
        let bound = (1.0 / decrement).ceil() as usize;

        let mut previous = sim.cell_brightness(30, 30);
        assert_eq!(previous, 1.0);
        let mut generations = 0;
        while sim.cell_brightness(30, 30) > 0.0 {
            sim.update();
            generations += 1;
            let current = sim.cell_brightness(30, 30);
            assert!(current <= previous, "brightness rose from {} to {}", previous, current);
            previous = current;
            assert!(generations <= bound, "still lit after {} generations", generations);
        }
        assert_eq!(sim.cell_brightness(30, 30), 0.0);
    }
}

#[test]
fn test_untouched_cells_stay_dark() {
    let mut sim = life(200, 100);
    for _ in 0..25 {
        sim.update();
        assert_eq!(sim.cell_brightness(50, 50), 0.0);
    }
}

#[test]
fn test_smallest_decrement_fades_one_hundredth_per_generation() {
    let mut sim = life(200, 100);
    assert_eq!(sim.set_fade_decrement(0.01), 0.01);
    sim.toggle_cell(30, 30);
    sim.update();
    assert!((sim.cell_brightness(30, 30) - 0.99).abs() < 1e-5);
    for _ in 1..50 {
        sim.update();
    }
    assert!((sim.cell_brightness(30, 30) - 0.5).abs() < 1e-4);
}

#[test]
fn test_fade_out_cycles_band_the_painted_level() {
    let mut sim = life(200, 100);
    sim.set_fade_decrement(0.1);
    assert_eq!(sim.set_fade_out_cycles(0), 1);
    assert_eq!(sim.set_fade_out_cycles(500), 20);
    assert_eq!(sim.set_fade_out_cycles(4), 4);

    sim.toggle_cell(30, 30);
    for _ in 0..6 {
        sim.update();
    }
    // The stored level is exact, only the painted level is banded
    assert!((sim.cell_brightness(30, 30) - 0.4).abs() < 1e-5);
    let painted = sim.engine().ledger().display_level(30, 30, false);
    assert!((painted - 0.5).abs() < 1e-6);
}

/// Run `generations` updates, then check every cell that was never active
/// still reads brightness 0
fn assert_never_active_stay_dark<S: Simulation>(
    sim: &mut S,
    generations: usize,
    grid: impl Fn(&S) -> &Grid,
) {
    let rows = grid(&*sim).rows();
    let cols = grid(&*sim).cols();
    let mut touched = vec![false; rows * cols];
    let mark = |sim: &S, touched: &mut Vec<bool>| {
        for row in 0..rows {
            for col in 0..cols {
                touched[row * cols + col] |= grid(sim).get(row, col);
            }
        }
    };

    mark(&*sim, &mut touched);
    for _ in 0..generations {
        sim.update();
        mark(&*sim, &mut touched);
    }

    let mut dark = 0;
    for row in 0..rows {
        for col in 0..cols {
            if !touched[row * cols + col] {
                assert_eq!(sim.cell_brightness(row, col), 0.0, "cell {},{} glows", row, col);
                dark += 1;
            }
        }
    }
    assert!(dark > 0);
}

#[test]
fn test_termite_cells_without_chips_stay_dark() {
    let mut sim = TermiteSimulation::new(Engine::with_seed(300, 300, 9));
    sim.init();
    assert_never_active_stay_dark(&mut sim, 40, |sim| sim.chips());
}

#[test]
fn test_ant_cells_never_flipped_stay_dark() {
    let mut sim = AntSimulation::new(Engine::with_seed(200, 100, 9));
    sim.init();
    assert_never_active_stay_dark(&mut sim, 60, |sim| sim.grid());
}

#[test]
fn test_toggle_at_flips_the_cell_under_the_point() {
    let mut sim = life(200, 100);
    let (x, y) = sim.engine().layout().cell_centre(7, 12);
    sim.toggle_at(x, y);
    assert!(sim.grid().get(7, 12));
    assert_eq!(sim.get_stats().cell_count, 1);

    sim.toggle_at(x, y);
    assert!(!sim.grid().get(7, 12));
    assert_eq!(sim.get_stats().cell_count, 0);

    // Off the surface: ignored
    sim.toggle_at(-5.0, 10_000.0);
    assert_eq!(sim.get_stats().cell_count, 0);
}

#[test]
fn test_background_colour_fills_empty_cells() {
    let mut engine = Engine::with_seed(200, 100, 3);
    engine.set_background("#ff0000");
    let mut sim = LifeSimulation::new(engine);
    sim.init();
    sim.clear();
    sim.draw(0.0);
    assert_eq!(sim.engine().surface().pixel(50, 50), Some(Rgb::new(255, 0, 0)));

    sim.engine_mut().set_background("red");
    sim.draw(0.0);
    assert_eq!(sim.engine().surface().pixel(50, 50), Some(Rgb::BLACK));
}

#[test]
fn test_frozen_colours_ignore_the_clock() {
    let mut engine = Engine::with_seed(200, 100, 3);
    let start = engine.colour_at(100.0, 50.0, 1000.0);
    let later = engine.colour_at(100.0, 50.0, 11_000.0);
    assert_ne!(start, later);

    engine.set_animate_colours(false);
    assert!(!engine.settings().animate_colours);
    let frozen = engine.colour_at(100.0, 50.0, 1000.0);
    assert_eq!(engine.colour_at(100.0, 50.0, 11_000.0), frozen);
}

#[test]
fn test_resize_preserves_counters_when_shrinking() {
    let mut sim = LifeSimulation::new(Engine::with_seed(800, 600, 5));
    sim.init();
    for _ in 0..7 {
        sim.update();
    }
    let before = sim.get_stats();

    let state = sim.get_state();
    sim.resize_to(120, 90);
    sim.set_state(state);

    let after = sim.get_stats();
    assert_eq!(after.generation, before.generation);
    assert_eq!(after.cell_count, before.cell_count);
}

#[test]
fn test_hue_blend_wraps_through_zero() {
    let field = ColourField {
        top_left: Corner::new(350.0, 0.0),
        top_right: Corner::new(10.0, 0.0),
        bottom_left: Corner::new(350.0, 0.0),
        bottom_right: Corner::new(10.0, 0.0),
    };
    for step in 0..=10 {
        let hue = field.hue_at(step as f64 / 10.0, 0.0, None);
        assert!(hue >= 349.0 || hue <= 11.0, "hue {} left the short arc", hue);
    }
    let middle = field.hue_at(0.5, 0.5, None);
    assert!(middle < 1e-6 || middle > 360.0 - 1e-6);
}

#[test]
fn test_termite_picks_up_chip_underfoot() {
    let mut sim = TermiteSimulation::new(Engine::with_seed(600, 600, 2));
    sim.init();
    sim.clear();
    sim.set_termite_count(0);
    sim.set_param("turn_probability", 0.0).unwrap();

    sim.toggle_cell(15, 15);
    let (x, y) = sim.engine().layout().cell_centre(15, 15);
    sim.add_actor_at(x, y).unwrap();

    sim.update();
    assert!(sim.termites()[0].carrying);
    assert!(!sim.chips().get(15, 15));
}

#[test]
fn test_ant_turns_right_on_inactive_cell() {
    let mut sim = AntSimulation::new(Engine::with_seed(200, 100, 4));
    sim.init();
    let start = sim.ants()[0].clone();
    assert!(!sim.grid().get(start.row, start.col));

    sim.update();
    let ant = &sim.ants()[0];
    assert_eq!(ant.direction.index(), (start.direction.index() + 1) % 4);
    assert_eq!(ant.direction, Direction::Right);
    assert!(sim.grid().get(start.row, start.col));
}

#[test]
fn test_speed_clamps_to_maximum() {
    let mut sim = life(200, 100);
    assert_eq!(sim.set_speed(10_000), 60);
    assert_eq!(sim.engine().update_interval(), 1000.0 / 60.0);
    assert_eq!(sim.set_speed(0), 1);
}

#[test]
fn test_fps_pending_until_first_window() {
    let mut sim = life(200, 100);
    let mut scheduler = Scheduler::new();
    for frame in 0..30 {
        scheduler.tick(&mut sim, frame as f64 * 16.0);
    }
    assert_eq!(sim.get_stats().fps, Fps::Pending);
    assert_eq!(sim.get_stats().fps.to_string(), "-");

    for frame in 30..80 {
        scheduler.tick(&mut sim, frame as f64 * 16.0);
    }
    assert!(matches!(sim.get_stats().fps, Fps::Measured(n) if n > 0));
}

#[test]
fn test_scheduler_decouples_updates_from_frames() {
    let mut sim = create_simulation("ant", Engine::with_seed(200, 100, 8)).unwrap();
    sim.init();
    sim.start();
    let mut scheduler = Scheduler::new();

    let outcomes: Vec<Tick> = (0..10)
        .map(|frame| scheduler.tick(sim.as_mut(), 1000.0 + frame as f64 * 25.0))
        .collect();
    // 25 ms frames, 100 ms interval
    assert_eq!(outcomes.iter().filter(|t| **t == Tick::Stepped).count(), 3);
    assert_eq!(scheduler.frames(), 10);
}

#[test]
fn test_unknown_simulation_is_an_error() {
    let result = create_simulation("wireworld", Engine::with_seed(10, 10, 0));
    assert!(matches!(result, Err(SimulationError::UnknownSimulation(id)) if id == "wireworld"));
}

#[derive(Default)]
struct Recorder {
    events: Rc<RefCell<Vec<LifecycleEvent>>>,
}

impl LifecycleHook for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn notify(&mut self, event: LifecycleEvent) -> Result<(), String> {
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

struct Failing;

impl LifecycleHook for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn notify(&mut self, _event: LifecycleEvent) -> Result<(), String> {
        Err("boom".to_string())
    }
}

#[derive(Clone, Default)]
struct Collect {
    errors: Rc<RefCell<Vec<SimulationError>>>,
}

impl ErrorReporter for Collect {
    fn report(&self, _context: &str, error: &SimulationError) {
        self.errors.borrow_mut().push(error.clone());
    }
}

#[test]
fn test_hooks_see_lifecycle_and_failures_are_reported() {
    let recorder = Recorder::default();
    let events = recorder.events.clone();
    let collect = Collect::default();
    let errors = collect.errors.clone();

    let mut engine = Engine::with_seed(200, 100, 1);
    engine.add_hook(Box::new(recorder));
    engine.add_hook(Box::new(Failing));
    engine.set_reporter(Box::new(collect));

    let mut sim = LifeSimulation::new(engine);
    sim.init();
    sim.start();
    sim.update();
    sim.pause();

    let events = events.borrow();
    assert!(events.contains(&LifecycleEvent::Initialized));
    assert!(events.contains(&LifecycleEvent::Generation(1)));
    assert_eq!(events.last(), Some(&LifecycleEvent::Paused));
    // The failing hook is reported on every event, and the operation carries on
    assert_eq!(errors.borrow().len(), events.len());
    assert_eq!(sim.get_stats().generation, 1);
}

#[test]
fn test_state_from_another_variant_is_reported_not_raised() {
    let collect = Collect::default();
    let errors = collect.errors.clone();

    let mut source = AntSimulation::new(Engine::with_seed(200, 100, 1));
    source.init();
    source.update();
    let state = source.get_state();

    let mut engine = Engine::with_seed(200, 100, 1);
    engine.set_reporter(Box::new(collect));
    let mut sim = LifeSimulation::new(engine);
    sim.init();
    sim.set_state(state);

    assert_eq!(sim.get_stats().generation, 1);
    assert!(matches!(
        errors.borrow().as_slice(),
        [SimulationError::StateMismatch { expected: "life", found: "ant" }]
    ));
}

#[test]
fn test_pointer_stroke_toggles_each_cell_once() {
    let mut sim = life(200, 100);
    sim.handle_mouse_down(10.5, 10.5);
    sim.handle_mouse_move(20.5, 10.5);
    // Back over the same cells: no second toggle within one stroke
    sim.handle_mouse_move(10.5, 10.5);
    sim.handle_mouse_up();

    for col in 10..=20 {
        assert!(sim.grid().get(10, col));
    }
    assert_eq!(sim.get_stats().cell_count, 11);
}

#[test]
fn test_draw_paints_live_cells() {
    let mut sim = life(200, 100);
    sim.toggle_cell(5, 5);
    sim.draw(0.0);
    let lit = sim.engine().surface().pixel(5, 5).unwrap();
    let dark = sim.engine().surface().pixel(50, 50).unwrap();
    assert_ne!(lit, dark);
    assert_eq!(dark, Rgb::BLACK);
}
