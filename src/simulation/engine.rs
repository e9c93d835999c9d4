use std::collections::HashSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::colour::{ColourCache, ColourField, Rgb};
use crate::config::{
    EngineSettings, COLOUR_BUCKET_MS, DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH,
    FPS_WINDOW_MS, TARGET_CELLS,
};
use crate::error::{ErrorReporter, LifecycleEvent, LifecycleHook, LogReporter, SimulationError};
use crate::simulation::brightness::BrightnessLedger;
use crate::simulation::grid::Grid;
use crate::surface::Pixmap;

/// Mapping between surface pixels and grid cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub cell_size: u32,
    pub rows: usize,
    pub cols: usize,
    /// Centring margins in pixels
    pub offset_x: u32,
    pub offset_y: u32,
}

impl GridLayout {
    /// Square cells sized so the shorter axis holds about `TARGET_CELLS`
    pub fn for_surface(width: u32, height: u32) -> Self {
        let cell_size = (width.min(height) / TARGET_CELLS).max(1);
        let cols = width / cell_size;
        let rows = height / cell_size;
        Self {
            cell_size,
            rows: rows as usize,
            cols: cols as usize,
            offset_x: (width - cols * cell_size) / 2,
            offset_y: (height - rows * cell_size) / 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Cell under a surface-local point, if any
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (row, col) = self.signed_cell(x, y)?;
        (row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols)
            .then(|| (row as usize, col as usize))
    }

    /// Cell under a point, clamped onto the grid
    pub fn clamped_cell(&self, x: f64, y: f64) -> (usize, usize) {
        let (row, col) = self.signed_cell(x, y).unwrap_or((0, 0));
        (
            row.clamp(0, self.rows.saturating_sub(1) as i64) as usize,
            col.clamp(0, self.cols.saturating_sub(1) as i64) as usize,
        )
    }

    fn signed_cell(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        if !x.is_finite() || !y.is_finite() || self.cell_size == 0 {
            return None;
        }
        let size = self.cell_size as f64;
        let col = ((x - self.offset_x as f64) / size).floor() as i64;
        let row = ((y - self.offset_y as f64) / size).floor() as i64;
        Some((row, col))
    }

    /// Top-left pixel of a cell
    pub fn cell_origin(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.offset_x as f64 + (col as u32 * self.cell_size) as f64,
            self.offset_y as f64 + (row as u32 * self.cell_size) as f64,
        )
    }

    pub fn cell_centre(&self, row: usize, col: usize) -> (f64, f64) {
        let (x, y) = self.cell_origin(row, col);
        let half = self.cell_size as f64 / 2.0;
        (x + half, y + half)
    }
}

/// Frames-per-second reading; `Pending` until the first window completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fps {
    #[default]
    Pending,
    Measured(u32),
}

impl fmt::Display for Fps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fps::Pending => write!(f, "-"),
            Fps::Measured(fps) => write!(f, "{}", fps),
        }
    }
}

/// Counts drawn frames over fixed windows of host time
#[derive(Clone, Debug, Default)]
pub struct FpsCounter {
    window_start: Option<f64>,
    frame_count: u32,
    current: Fps,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick the counter, returns Some(fps) each time a window completes
    pub fn tick(&mut self, now_ms: f64) -> Option<u32> {
        let start = *self.window_start.get_or_insert(now_ms);
        self.frame_count += 1;
        let elapsed = now_ms - start;

        if elapsed >= FPS_WINDOW_MS {
            let fps = (self.frame_count as f64 * 1000.0 / elapsed).round() as u32;
            self.frame_count = 0;
            self.window_start = Some(now_ms);
            self.current = Fps::Measured(fps);
            Some(fps)
        } else {
            None
        }
    }

    pub fn current(&self) -> Fps {
        self.current
    }
}

/// Cells visited by a straight line between two cells, endpoints included
pub fn line_cells(from: (i64, i64), to: (i64, i64)) -> Vec<(i64, i64)> {
    let (mut r, mut c) = from;
    let dr = (to.0 - r).abs();
    let dc = -(to.1 - c).abs();
    let sr = if r < to.0 { 1 } else { -1 };
    let sc = if c < to.1 { 1 } else { -1 };
    let mut err = dr + dc;
    let mut cells = Vec::with_capacity((dr.max(-dc) + 1) as usize);

    loop {
        cells.push((r, c));
        if r == to.0 && c == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dc {
            err += dc;
            r += sr;
        }
        if e2 <= dr {
            err += dr;
            c += sc;
        }
    }
    cells
}

/// One pointer drag: the last cell under the pointer and every cell already
/// toggled by this drag
#[derive(Clone, Debug)]
struct Stroke {
    last: (usize, usize),
    toggled: HashSet<(usize, usize)>,
}

/// State shared by every simulation: the surface and its grid layout, the
/// clock, the brightness ledger, colours, counters and error reporting.
pub struct Engine {
    surface: Pixmap,
    layout: GridLayout,
    /// Surface size the layout was computed for
    laid_out_for: (u32, u32),
    settings: EngineSettings,
    ledger: BrightnessLedger,
    field: ColourField,
    colours: ColourCache,
    generation: u64,
    cell_count: usize,
    running: bool,
    last_update_ms: f64,
    clock_origin_ms: Option<f64>,
    fps: FpsCounter,
    stroke: Option<Stroke>,
    rng: StdRng,
    reporter: Box<dyn ErrorReporter>,
    hooks: Vec<Box<dyn LifecycleHook>>,
}

impl Engine {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    /// Engine with a deterministic random stream
    pub fn with_seed(width: u32, height: u32, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: u32, height: u32, rng: StdRng) -> Self {
        Self {
            surface: Pixmap::new(width, height),
            layout: GridLayout::default(),
            laid_out_for: (0, 0),
            settings: EngineSettings::default(),
            ledger: BrightnessLedger::default(),
            field: ColourField::default(),
            colours: ColourCache::new(),
            generation: 0,
            cell_count: 0,
            running: false,
            last_update_ms: 0.0,
            clock_origin_ms: None,
            fps: FpsCounter::new(),
            stroke: None,
            rng,
            reporter: Box::new(LogReporter),
            hooks: Vec::new(),
        }
    }

    pub fn set_reporter(&mut self, reporter: Box<dyn ErrorReporter>) {
        self.reporter = reporter;
    }

    pub fn add_hook(&mut self, hook: Box<dyn LifecycleHook>) {
        self.hooks.push(hook);
    }

    pub fn report(&self, context: &str, error: &SimulationError) {
        self.reporter.report(context, error);
    }

    /// Tell every hook about `event`; hook failures are reported, not raised
    pub fn notify(&mut self, event: LifecycleEvent) {
        for hook in &mut self.hooks {
            if let Err(message) = hook.notify(event) {
                let error = SimulationError::Hook {
                    hook: hook.name().to_string(),
                    message,
                };
                self.reporter.report("lifecycle hook", &error);
            }
        }
    }

    // ============================================
    // Surface and layout
    // ============================================

    pub fn surface(&self) -> &Pixmap {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Pixmap {
        &mut self.surface
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn layout_surface(&self) -> (u32, u32) {
        self.laid_out_for
    }

    /// Recompute the layout from the current surface size. A detached or
    /// zero-sized surface falls back to the default size.
    pub fn resize(&mut self) -> GridLayout {
        if self.surface.is_detached() {
            log::warn!(
                "Surface is {}x{}, falling back to {}x{}",
                self.surface.width(),
                self.surface.height(),
                DEFAULT_SURFACE_WIDTH,
                DEFAULT_SURFACE_HEIGHT
            );
            self.surface
                .set_size(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT);
        }

        let layout = GridLayout::for_surface(self.surface.width(), self.surface.height());
        if layout != self.layout {
            log::debug!(
                "Layout {}x{} cells of {}px",
                layout.cols,
                layout.rows,
                layout.cell_size
            );
        }
        self.layout = layout;
        self.laid_out_for = (self.surface.width(), self.surface.height());
        self.ledger.resize(layout.rows, layout.cols);
        self.colours.invalidate();
        self.notify(LifecycleEvent::Resized {
            rows: layout.rows,
            cols: layout.cols,
        });
        layout
    }

    // ============================================
    // Counters and clock
    // ============================================

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn set_cell_count(&mut self, count: usize) {
        self.cell_count = count;
    }

    /// Decay the ledger and advance the generation counter; the first half
    /// of every update
    pub fn begin_generation(&mut self) {
        self.ledger.decay();
        self.generation += 1;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn last_update_ms(&self) -> f64 {
        self.last_update_ms
    }

    pub fn mark_updated(&mut self, now_ms: f64) {
        self.last_update_ms = now_ms;
    }

    /// Progress in [0, 1] from the last update towards the next one
    pub fn update_fraction(&self, now_ms: f64) -> f64 {
        let interval = self.settings.update_interval();
        if interval <= 0.0 || !now_ms.is_finite() {
            return 1.0;
        }
        ((now_ms - self.last_update_ms) / interval).clamp(0.0, 1.0)
    }

    pub fn record_frame(&mut self, now_ms: f64) {
        self.fps.tick(now_ms);
    }

    pub fn fps(&self) -> Fps {
        self.fps.current()
    }

    // ============================================
    // Settings
    // ============================================

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_speed(&mut self, speed: u32) -> u32 {
        self.settings.set_speed(speed)
    }

    pub fn update_interval(&self) -> f64 {
        self.settings.update_interval()
    }

    pub fn set_brightness(&mut self, brightness: f32) -> f32 {
        let value = self.settings.set_brightness(brightness);
        self.colours.invalidate();
        value
    }

    pub fn set_show_direction_indicator(&mut self, show: bool) {
        self.settings.show_direction_indicator = show;
    }

    pub fn set_animate_colours(&mut self, animate: bool) {
        self.settings.animate_colours = animate;
        self.colours.invalidate();
    }

    pub fn set_background(&mut self, colour: &str) {
        self.settings.background = Rgb::parse_or(colour, Rgb::BLACK);
    }

    pub fn colour_cache_valid(&self) -> bool {
        self.colours.is_valid()
    }

    pub fn ledger(&self) -> &BrightnessLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut BrightnessLedger {
        &mut self.ledger
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    // ============================================
    // Drawing
    // ============================================

    /// Milliseconds since the first drawn frame, or `None` when colours are static
    fn colour_time(&mut self, now_ms: f64) -> Option<f64> {
        if !self.settings.animate_colours || !now_ms.is_finite() {
            return None;
        }
        let origin = *self.clock_origin_ms.get_or_insert(now_ms);
        Some((now_ms - origin).max(0.0))
    }

    fn lightness(&self) -> f64 {
        (self.settings.lightness * self.settings.brightness() as f64).clamp(0.0, 1.0)
    }

    /// Colour-field colour for an arbitrary surface point
    pub fn colour_at(&mut self, x: f64, y: f64, now_ms: f64) -> Rgb {
        let time = self.colour_time(now_ms);
        self.field.colour_at(
            x,
            y,
            self.surface.width() as f64,
            self.surface.height() as f64,
            self.settings.saturation,
            self.lightness(),
            time,
        )
    }

    /// Clear to the background and paint every visible cell of `grid`,
    /// dimmed by its ledger level
    pub fn paint_cells(&mut self, grid: &Grid, now_ms: f64) {
        let time = self.colour_time(now_ms);
        let stamp = time.map_or(-1, |t| (t / COLOUR_BUCKET_MS).floor() as i64);
        let bucket_time = time.map(|_| stamp as f64 * COLOUR_BUCKET_MS);

        let layout = self.layout;
        let field = self.field;
        let width = self.surface.width() as f64;
        let height = self.surface.height() as f64;
        let saturation = self.settings.saturation;
        let lightness = self.lightness();

        self.surface.clear(self.settings.background);

        let rows = layout.rows.min(grid.rows());
        let cols = layout.cols.min(grid.cols());
        let colours = self.colours.colours(layout.rows, layout.cols, stamp, |r, c| {
            let (x, y) = layout.cell_centre(r, c);
            field.colour_at(x, y, width, height, saturation, lightness, bucket_time)
        });

        let size = layout.cell_size as f64;
        for row in 0..rows {
            for col in 0..cols {
                let level = self.ledger.display_level(row, col, grid.get(row, col));
                if level <= 0.0 {
                    continue;
                }
                let colour = colours[row * layout.cols + col].scale(level);
                let (x, y) = layout.cell_origin(row, col);
                self.surface.fill_rect(x, y, size, size, colour);
            }
        }
    }

    // ============================================
    // Pointer strokes
    // ============================================

    /// Start a drag; returns the cell to toggle, if the pointer is on the grid
    pub fn begin_stroke(&mut self, x: f64, y: f64) -> Option<(usize, usize)> {
        let cell = self.layout.cell_at(x, y);
        self.stroke = cell.map(|cell| Stroke {
            last: cell,
            toggled: HashSet::from([cell]),
        });
        cell
    }

    /// Extend the drag to (x, y); returns the cells the path crossed that
    /// this drag has not toggled yet
    pub fn continue_stroke(&mut self, x: f64, y: f64) -> Vec<(usize, usize)> {
        let Some(cell) = self.layout.cell_at(x, y) else {
            return Vec::new();
        };
        let Some(stroke) = self.stroke.as_mut() else {
            return Vec::new();
        };

        let from = (stroke.last.0 as i64, stroke.last.1 as i64);
        let to = (cell.0 as i64, cell.1 as i64);
        stroke.last = cell;

        line_cells(from, to)
            .into_iter()
            .map(|(r, c)| (r as usize, c as usize))
            .filter(|cell| stroke.toggled.insert(*cell))
            .collect()
    }

    pub fn end_stroke(&mut self) {
        self.stroke = None;
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_targets_short_axis() {
        let layout = GridLayout::for_surface(800, 600);
        assert_eq!(layout.cell_size, 6);
        assert_eq!(layout.rows, 100);
        assert_eq!(layout.cols, 133);
        assert_eq!(layout.offset_x, 1);
        assert_eq!(layout.offset_y, 0);

        let tiny = GridLayout::for_surface(30, 20);
        assert_eq!(tiny.cell_size, 1);
        assert_eq!((tiny.rows, tiny.cols), (20, 30));
    }

    #[test]
    fn test_cell_lookup() {
        let layout = GridLayout::for_surface(800, 600);
        assert_eq!(layout.cell_at(1.0, 0.0), Some((0, 0)));
        assert_eq!(layout.cell_at(0.5, 0.0), None);
        assert_eq!(layout.cell_at(7.5, 13.0), Some((2, 1)));
        assert_eq!(layout.cell_at(f64::NAN, 1.0), None);
        assert_eq!(layout.clamped_cell(-50.0, 9999.0), (99, 0));
    }

    #[test]
    fn test_detached_surface_falls_back() {
        let mut engine = Engine::with_seed(0, 0, 1);
        let layout = engine.resize();
        assert_eq!(engine.surface().width(), DEFAULT_SURFACE_WIDTH);
        assert_eq!(engine.surface().height(), DEFAULT_SURFACE_HEIGHT);
        assert!(!layout.is_empty());
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut engine = Engine::with_seed(640, 480, 1);
        let first = engine.resize();
        let second = engine.resize();
        assert_eq!(first, second);
        assert!(!engine.colour_cache_valid());
    }

    #[test]
    fn test_brightness_invalidates_colours() {
        let mut engine = Engine::with_seed(100, 100, 1);
        engine.resize();
        let grid = Grid::new(100, 100);
        engine.paint_cells(&grid, 0.0);
        assert!(engine.colour_cache_valid());
        assert_eq!(engine.set_brightness(3.0), 2.0);
        assert!(!engine.colour_cache_valid());
    }

    #[test]
    fn test_line_cells() {
        assert_eq!(line_cells((0, 0), (0, 3)), vec![(0, 0), (0, 1), (0, 2), (0, 3)]);
        assert_eq!(line_cells((2, 2), (0, 0)), vec![(2, 2), (1, 1), (0, 0)]);
        let steep = line_cells((0, 0), (4, 1));
        assert_eq!(steep.len(), 5);
        assert_eq!(steep.first(), Some(&(0, 0)));
        assert_eq!(steep.last(), Some(&(4, 1)));
    }

    #[test]
    fn test_stroke_toggles_each_cell_once() {
        let mut engine = Engine::with_seed(100, 100, 1);
        engine.resize();
        assert_eq!(engine.begin_stroke(0.5, 0.5), Some((0, 0)));

        let crossed = engine.continue_stroke(5.5, 0.5);
        assert_eq!(crossed, vec![(0, 1), (0, 2), (0, 3), (0, 4), (0, 5)]);

        // Dragging back over the same cells toggles nothing new
        let back = engine.continue_stroke(0.5, 0.5);
        assert!(back.is_empty());

        engine.end_stroke();
        assert!(!engine.is_stroking());
        assert!(engine.continue_stroke(9.5, 9.5).is_empty());
    }

    #[test]
    fn test_fps_pending_until_window_completes() {
        let mut fps = FpsCounter::new();
        assert_eq!(fps.current().to_string(), "-");
        for i in 0..30 {
            fps.tick(i as f64 * 33.0);
        }
        assert_eq!(fps.current(), Fps::Pending);
        assert_eq!(fps.tick(1000.0), Some(31));
        assert_eq!(fps.current().to_string(), "31");
    }
}
