use crate::config::{
    DEFAULT_FADE_DECREMENT, DEFAULT_FADE_OUT_CYCLES, MAX_FADE_DECREMENT, MAX_FADE_OUT_CYCLES,
    MIN_FADE_DECREMENT, MIN_FADE_OUT_CYCLES,
};
use crate::simulation::grid::Grid;

/// Levels below this snap to zero so fades finish on schedule
const FADE_EPSILON: f32 = 1e-4;

/// Per-cell brightness for the fade-to-black effect.
///
/// Dense arena indexed by (row, col). `None` marks a cell that has never been
/// lit; it reads as 0 and is never decayed, so a cell that stays inactive from
/// generation 0 onwards stays black instead of fading in from full brightness.
/// A lit cell decays towards 0 once it goes dark and then rests at 0.
///
/// Every generation follows the same protocol: [`decay`](Self::decay) all lit
/// cells, apply the simulation's rule, then [`relight`](Self::relight) every
/// active cell to exactly 1.
#[derive(Clone, Debug)]
pub struct BrightnessLedger {
    rows: usize,
    cols: usize,
    levels: Vec<Option<f32>>,
    decrement: f32,
    fade_out_cycles: u32,
}

impl Default for BrightnessLedger {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl BrightnessLedger {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            levels: vec![None; rows * cols],
            decrement: DEFAULT_FADE_DECREMENT,
            fade_out_cycles: DEFAULT_FADE_OUT_CYCLES,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn decrement(&self) -> f32 {
        self.decrement
    }

    pub fn set_decrement(&mut self, decrement: f32) -> f32 {
        self.decrement = if decrement.is_finite() {
            decrement.clamp(MIN_FADE_DECREMENT, MAX_FADE_DECREMENT)
        } else {
            DEFAULT_FADE_DECREMENT
        };
        self.decrement
    }

    pub fn fade_out_cycles(&self) -> u32 {
        self.fade_out_cycles
    }

    pub fn set_fade_out_cycles(&mut self, cycles: u32) -> u32 {
        self.fade_out_cycles = cycles.clamp(MIN_FADE_OUT_CYCLES, MAX_FADE_OUT_CYCLES);
        self.fade_out_cycles
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Re-dimension, keeping levels in the overlapping region
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if rows == self.rows && cols == self.cols {
            return;
        }
        let mut levels = vec![None; rows * cols];
        for row in 0..rows.min(self.rows) {
            for col in 0..cols.min(self.cols) {
                levels[row * cols + col] = self.levels[row * self.cols + col];
            }
        }
        self.rows = rows;
        self.cols = cols;
        self.levels = levels;
    }

    /// Forget every cell
    pub fn clear(&mut self) {
        self.levels.fill(None);
    }

    /// Raw level; `None` for never-lit or out-of-range cells
    pub fn level(&self, row: usize, col: usize) -> Option<f32> {
        self.index(row, col).and_then(|i| self.levels[i])
    }

    /// Brightness in [0, 1]; 0 for never-lit cells
    pub fn brightness(&self, row: usize, col: usize) -> f32 {
        self.level(row, col).unwrap_or(0.0)
    }

    /// Level to paint a cell with, given whether it is currently active.
    /// A fading cell is drawn in `fade_out_cycles` visible bands, rounded up
    /// so it stays visible until its level reaches 0.
    pub fn display_level(&self, row: usize, col: usize, active: bool) -> f32 {
        match self.level(row, col) {
            Some(level) if level > 0.0 && level < 1.0 => {
                let bands = self.fade_out_cycles as f32;
                ((level * bands).ceil() / bands).min(1.0)
            }
            Some(level) => level,
            None if active => 1.0,
            None => 0.0,
        }
    }

    pub fn light(&mut self, row: usize, col: usize) {
        if let Some(i) = self.index(row, col) {
            self.levels[i] = Some(1.0);
        }
    }

    /// Lower every lit cell by the decrement, resting at 0
    pub fn decay(&mut self) {
        let decrement = self.decrement;
        for level in self.levels.iter_mut().flatten() {
            let next = *level - decrement;
            *level = if next <= FADE_EPSILON { 0.0 } else { next };
        }
    }

    /// Set every active cell of `grid` to full brightness
    pub fn relight(&mut self, grid: &Grid) {
        for row in 0..self.rows.min(grid.rows()) {
            for col in 0..self.cols.min(grid.cols()) {
                if grid.get(row, col) {
                    self.levels[row * self.cols + col] = Some(1.0);
                }
            }
        }
    }

    /// Start from scratch at generation 0: active cells lit, everything else
    /// marked never-lit
    pub fn seed(&mut self, grid: &Grid) {
        self.clear();
        self.relight(grid);
    }

    /// Bring one cell in line after a manual toggle. A cell switched off keeps
    /// its current level, or starts at 1 if it had none, so it fades out
    /// rather than snapping to black.
    pub fn reconcile(&mut self, row: usize, col: usize, active: bool) {
        if let Some(i) = self.index(row, col) {
            let slot = &mut self.levels[i];
            if active || slot.is_none() {
                *slot = Some(1.0);
            }
        }
    }
}
