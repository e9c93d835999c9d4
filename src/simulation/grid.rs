use rand::Rng;

/// Rectangular field of boolean cells, row-major.
///
/// What "active" means is up to the simulation: alive, chip present, flipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Create an all-inactive grid
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// Create a grid where each cell is independently active with probability `density`
    pub fn random(rows: usize, cols: usize, density: f64, rng: &mut impl Rng) -> Self {
        let mut grid = Self::new(rows, cols);
        grid.randomize(density, rng);
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Out-of-range coordinates read as inactive
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.index(row, col).map_or(false, |i| self.cells[i])
    }

    pub fn set(&mut self, row: usize, col: usize, active: bool) {
        if let Some(i) = self.index(row, col) {
            self.cells[i] = active;
        }
    }

    /// Flip a cell, returning its new value
    pub fn toggle(&mut self, row: usize, col: usize) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i] = !self.cells[i];
                self.cells[i]
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Independent Bernoulli draw per cell
    pub fn randomize(&mut self, density: f64, rng: &mut impl Rng) {
        let p = if density.is_finite() {
            density.clamp(0.0, 1.0)
        } else {
            0.0
        };
        for cell in &mut self.cells {
            *cell = rng.gen_bool(p);
        }
    }

    /// Wrap signed coordinates onto the torus
    pub fn wrap(&self, row: isize, col: isize) -> (usize, usize) {
        (
            row.rem_euclid(self.rows.max(1) as isize) as usize,
            col.rem_euclid(self.cols.max(1) as isize) as usize,
        )
    }

    /// Active cells among the 8 toroidally wrapped neighbours
    pub fn live_neighbours(&self, row: usize, col: usize) -> u8 {
        let mut count = 0;
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let (r, c) = self.wrap(row as isize + dr, col as isize + dc);
                if self.cells[r * self.cols + c] {
                    count += 1;
                }
            }
        }
        count
    }

    /// Copy of this grid at new dimensions, keeping the overlapping region
    pub fn resized(&self, rows: usize, cols: usize) -> Grid {
        let mut grid = Grid::new(rows, cols);
        grid.transplant(self);
        grid
    }

    /// Overwrite the region shared with `other`
    pub fn transplant(&mut self, other: &Grid) {
        let rows = self.rows.min(other.rows);
        let cols = self.cols.min(other.cols);
        for row in 0..rows {
            let dst = row * self.cols;
            let src = row * other.cols;
            self.cells[dst..dst + cols].copy_from_slice(&other.cells[src..src + cols]);
        }
    }
}
