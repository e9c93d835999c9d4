use crate::colour::Rgb;

/// Cells along the shorter surface axis
pub const TARGET_CELLS: u32 = 100;

/// Surface size used while the real one is detached or reports zero
pub const DEFAULT_SURFACE_WIDTH: u32 = 800;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 600;

// ============================================
// Clock
// ============================================

/// Simulation steps per second
pub const MIN_SPEED: u32 = 1;
pub const MAX_SPEED: u32 = 60;
pub const DEFAULT_SPEED: u32 = 10;

/// Length of one FPS measurement window in milliseconds
pub const FPS_WINDOW_MS: f64 = 1000.0;

// ============================================
// Rendering
// ============================================

/// Global brightness multiplier applied to cell lightness
pub const MIN_BRIGHTNESS: f32 = 0.1;
pub const MAX_BRIGHTNESS: f32 = 2.0;
pub const DEFAULT_BRIGHTNESS: f32 = 1.0;

/// HSL parameters fed to the colour field
pub const DEFAULT_SATURATION: f64 = 0.85;
pub const DEFAULT_LIGHTNESS: f64 = 0.55;

/// Colours are recomputed at most once per bucket of this many milliseconds
pub const COLOUR_BUCKET_MS: f64 = 50.0;

/// Blur radius of the glow drawn around agents, in cells
pub const AGENT_GLOW_CELLS: f64 = 0.8;

// ============================================
// Fade to black
// ============================================

/// Brightness removed from a dark cell each generation
pub const MIN_FADE_DECREMENT: f32 = 0.01;
pub const MAX_FADE_DECREMENT: f32 = 1.0;
pub const DEFAULT_FADE_DECREMENT: f32 = 0.1;

/// Upper bound, in generations, on how long a fade may last
pub const MIN_FADE_OUT_CYCLES: u32 = 1;
pub const MAX_FADE_OUT_CYCLES: u32 = 20;
pub const DEFAULT_FADE_OUT_CYCLES: u32 = 20;

// ============================================
// Variants
// ============================================

/// Initial live-cell probability for the life automaton
pub const DEFAULT_LIFE_DENSITY: f64 = 0.25;

/// Termite population and chip seeding
pub const DEFAULT_TERMITE_COUNT: usize = 60;
pub const DEFAULT_CHIP_DENSITY: f64 = 0.25;

/// Termite stride as a fraction of the cell size
pub const DEFAULT_TERMITE_STEP: f64 = 0.25;

/// Per-tick chance that a termite wanders off its heading
pub const DEFAULT_TURN_PROBABILITY: f64 = 0.1;

/// Largest heading change of a single wander, in radians
pub const MAX_WANDER_ANGLE: f64 = std::f64::consts::FRAC_PI_4;

/// Samples kept in each agent trail
pub const DEFAULT_TRAIL_LENGTH: usize = 8;
pub const MAX_TRAIL_LENGTH: usize = 64;

/// Ants created by `init`
pub const DEFAULT_ANT_COUNT: usize = 1;

/// Hard cap on agents of either kind
pub const MAX_AGENTS: usize = 2000;

/// Runtime settings shared by every simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    speed: u32,
    brightness: f32,
    pub saturation: f64,
    pub lightness: f64,
    /// Rotate the corner hues over time instead of holding them still
    pub animate_colours: bool,
    pub show_direction_indicator: bool,
    pub background: Rgb,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            brightness: DEFAULT_BRIGHTNESS,
            saturation: DEFAULT_SATURATION,
            lightness: DEFAULT_LIGHTNESS,
            animate_colours: true,
            show_direction_indicator: true,
            background: Rgb::BLACK,
        }
    }
}

impl EngineSettings {
    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Clamp to [MIN_SPEED, MAX_SPEED]; returns the stored value
    pub fn set_speed(&mut self, speed: u32) -> u32 {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.speed
    }

    /// Milliseconds between two updates
    pub fn update_interval(&self) -> f64 {
        1000.0 / self.speed as f64
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn set_brightness(&mut self, brightness: f32) -> f32 {
        self.brightness = if brightness.is_finite() {
            brightness.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS)
        } else {
            DEFAULT_BRIGHTNESS
        };
        self.brightness
    }
}
