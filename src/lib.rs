//! Cellular-automaton and agent simulations drawn onto a software surface.
//!
//! Three variants share one engine: a toroidal Game of Life, a termite chip
//! sorter and a turning-rule ant. Cells fade out over several generations
//! after they go inactive, and are tinted by a four-corner rotating hue field.

pub mod colour;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod simulation;
pub mod surface;

pub use colour::{ColourField, Rgb};
pub use config::EngineSettings;
pub use error::{ErrorReporter, LifecycleEvent, LifecycleHook, LogReporter, SimulationError};
pub use scheduler::{Scheduler, Tick};
pub use simulation::{
    create_simulation, AntSimulation, Engine, LifeSimulation, SimState, Simulation, Stats,
    TermiteSimulation, SIMULATIONS,
};
pub use surface::Pixmap;
