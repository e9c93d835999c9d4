use thiserror::Error;

/// Failures raised by the simulation core.
///
/// Only [`SimulationError::UnknownSimulation`] ever reaches a caller as a hard
/// error; everything else is routed through an [`ErrorReporter`] and the
/// operation that hit it carries on.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("unknown simulation `{0}`")]
    UnknownSimulation(String),
    #[error("state captured from `{found}` cannot be restored into `{expected}`")]
    StateMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("`{simulation}` has no parameter named `{name}`")]
    UnknownParameter {
        simulation: &'static str,
        name: String,
    },
    #[error("parameter `{name}` rejected value {value}")]
    InvalidParameter { name: String, value: f64 },
    #[error("`{simulation}` does not support {operation}")]
    Unsupported {
        simulation: &'static str,
        operation: &'static str,
    },
    #[error("agent {index} left the surface at ({x}, {y})")]
    AgentLost { index: usize, x: f64, y: f64 },
    #[error("lifecycle hook `{hook}` failed: {message}")]
    Hook { hook: String, message: String },
}

/// Strategy for errors that must not abort the operation that raised them.
pub trait ErrorReporter {
    fn report(&self, context: &str, error: &SimulationError);
}

/// Default reporter: one structured log line per error.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, context: &str, error: &SimulationError) {
        log::error!("{}: {}", context, error);
    }
}

/// Notifications emitted by a simulation's life-cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    Initialized,
    Started,
    Paused,
    Reset,
    Cleared,
    Resized { rows: usize, cols: usize },
    Generation(u64),
}

/// Observer attached to a simulation.
///
/// Hooks only see the event value, never the simulation, so they cannot call
/// back into `update`/`draw`/`toggle_cell`.
pub trait LifecycleHook {
    fn name(&self) -> &str;

    fn notify(&mut self, event: LifecycleEvent) -> Result<(), String>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Reporter that records every error it sees
    #[derive(Clone, Default)]
    pub struct CollectingReporter {
        pub seen: Rc<RefCell<Vec<(String, SimulationError)>>>,
    }

    impl ErrorReporter for CollectingReporter {
        fn report(&self, context: &str, error: &SimulationError) {
            self.seen
                .borrow_mut()
                .push((context.to_string(), error.clone()));
        }
    }
}
