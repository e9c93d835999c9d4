mod app;
mod gpu;

use clap::Parser;
use winit::event_loop::{ControlFlow, EventLoop};

use app::{App, Options};

fn main() -> Result<(), winit::error::EventLoopError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::parse();

    let mut app = match App::new(options) {
        Ok(app) => app,
        Err(error) => {
            log::error!("{}", error);
            std::process::exit(2);
        }
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    event_loop.run_app(&mut app)
}
