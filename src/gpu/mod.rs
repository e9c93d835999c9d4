mod context;
mod frame;
mod render;

pub use context::{GpuContext, GpuError};
pub use frame::FrameTexture;
pub use render::BlitPipeline;
