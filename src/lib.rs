pub use wgpu;

mod brush;
mod camera;
mod canvas;
mod color;
mod input;
mod paint_surface;
mod pipeline;
mod renderer;
mod ring_buffer;
pub mod stamp;
mod vertex;

pub use brush::{Brush, BrushChange, BrushSettings};
pub use camera::{Camera, CameraBounds, CameraChange};
pub use canvas::{Canvas, CanvasSettings, FrameInput};
pub use color::{Color, PremulRgba};
pub use input::{PointerPhase, PointerTracker, SampleBatch};
pub use paint_surface::PaintSurface;
pub use pipeline::{PaintUniforms, PresentUniforms, PAINT_TEXTURE_FORMAT};
pub use renderer::Renderer;
pub use ring_buffer::{RingBuffer, RingBufferError};
