//! A minimal windowed painting app: left-drag paints, the mouse wheel zooms.
//!
//! Run with `cargo run --example painter`.

use std::sync::Arc;
use std::time::Instant;

use impasto::{BrushSettings, Camera, CameraBounds, Canvas, CanvasSettings, Color, Renderer};
use lyon::math::Point;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

struct Painter {
    window: Arc<Window>,
    renderer: Renderer<'static>,
    canvas: Canvas,
    last_frame: Instant,
}

#[derive(Default)]
struct App {
    painter: Option<Painter>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.painter.is_some() {
            return;
        }

        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title("impasto"))
                .expect("Failed to create window"),
        );
        let size = window.inner_size();

        let mut canvas = Canvas::new(CanvasSettings::default(), BrushSettings::default());
        canvas
            .camera_mut()
            .set_bounds(CameraBounds::from_viewport(size.width as f32, size.height as f32));
        canvas.brush_mut().set_color(Color::from_hex("#20304a").unwrap());
        canvas.brush_mut().set_size(24.0);
        canvas.brush_mut().set_flow(0.6);

        let renderer = futures::executor::block_on(Renderer::new(
            window.clone(),
            (size.width, size.height),
            window.scale_factor(),
            canvas.paint_extent(),
        ));

        self.painter = Some(Painter {
            window,
            renderer,
            canvas,
            last_frame: Instant::now(),
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(painter) = self.painter.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                painter.renderer.resize((size.width, size.height));
                painter.canvas.camera_mut().set_bounds(CameraBounds::from_viewport(
                    size.width as f32,
                    size.height as f32,
                ));
            }
            WindowEvent::CursorEntered { .. } => painter.canvas.pointer_mut().entered(),
            WindowEvent::CursorLeft { .. } => painter.canvas.pointer_mut().left(),
            WindowEvent::CursorMoved { position, .. } => {
                painter
                    .canvas
                    .pointer_mut()
                    .moved(Point::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => painter.canvas.pointer_mut().pressed(),
                ElementState::Released => painter.canvas.pointer_mut().released(),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 40.0,
                };
                let camera: &mut Camera = painter.canvas.camera_mut();
                camera.rescale(1.1f32.powf(lines));
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let delta_ms = now.duration_since(painter.last_frame).as_secs_f32() * 1000.0;
                painter.last_frame = now;

                // No settings panel to sync, so the change events are
                // discarded; leaving them queued would also keep the canvas
                // from ever reporting idle.
                let _ = painter.canvas.brush_mut().take_changes();
                let _ = painter.canvas.camera_mut().take_changes();

                let frame = painter.canvas.tick(delta_ms);
                match painter.renderer.render(&frame) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = painter.renderer.size();
                        painter.renderer.resize(size);
                    }
                    Err(error) => eprintln!("render error: {error}"),
                }
                painter.window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run_app(&mut App::default())
        .expect("Event loop error");
}
