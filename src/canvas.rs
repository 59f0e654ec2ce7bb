use lyon::math::Point;

use crate::brush::{Brush, BrushSettings};
use crate::camera::Camera;
use crate::input::PointerTracker;
use crate::stamp;

/// Construction-time canvas configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSettings {
    /// Size of the paint surface in texels.
    pub paint_extent: (u32, u32),
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            paint_extent: (1024, 1024),
        }
    }
}

/// Everything the renderer needs for one frame, assembled by
/// [`Canvas::tick`].
///
/// `segment` is `Some` only while painting; the renderer runs the paint pass
/// exactly when it is, and flips the surface afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Stroke segment for this frame in canvas-texel space: the previous
    /// frame's endpoint and the current pointer position.
    pub segment: Option<(Point, Point)>,
    /// Straight (not premultiplied) brush color.
    pub brush_rgb: [f32; 3],
    /// Brush radius in texels.
    pub brush_radius: f32,
    pub brush_softness: f32,
    /// Per-subsample blend alpha for this frame's time slice.
    pub stamp_alpha: f32,
    /// Texel-to-clip matrix for the present pass.
    pub view_proj: [[f32; 4]; 4],
    pub delta_ms: f32,
}

/// The application-root state of the painting canvas: brush, camera and
/// pointer lifecycle, owned in one place and injected into collaborators
/// rather than reached through globals.
///
/// Drive it with pointer events between frames, then call [`Canvas::tick`]
/// once per animation frame and hand the resulting [`FrameInput`] to the
/// renderer.
#[derive(Debug)]
pub struct Canvas {
    settings: CanvasSettings,
    brush: Brush,
    camera: Camera,
    pointer: PointerTracker,
    /// Previous frame's stroke endpoint in texel space; `None` between
    /// strokes so a new press seeds the segment start at the press position.
    stroke_endpoint: Option<Point>,
    /// Most recent pointer position in device pixels, tracked across hover
    /// so a press paints from where the pointer already is.
    last_device_position: Option<Point>,
}

impl Canvas {
    pub fn new(settings: CanvasSettings, brush_settings: BrushSettings) -> Self {
        let pointer = PointerTracker::new(brush_settings.stroke_buffer_capacity);
        Self {
            settings,
            brush: Brush::new(brush_settings),
            camera: Camera::new(),
            pointer,
            stroke_endpoint: None,
            last_device_position: None,
        }
    }

    pub fn settings(&self) -> &CanvasSettings {
        &self.settings
    }

    pub fn paint_extent(&self) -> (u32, u32) {
        self.settings.paint_extent
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut PointerTracker {
        &mut self.pointer
    }

    /// True when nothing happened since the last frame: no pointer activity,
    /// no stroke in progress, no camera or brush changes pending. An idle
    /// canvas does not need a new frame, only the last presented image.
    pub fn is_idle(&self) -> bool {
        !self.pointer.is_painting()
            && !self.pointer.has_queued_samples()
            && self.camera.is_idle()
            && !self.brush.has_changes()
    }

    /// Advances one animation frame: consumes the buffered pointer samples,
    /// derives this frame's stroke segment and uniform values.
    ///
    /// All stamp evaluation for the frame happens in the pass driven by the
    /// returned input; nothing suspends mid-frame.
    pub fn tick(&mut self, delta_ms: f32) -> FrameInput {
        let samples = self.pointer.drain_samples();
        if let Some(position) = samples.last() {
            self.last_device_position = Some(*position);
        }
        let _ = self.pointer.take_activity();

        let segment = if self.pointer.is_painting() {
            match self.last_device_position {
                Some(device) => {
                    let current = self.camera.device_to_texel(device);
                    // Seed the start at the current position on the first
                    // frame of a stroke, so no line is drawn from an
                    // undefined origin.
                    let start = self.stroke_endpoint.unwrap_or(current);
                    self.stroke_endpoint = Some(current);
                    Some((start, current))
                }
                // Pressed before any move event was ever observed; there is
                // no position to stamp at yet.
                None => None,
            }
        } else {
            self.stroke_endpoint = None;
            None
        };

        FrameInput {
            segment,
            brush_rgb: self.brush.color().normalize_rgb(),
            brush_radius: self.brush.size(),
            brush_softness: self.brush.softness(),
            stamp_alpha: stamp::stamp_alpha(self.brush.flow_rate(), delta_ms),
            view_proj: self.camera.view_proj_matrix(),
            delta_ms,
        }
    }
}
