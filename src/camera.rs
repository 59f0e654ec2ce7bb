use lyon::math::{Angle, Point, Transform, Vector};
use tracing::warn;

use crate::brush::MAX_PENDING_CHANGES;
use crate::stamp::EPSILON;

/// The viewport rectangle the orthographic projection maps onto clip space,
/// in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl CameraBounds {
    pub fn from_viewport(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            right: width,
            top: 0.0,
            bottom: height,
        }
    }

    fn width(&self) -> f32 {
        self.right - self.left
    }

    fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// A change to the camera state, drained by UI subscribers via
/// [`Camera::take_changes`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraChange {
    Scale(f32),
    Rotation(f32),
    Translation(Vector),
    Bounds(CameraBounds),
}

/// A 2D orthographic camera over the paint surface: pan, zoom and rotation.
///
/// The view transform maps canvas-texel coordinates to device pixels; its
/// cached inverse maps pointer positions back into texel space. Transforms
/// are rebuilt lazily behind dirty flags, so repeated reads within a frame
/// are free.
#[derive(Debug)]
pub struct Camera {
    scale: f32,
    rotation: f32,
    translation: Vector,
    bounds: CameraBounds,

    view: Transform,
    view_dirty: bool,
    view_inverse: Transform,
    view_inverse_dirty: bool,
    proj: Transform,
    proj_dirty: bool,

    locked: bool,
    changes: Vec<CameraChange>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            rotation: 0.0,
            translation: Vector::new(0.0, 0.0),
            bounds: CameraBounds::default(),
            view: Transform::identity(),
            view_dirty: true,
            view_inverse: Transform::identity(),
            view_inverse_dirty: true,
            proj: Transform::identity(),
            proj_dirty: true,
            locked: false,
            changes: Vec::new(),
        }
    }

    /// Texel space to device pixels: scale, then rotate, then translate.
    pub fn view(&mut self) -> Transform {
        if self.view_dirty {
            self.view = Transform::scale(self.scale, self.scale)
                .then(&Transform::rotation(Angle::radians(self.rotation)))
                .then(&Transform::translation(
                    self.translation.x,
                    self.translation.y,
                ));
            self.view_dirty = false;
            self.view_inverse_dirty = true;
        }
        self.view
    }

    /// Device pixels back to texel space.
    pub fn view_inverse(&mut self) -> Transform {
        let view = self.view();
        if self.view_inverse_dirty {
            // The scale is clamped away from zero, so the view always has an
            // inverse; identity is a defensive fallback only.
            self.view_inverse = view.inverse().unwrap_or_else(Transform::identity);
            self.view_inverse_dirty = false;
        }
        self.view_inverse
    }

    /// Device pixels to clip space, with the y axis flipped so texel row 0
    /// appears at the top of the viewport.
    pub fn proj(&mut self) -> Transform {
        if self.proj_dirty {
            let width = self.bounds.width().max(EPSILON);
            let height = self.bounds.height().max(EPSILON);
            self.proj = Transform::scale(2.0 / width, -2.0 / height)
                .then(&Transform::translation(-1.0, 1.0));
            self.proj_dirty = false;
        }
        self.proj
    }

    /// The combined texel-to-clip transform, as a column-major matrix for
    /// the present shader.
    pub fn view_proj_matrix(&mut self) -> [[f32; 4]; 4] {
        let combined = self.view().then(&self.proj());
        transform_to_mat4(&combined)
    }

    /// Maps a pointer position in device pixels into canvas-texel space.
    pub fn device_to_texel(&mut self, position: Point) -> Point {
        self.view_inverse().transform_point(position)
    }

    pub fn bounds(&self) -> CameraBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: CameraBounds) {
        self.bounds = bounds;
        self.proj_dirty = true;
        self.push_change(CameraChange::Bounds(bounds));
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        if self.locked {
            return;
        }
        if scale < EPSILON {
            warn!("camera scale {scale} too small, clamping");
        }
        self.scale = scale.max(EPSILON);
        self.view_dirty = true;
        self.push_change(CameraChange::Scale(self.scale));
    }

    /// Multiplies the current scale, for wheel-style zoom deltas.
    pub fn rescale(&mut self, factor: f32) {
        self.set_scale(self.scale * factor);
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        if self.locked {
            return;
        }
        self.rotation = rotation;
        self.view_dirty = true;
        self.push_change(CameraChange::Rotation(rotation));
    }

    pub fn rotate(&mut self, rotation: f32) {
        self.set_rotation(self.rotation + rotation);
    }

    pub fn translation(&self) -> Vector {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vector) {
        if self.locked {
            return;
        }
        self.translation = translation;
        self.view_dirty = true;
        self.push_change(CameraChange::Translation(translation));
    }

    pub fn translate(&mut self, delta: Vector) {
        self.set_translation(self.translation + delta);
    }

    /// Pans by a movement expressed in device pixels, as delivered by
    /// pointer-move events. The translation component lives in device space,
    /// so the delta applies directly regardless of zoom or rotation.
    pub fn pan(&mut self, device_delta: Vector) {
        self.translate(device_delta);
    }

    /// While locked, all mutations are ignored; pointer gestures routed to
    /// painting must not also move the camera.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// True when no transform needs rebuilding and no change events are
    /// pending: an idle camera never forces a present pass by itself.
    pub fn is_idle(&self) -> bool {
        !self.view_dirty && !self.proj_dirty && self.changes.is_empty()
    }

    /// Drains the change events recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<CameraChange> {
        std::mem::take(&mut self.changes)
    }

    /// Bounded like the brush queue: without a subscriber only the newest
    /// entries are worth keeping.
    fn push_change(&mut self, change: CameraChange) {
        if self.changes.len() == MAX_PENDING_CHANGES {
            self.changes.remove(0);
        }
        self.changes.push(change);
    }
}

/// Embeds a 2D affine transform into the column-major 4x4 matrix layout the
/// shaders consume.
pub(crate) fn transform_to_mat4(transform: &Transform) -> [[f32; 4]; 4] {
    [
        [transform.m11, transform.m12, 0.0, 0.0],
        [transform.m21, transform.m22, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [transform.m31, transform.m32, 0.0, 1.0],
    ]
}
