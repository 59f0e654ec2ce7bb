use tracing::warn;

use crate::color::Color;
use crate::stamp;

/// Upper bound on undrained change events. Without a subscriber the queue
/// would otherwise grow for the lifetime of the session; older entries are
/// stale parameter snapshots, so they are the ones dropped.
pub(crate) const MAX_PENDING_CHANGES: usize = 256;

/// Configuration the brush is constructed with, as opposed to the parameters
/// the user adjusts while painting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    /// The number of seconds of continuous painting after which the lowest
    /// flow setting reaches full opacity.
    pub max_seconds_to_opaque: f32,
    /// Capacity of the pointer sample queue, in samples.
    pub stroke_buffer_capacity: usize,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            max_seconds_to_opaque: 2.0,
            stroke_buffer_capacity: 64,
        }
    }
}

/// A change to one of the user-adjustable brush parameters.
///
/// Setters record these instead of mutating UI state directly; a settings
/// panel (or any other subscriber) drains them with [`Brush::take_changes`]
/// and syncs itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrushChange {
    Color(Color),
    Flow(f32),
    Size(f32),
    Softness(f32),
}

/// The soft round brush: color, flow, size and edge softness.
///
/// All parameters are plain values read once per frame by the compositor;
/// setters clamp to the valid range and emit [`BrushChange`] events.
///
/// # Examples
///
/// ```
/// use impasto::{Brush, BrushChange, Color};
///
/// let mut brush = Brush::default();
/// brush.set_color(Color::rgb(255, 0, 0));
/// brush.set_flow(0.5);
/// assert_eq!(brush.flow(), 0.5);
/// assert_eq!(
///     brush.take_changes(),
///     vec![
///         BrushChange::Color(Color::rgb(255, 0, 0)),
///         BrushChange::Flow(0.5),
///     ],
/// );
/// ```
#[derive(Debug)]
pub struct Brush {
    color: Color,
    flow: f32,
    size: f32,
    softness: f32,
    settings: BrushSettings,
    changes: Vec<BrushChange>,
}

impl Default for Brush {
    fn default() -> Self {
        Self::new(BrushSettings::default())
    }
}

impl Brush {
    pub fn new(settings: BrushSettings) -> Self {
        Self {
            color: Color::BLACK,
            flow: 1.0,
            size: 12.0,
            softness: 0.9,
            settings,
            changes: Vec::new(),
        }
    }

    pub fn settings(&self) -> &BrushSettings {
        &self.settings
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.push_change(BrushChange::Color(color));
    }

    /// Flow in `[0, 1]`: the fraction of `max_seconds_to_opaque` after which
    /// painting over the same area saturates.
    pub fn flow(&self) -> f32 {
        self.flow
    }

    pub fn set_flow(&mut self, flow: f32) {
        self.flow = clamp_unit("flow", flow);
        self.push_change(BrushChange::Flow(self.flow));
    }

    /// Brush radius in texels.
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_size(&mut self, size: f32) {
        if size < 0.5 {
            warn!("brush size {size} below minimum, clamping to 0.5");
        }
        self.size = size.max(0.5);
        self.push_change(BrushChange::Size(self.size));
    }

    /// Edge softness in `[0, 1]`: 0 is a hard disk, 1 the most gradual
    /// falloff.
    pub fn softness(&self) -> f32 {
        self.softness
    }

    pub fn set_softness(&mut self, softness: f32) {
        self.softness = clamp_unit("softness", softness);
        self.push_change(BrushChange::Softness(self.softness));
    }

    /// The opacity accumulation rate for the current flow setting.
    pub fn flow_rate(&self) -> f32 {
        stamp::flow_rate(self.flow, self.settings.max_seconds_to_opaque)
    }

    /// Drains the change events recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<BrushChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn push_change(&mut self, change: BrushChange) {
        if self.changes.len() == MAX_PENDING_CHANGES {
            self.changes.remove(0);
        }
        self.changes.push(change);
    }
}

fn clamp_unit(name: &str, value: f32) -> f32 {
    if !(0.0..=1.0).contains(&value) {
        warn!("brush {name} {value} outside [0, 1], clamping");
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_to_valid_ranges() {
        let mut brush = Brush::default();
        brush.set_flow(1.5);
        brush.set_softness(-0.2);
        brush.set_size(0.0);
        assert_eq!(brush.flow(), 1.0);
        assert_eq!(brush.softness(), 0.0);
        assert_eq!(brush.size(), 0.5);
    }

    #[test]
    fn changes_are_recorded_and_drained() {
        let mut brush = Brush::default();
        brush.set_size(24.0);
        brush.set_softness(0.25);
        assert!(brush.has_changes());
        assert_eq!(
            brush.take_changes(),
            vec![BrushChange::Size(24.0), BrushChange::Softness(0.25)],
        );
        assert!(!brush.has_changes());
        assert!(brush.take_changes().is_empty());
    }

    #[test]
    fn undrained_changes_stay_bounded_and_keep_the_newest() {
        let mut brush = Brush::default();
        for i in 0..(MAX_PENDING_CHANGES + 100) {
            brush.set_size(i as f32 + 1.0);
        }
        let changes = brush.take_changes();
        assert_eq!(changes.len(), MAX_PENDING_CHANGES);
        assert_eq!(
            changes.last(),
            Some(&BrushChange::Size(MAX_PENDING_CHANGES as f32 + 100.0)),
        );
    }

    #[test]
    fn flow_rate_grows_with_flow() {
        let mut brush = Brush::default();
        brush.set_flow(0.0);
        let slow = brush.flow_rate();
        brush.set_flow(0.9);
        let fast = brush.flow_rate();
        assert!(fast > slow);
    }
}
