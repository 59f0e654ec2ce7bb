use lyon::math::Point;
use smallvec::SmallVec;
use tracing::warn;

use crate::ring_buffer::{RingBuffer, RingBufferError};

/// The pointer lifecycle over the canvas.
///
/// Transitions: `Idle -> Hover` on enter, `Hover -> Painting` on press,
/// `Painting -> Hover` on release, anything `-> Idle` on leave. The
/// compositor runs once per frame only while in `Painting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPhase {
    #[default]
    Idle,
    Hover,
    Painting,
}

/// The per-frame batch of drained pointer samples. Normal event cadence is a
/// handful of samples per displayed frame, so the batch lives on the stack.
pub type SampleBatch = SmallVec<[Point; 8]>;

/// Buffers pointer events between their asynchronous arrival and the frame
/// tick that consumes them.
///
/// Move positions are queued in device-pixel space in a fixed-capacity ring
/// buffer; the queue decouples the input rate from the render rate and
/// guarantees at most one compositing pass per displayed frame. On overflow
/// the oldest sample is dropped: the newest position is the one the next
/// frame's stroke segment needs.
#[derive(Debug)]
pub struct PointerTracker {
    phase: PointerPhase,
    queue: RingBuffer<Point>,
    activity: bool,
}

impl PointerTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            phase: PointerPhase::Idle,
            queue: RingBuffer::new(capacity),
            activity: false,
        }
    }

    pub fn phase(&self) -> PointerPhase {
        self.phase
    }

    pub fn is_painting(&self) -> bool {
        self.phase == PointerPhase::Painting
    }

    /// The pointer moved over the canvas.
    pub fn moved(&mut self, position: Point) {
        self.activity = true;
        if let Err(RingBufferError::Full) = self.queue.push_back(position) {
            warn!("pointer sample queue full, dropping oldest sample");
            let _ = self.queue.pop_front();
            // A pop just freed a slot.
            let _ = self.queue.push_back(position);
        }
    }

    /// The pointer entered the canvas.
    pub fn entered(&mut self) {
        self.activity = true;
        if self.phase == PointerPhase::Idle {
            self.phase = PointerPhase::Hover;
        }
    }

    /// The pointer left the canvas. Ends any stroke in progress; committed
    /// texels are never rolled back.
    pub fn left(&mut self) {
        self.activity = true;
        self.phase = PointerPhase::Idle;
        self.queue.reset();
    }

    /// The pointer button was pressed while over the canvas.
    pub fn pressed(&mut self) {
        self.activity = true;
        if self.phase == PointerPhase::Hover {
            self.phase = PointerPhase::Painting;
        }
    }

    /// The pointer button was released.
    pub fn released(&mut self) {
        self.activity = true;
        if self.phase == PointerPhase::Painting {
            self.phase = PointerPhase::Hover;
        }
    }

    /// Consumes every queued sample, front to back. Called once per frame
    /// tick.
    pub fn drain_samples(&mut self) -> SampleBatch {
        let mut batch = SampleBatch::new();
        while let Ok(position) = self.queue.pop_front() {
            batch.push(position);
        }
        batch
    }

    pub fn has_queued_samples(&self) -> bool {
        !self.queue.is_empty()
    }

    /// True if any event arrived since the last [`PointerTracker::take_activity`].
    pub fn take_activity(&mut self) -> bool {
        std::mem::take(&mut self.activity)
    }
}
