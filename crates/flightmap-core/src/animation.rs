//! Plane glyph animation along the route arcs.
//!
//! [`PlaneAnimator`] is the frame-by-frame state machine; [`AnimationLoop`]
//! abstracts how frames get scheduled (display repaint, fixed interval, or a
//! test driving frames by hand).

use crate::geometry::{bearing_degrees, RouteArc};
use crate::models::Coordinate;

/// Identifies one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Frame scheduling. Each frame must be requested explicitly.
pub trait AnimationLoop {
    fn request_frame(&mut self) -> FrameToken;

    /// Cancel a requested frame. Unknown or already-delivered tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Single-slot frame queue the host drains on its own clock.
///
/// The host calls [`FrameQueue::take_due`] on every repaint or timer tick and
/// forwards the token to the controller.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next: u64,
    pending: Option<FrameToken>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_due(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl AnimationLoop for FrameQueue {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        self.pending = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}

/// Position of the glyph within the route list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationCursor {
    pub segment_index: usize,
    pub point_index: usize,
}

/// One emitted glyph position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphFrame {
    pub cursor: AnimationCursor,
    pub position: Coordinate,
    /// Degrees toward the next point; `None` on the very last point of the route list
    pub bearing: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    Idle,
    Running,
    Cancelled,
}

/// Walks the glyph over every arc in order, then wraps to the first arc forever.
#[derive(Debug)]
pub struct PlaneAnimator {
    state: AnimatorState,
    arcs: Vec<RouteArc>,
    cursor: AnimationCursor,
}

impl Default for PlaneAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaneAnimator {
    pub fn new() -> Self {
        Self {
            state: AnimatorState::Idle,
            arcs: Vec::new(),
            cursor: AnimationCursor::default(),
        }
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn cursor(&self) -> AnimationCursor {
        self.cursor
    }

    pub fn is_running(&self) -> bool {
        self.state == AnimatorState::Running
    }

    /// Start over on `arcs`. Returns the first position, or `None` (staying
    /// idle) when there is nothing to animate.
    pub fn start(&mut self, arcs: Vec<RouteArc>) -> Option<Coordinate> {
        self.cursor = AnimationCursor::default();
        self.arcs = arcs;
        self.arcs.retain(|arc| !arc.is_empty());

        if self.arcs.is_empty() {
            self.state = AnimatorState::Idle;
            return None;
        }

        self.state = AnimatorState::Running;
        Some(self.arcs[0].origin())
    }

    /// Stop emitting. Safe to call in any state.
    pub fn cancel(&mut self) {
        if self.state == AnimatorState::Running {
            self.state = AnimatorState::Cancelled;
        }
        self.arcs.clear();
        self.cursor = AnimationCursor::default();
    }

    /// Emit the frame at the cursor and step forward.
    pub fn advance(&mut self) -> Option<GlyphFrame> {
        if self.state != AnimatorState::Running {
            return None;
        }

        let cursor = self.cursor;
        let arc = self.arcs.get(cursor.segment_index)?.points();
        let position = *arc.get(cursor.point_index)?;
        let bearing = self.bearing_at(cursor);

        self.cursor.point_index += 1;
        if self.cursor.point_index >= arc.len() {
            self.cursor.point_index = 0;
            self.cursor.segment_index = (cursor.segment_index + 1) % self.arcs.len();
        }

        Some(GlyphFrame {
            cursor,
            position,
            bearing,
        })
    }

    fn bearing_at(&self, cursor: AnimationCursor) -> Option<f64> {
        let arc = self.arcs[cursor.segment_index].points();
        if let (Some(here), Some(next)) = (arc.get(cursor.point_index), arc.get(cursor.point_index + 1)) {
            return Some(bearing_degrees(*here, *next));
        }

        // Last point of this arc: face along the next arc, unless this is the final one.
        let next_arc = self.arcs.get(cursor.segment_index + 1)?.points();
        match (next_arc.first(), next_arc.get(1)) {
            (Some(start), Some(next)) => Some(bearing_degrees(*start, *next)),
            _ => None,
        }
    }
}
