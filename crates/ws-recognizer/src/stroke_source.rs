//! Stroke source seam and the in-memory ink model.

use std::sync::{Mutex, MutexGuard, PoisonError};

use inkwire_protocol::Stroke;

/// Supplies the strokes captured since the last send.
///
/// Reading and consuming are separate steps: strokes stay pending until a
/// frame carrying them has been handed to the transport.
pub trait StrokeSource: Send + Sync {
    /// Returns pending strokes in capture order without consuming them.
    fn pending_strokes(&self) -> Vec<Stroke>;

    /// Marks the first `count` pending strokes as sent.
    fn commit_sent(&self, count: usize);

    /// Returns pending strokes and marks them as sent.
    fn take_pending(&self) -> Vec<Stroke> {
        let pending = self.pending_strokes();
        self.commit_sent(pending.len());
        pending
    }
}

/// Ink captured on one drawing surface.
#[derive(Debug, Default)]
pub struct InkModel {
    state: Mutex<InkState>,
}

#[derive(Debug, Default)]
struct InkState {
    strokes: Vec<Stroke>,
    /// Index of the first stroke not yet handed out.
    sent: usize,
}

impl InkModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a completed stroke.
    pub fn add_stroke(&self, stroke: Stroke) {
        self.lock().strokes.push(stroke);
    }

    /// Snapshot of every stroke on the surface, sent or not.
    pub fn strokes(&self) -> Vec<Stroke> {
        self.lock().strokes.clone()
    }

    /// Number of strokes not yet handed out.
    pub fn pending_len(&self) -> usize {
        let state = self.lock();
        state.strokes.len() - state.sent
    }

    /// Drops all ink.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.strokes.clear();
        state.sent = 0;
    }
}

impl StrokeSource for InkModel {
    fn pending_strokes(&self) -> Vec<Stroke> {
        let state = self.lock();
        state.strokes[state.sent..].to_vec()
    }

    fn commit_sent(&self, count: usize) {
        let mut state = self.lock();
        // `clear` may have run since the strokes were read.
        state.sent = (state.sent + count).min(state.strokes.len());
    }
}
