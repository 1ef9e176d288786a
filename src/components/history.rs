use std::collections::VecDeque;
use std::time::SystemTime;

use crate::canvas::Surface;

/// Default cap on the undo stack.
pub const MAX_HISTORY_LENGTH: usize = 50;

// ============================================================================
// SNAPSHOT — immutable full-surface capture
// ============================================================================

/// The complete pixel buffer of a surface at one instant.
///
/// Snapshots are never mutated after capture.  Moving one between the undo
/// and redo stacks moves the boxed buffer; the bytes are not copied.
#[derive(Debug)]
pub struct HistorySnapshot {
    width: u32,
    height: u32,
    pixels: Box<[u8]>,
    timestamp: SystemTime,
}

impl HistorySnapshot {
    /// Capture the whole surface.  Returns `None` for an unavailable
    /// (zero-area) surface.
    pub fn capture<S: Surface + ?Sized>(surface: &S) -> Option<Self> {
        if !surface.is_ready() {
            return None;
        }
        Some(Self {
            width: surface.width(),
            height: surface.height(),
            pixels: surface.get_full().into_boxed_slice(),
            timestamp: SystemTime::now(),
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.len()
    }

    /// Overwrite the entire surface with this snapshot.  Nothing is written
    /// if the surface has been resized since the capture.
    fn restore_into<S: Surface + ?Sized>(&self, surface: &mut S) -> bool {
        if (surface.width(), surface.height()) != (self.width, self.height) {
            log_warn!(
                "History snapshot is {}x{} but the surface is {}x{}, not restored",
                self.width, self.height, surface.width(), surface.height()
            );
            return false;
        }
        surface.put_full(&self.pixels)
    }
}

// ============================================================================
// HISTORY MANAGER - bounded snapshot undo/redo
// ============================================================================

/// Undo/redo over full-surface checkpoints.
///
/// The top of the undo stack is always the state currently on the surface.
/// Its bottom entry is the baseline recorded by [`clear_history`], which
/// `undo` never pops.  Every operation either applies fully or is a no-op.
///
/// [`clear_history`]: HistoryManager::clear_history
#[derive(Debug)]
pub struct HistoryManager {
    undo_stack: VecDeque<HistorySnapshot>,
    redo_stack: VecDeque<HistorySnapshot>,
    max_history_length: usize,
    /// Running byte total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(MAX_HISTORY_LENGTH)
    }
}

impl HistoryManager {
    /// `max_history_length` is clamped to at least 1 so the baseline fits.
    pub fn new(max_history_length: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_length: max_history_length.max(1),
            total_memory: 0,
        }
    }

    /// Record the current surface as the newest state.  Clears the redo
    /// stack and evicts the oldest entries beyond the length cap.
    pub fn checkpoint<S: Surface + ?Sized>(&mut self, surface: &S) {
        let Some(snapshot) = HistorySnapshot::capture(surface) else {
            return;
        };

        for dropped in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(dropped.memory_size());
        }

        self.total_memory += snapshot.memory_size();
        self.undo_stack.push_back(snapshot);
        self.prune();
    }

    /// Step back one checkpoint.  Returns `false` (and changes nothing) at
    /// the baseline or when the surface cannot be restored.
    pub fn undo<S: Surface + ?Sized>(&mut self, surface: &mut S) -> bool {
        if self.undo_stack.len() <= 1 || !surface.is_ready() {
            return false;
        }
        let previous = &self.undo_stack[self.undo_stack.len() - 2];
        if !Self::apply_state(previous, surface) {
            return false;
        }
        if let Some(current) = self.undo_stack.pop_back() {
            self.redo_stack.push_back(current);
        }
        true
    }

    /// Re-apply the most recently undone checkpoint.  Returns `false` (and
    /// changes nothing) when there is nothing to redo.
    pub fn redo<S: Surface + ?Sized>(&mut self, surface: &mut S) -> bool {
        if !surface.is_ready() {
            return false;
        }
        let Some(next) = self.redo_stack.back() else {
            return false;
        };
        if !Self::apply_state(next, surface) {
            return false;
        }
        if let Some(next) = self.redo_stack.pop_back() {
            self.undo_stack.push_back(next);
        }
        true
    }

    /// Drop both stacks and record the current surface as the new baseline.
    pub fn clear_history<S: Surface + ?Sized>(&mut self, surface: &S) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
        self.checkpoint(surface);
    }

    /// The only path from history back to the surface: a whole-buffer
    /// overwrite, never a partial one.
    fn apply_state<S: Surface + ?Sized>(snapshot: &HistorySnapshot, surface: &mut S) -> bool {
        snapshot.restore_into(surface)
    }

    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_history_length {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }
    }

    /// True when `undo` would step back (the baseline is not undoable).
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_length(&self) -> usize {
        self.max_history_length
    }

    /// Bytes held across both stacks (O(1) via cached total).
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    /// The state currently on the surface.
    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.undo_stack.back()
    }

    /// The oldest state still reachable by undo.
    pub fn oldest(&self) -> Option<&HistorySnapshot> {
        self.undo_stack.front()
    }

    /// Undo stack from oldest to newest.
    pub fn undo_snapshots(&self) -> impl Iterator<Item = &HistorySnapshot> {
        self.undo_stack.iter()
    }
}
