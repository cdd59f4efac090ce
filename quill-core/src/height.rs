//! Height synchronizer.
//!
//! Reconciles the document height reported by the embedded size observer with
//! the height the host lays the editor out at. Reports of `0` are transient
//! layout readings, and reports within [`HEIGHT_TOLERANCE`] of the current
//! height are sub-pixel noise; neither moves the layout.

/// Reports closer than this to the current height are ignored.
pub const HEIGHT_TOLERANCE: u32 = 2;

/// Layout height before the first report arrives.
pub const DEFAULT_INITIAL_HEIGHT: u32 = 20;

/// Pure transition `(current, max, reported) -> current'`.
pub fn transition(current: u32, max: Option<u32>, reported: u32) -> u32 {
    if reported == 0 || reported.abs_diff(current) <= HEIGHT_TOLERANCE {
        return current;
    }
    match max {
        Some(max) if reported > max => max,
        _ => reported,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightSync {
    current: u32,
    max: Option<u32>,
}

impl Default for HeightSync {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_HEIGHT, None)
    }
}

impl HeightSync {
    /// `max` is fixed for the lifetime of the synchronizer. An initial height
    /// above `max` starts out clamped.
    pub fn new(initial: u32, max: Option<u32>) -> Self {
        let current = match max {
            Some(max) => initial.min(max),
            None => initial,
        };
        Self { current, max }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }

    /// Feed one report. Returns `true` when the layout height changed.
    pub fn apply(&mut self, reported: u32) -> bool {
        let next = transition(self.current, self.max, reported);
        if next == self.current {
            tracing::trace!(reported, current = self.current, "height report ignored");
            return false;
        }
        tracing::debug!(from = self.current, to = next, reported, "layout height changed");
        self.current = next;
        true
    }
}
