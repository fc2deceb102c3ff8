//! Button debouncing.
//!
//! The debouncer is scanned at a fixed period (see
//! [`BUTTON_SCAN_PERIOD`](crate::config::BUTTON_SCAN_PERIOD)). A raw level
//! that differs from the stable state must be observed on `required`
//! consecutive scans before it becomes the new stable state and an edge is
//! emitted. A single scan that agrees with the stable state restarts the
//! count.

use heapless::Vec;

use crate::hal::{BUTTON_COUNT, ButtonId, ButtonInput};

/// Direction of a debounced transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Edge {
    Down,
    Up,
}

/// A debounced button transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub edge: Edge,
}

impl ButtonEvent {
    pub const fn new(button: ButtonId, edge: Edge) -> Self {
        Self { button, edge }
    }

    pub const fn down(button: ButtonId) -> Self {
        Self::new(button, Edge::Down)
    }

    pub const fn up(button: ButtonId) -> Self {
        Self::new(button, Edge::Up)
    }

    pub const fn is_down(&self) -> bool {
        matches!(self.edge, Edge::Down)
    }
}

/// Edges produced by a single scan, in button order.
pub type ScanEdges = Vec<ButtonEvent, BUTTON_COUNT>;

/// Stable-count debouncer for the three front-panel buttons.
#[derive(Clone, Debug)]
pub struct ButtonDebouncer {
    stable: [bool; BUTTON_COUNT],
    pending: [u8; BUTTON_COUNT],
    required: u8,
}

impl ButtonDebouncer {
    /// Creates a debouncer requiring `required` agreeing scans per edge. A
    /// value of zero is treated as one.
    pub const fn new(required: u8) -> Self {
        Self {
            stable: [false; BUTTON_COUNT],
            pending: [0; BUTTON_COUNT],
            required: if required == 0 { 1 } else { required },
        }
    }

    /// Last stable level of `button` (`true` = pressed).
    pub const fn is_pressed(&self, button: ButtonId) -> bool {
        self.stable[button.as_index()]
    }

    /// Samples every button once and returns the edges that stabilized.
    pub fn scan<I: ButtonInput>(&mut self, input: &mut I) -> ScanEdges {
        let mut edges = ScanEdges::new();
        for button in ButtonId::ALL {
            let raw = input.read_raw(button);
            if let Some(event) = self.sample(button, raw) {
                // One edge per button per scan, so capacity is never exceeded.
                let _ = edges.push(event);
            }
        }
        edges
    }

    /// Feeds one raw reading for `button`.
    pub fn sample(&mut self, button: ButtonId, raw: bool) -> Option<ButtonEvent> {
        let index = button.as_index();
        if raw == self.stable[index] {
            self.pending[index] = 0;
            return None;
        }

        self.pending[index] = self.pending[index].saturating_add(1);
        if self.pending[index] < self.required {
            return None;
        }

        self.pending[index] = 0;
        self.stable[index] = raw;
        let edge = if raw { Edge::Down } else { Edge::Up };
        Some(ButtonEvent::new(button, edge))
    }
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new(crate::config::DEBOUNCE_SAMPLES)
    }
}
