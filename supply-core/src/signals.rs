//! Flags shared between interrupt context and the dispatcher.
//!
//! Interrupt handlers only record facts here; the dispatcher drains the
//! flags from its own thread of execution. Each flag has a single writer and
//! a single reader, so plain atomic loads and swaps are sufficient.

use portable_atomic::{AtomicBool, Ordering};

/// Pending-event flags raised by the timer and ADC sources.
#[derive(Debug, Default)]
pub struct EventSignals {
    tick: AtomicBool,
    conversion: AtomicBool,
}

impl EventSignals {
    pub const fn new() -> Self {
        Self {
            tick: AtomicBool::new(false),
            conversion: AtomicBool::new(false),
        }
    }

    /// Records that the periodic timer fired.
    pub fn raise_tick(&self) {
        self.tick.store(true, Ordering::Release);
    }

    /// Records that an ADC conversion finished.
    pub fn raise_conversion(&self) {
        self.conversion.store(true, Ordering::Release);
    }

    /// Clears and returns the tick flag.
    pub fn take_tick(&self) -> bool {
        self.tick.swap(false, Ordering::AcqRel)
    }

    /// Clears and returns the conversion flag.
    pub fn take_conversion(&self) -> bool {
        self.conversion.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_consumed_once() {
        let signals = EventSignals::new();
        assert!(!signals.take_tick());

        signals.raise_tick();
        signals.raise_tick();
        assert!(signals.take_tick());
        assert!(!signals.take_tick());

        signals.raise_conversion();
        assert!(!signals.take_tick());
        assert!(signals.take_conversion());
        assert!(!signals.take_conversion());
    }
}
