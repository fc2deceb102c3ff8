//! Hysteretic overcurrent detection.
//!
//! A supply trips once its consecutive over-limit count exceeds the
//! threshold. Tripping latches: the count freezes and in-limit readings are
//! ignored until [`OvercurrentGuard::reset`].

use crate::config::OVERCURRENT_TRIP_THRESHOLD;
use crate::hal::{SUPPLY_COUNT, SupplyId};

/// Classification of one current reading.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GuardVerdict {
    /// Reading is within the limit; the count was cleared.
    InLimit,
    /// Reading is over the limit; the count is still within the threshold.
    Counting(u8),
    /// This reading latched the shutdown.
    Tripped,
    /// Shutdown was already latched; the reading was ignored.
    Latched,
}

#[derive(Clone, Debug)]
pub struct OvercurrentGuard {
    counts: [u8; SUPPLY_COUNT],
    latched: [bool; SUPPLY_COUNT],
    threshold: u8,
}

impl OvercurrentGuard {
    pub const fn new(threshold: u8) -> Self {
        Self {
            counts: [0; SUPPLY_COUNT],
            latched: [false; SUPPLY_COUNT],
            threshold,
        }
    }

    pub const fn count(&self, supply: SupplyId) -> u8 {
        self.counts[supply.as_index()]
    }

    pub const fn is_latched(&self, supply: SupplyId) -> bool {
        self.latched[supply.as_index()]
    }

    pub fn any_latched(&self) -> bool {
        self.latched.iter().any(|latched| *latched)
    }

    /// Classifies `current` (0.1 mA units) against `limit_ma`.
    ///
    /// The limit is scaled by ten to match the reading's units.
    pub fn observe(&mut self, supply: SupplyId, current: i32, limit_ma: u16) -> GuardVerdict {
        let index = supply.as_index();
        if self.latched[index] {
            return GuardVerdict::Latched;
        }

        if current <= i32::from(limit_ma) * 10 {
            self.counts[index] = 0;
            return GuardVerdict::InLimit;
        }

        self.counts[index] = self.counts[index].saturating_add(1);
        if self.counts[index] > self.threshold {
            self.latched[index] = true;
            GuardVerdict::Tripped
        } else {
            GuardVerdict::Counting(self.counts[index])
        }
    }

    /// Clears every latch and count.
    pub fn reset(&mut self) {
        self.counts = [0; SUPPLY_COUNT];
        self.latched = [false; SUPPLY_COUNT];
    }
}

impl Default for OvercurrentGuard {
    fn default() -> Self {
        Self::new(OVERCURRENT_TRIP_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT_MA: u16 = 100;
    const OVER: i32 = 1001;
    const UNDER: i32 = 1000;

    #[test]
    fn trips_on_fourth_consecutive_reading() {
        let mut guard = OvercurrentGuard::default();
        assert_eq!(guard.observe(SupplyId::A, OVER, LIMIT_MA), GuardVerdict::Counting(1));
        assert_eq!(guard.observe(SupplyId::A, OVER, LIMIT_MA), GuardVerdict::Counting(2));
        assert_eq!(guard.observe(SupplyId::A, OVER, LIMIT_MA), GuardVerdict::Counting(3));
        assert!(!guard.is_latched(SupplyId::A));
        assert_eq!(guard.observe(SupplyId::A, OVER, LIMIT_MA), GuardVerdict::Tripped);
        assert!(guard.is_latched(SupplyId::A));
        assert!(!guard.is_latched(SupplyId::B));
    }

    #[test]
    fn in_limit_reading_rearms_the_window() {
        let mut guard = OvercurrentGuard::default();
        for _ in 0..3 {
            guard.observe(SupplyId::B, OVER, LIMIT_MA);
        }
        assert_eq!(guard.observe(SupplyId::B, UNDER, LIMIT_MA), GuardVerdict::InLimit);
        assert_eq!(guard.count(SupplyId::B), 0);
        assert_eq!(guard.observe(SupplyId::B, OVER, LIMIT_MA), GuardVerdict::Counting(1));
    }

    #[test]
    fn latch_survives_in_limit_readings_until_reset() {
        let mut guard = OvercurrentGuard::default();
        for _ in 0..4 {
            guard.observe(SupplyId::A, OVER, LIMIT_MA);
        }
        assert_eq!(guard.observe(SupplyId::A, 0, LIMIT_MA), GuardVerdict::Latched);
        assert_eq!(guard.count(SupplyId::A), 4);
        assert!(guard.any_latched());

        guard.reset();
        assert!(!guard.any_latched());
        assert_eq!(guard.count(SupplyId::A), 0);
    }
}
