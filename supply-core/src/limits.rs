//! Per-supply current limit selection.
//!
//! Limits are chosen from a fixed table. Each supply keeps a committed index
//! (the limit enforced by the sampling engine) and a pending index edited in
//! the menu. Pending values only take effect on [`CurrentLimits::accept`].

use crate::hal::{SUPPLY_COUNT, SupplyId};

/// Selectable limits in units of 10 mA.
pub const CURRENT_LIMIT_VALUES: [u8; 8] = [1, 5, 10, 20, 40, 60, 80, 100];

#[allow(clippy::cast_possible_truncation)]
const LAST_INDEX: u8 = (CURRENT_LIMIT_VALUES.len() - 1) as u8;

/// Committed and pending limit indices for both supplies.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CurrentLimits {
    committed: [u8; SUPPLY_COUNT],
    pending: [u8; SUPPLY_COUNT],
    adjusting: SupplyId,
}

impl CurrentLimits {
    /// Both supplies start at the highest limit with supply A selected.
    pub const fn new() -> Self {
        Self {
            committed: [LAST_INDEX; SUPPLY_COUNT],
            pending: [LAST_INDEX; SUPPLY_COUNT],
            adjusting: SupplyId::A,
        }
    }

    /// Supply whose pending limit is currently being edited.
    pub const fn adjusting(&self) -> SupplyId {
        self.adjusting
    }

    pub fn select(&mut self, supply: SupplyId) {
        self.adjusting = supply;
    }

    pub const fn committed_index(&self, supply: SupplyId) -> u8 {
        self.committed[supply.as_index()]
    }

    pub const fn pending_index(&self, supply: SupplyId) -> u8 {
        self.pending[supply.as_index()]
    }

    /// Enforced limit in milliamps.
    pub fn committed_milliamps(&self, supply: SupplyId) -> u16 {
        milliamps_for(self.committed_index(supply))
    }

    /// Limit being edited, in milliamps.
    pub fn pending_milliamps(&self, supply: SupplyId) -> u16 {
        milliamps_for(self.pending_index(supply))
    }

    /// Advances the pending limit of the selected supply, wrapping to the
    /// smallest value after the largest.
    pub fn increment(&mut self) {
        let slot = &mut self.pending[self.adjusting.as_index()];
        *slot = if *slot >= LAST_INDEX { 0 } else { *slot + 1 };
    }

    /// Steps the pending limit of the selected supply back, wrapping to the
    /// largest value before the smallest.
    pub fn decrement(&mut self) {
        let slot = &mut self.pending[self.adjusting.as_index()];
        *slot = if *slot == 0 { LAST_INDEX } else { *slot - 1 };
    }

    /// Commits the pending limits of both supplies.
    pub fn accept(&mut self) {
        self.committed = self.pending;
    }

    /// Discards edits and restores the pending limits from the committed ones.
    pub fn reject(&mut self) {
        self.pending = self.committed;
    }
}

impl Default for CurrentLimits {
    fn default() -> Self {
        Self::new()
    }
}

fn milliamps_for(index: u8) -> u16 {
    u16::from(CURRENT_LIMIT_VALUES[usize::from(index)]) * 10
}
