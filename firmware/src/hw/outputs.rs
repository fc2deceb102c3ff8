//! Regulator shutdown lines and the status LED.
//!
//! Both regulators shut down while their line is driven high. The LED is
//! lit while any supply is latched off.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use supply_core::hal::{SUPPLY_COUNT, ShutdownControl, SupplyId};

pub struct ShutdownOutputs<P> {
    shutdown: [P; SUPPLY_COUNT],
    status: P,
}

impl<P: OutputPin<Error = Infallible>> ShutdownOutputs<P> {
    /// Takes ownership of the pins and releases every line.
    pub fn new(shutdown: [P; SUPPLY_COUNT], status: P) -> Self {
        let mut outputs = Self { shutdown, status };
        for supply in SupplyId::ALL {
            outputs.set_shutdown(supply, false);
        }
        outputs.set_status(false);
        outputs
    }
}

impl<P: OutputPin<Error = Infallible>> ShutdownControl for ShutdownOutputs<P> {
    fn set_shutdown(&mut self, supply: SupplyId, asserted: bool) {
        let Ok(()) = self.shutdown[supply.as_index()].set_state(asserted.into());
    }

    fn set_status(&mut self, asserted: bool) {
        let Ok(()) = self.status.set_state(asserted.into());
    }
}
