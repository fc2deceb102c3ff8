//! Blocking delay and terminal halt for the error console.

use embassy_time::{Duration, block_for};
use supply_core::hal::SystemControl;

pub struct BoardSystem;

impl SystemControl for BoardSystem {
    fn delay_ms(&mut self, millis: u32) {
        block_for(Duration::from_millis(u64::from(millis)));
    }

    fn halt(&mut self) -> ! {
        defmt::error!("fatal error, controller halted");
        loop {
            cortex_m::asm::wfi();
        }
    }
}
