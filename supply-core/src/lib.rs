#![no_std]

// Shared logic for the bench power-supply controller.
//
// Everything here stays portable across the MCU firmware and the host
// emulator: hardware is reached only through the capability traits in `hal`,
// and all storage is fixed-capacity.

pub mod app;
pub mod buttons;
pub mod config;
pub mod dispatcher;
pub mod display;
pub mod errors;
pub mod hal;
pub mod limits;
pub mod menu;
pub mod sampling;
pub mod signals;
