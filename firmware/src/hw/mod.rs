//! Board drivers behind the `supply-core` capability traits.

pub mod adc;
pub mod buttons;
pub mod ina219;
pub mod lcd;
pub mod outputs;
#[cfg(target_os = "none")]
pub mod system;
