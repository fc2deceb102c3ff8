//! Compile-time configuration for the controller.
//!
//! Timing parameters, sampling constants, and sensor wiring live here so
//! they can be tuned in one place. [`ControllerConfig::DEFAULT`] bundles them
//! for the dispatcher; hosts may override individual fields.

use core::time::Duration;

use crate::hal::{BusRange, SUPPLY_COUNT, SensorConfig};

/// Period of the repeating timer that triggers sensor polls.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(100);

/// Samples accumulated per ADC channel before an average is published.
pub const ADC_AVERAGE_WINDOW: u16 = 16;

/// Millivolts represented by a full-scale ADC conversion.
pub const ADC_FULL_SCALE_MILLIVOLTS: u32 = 5000;

/// Number of distinct codes produced by the 10-bit ADC.
pub const ADC_STEPS: u32 = 1024;

/// Consecutive over-limit polls tolerated before a supply is shut down.
pub const OVERCURRENT_TRIP_THRESHOLD: u8 = 3;

/// Consecutive identical button scans required before an edge is reported.
pub const DEBOUNCE_SAMPLES: u8 = 4;

/// Interval between button scans.
pub const BUTTON_SCAN_PERIOD: Duration = Duration::from_millis(5);

/// How long a Note or Warning stays on screen before normal operation resumes.
pub const ERROR_HOLD: Duration = Duration::from_millis(1000);

/// I2C address of the sensor on supply A (variable output).
pub const SENSOR_A_ADDRESS: u8 = 0x40;
/// I2C address of the sensor on supply B (switchable output).
pub const SENSOR_B_ADDRESS: u8 = 0x41;

/// Linear transform from the raw shunt register to tenths of a milliamp.
///
/// `current = (shunt * numerator + bias) / divisor`
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ShuntCalibration {
    pub numerator: i32,
    pub bias: i32,
    pub divisor: i32,
}

impl ShuntCalibration {
    /// Calibration for the 33 mOhm sense resistors fitted on the board.
    pub const DEFAULT: Self = Self {
        numerator: 100,
        bias: 165,
        divisor: 330,
    };

    /// Converts a raw shunt reading, clamping reverse current to zero.
    pub fn apply(&self, shunt: i32) -> i32 {
        let clamped = shunt.max(0);
        (clamped * self.numerator + self.bias) / self.divisor
    }
}

/// Runtime view of the controller configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    pub tick_period: Duration,
    pub adc_window: u16,
    pub adc_full_scale_mv: u32,
    pub calibration: ShuntCalibration,
    pub trip_threshold: u8,
    pub debounce_samples: u8,
    pub scan_period: Duration,
    pub error_hold: Duration,
    pub sensors: [SensorConfig; SUPPLY_COUNT],
}

impl ControllerConfig {
    pub const DEFAULT: Self = Self {
        tick_period: DEFAULT_TICK_PERIOD,
        adc_window: ADC_AVERAGE_WINDOW,
        adc_full_scale_mv: ADC_FULL_SCALE_MILLIVOLTS,
        calibration: ShuntCalibration::DEFAULT,
        trip_threshold: OVERCURRENT_TRIP_THRESHOLD,
        debounce_samples: DEBOUNCE_SAMPLES,
        scan_period: BUTTON_SCAN_PERIOD,
        error_hold: ERROR_HOLD,
        sensors: [
            SensorConfig::new(SENSOR_A_ADDRESS, BusRange::Range16V),
            SensorConfig::new(SENSOR_B_ADDRESS, BusRange::Range16V),
        ],
    };

    /// Returns a copy with a different tick period.
    #[must_use]
    pub const fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    /// Returns a copy with a different debounce sample count.
    #[must_use]
    pub const fn with_debounce_samples(mut self, samples: u8) -> Self {
        self.debounce_samples = samples;
        self
    }

    /// Converts a pause in milliseconds to dispatcher ticks, rounding up so a
    /// pause never ends early. Every pause lasts at least one tick.
    pub fn pause_ticks(&self, pause_ms: u16) -> u16 {
        ticks_for(pause_ms, self.tick_period)
    }

    /// Error hold time in whole milliseconds.
    pub fn error_hold_ms(&self) -> u32 {
        u32::try_from(self.error_hold.as_millis()).unwrap_or(u32::MAX)
    }
}

/// Number of `tick_period` ticks covering `pause_ms`, rounded up, at least one.
pub fn ticks_for(pause_ms: u16, tick_period: Duration) -> u16 {
    let period = tick_period.as_millis().max(1);
    let ticks = u128::from(pause_ms).div_ceil(period).max(1);
    u16::try_from(ticks).unwrap_or(u16::MAX)
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
