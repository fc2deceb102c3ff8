//! Analog sampling and current limiting.
//!
//! The engine owns the ADC averaging state, the latest current-sensor
//! readings, and the overcurrent guard. It never touches hardware on its own:
//! callers pass the sensor, ADC, and shutdown collaborators into each
//! operation so the dispatcher keeps exclusive ownership of the board.

use core::fmt;

use heapless::Vec;

use crate::config::{ControllerConfig, ShuntCalibration};
use crate::hal::{
    ADC_CHANNEL_COUNT, AnalogInput, CurrentSensor, SUPPLY_COUNT, SensorConfig, ShutdownControl,
    SupplyId,
};
use crate::limits::CurrentLimits;

pub mod adc;
pub mod overcurrent;

pub use adc::{AdcAverager, FoldOutcome, OutOfRange, average_millivolts};
pub use overcurrent::{GuardVerdict, OvercurrentGuard};

/// Failure talking to a current sensor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SamplingError<E> {
    /// Startup configuration was rejected.
    Configure { supply: SupplyId, error: E },
    /// A register read failed during a poll.
    Read { supply: SupplyId, error: E },
}

impl<E> SamplingError<E> {
    pub const fn supply(&self) -> SupplyId {
        match self {
            SamplingError::Configure { supply, .. } | SamplingError::Read { supply, .. } => *supply,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for SamplingError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingError::Configure { supply, error } => {
                write!(f, "sensor {} configure failed: {error:?}", supply.label())
            }
            SamplingError::Read { supply, error } => {
                write!(f, "sensor {} read failed: {error:?}", supply.label())
            }
        }
    }
}

/// Latest values reported by one supply's current sensor.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SensorReading {
    pub bus_millivolts: i16,
    /// Shunt current in tenths of a milliamp.
    pub shunt_current: i16,
}

/// Snapshot of every value the display can render.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Readings {
    pub supplies: [SensorReading; SUPPLY_COUNT],
    pub adc_millivolts: [u16; ADC_CHANNEL_COUNT],
}

/// Outcome of one sensor poll.
#[derive(Clone, Debug)]
pub struct SensorPoll<E> {
    /// A displayed value differs from the previous poll.
    pub changed: bool,
    /// Supplies whose shutdown latched during this poll.
    pub tripped: [bool; SUPPLY_COUNT],
    /// Read failures; the affected supply keeps its previous values.
    pub errors: Vec<SamplingError<E>, SUPPLY_COUNT>,
}

impl<E> SensorPoll<E> {
    fn new() -> Self {
        Self {
            changed: false,
            tripped: [false; SUPPLY_COUNT],
            errors: Vec::new(),
        }
    }

    pub fn any_tripped(&self) -> bool {
        self.tripped.iter().any(|tripped| *tripped)
    }
}

/// Outcome of folding one ADC conversion.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ConversionFold {
    pub outcome: FoldOutcome,
    pub out_of_range: Option<OutOfRange>,
}

impl ConversionFold {
    /// A published average differs from the previous window.
    pub const fn changed(&self) -> bool {
        matches!(self.outcome, FoldOutcome::Published { changed: true })
    }
}

#[derive(Clone, Debug)]
pub struct SamplingEngine {
    adc: AdcAverager,
    sensors: [SensorReading; SUPPLY_COUNT],
    guard: OvercurrentGuard,
    calibration: ShuntCalibration,
}

impl SamplingEngine {
    pub const fn new(config: &ControllerConfig) -> Self {
        Self {
            adc: AdcAverager::new(config.adc_window, config.adc_full_scale_mv),
            sensors: [SensorReading {
                bus_millivolts: 0,
                shunt_current: 0,
            }; SUPPLY_COUNT],
            guard: OvercurrentGuard::new(config.trip_threshold),
            calibration: config.calibration,
        }
    }

    pub const fn adc(&self) -> &AdcAverager {
        &self.adc
    }

    pub const fn guard(&self) -> &OvercurrentGuard {
        &self.guard
    }

    pub const fn reading(&self, supply: SupplyId) -> SensorReading {
        self.sensors[supply.as_index()]
    }

    /// Values the display composer renders.
    pub const fn readings(&self) -> Readings {
        Readings {
            supplies: self.sensors,
            adc_millivolts: self.adc.all_millivolts(),
        }
    }

    /// Programs every sensor. Stops at the first failure.
    pub fn configure_sensors<S: CurrentSensor>(
        &mut self,
        sensor: &mut S,
        configs: &[SensorConfig; SUPPLY_COUNT],
    ) -> Result<(), SamplingError<S::Error>> {
        for supply in SupplyId::ALL {
            sensor
                .configure(supply, configs[supply.as_index()])
                .map_err(|error| SamplingError::Configure { supply, error })?;
        }
        Ok(())
    }

    /// Kicks off the first conversion of the round-robin.
    pub fn start<A: AnalogInput>(&self, adc: &mut A) {
        adc.start_conversion(self.adc.channel());
    }

    /// Reads both sensors, updates readings, and applies the overcurrent
    /// policy against the committed limits.
    pub fn poll_sensors<S, O>(
        &mut self,
        sensor: &mut S,
        outputs: &mut O,
        limits: &CurrentLimits,
    ) -> SensorPoll<S::Error>
    where
        S: CurrentSensor,
        O: ShutdownControl,
    {
        let mut poll = SensorPoll::new();

        for supply in SupplyId::ALL {
            let index = supply.as_index();
            let sample = sensor.bus_millivolts(supply).and_then(|bus| {
                let shunt = sensor.shunt_millivolts(supply)?;
                Ok((bus, shunt))
            });

            let (bus, shunt) = match sample {
                Ok(values) => values,
                Err(error) => {
                    // At most one error per supply, so the push cannot fail.
                    let _ = poll.errors.push(SamplingError::Read { supply, error });
                    continue;
                }
            };

            let current = self.calibration.apply(shunt);
            let reading = SensorReading {
                bus_millivolts: bus,
                shunt_current: i16::try_from(current).unwrap_or(i16::MAX),
            };
            if reading != self.sensors[index] {
                self.sensors[index] = reading;
                poll.changed = true;
            }

            let limit = limits.committed_milliamps(supply);
            if self.guard.observe(supply, current, limit) == GuardVerdict::Tripped {
                outputs.set_shutdown(supply, true);
                outputs.set_status(true);
                poll.tripped[index] = true;
            }
        }

        poll
    }

    /// Folds the finished conversion and starts the next one.
    pub fn fold_conversion<A: AnalogInput>(&mut self, adc: &mut A) -> ConversionFold {
        let raw = adc.last_conversion();
        let (outcome, out_of_range) = self.adc.fold(raw);
        adc.start_conversion(self.adc.channel());
        ConversionFold {
            outcome,
            out_of_range,
        }
    }

    /// Clears any latched shutdown and releases every output.
    pub fn reset_shutdown<O: ShutdownControl>(&mut self, outputs: &mut O) {
        self.guard.reset();
        for supply in SupplyId::ALL {
            outputs.set_shutdown(supply, false);
        }
        outputs.set_status(false);
    }
}

impl Default for SamplingEngine {
    fn default() -> Self {
        Self::new(&ControllerConfig::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FixedSensor {
        bus: [i16; SUPPLY_COUNT],
        shunt: [i32; SUPPLY_COUNT],
        fail: [bool; SUPPLY_COUNT],
    }

    impl CurrentSensor for FixedSensor {
        type Error = ();

        fn configure(&mut self, supply: SupplyId, _: SensorConfig) -> Result<(), ()> {
            if self.fail[supply.as_index()] { Err(()) } else { Ok(()) }
        }

        fn bus_millivolts(&mut self, supply: SupplyId) -> Result<i16, ()> {
            if self.fail[supply.as_index()] {
                Err(())
            } else {
                Ok(self.bus[supply.as_index()])
            }
        }

        fn shunt_millivolts(&mut self, supply: SupplyId) -> Result<i32, ()> {
            Ok(self.shunt[supply.as_index()])
        }
    }

    #[derive(Default)]
    struct Outputs {
        shutdown: [bool; SUPPLY_COUNT],
        status: bool,
    }

    impl ShutdownControl for Outputs {
        fn set_shutdown(&mut self, supply: SupplyId, asserted: bool) {
            self.shutdown[supply.as_index()] = asserted;
        }

        fn set_status(&mut self, asserted: bool) {
            self.status = asserted;
        }
    }

    #[test]
    fn poll_converts_shunt_and_reports_changes() {
        let mut engine = SamplingEngine::default();
        let mut sensor = FixedSensor {
            bus: [5012, 3300],
            shunt: [-20, 330],
            ..FixedSensor::default()
        };
        let mut outputs = Outputs::default();
        let limits = CurrentLimits::new();

        let poll = engine.poll_sensors(&mut sensor, &mut outputs, &limits);
        assert!(poll.changed);
        assert!(poll.errors.is_empty());
        assert_eq!(engine.reading(SupplyId::A).shunt_current, 0);
        assert_eq!(engine.reading(SupplyId::B).shunt_current, 100);
        assert_eq!(engine.reading(SupplyId::B).bus_millivolts, 3300);

        let poll = engine.poll_sensors(&mut sensor, &mut outputs, &limits);
        assert!(!poll.changed);
    }

    #[test]
    fn failed_read_keeps_previous_values() {
        let mut engine = SamplingEngine::default();
        let mut sensor = FixedSensor {
            bus: [1000, 2000],
            ..FixedSensor::default()
        };
        let mut outputs = Outputs::default();
        let limits = CurrentLimits::new();
        engine.poll_sensors(&mut sensor, &mut outputs, &limits);

        sensor.fail[1] = true;
        sensor.bus = [1000, 9999];
        let poll = engine.poll_sensors(&mut sensor, &mut outputs, &limits);
        assert_eq!(
            poll.errors.as_slice(),
            &[SamplingError::Read {
                supply: SupplyId::B,
                error: ()
            }]
        );
        assert_eq!(engine.reading(SupplyId::B).bus_millivolts, 2000);
    }

    #[test]
    fn trip_asserts_shutdown_and_status_until_reset() {
        let mut engine = SamplingEngine::default();
        let mut limits = CurrentLimits::new();
        limits.select(SupplyId::A);
        limits.increment();
        limits.accept();
        assert_eq!(limits.committed_milliamps(SupplyId::A), 10);

        // 1000 raw => 303 tenths of a milliamp, over the 100-tenth limit.
        let mut sensor = FixedSensor {
            shunt: [1000, 0],
            ..FixedSensor::default()
        };
        let mut outputs = Outputs::default();

        for _ in 0..3 {
            let poll = engine.poll_sensors(&mut sensor, &mut outputs, &limits);
            assert!(!poll.any_tripped());
        }
        let poll = engine.poll_sensors(&mut sensor, &mut outputs, &limits);
        assert_eq!(poll.tripped, [true, false]);
        assert_eq!(outputs.shutdown, [true, false]);
        assert!(outputs.status);

        engine.reset_shutdown(&mut outputs);
        assert_eq!(outputs.shutdown, [false, false]);
        assert!(!outputs.status);
        assert!(!engine.guard().any_latched());
    }

    #[test]
    fn configure_reports_failing_supply() {
        let mut engine = SamplingEngine::default();
        let mut sensor = FixedSensor::default();
        sensor.fail[1] = true;
        let configs = ControllerConfig::DEFAULT.sensors;

        let error = engine
            .configure_sensors(&mut sensor, &configs)
            .expect_err("sensor B should fail");
        assert_eq!(error.supply(), SupplyId::B);
    }
}
