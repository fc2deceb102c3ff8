//! Hardware capabilities consumed by the controller core.
//!
//! Each trait covers one narrow collaborator (shutdown outputs, button
//! inputs, the ADC, the current sensors, the text display, and system
//! control). Firmware and emulator crates provide concrete implementations;
//! the no-op variants here keep bring-up builds and tests simple.

use core::convert::Infallible;

/// Number of regulated supplies on the board.
pub const SUPPLY_COUNT: usize = 2;
/// Number of momentary buttons on the front panel.
pub const BUTTON_COUNT: usize = 3;
/// Number of auxiliary analog inputs sampled round-robin.
pub const ADC_CHANNEL_COUNT: usize = 4;

/// Identifier for the two regulated outputs. Each supply has its own
/// current sensor at the same index.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SupplyId {
    A,
    B,
}

impl SupplyId {
    /// Every supply in index order.
    pub const ALL: [SupplyId; SUPPLY_COUNT] = [SupplyId::A, SupplyId::B];

    /// Deterministic index for per-supply arrays.
    pub const fn as_index(self) -> usize {
        match self {
            SupplyId::A => 0,
            SupplyId::B => 1,
        }
    }

    /// Attempts to construct a [`SupplyId`] from a raw index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SupplyId::A),
            1 => Some(SupplyId::B),
            _ => None,
        }
    }

    /// Upper-case letter used on the display (`A` or `B`).
    pub const fn label(self) -> char {
        match self {
            SupplyId::A => 'A',
            SupplyId::B => 'B',
        }
    }
}

/// Identifier for the front-panel buttons.
///
/// Button 0 is labelled UP, button 1 DOWN and button 2 SELECT.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonId {
    Up,
    Down,
    Select,
}

impl ButtonId {
    /// Every button in index order.
    pub const ALL: [ButtonId; BUTTON_COUNT] = [ButtonId::Up, ButtonId::Down, ButtonId::Select];

    /// Deterministic index used by menu button tables.
    pub const fn as_index(self) -> usize {
        match self {
            ButtonId::Up => 0,
            ButtonId::Down => 1,
            ButtonId::Select => 2,
        }
    }

    /// Attempts to construct a [`ButtonId`] from a raw index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ButtonId::Up),
            1 => Some(ButtonId::Down),
            2 => Some(ButtonId::Select),
            _ => None,
        }
    }
}

/// Bus voltage range programmed into a current sensor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BusRange {
    Range16V,
    Range32V,
}

/// Startup configuration for one current sensor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SensorConfig {
    pub address: u8,
    pub range: BusRange,
}

impl SensorConfig {
    pub const fn new(address: u8, range: BusRange) -> Self {
        Self { address, range }
    }
}

/// Digital outputs driving the regulator shutdown pins and the status LED.
pub trait ShutdownControl {
    /// Asserts or releases the shutdown line of one supply.
    fn set_shutdown(&mut self, supply: SupplyId, asserted: bool);

    /// Drives the front-panel status indicator.
    fn set_status(&mut self, asserted: bool);
}

/// Raw access to the button lines. `true` means the button is pressed,
/// regardless of the electrical polarity.
pub trait ButtonInput {
    fn read_raw(&mut self, button: ButtonId) -> bool;
}

/// Single-conversion ADC access.
pub trait AnalogInput {
    /// Starts a conversion on `channel`. Completion is signalled out of band.
    fn start_conversion(&mut self, channel: u8);

    /// Returns the result of the most recent conversion (10-bit).
    fn last_conversion(&mut self) -> u16;
}

/// Register-level access to the current sensors, addressed by supply.
pub trait CurrentSensor {
    /// Transport-specific error type.
    type Error;

    /// Programs address and range. Called once at startup.
    fn configure(&mut self, supply: SupplyId, config: SensorConfig) -> Result<(), Self::Error>;

    /// Reads the bus voltage in millivolts.
    fn bus_millivolts(&mut self, supply: SupplyId) -> Result<i16, Self::Error>;

    /// Reads the raw shunt-voltage register. Negative values indicate reverse
    /// current and are clamped by the caller.
    fn shunt_millivolts(&mut self, supply: SupplyId) -> Result<i32, Self::Error>;
}

/// Character-cell text output.
pub trait TextSink {
    /// Clears the whole display and homes the cursor.
    fn clear(&mut self);

    /// Blanks one line and leaves the cursor at its first column.
    fn clear_line(&mut self, line: u8);

    /// Moves the cursor to the first column of `line`.
    fn set_line(&mut self, line: u8);

    /// Writes one character code at the cursor.
    fn write_char(&mut self, c: char);

    /// Writes text at the cursor.
    fn write_text(&mut self, text: &str) {
        for c in text.chars() {
            self.write_char(c);
        }
    }

    /// Writes a decimal number at the cursor.
    fn write_number(&mut self, value: i32) {
        let mut digits = ['0'; 10];
        let mut count = 0;
        let mut remaining = value.unsigned_abs();
        if value < 0 {
            self.write_char('-');
        }
        loop {
            digits[count] = char::from_digit(remaining % 10, 10).unwrap_or('0');
            count += 1;
            remaining /= 10;
            if remaining == 0 {
                break;
            }
        }
        for digit in digits[..count].iter().rev() {
            self.write_char(*digit);
        }
    }
}

/// Blocking delays and the terminal halt used by the error console.
pub trait SystemControl {
    /// Busy-waits for the given number of milliseconds.
    fn delay_ms(&mut self, millis: u32);

    /// Stops the controller permanently. Reached only after a fatal error.
    fn halt(&mut self) -> !;
}

/// Shutdown outputs that perform no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopShutdown;

impl NoopShutdown {
    pub const fn new() -> Self {
        Self
    }
}

impl ShutdownControl for NoopShutdown {
    fn set_shutdown(&mut self, _: SupplyId, _: bool) {}

    fn set_status(&mut self, _: bool) {}
}

/// Button lines that are never pressed.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopButtons;

impl ButtonInput for NoopButtons {
    fn read_raw(&mut self, _: ButtonId) -> bool {
        false
    }
}

/// ADC that always converts to zero.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopAnalog;

impl AnalogInput for NoopAnalog {
    fn start_conversion(&mut self, _: u8) {}

    fn last_conversion(&mut self) -> u16 {
        0
    }
}

/// Current sensor that reports an idle, unloaded supply.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSensor;

impl CurrentSensor for NoopSensor {
    type Error = Infallible;

    fn configure(&mut self, _: SupplyId, _: SensorConfig) -> Result<(), Self::Error> {
        Ok(())
    }

    fn bus_millivolts(&mut self, _: SupplyId) -> Result<i16, Self::Error> {
        Ok(0)
    }

    fn shunt_millivolts(&mut self, _: SupplyId) -> Result<i32, Self::Error> {
        Ok(0)
    }
}

/// Text sink that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopTextSink;

impl TextSink for NoopTextSink {
    fn clear(&mut self) {}

    fn clear_line(&mut self, _: u8) {}

    fn set_line(&mut self, _: u8) {}

    fn write_char(&mut self, _: char) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    struct Capture(String<32>);

    impl TextSink for Capture {
        fn clear(&mut self) {
            self.0.clear();
        }

        fn clear_line(&mut self, _: u8) {}

        fn set_line(&mut self, _: u8) {}

        fn write_char(&mut self, c: char) {
            self.0.push(c).unwrap();
        }
    }

    #[test]
    fn ids_round_trip_through_indices() {
        for supply in SupplyId::ALL {
            assert_eq!(SupplyId::from_index(supply.as_index()), Some(supply));
        }
        for button in ButtonId::ALL {
            assert_eq!(ButtonId::from_index(button.as_index()), Some(button));
        }
        assert_eq!(SupplyId::from_index(2), None);
        assert_eq!(ButtonId::from_index(3), None);
    }

    #[test]
    fn default_write_number_handles_sign_and_zero() {
        let mut sink = Capture(String::new());
        sink.write_number(0);
        sink.write_char(' ');
        sink.write_number(1000);
        sink.write_char(' ');
        sink.write_number(-42);
        assert_eq!(sink.0.as_str(), "0 1000 -42");
    }
}
