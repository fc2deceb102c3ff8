//! HD44780 16x2 character LCD in 4-bit mode.
//!
//! The controller is driven write-only (R/W tied low), so every command is
//! followed by a fixed worst-case delay instead of a busy-flag poll.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use supply_core::display::DISPLAY_COLUMNS;
use supply_core::hal::TextSink;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM address of the first column of each line.
const LINE_OFFSETS: [u8; 2] = [0x00, 0x40];

const POWER_ON_DELAY_US: u32 = 50_000;
const COMMAND_DELAY_US: u32 = 50;
const CLEAR_DELAY_US: u32 = 2_000;

/// Register-select, enable, and the upper four data lines.
pub struct LcdPins<P> {
    pub rs: P,
    pub enable: P,
    pub data: [P; 4],
}

pub struct Hd44780<P, D> {
    pins: LcdPins<P>,
    delay: D,
}

impl<P, D> Hd44780<P, D>
where
    P: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    /// Runs the 4-bit initialisation sequence and clears the screen.
    pub fn new(pins: LcdPins<P>, delay: D) -> Self {
        let mut lcd = Self { pins, delay };
        lcd.init();
        lcd
    }

    fn init(&mut self) {
        self.delay.delay_us(POWER_ON_DELAY_US);
        self.set_register_select(false);

        // Force 8-bit mode three times, then drop to 4-bit.
        for wait in [4_100, 100, COMMAND_DELAY_US] {
            self.write_nibble(0x3);
            self.delay.delay_us(wait);
        }
        self.write_nibble(0x2);
        self.delay.delay_us(COMMAND_DELAY_US);

        self.command(CMD_FUNCTION_4BIT_2LINE);
        self.command(CMD_DISPLAY_ON);
        self.command(CMD_CLEAR);
        self.command(CMD_ENTRY_MODE_INCREMENT);
    }

    pub fn command(&mut self, command: u8) {
        self.set_register_select(false);
        self.write_byte(command);
        let wait = if command == CMD_CLEAR {
            CLEAR_DELAY_US
        } else {
            COMMAND_DELAY_US
        };
        self.delay.delay_us(wait);
    }

    pub fn data(&mut self, value: u8) {
        self.set_register_select(true);
        self.write_byte(value);
        self.delay.delay_us(COMMAND_DELAY_US);
    }

    fn write_byte(&mut self, value: u8) {
        self.write_nibble(value >> 4);
        self.write_nibble(value & 0x0F);
    }

    fn write_nibble(&mut self, nibble: u8) {
        for (bit, pin) in self.pins.data.iter_mut().enumerate() {
            let Ok(()) = pin.set_state(((nibble >> bit) & 1 == 1).into());
        }
        let Ok(()) = self.pins.enable.set_high();
        self.delay.delay_us(1);
        let Ok(()) = self.pins.enable.set_low();
        self.delay.delay_us(1);
    }

    fn set_register_select(&mut self, data: bool) {
        let Ok(()) = self.pins.rs.set_state(data.into());
    }
}

/// Maps a character onto the LCD character ROM. The arrow glyphs at 0x7E
/// and 0x7F pass through; anything outside printable ASCII becomes `?`.
pub fn rom_code(c: char) -> u8 {
    match u8::try_from(c) {
        Ok(code @ 0x20..=0x7F) => code,
        _ => b'?',
    }
}

impl<P, D> TextSink for Hd44780<P, D>
where
    P: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    fn clear(&mut self) {
        self.command(CMD_CLEAR);
    }

    fn clear_line(&mut self, line: u8) {
        self.set_line(line);
        for _ in 0..DISPLAY_COLUMNS {
            self.data(b' ');
        }
        self.set_line(line);
    }

    fn set_line(&mut self, line: u8) {
        let offset = LINE_OFFSETS[usize::from(line).min(LINE_OFFSETS.len() - 1)];
        self.command(CMD_SET_DDRAM | offset);
    }

    fn write_char(&mut self, c: char) {
        self.data(rom_code(c));
    }
}
