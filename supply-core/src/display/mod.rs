//! Two-line display composition.
//!
//! The composer decides what the 16x2 character display shows while the
//! menu is not overriding it. Each line renders one [`LineDisplayMode`]; a
//! dirty flag tracks whether the last redraw is stale, so readings that
//! leave the rendered text unchanged never cost a redraw.

use core::fmt::{self, Write};

use heapless::String;

use crate::hal::{SupplyId, TextSink};
use crate::sampling::Readings;

pub mod fixed;

pub use fixed::FixedPoint;

/// Characters per display line.
pub const DISPLAY_COLUMNS: usize = 16;
/// Number of display lines.
pub const DISPLAY_LINES: usize = 2;

/// Right-arrow glyph in the HD44780 character ROM.
pub const CURSOR_RIGHT: char = '\u{7e}';
/// Left-arrow glyph in the HD44780 character ROM.
pub const CURSOR_LEFT: char = '\u{7f}';

/// One composed display line.
pub type LineBuffer = String<DISPLAY_COLUMNS>;

/// Physical display line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DisplayLine {
    Top,
    Bottom,
}

impl DisplayLine {
    pub const ALL: [DisplayLine; DISPLAY_LINES] = [DisplayLine::Top, DisplayLine::Bottom];

    pub const fn as_index(self) -> usize {
        match self {
            DisplayLine::Top => 0,
            DisplayLine::Bottom => 1,
        }
    }

    pub const fn row(self) -> u8 {
        match self {
            DisplayLine::Top => 0,
            DisplayLine::Bottom => 1,
        }
    }
}

/// Reading pair rendered on one line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineDisplayMode {
    /// Supply A voltage and current.
    SupplyA,
    /// Supply B voltage and current.
    SupplyB,
    /// Currents of both supplies.
    Currents,
    /// Auxiliary inputs 1 and 2.
    Inputs12,
    /// Auxiliary inputs 3 and 4.
    Inputs34,
}

impl LineDisplayMode {
    /// Next mode in the cycle, wrapping after the last.
    pub const fn next(self) -> Self {
        match self {
            LineDisplayMode::SupplyA => LineDisplayMode::SupplyB,
            LineDisplayMode::SupplyB => LineDisplayMode::Currents,
            LineDisplayMode::Currents => LineDisplayMode::Inputs12,
            LineDisplayMode::Inputs12 => LineDisplayMode::Inputs34,
            LineDisplayMode::Inputs34 => LineDisplayMode::SupplyA,
        }
    }
}

/// Which quantity the current-limit screen marks as editable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LimitCursor {
    None,
    Supply,
    Value,
}

#[derive(Clone, Debug)]
pub struct DisplayComposer {
    modes: [LineDisplayMode; DISPLAY_LINES],
    /// Text of each line as of the last redraw.
    shown: [LineBuffer; DISPLAY_LINES],
    dirty: bool,
    enabled: bool,
}

impl DisplayComposer {
    /// Starts dirty with the passive display disabled; the menu enables it
    /// once the startup banner has been shown.
    pub const fn new() -> Self {
        Self {
            modes: [LineDisplayMode::SupplyA, LineDisplayMode::SupplyB],
            shown: [String::new(), String::new()],
            dirty: true,
            enabled: false,
        }
    }

    pub const fn mode(&self, line: DisplayLine) -> LineDisplayMode {
        self.modes[line.as_index()]
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the passive reading display owns the screen.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Marks the display dirty when `readings` change the text of a line
    /// the current modes render. Returns whether anything went stale.
    pub fn observe(&mut self, readings: &Readings) -> bool {
        let stale = DisplayLine::ALL.into_iter().any(|line| {
            compose_line(self.mode(line), readings) != self.shown[line.as_index()]
        });
        if stale {
            self.dirty = true;
        }
        stale
    }

    /// Hands the screen back to the passive display and forces a redraw.
    pub fn enable_readings(&mut self) {
        self.enabled = true;
        self.dirty = true;
    }

    /// Lets the menu own the screen.
    pub fn suppress(&mut self) {
        self.enabled = false;
    }

    /// Cycles the mode of one line.
    pub fn advance_line(&mut self, line: DisplayLine) {
        let slot = &mut self.modes[line.as_index()];
        *slot = slot.next();
        self.dirty = true;
    }

    /// Redraws both lines when dirty and enabled. Returns whether the sink
    /// was touched.
    pub fn redraw<T: TextSink>(&mut self, sink: &mut T, readings: &Readings) -> bool {
        if !self.enabled || !self.dirty {
            return false;
        }

        sink.clear();
        for line in DisplayLine::ALL {
            let text = compose_line(self.mode(line), readings);
            sink.set_line(line.row());
            sink.write_text(&text);
            self.shown[line.as_index()] = text;
        }
        self.dirty = false;
        true
    }

    /// Replaces the screen with menu text. A `\n` starts the second line.
    pub fn show_text<T: TextSink>(&mut self, sink: &mut T, text: &str) {
        self.suppress();
        sink.clear();
        for (line, part) in DisplayLine::ALL.iter().zip(text.split('\n')) {
            sink.set_line(line.row());
            sink.write_text(part);
        }
    }

    /// Renders the current-limit editor on the bottom line.
    pub fn show_limit<T: TextSink>(
        &mut self,
        sink: &mut T,
        supply: SupplyId,
        milliamps: u16,
        cursor: LimitCursor,
    ) {
        self.suppress();
        sink.clear_line(DisplayLine::Bottom.row());
        sink.write_char(if cursor == LimitCursor::Supply {
            CURSOR_RIGHT
        } else {
            ' '
        });
        sink.write_char(supply.label());
        sink.write_char(':');
        sink.write_number(i32::from(milliamps));
        sink.write_text("ma");
        sink.write_char(if cursor == LimitCursor::Value {
            CURSOR_LEFT
        } else {
            ' '
        });
    }
}

impl Default for DisplayComposer {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats one line for `mode`, truncated to the display width.
pub fn compose_line(mode: LineDisplayMode, readings: &Readings) -> LineBuffer {
    let mut line = LineBuffer::new();
    let mut out = Truncating(&mut line);
    // Truncating never reports an error.
    let _ = match mode {
        LineDisplayMode::SupplyA => supply_line(&mut out, SupplyId::A, readings),
        LineDisplayMode::SupplyB => supply_line(&mut out, SupplyId::B, readings),
        LineDisplayMode::Currents => write!(
            out,
            "A:{}ma B:{}ma",
            current(readings, SupplyId::A),
            current(readings, SupplyId::B)
        ),
        LineDisplayMode::Inputs12 => inputs_line(&mut out, 0, 1, readings),
        LineDisplayMode::Inputs34 => inputs_line(&mut out, 2, 3, readings),
    };
    line
}

fn supply_line(out: &mut impl Write, supply: SupplyId, readings: &Readings) -> fmt::Result {
    let reading = readings.supplies[supply.as_index()];
    write!(
        out,
        "{}:{}v {}ma",
        supply.label(),
        FixedPoint::new(i32::from(reading.bus_millivolts), 1000).digits(2),
        current(readings, supply)
    )
}

fn inputs_line(out: &mut impl Write, first: usize, second: usize, readings: &Readings) -> fmt::Result {
    write!(
        out,
        "{}:{}v {}:{}v",
        input_label(first),
        FixedPoint::new(i32::from(readings.adc_millivolts[first]), 1000).digits(2),
        input_label(second),
        FixedPoint::new(i32::from(readings.adc_millivolts[second]), 1000).digits(2),
    )
}

fn current(readings: &Readings, supply: SupplyId) -> FixedPoint {
    FixedPoint::new(
        i32::from(readings.supplies[supply.as_index()].shunt_current),
        10,
    )
    .digits(1)
}

fn input_label(channel: usize) -> char {
    match channel {
        0 => 'a',
        1 => 'b',
        2 => 'c',
        _ => 'd',
    }
}

/// Writer that silently drops characters past the line width.
struct Truncating<'a>(&'a mut LineBuffer);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}
