//! Simulated bench hardware.
//!
//! One shared [`SimBench`] handle implements every board capability so the
//! session can adjust loads and read the LCD while the dispatcher owns the
//! board. Each regulator holds its set voltage until its shutdown line is
//! asserted, after which both sensor registers read zero.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use supply_core::config::{ADC_FULL_SCALE_MILLIVOLTS, ADC_STEPS};
use supply_core::display::{CURSOR_LEFT, CURSOR_RIGHT, DISPLAY_COLUMNS, DISPLAY_LINES};
use supply_core::hal::{
    ADC_CHANNEL_COUNT, AnalogInput, BUTTON_COUNT, ButtonId, ButtonInput, CurrentSensor,
    SUPPLY_COUNT, SensorConfig, ShutdownControl, SupplyId, SystemControl, TextSink,
};

/// Shunt register counts per milliamp with the default calibration.
const SHUNT_COUNTS_PER_MA: i32 = 33;
/// Highest load the simulated sensor can report without saturating.
pub const MAX_LOAD_MA: u16 = 3000;
/// Auxiliary input change per keypress.
pub const AUX_STEP_MV: u16 = 500;

/// 16x2 character display with HD44780 cursor semantics.
#[derive(Clone, Debug)]
pub struct VirtualLcd {
    cells: [[char; DISPLAY_COLUMNS]; DISPLAY_LINES],
    row: usize,
    col: usize,
}

impl Default for VirtualLcd {
    fn default() -> Self {
        Self {
            cells: [[' '; DISPLAY_COLUMNS]; DISPLAY_LINES],
            row: 0,
            col: 0,
        }
    }
}

impl VirtualLcd {
    /// One line with trailing blanks removed and the arrow glyphs mapped to
    /// terminal characters.
    pub fn line(&self, row: usize) -> String {
        let text: String = self.cells[row].iter().map(|c| glyph(*c)).collect();
        text.trim_end().to_string()
    }

    /// Both lines padded to the display width.
    pub fn frame(&self) -> [String; DISPLAY_LINES] {
        self.cells
            .map(|cells| cells.iter().map(|c| glyph(*c)).collect::<String>())
    }

    fn home(&mut self, row: usize) {
        self.row = row.min(DISPLAY_LINES - 1);
        self.col = 0;
    }
}

fn glyph(c: char) -> char {
    match c {
        CURSOR_RIGHT => '>',
        CURSOR_LEFT => '<',
        other => other,
    }
}

impl TextSink for VirtualLcd {
    fn clear(&mut self) {
        self.cells = [[' '; DISPLAY_COLUMNS]; DISPLAY_LINES];
        self.home(0);
    }

    fn clear_line(&mut self, line: u8) {
        self.home(usize::from(line));
        self.cells[self.row] = [' '; DISPLAY_COLUMNS];
    }

    fn set_line(&mut self, line: u8) {
        self.home(usize::from(line));
    }

    fn write_char(&mut self, c: char) {
        if let Some(cell) = self.cells[self.row].get_mut(self.col) {
            *cell = c;
        }
        self.col += 1;
    }
}

#[derive(Debug)]
pub struct SimState {
    /// Regulator output voltage while enabled.
    pub set_mv: [i16; SUPPLY_COUNT],
    pub load_ma: [u16; SUPPLY_COUNT],
    pub aux_mv: [u16; ADC_CHANNEL_COUNT],
    pub shutdown: [bool; SUPPLY_COUNT],
    pub status: bool,
    pub pressed: [bool; BUTTON_COUNT],
    pub configured: [Option<SensorConfig>; SUPPLY_COUNT],
    pub adc_channel: u8,
    pub conversion_pending: bool,
    pub lcd: VirtualLcd,
    /// Total time spent in blocking error holds.
    pub held_ms: u32,
    /// Sleep through error holds instead of only counting them.
    pub realtime: bool,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            set_mv: [5000, 3300],
            load_ma: [0; SUPPLY_COUNT],
            aux_mv: [0; ADC_CHANNEL_COUNT],
            shutdown: [false; SUPPLY_COUNT],
            status: false,
            pressed: [false; BUTTON_COUNT],
            configured: [None; SUPPLY_COUNT],
            adc_channel: 0,
            conversion_pending: false,
            lcd: VirtualLcd::default(),
            held_ms: 0,
            realtime: false,
        }
    }
}

impl SimState {
    fn output_enabled(&self, supply: SupplyId) -> bool {
        !self.shutdown[supply.as_index()]
    }
}

#[derive(Clone, Debug, Default)]
pub struct SimBench(Rc<RefCell<SimState>>);

impl SimBench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, SimState> {
        self.0.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, SimState> {
        self.0.borrow_mut()
    }

    /// Changes the load on one supply, clamped to the sensor range.
    pub fn adjust_load(&self, supply: SupplyId, delta_ma: i32) -> u16 {
        let mut state = self.state_mut();
        let load = &mut state.load_ma[supply.as_index()];
        let next = (i32::from(*load) + delta_ma).clamp(0, i32::from(MAX_LOAD_MA));
        *load = u16::try_from(next).unwrap_or(MAX_LOAD_MA);
        *load
    }

    /// Raises one auxiliary input by `AUX_STEP_MV`, wrapping to zero past
    /// full scale.
    pub fn step_aux(&self, channel: usize) -> u16 {
        let mut state = self.state_mut();
        let input = &mut state.aux_mv[channel % ADC_CHANNEL_COUNT];
        *input = if u32::from(*input) + u32::from(AUX_STEP_MV) > ADC_FULL_SCALE_MILLIVOLTS {
            0
        } else {
            *input + AUX_STEP_MV
        };
        *input
    }

    /// Clears and returns the pending-conversion flag.
    pub fn take_conversion(&self) -> bool {
        std::mem::take(&mut self.state_mut().conversion_pending)
    }

    pub fn line(&self, row: usize) -> String {
        self.state().lcd.line(row)
    }

    pub fn frame(&self) -> [String; DISPLAY_LINES] {
        self.state().lcd.frame()
    }
}

impl ShutdownControl for SimBench {
    fn set_shutdown(&mut self, supply: SupplyId, asserted: bool) {
        self.state_mut().shutdown[supply.as_index()] = asserted;
    }

    fn set_status(&mut self, asserted: bool) {
        self.state_mut().status = asserted;
    }
}

impl ButtonInput for SimBench {
    fn read_raw(&mut self, button: ButtonId) -> bool {
        self.state().pressed[button.as_index()]
    }
}

impl AnalogInput for SimBench {
    fn start_conversion(&mut self, channel: u8) {
        let mut state = self.state_mut();
        state.adc_channel = channel;
        state.conversion_pending = true;
    }

    fn last_conversion(&mut self) -> u16 {
        let state = self.state();
        let millivolts = state.aux_mv[usize::from(state.adc_channel) % ADC_CHANNEL_COUNT];
        let counts = u32::from(millivolts) * ADC_STEPS / ADC_FULL_SCALE_MILLIVOLTS;
        u16::try_from(counts.min(ADC_STEPS - 1)).unwrap_or(u16::MAX)
    }
}

/// The simulated sensors never fail.
#[derive(Debug)]
pub enum NoFault {}

impl CurrentSensor for SimBench {
    type Error = NoFault;

    fn configure(&mut self, supply: SupplyId, config: SensorConfig) -> Result<(), NoFault> {
        self.state_mut().configured[supply.as_index()] = Some(config);
        Ok(())
    }

    fn bus_millivolts(&mut self, supply: SupplyId) -> Result<i16, NoFault> {
        let state = self.state();
        Ok(if state.output_enabled(supply) {
            state.set_mv[supply.as_index()]
        } else {
            0
        })
    }

    fn shunt_millivolts(&mut self, supply: SupplyId) -> Result<i32, NoFault> {
        let state = self.state();
        Ok(if state.output_enabled(supply) {
            i32::from(state.load_ma[supply.as_index()]) * SHUNT_COUNTS_PER_MA
        } else {
            0
        })
    }
}

impl TextSink for SimBench {
    fn clear(&mut self) {
        self.state_mut().lcd.clear();
    }

    fn clear_line(&mut self, line: u8) {
        self.state_mut().lcd.clear_line(line);
    }

    fn set_line(&mut self, line: u8) {
        self.state_mut().lcd.set_line(line);
    }

    fn write_char(&mut self, c: char) {
        self.state_mut().lcd.write_char(c);
    }
}

impl SystemControl for SimBench {
    fn delay_ms(&mut self, millis: u32) {
        let realtime = {
            let mut state = self.state_mut();
            state.held_ms = state.held_ms.saturating_add(millis);
            state.realtime
        };
        if realtime {
            thread::sleep(Duration::from_millis(u64::from(millis)));
        }
    }

    fn halt(&mut self) -> ! {
        for line in self.frame() {
            eprintln!("|{line}|");
        }
        eprintln!("controller halted");
        std::process::exit(1);
    }
}
