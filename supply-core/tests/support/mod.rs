#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use supply_core::app::Board;
use supply_core::buttons::ButtonEvent;
use supply_core::config::ControllerConfig;
use supply_core::dispatcher::{Event, EventDispatcher, PassSummary};
use supply_core::hal::{
    ADC_CHANNEL_COUNT, AnalogInput, ButtonId, CurrentSensor, SUPPLY_COUNT, SensorConfig,
    ShutdownControl, SupplyId, SystemControl, TextSink,
};

/// Observable state of the simulated bench.
#[derive(Debug, Default)]
pub struct BenchState {
    pub shutdown: [bool; SUPPLY_COUNT],
    pub status: bool,
    pub configured: Vec<(SupplyId, SensorConfig)>,
    pub fail_config: [bool; SUPPLY_COUNT],
    pub fail_read: [bool; SUPPLY_COUNT],
    pub bus_mv: [i16; SUPPLY_COUNT],
    pub shunt_raw: [i32; SUPPLY_COUNT],
    pub adc_raw: [u16; ADC_CHANNEL_COUNT],
    pub adc_channel: Option<u8>,
    pub conversions_started: usize,
    pub lines: [Vec<char>; 2],
    pub row: usize,
    pub col: usize,
    pub clears: usize,
    pub delays: Vec<u32>,
}

/// Shared handle that implements every board capability, so tests can keep a
/// clone and inspect the hardware the dispatcher owns.
#[derive(Clone, Debug, Default)]
pub struct Bench(Rc<RefCell<BenchState>>);

impl Bench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::cell::RefMut<'_, BenchState> {
        self.0.borrow_mut()
    }

    pub fn line(&self, row: usize) -> String {
        self.0.borrow().lines[row].iter().collect()
    }

    pub fn board(&self) -> Board<Bench, Bench, Bench, Bench> {
        Board::new(self.clone(), self.clone(), self.clone(), self.clone())
    }
}

impl ShutdownControl for Bench {
    fn set_shutdown(&mut self, supply: SupplyId, asserted: bool) {
        self.state().shutdown[supply.as_index()] = asserted;
    }

    fn set_status(&mut self, asserted: bool) {
        self.state().status = asserted;
    }
}

impl AnalogInput for Bench {
    fn start_conversion(&mut self, channel: u8) {
        let mut state = self.state();
        state.adc_channel = Some(channel);
        state.conversions_started += 1;
    }

    fn last_conversion(&mut self) -> u16 {
        let state = self.state();
        let channel = usize::from(state.adc_channel.expect("conversion was started"));
        state.adc_raw[channel]
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct BusFault;

impl CurrentSensor for Bench {
    type Error = BusFault;

    fn configure(&mut self, supply: SupplyId, config: SensorConfig) -> Result<(), BusFault> {
        let mut state = self.state();
        if state.fail_config[supply.as_index()] {
            return Err(BusFault);
        }
        state.configured.push((supply, config));
        Ok(())
    }

    fn bus_millivolts(&mut self, supply: SupplyId) -> Result<i16, BusFault> {
        let state = self.state();
        if state.fail_read[supply.as_index()] {
            return Err(BusFault);
        }
        Ok(state.bus_mv[supply.as_index()])
    }

    fn shunt_millivolts(&mut self, supply: SupplyId) -> Result<i32, BusFault> {
        Ok(self.state().shunt_raw[supply.as_index()])
    }
}

impl TextSink for Bench {
    fn clear(&mut self) {
        let mut state = self.state();
        state.lines = Default::default();
        state.row = 0;
        state.col = 0;
        state.clears += 1;
    }

    fn clear_line(&mut self, line: u8) {
        let mut state = self.state();
        state.row = usize::from(line);
        state.col = 0;
        let row = state.row;
        state.lines[row].clear();
    }

    fn set_line(&mut self, line: u8) {
        let mut state = self.state();
        state.row = usize::from(line);
        state.col = 0;
    }

    fn write_char(&mut self, c: char) {
        let mut state = self.state();
        let (row, col) = (state.row, state.col);
        let line = &mut state.lines[row];
        if col < line.len() {
            line[col] = c;
        } else {
            line.push(c);
        }
        state.col += 1;
    }
}

impl SystemControl for Bench {
    fn delay_ms(&mut self, millis: u32) {
        self.state().delays.push(millis);
    }

    fn halt(&mut self) -> ! {
        panic!("halted");
    }
}

pub type BenchDispatcher = EventDispatcher<Bench, Bench, Bench, Bench, Bench>;

/// Builds and starts a dispatcher wired to `bench`.
pub fn start(bench: &Bench, config: ControllerConfig) -> BenchDispatcher {
    let mut dispatcher = EventDispatcher::new(bench.board(), bench.clone(), config);
    dispatcher.start();
    dispatcher
}

/// Starts a dispatcher and runs out the startup banner.
pub fn start_live(bench: &Bench) -> BenchDispatcher {
    let mut dispatcher = start(bench, ControllerConfig::DEFAULT);
    while dispatcher.menu().current_state().is_none() {
        tick(&mut dispatcher);
    }
    dispatcher
}

/// One timer tick followed by an idle pass.
pub fn tick(dispatcher: &mut BenchDispatcher) -> PassSummary {
    dispatcher.handle(Event::PeriodicTick);
    dispatcher.handle(Event::Idle)
}

/// Press and release followed by an idle pass.
pub fn press(dispatcher: &mut BenchDispatcher, button: ButtonId) -> PassSummary {
    dispatcher.handle(Event::ButtonEdge(ButtonEvent::down(button)));
    dispatcher.handle(Event::ButtonEdge(ButtonEvent::up(button)));
    dispatcher.handle(Event::Idle)
}
