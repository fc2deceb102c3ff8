//! Drives the dispatcher against the simulated bench.
//!
//! Time advances in button-scan steps. Every step scans the buttons, raises
//! the tick flag when a full tick period has accumulated, forwards finished
//! conversions, and runs one dispatcher pass, the same order the firmware
//! tasks produce.

use std::time::Duration;

use supply_core::buttons::ButtonDebouncer;
use supply_core::config::ControllerConfig;
use supply_core::dispatcher::{EventDispatcher, PassSummary};
use supply_core::display::DISPLAY_LINES;
use supply_core::hal::{ButtonId, SupplyId};
use supply_core::signals::EventSignals;

use crate::bench::SimBench;

/// Load change per keypress.
pub const LOAD_STEP_MA: i32 = 50;
/// Minimum number of scans a simulated press is held for.
const MIN_HOLD_SCANS: u32 = 10;

pub type SimDispatcher = EventDispatcher<SimBench, SimBench, SimBench, SimBench, SimBench>;

/// One scripted or interactive input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Action {
    Press(ButtonId),
    Wait(Duration),
    Load(SupplyId, i32),
    /// Steps one auxiliary input voltage.
    Aux(usize),
}

impl Action {
    /// Maps a script or keyboard character to an action.
    pub fn from_key(key: char) -> Option<Self> {
        let action = match key {
            'u' => Action::Press(ButtonId::Up),
            'd' => Action::Press(ButtonId::Down),
            's' => Action::Press(ButtonId::Select),
            '.' => Action::Wait(Duration::from_millis(100)),
            'w' => Action::Wait(Duration::from_secs(1)),
            'a' => Action::Load(SupplyId::A, LOAD_STEP_MA),
            'A' => Action::Load(SupplyId::A, -LOAD_STEP_MA),
            'b' => Action::Load(SupplyId::B, LOAD_STEP_MA),
            'B' => Action::Load(SupplyId::B, -LOAD_STEP_MA),
            '1' => Action::Aux(0),
            '2' => Action::Aux(1),
            '3' => Action::Aux(2),
            '4' => Action::Aux(3),
            _ => return None,
        };
        Some(action)
    }
}

/// Parses a key script. Whitespace is ignored.
pub fn parse_script(script: &str) -> Result<Vec<Action>, String> {
    script
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| Action::from_key(c).ok_or_else(|| format!("Unknown script key `{c}`")))
        .collect()
}

pub struct Session {
    bench: SimBench,
    dispatcher: SimDispatcher,
    debouncer: ButtonDebouncer,
    signals: EventSignals,
    config: ControllerConfig,
    since_tick: Duration,
    elapsed: Duration,
}

impl Session {
    /// Builds the board and runs the dispatcher's startup sequence.
    pub fn new(config: ControllerConfig) -> Self {
        Self::with_bench(SimBench::new(), config)
    }

    pub fn with_bench(bench: SimBench, config: ControllerConfig) -> Self {
        let board = supply_core::app::Board::new(
            bench.clone(),
            bench.clone(),
            bench.clone(),
            bench.clone(),
        );
        let mut dispatcher = EventDispatcher::new(board, bench.clone(), config);
        dispatcher.start();

        Self {
            bench,
            dispatcher,
            debouncer: ButtonDebouncer::new(config.debounce_samples),
            signals: EventSignals::new(),
            config,
            since_tick: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    pub fn bench(&self) -> &SimBench {
        &self.bench
    }

    pub fn dispatcher(&self) -> &SimDispatcher {
        &self.dispatcher
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn frame(&self) -> [String; DISPLAY_LINES] {
        self.bench.frame()
    }

    /// Applies one action and returns everything the dispatcher did.
    pub fn apply(&mut self, action: Action) -> PassSummary {
        match action {
            Action::Press(button) => self.press(button),
            Action::Wait(duration) => self.wait(duration),
            Action::Load(supply, delta) => {
                self.bench.adjust_load(supply, delta);
                PassSummary::default()
            }
            Action::Aux(channel) => {
                self.bench.step_aux(channel);
                PassSummary::default()
            }
        }
    }

    /// Holds a button long enough to debounce, then releases it.
    pub fn press(&mut self, button: ButtonId) -> PassSummary {
        let hold = u32::from(self.config.debounce_samples)
            .saturating_mul(2)
            .max(MIN_HOLD_SCANS);
        let mut total = PassSummary::default();

        self.bench.state_mut().pressed[button.as_index()] = true;
        for _ in 0..hold {
            absorb(&mut total, self.step());
        }
        self.bench.state_mut().pressed[button.as_index()] = false;
        for _ in 0..hold {
            absorb(&mut total, self.step());
        }
        total
    }

    /// Lets simulated time pass with no input.
    pub fn wait(&mut self, duration: Duration) -> PassSummary {
        let mut total = PassSummary::default();
        let target = self.elapsed + duration;
        while self.elapsed < target {
            absorb(&mut total, self.step());
        }
        total
    }

    /// Advances by one button-scan period.
    pub fn step(&mut self) -> PassSummary {
        let scan_period = self.config.scan_period.max(Duration::from_millis(1));
        self.elapsed += scan_period;
        self.since_tick += scan_period;
        if self.since_tick >= self.config.tick_period {
            self.since_tick -= self.config.tick_period;
            self.signals.raise_tick();
        }
        if self.bench.take_conversion() {
            self.signals.raise_conversion();
        }

        let edges = self.debouncer.scan(&mut self.bench);
        self.dispatcher.pump(&self.signals, edges)
    }
}

/// Folds one pass into a running summary.
fn absorb(total: &mut PassSummary, pass: PassSummary) {
    total.polled |= pass.polled;
    total.folded |= pass.folded;
    total.forwarded = total.forwarded.saturating_add(pass.forwarded);
    total.navigated |= pass.navigated;
    total.redrawn |= pass.redrawn;
    for (seen, tripped) in total.tripped.iter_mut().zip(pass.tripped) {
        *seen |= tripped;
    }
    total.limits_committed |= pass.limits_committed;
    total.dropped_edge |= pass.dropped_edge;
    for entry in pass.reported {
        let _ = total.reported.push(entry);
    }
}

/// Status lines for anything noteworthy in a summary.
pub fn describe(summary: &PassSummary) -> Vec<String> {
    let mut lines = Vec::new();
    for supply in summary.tripped_supplies() {
        lines.push(format!("overcurrent: supply {} latched off", supply.label()));
    }
    if summary.dropped_edge {
        lines.push("buttons: edge queue full, edge dropped".to_string());
    }
    for (code, severity) in &summary.reported {
        lines.push(format!("fault: {}{code}", severity.label()));
    }
    if summary.limits_committed {
        lines.push("limits: committed".to_string());
    }
    lines
}
