//! Cooperative event dispatcher.
//!
//! Interrupt-side code only records facts: a tick elapsed, a conversion
//! finished, a debounced edge arrived. [`EventDispatcher::handle`] turns those
//! into flags and queued edges, and an [`Event::Idle`] pass does the actual
//! work in a fixed order: sensor poll, ADC fold, menu, redraw.

use heapless::{Deque, Vec};

use crate::app::{Board, Command, SUPPLY_MENU, SupplyApp};
use crate::buttons::ButtonEvent;
use crate::config::ControllerConfig;
use crate::errors::{ErrorCode, ErrorConsole, Severity};
use crate::hal::{
    AnalogInput, CurrentSensor, SUPPLY_COUNT, ShutdownControl, SupplyId, SystemControl, TextSink,
};
use crate::menu::{MenuEngine, MenuError, MenuOp, MenuTable};
use crate::signals::EventSignals;

/// Debounced edges buffered between idle passes.
pub const EDGE_QUEUE_CAPACITY: usize = 8;

/// Faults recorded in one pass.
pub const MAX_REPORTS_PER_PASS: usize = 4;

/// Discrete inputs to the dispatcher.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Idle,
    PeriodicTick,
    ConversionComplete,
    ButtonEdge(ButtonEvent),
}

/// What one call to [`EventDispatcher::handle`] did, for logging.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PassSummary {
    pub polled: bool,
    pub folded: bool,
    /// Button edges handed to the menu.
    pub forwarded: u8,
    /// The menu changed state.
    pub navigated: bool,
    pub redrawn: bool,
    /// Supplies whose overcurrent shutdown latched in this pass.
    pub tripped: [bool; SUPPLY_COUNT],
    pub limits_committed: bool,
    /// An edge was dropped because the queue was full.
    pub dropped_edge: bool,
    /// Non-fatal faults shown on the display.
    pub reported: Vec<(ErrorCode, Severity), MAX_REPORTS_PER_PASS>,
}

impl PassSummary {
    pub fn tripped_supplies(&self) -> impl Iterator<Item = SupplyId> + '_ {
        SupplyId::ALL
            .into_iter()
            .filter(|supply| self.tripped[supply.as_index()])
    }

    /// Whether the pass did anything worth logging.
    pub fn is_quiet(&self) -> bool {
        !self.navigated
            && !self.limits_committed
            && !self.dropped_edge
            && self.reported.is_empty()
            && !self.tripped.iter().any(|tripped| *tripped)
    }
}

pub struct EventDispatcher<O, A, S, T, C> {
    app: SupplyApp<O, A, S, T>,
    menu: MenuEngine<Command>,
    console: ErrorConsole<C>,
    capture_sensors: bool,
    sample_adc: bool,
    edges: Deque<ButtonEvent, EDGE_QUEUE_CAPACITY>,
}

impl<O, A, S, T, C> EventDispatcher<O, A, S, T, C>
where
    O: ShutdownControl,
    A: AnalogInput,
    S: CurrentSensor,
    T: TextSink,
    C: SystemControl,
{
    /// Builds the dispatcher around the front-panel menu.
    pub fn new(board: Board<O, A, S, T>, system: C, config: ControllerConfig) -> Self {
        Self::with_menu(board, system, config, SUPPLY_MENU)
    }

    /// Builds the dispatcher around an arbitrary menu table. A table that
    /// fails validation is fatal.
    pub fn with_menu(
        board: Board<O, A, S, T>,
        system: C,
        config: ControllerConfig,
        ops: &[MenuOp<Command>],
    ) -> Self {
        let mut console = ErrorConsole::new(system, config.error_hold_ms());
        let mut app = SupplyApp::new(board, config);
        let table = match MenuTable::build(ops) {
            Ok(table) => table,
            Err(_) => console.fatal(&mut app.board_mut().display, ErrorCode::MenuTable),
        };

        Self {
            app,
            menu: MenuEngine::new(table, config.tick_period),
            console,
            capture_sensors: false,
            sample_adc: false,
            edges: Deque::new(),
        }
    }

    /// Brings the board up and runs the menu prologue. A sensor that cannot
    /// be configured is fatal.
    pub fn start(&mut self) {
        if let Err(error) = self.app.power_on() {
            let code = ErrorCode::SensorConfig(error.supply());
            self.console.fatal(&mut self.app.board_mut().display, code);
        }
        let started = self.menu.start(&mut self.app);
        self.check_menu(started);
    }

    pub fn handle(&mut self, event: Event) -> PassSummary {
        let mut summary = PassSummary::default();
        match event {
            Event::PeriodicTick => {
                self.capture_sensors = true;
                self.menu.tick();
            }
            Event::ConversionComplete => self.sample_adc = true,
            // The menu ignores buttons while a pause is pending, including
            // edges that would otherwise be drained after it completes.
            Event::ButtonEdge(_) if self.menu.is_paused() => {}
            Event::ButtonEdge(edge) => {
                if self.edges.push_back(edge).is_err() {
                    summary.dropped_edge = true;
                    self.report(&mut summary, ErrorCode::ButtonOverflow);
                }
            }
            Event::Idle => self.idle(&mut summary),
        }
        summary
    }

    /// Converts raised signals into events, queues `edges`, then runs one
    /// idle pass. The returned summary merges everything that happened.
    pub fn pump<I>(&mut self, signals: &EventSignals, edges: I) -> PassSummary
    where
        I: IntoIterator<Item = ButtonEvent>,
    {
        let mut dropped = false;
        let mut reported: Vec<(ErrorCode, Severity), MAX_REPORTS_PER_PASS> = Vec::new();

        if signals.take_tick() {
            self.handle(Event::PeriodicTick);
        }
        if signals.take_conversion() {
            self.handle(Event::ConversionComplete);
        }
        for edge in edges {
            let queued = self.handle(Event::ButtonEdge(edge));
            dropped |= queued.dropped_edge;
            for entry in queued.reported {
                let _ = reported.push(entry);
            }
        }

        let mut summary = self.handle(Event::Idle);
        summary.dropped_edge |= dropped;
        for entry in reported {
            let _ = summary.reported.push(entry);
        }
        summary
    }

    fn idle(&mut self, summary: &mut PassSummary) {
        if core::mem::take(&mut self.capture_sensors) {
            let poll = self.app.poll_sensors();
            summary.polled = true;
            summary.tripped = poll.tripped;
            for error in &poll.errors {
                self.report(summary, ErrorCode::SensorRead(error.supply()));
            }
        }

        if core::mem::take(&mut self.sample_adc) {
            let fold = self.app.fold_conversion();
            summary.folded = true;
            if let Some(out_of_range) = fold.out_of_range {
                self.report(summary, ErrorCode::AdcRange(out_of_range.channel));
            }
        }

        let polled = self.menu.poll(&mut self.app);
        summary.navigated |= self.check_menu(polled);
        while let Some(edge) = self.edges.pop_front() {
            summary.forwarded = summary.forwarded.saturating_add(1);
            let moved = self.menu.handle_button(edge, &mut self.app);
            summary.navigated |= self.check_menu(moved);
        }
        summary.limits_committed = self.app.take_commit();

        summary.redrawn = self.app.redraw();
    }

    fn report(&mut self, summary: &mut PassSummary, code: ErrorCode) {
        let severity = code.severity();
        let _ = summary.reported.push((code, severity));
        self.console
            .report(&mut self.app.board_mut().display, code, severity);
        self.app.display_mut().mark_dirty();
    }

    fn check_menu<R: Default>(&mut self, result: Result<R, MenuError>) -> R {
        match result {
            Ok(value) => value,
            Err(_) => self
                .console
                .fatal(&mut self.app.board_mut().display, ErrorCode::MenuRuntime),
        }
    }

    pub fn app(&self) -> &SupplyApp<O, A, S, T> {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut SupplyApp<O, A, S, T> {
        &mut self.app
    }

    pub fn menu(&self) -> &MenuEngine<Command> {
        &self.menu
    }

    pub fn console(&self) -> &ErrorConsole<C> {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut ErrorConsole<C> {
        &mut self.console
    }

    /// Edges waiting for the next idle pass.
    pub fn queued_edges(&self) -> usize {
        self.edges.len()
    }
}
