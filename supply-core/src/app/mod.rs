//! Application context for the bench supply.
//!
//! [`SupplyApp`] owns the board collaborators together with the sampling,
//! display, and limit state. It is the menu's host: menu text goes to the
//! display and [`Command`]s act on the limits and line modes.

use crate::config::ControllerConfig;
use crate::display::{DisplayComposer, DisplayLine, LimitCursor};
use crate::hal::{AnalogInput, CurrentSensor, ShutdownControl, SupplyId, TextSink};
use crate::limits::CurrentLimits;
use crate::menu::MenuHost;
use crate::sampling::{ConversionFold, SamplingEngine, SamplingError, SensorPoll};

pub mod navigation;

pub use navigation::{BANNER, SUPPLY_MENU};

/// Menu actions.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Hand the screen back to the live readings.
    EnableReadings,
    /// Move one display line to its next reading pair.
    CycleLine(DisplayLine),
    /// Pick the supply whose limit is edited.
    SelectSupply(SupplyId),
    /// Show the pending limit as adjustable.
    AdjustLimit,
    /// Show the pending limit without a cursor.
    ShowLimit,
    IncrementLimit,
    DecrementLimit,
    /// Commit the pending limits of both supplies.
    AcceptLimit,
    /// Discard pending edits.
    RejectLimit,
}

/// Hardware collaborators owned by the application.
pub struct Board<O, A, S, T> {
    pub outputs: O,
    pub adc: A,
    pub sensor: S,
    pub display: T,
}

impl<O, A, S, T> Board<O, A, S, T> {
    pub const fn new(outputs: O, adc: A, sensor: S, display: T) -> Self {
        Self {
            outputs,
            adc,
            sensor,
            display,
        }
    }
}

pub struct SupplyApp<O, A, S, T> {
    board: Board<O, A, S, T>,
    sampling: SamplingEngine,
    display: DisplayComposer,
    limits: CurrentLimits,
    config: ControllerConfig,
    committed: bool,
}

impl<O, A, S, T> SupplyApp<O, A, S, T>
where
    O: ShutdownControl,
    A: AnalogInput,
    S: CurrentSensor,
    T: TextSink,
{
    pub fn new(board: Board<O, A, S, T>, config: ControllerConfig) -> Self {
        Self {
            board,
            sampling: SamplingEngine::new(&config),
            display: DisplayComposer::new(),
            limits: CurrentLimits::new(),
            config,
            committed: false,
        }
    }

    /// Configures the sensors, releases every output, and starts the first
    /// conversion. A sensor failure aborts before the ADC is started.
    pub fn power_on(&mut self) -> Result<(), SamplingError<S::Error>> {
        self.sampling
            .configure_sensors(&mut self.board.sensor, &self.config.sensors)?;
        self.sampling.reset_shutdown(&mut self.board.outputs);
        self.sampling.start(&mut self.board.adc);
        Ok(())
    }

    /// Polls both current sensors against the committed limits.
    pub fn poll_sensors(&mut self) -> SensorPoll<S::Error> {
        let poll = self.sampling.poll_sensors(
            &mut self.board.sensor,
            &mut self.board.outputs,
            &self.limits,
        );
        if poll.changed {
            self.display.observe(&self.sampling.readings());
        }
        poll
    }

    /// Folds the finished ADC conversion and starts the next one.
    pub fn fold_conversion(&mut self) -> ConversionFold {
        let fold = self.sampling.fold_conversion(&mut self.board.adc);
        if fold.changed() {
            self.display.observe(&self.sampling.readings());
        }
        fold
    }

    /// Redraws the live readings if they are stale and on screen.
    pub fn redraw(&mut self) -> bool {
        let readings = self.sampling.readings();
        self.display.redraw(&mut self.board.display, &readings)
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::EnableReadings => self.display.enable_readings(),
            Command::CycleLine(line) => self.display.advance_line(line),
            Command::SelectSupply(supply) => {
                self.limits.select(supply);
                self.show_limit(LimitCursor::Supply);
            }
            Command::AdjustLimit => self.show_limit(LimitCursor::Value),
            Command::ShowLimit => self.show_limit(LimitCursor::None),
            Command::IncrementLimit => self.limits.increment(),
            Command::DecrementLimit => self.limits.decrement(),
            Command::AcceptLimit => {
                self.limits.accept();
                self.committed = true;
            }
            Command::RejectLimit => self.limits.reject(),
        }
    }

    /// Limit screens release any latched shutdown before drawing.
    fn show_limit(&mut self, cursor: LimitCursor) {
        self.sampling.reset_shutdown(&mut self.board.outputs);
        let supply = self.limits.adjusting();
        self.display.show_limit(
            &mut self.board.display,
            supply,
            self.limits.pending_milliamps(supply),
            cursor,
        );
    }

    /// Returns and clears whether limits were committed since the last call.
    pub fn take_commit(&mut self) -> bool {
        core::mem::take(&mut self.committed)
    }

    pub fn sampling(&self) -> &SamplingEngine {
        &self.sampling
    }

    pub fn display(&self) -> &DisplayComposer {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayComposer {
        &mut self.display
    }

    pub fn limits(&self) -> &CurrentLimits {
        &self.limits
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn board(&self) -> &Board<O, A, S, T> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board<O, A, S, T> {
        &mut self.board
    }
}

impl<O, A, S, T> MenuHost<Command> for SupplyApp<O, A, S, T>
where
    O: ShutdownControl,
    A: AnalogInput,
    S: CurrentSensor,
    T: TextSink,
{
    fn show(&mut self, text: &'static str) {
        self.display.show_text(&mut self.board.display, text);
    }

    fn execute(&mut self, command: Command) {
        SupplyApp::execute(self, command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{NoopAnalog, NoopSensor, NoopTextSink};

    #[derive(Default)]
    struct Outputs {
        shutdown: [bool; 2],
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

    fn app() -> SupplyApp<Outputs, NoopAnalog, NoopSensor, NoopTextSink> {
        SupplyApp::new(
            Board::new(Outputs::default(), NoopAnalog, NoopSensor, NoopTextSink),
            ControllerConfig::DEFAULT,
        )
    }

    #[test]
    fn limit_commands_edit_selected_supply() {
        let mut app = app();
        app.execute(Command::SelectSupply(SupplyId::B));
        app.execute(Command::IncrementLimit);
        assert_eq!(app.limits().pending_milliamps(SupplyId::B), 10);
        assert_eq!(app.limits().committed_milliamps(SupplyId::B), 1000);

        app.execute(Command::AcceptLimit);
        assert!(app.take_commit());
        assert!(!app.take_commit());
        assert_eq!(app.limits().committed_milliamps(SupplyId::B), 10);
        assert_eq!(app.limits().committed_milliamps(SupplyId::A), 1000);
    }

    #[test]
    fn limit_screens_release_shutdown() {
        let mut app = app();
        app.board_mut().outputs.shutdown = [true, true];
        app.board_mut().outputs.status = true;

        app.execute(Command::ShowLimit);
        assert_eq!(app.board().outputs.shutdown, [false, false]);
        assert!(!app.board().outputs.status);
        assert!(!app.display().is_enabled());
    }

    #[test]
    fn readings_commands_drive_display() {
        let mut app = app();
        app.execute(Command::EnableReadings);
        assert!(app.display().is_enabled());
        assert!(app.redraw());
        assert!(!app.redraw());

        app.execute(Command::CycleLine(DisplayLine::Top));
        assert!(app.redraw());
    }
}
