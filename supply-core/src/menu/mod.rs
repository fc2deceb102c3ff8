//! Table-driven menu navigation.
//!
//! The engine walks a compiled [`MenuTable`]: entering a state shows its
//! text, runs its command, then either waits out a pause, waits for a
//! button, or follows its `Goto` in the same pass. Commands are opaque to the
//! engine; a [`MenuHost`] renders text and executes them.

use core::fmt;
use core::time::Duration;

use crate::buttons::ButtonEvent;
use crate::config::ticks_for;

pub mod table;

pub use table::{
    MAX_GOTO_CHAIN, MAX_MENU_STATES, MenuOp, MenuSlot, MenuState, MenuTable, MenuTableError,
    OpKind,
};

/// Side effects requested by the menu.
pub trait MenuHost<C> {
    /// Replace the screen with menu text.
    fn show(&mut self, text: &'static str);
    /// Run a state's command.
    fn execute(&mut self, command: C);
}

/// Runtime invariant violations. Table validation rules these out, so any
/// occurrence is a bug.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MenuError {
    /// More than [`MAX_GOTO_CHAIN`] immediate transitions in one pass.
    GotoChain { from: MenuSlot },
    /// A transition named a state outside the table.
    UnknownState(u8),
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuError::GotoChain { from } => {
                write!(f, "goto chain from {from} exceeds {MAX_GOTO_CHAIN}")
            }
            MenuError::UnknownState(id) => write!(f, "transition to unknown state {id}"),
        }
    }
}

/// Interpreter for a compiled menu table.
#[derive(Clone, Debug)]
pub struct MenuEngine<C> {
    table: MenuTable<C>,
    current: MenuSlot,
    /// Ticks left before the current state's pause elapses.
    pause: Option<u16>,
    tick_period: Duration,
}

impl<C: Copy> MenuEngine<C> {
    /// Parks on the prologue until [`start`](Self::start) runs it.
    pub fn new(table: MenuTable<C>, tick_period: Duration) -> Self {
        Self {
            table,
            current: MenuSlot::Prologue,
            pause: None,
            tick_period,
        }
    }

    pub fn table(&self) -> &MenuTable<C> {
        &self.table
    }

    pub fn current(&self) -> MenuSlot {
        self.current
    }

    /// Id of the current navigable state, `None` while in the prologue.
    pub fn current_state(&self) -> Option<u8> {
        match self.current {
            MenuSlot::Prologue => None,
            MenuSlot::State(id) => Some(id),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_some()
    }

    /// Runs the prologue.
    pub fn start<H: MenuHost<C>>(&mut self, host: &mut H) -> Result<(), MenuError> {
        self.enter(MenuSlot::Prologue, host)
    }

    /// Advances a pending pause by one dispatcher tick.
    pub fn tick(&mut self) {
        if let Some(remaining) = self.pause.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Completes an elapsed pause. Returns whether a transition happened.
    pub fn poll<H: MenuHost<C>>(&mut self, host: &mut H) -> Result<bool, MenuError> {
        if self.pause != Some(0) {
            return Ok(false);
        }
        self.pause = None;

        let Some(next) = self.lookup(self.current)?.goto else {
            return Ok(false);
        };
        self.enter(MenuSlot::State(next), host)?;
        Ok(true)
    }

    /// Feeds a debounced button edge. Only presses move the menu, and only
    /// when no pause is pending. Returns whether a transition happened.
    pub fn handle_button<H: MenuHost<C>>(
        &mut self,
        event: ButtonEvent,
        host: &mut H,
    ) -> Result<bool, MenuError> {
        if self.pause.is_some() || !event.is_down() {
            return Ok(false);
        }

        let Some(buttons) = self.lookup(self.current)?.buttons else {
            return Ok(false);
        };
        self.enter(MenuSlot::State(buttons[event.button.as_index()]), host)?;
        Ok(true)
    }

    fn lookup(&self, slot: MenuSlot) -> Result<MenuState<C>, MenuError> {
        match slot {
            MenuSlot::Prologue => Ok(*self.table.prologue()),
            MenuSlot::State(id) => self
                .table
                .state(id)
                .copied()
                .ok_or(MenuError::UnknownState(id)),
        }
    }

    fn enter<H: MenuHost<C>>(&mut self, slot: MenuSlot, host: &mut H) -> Result<(), MenuError> {
        let origin = slot;
        let mut slot = slot;

        for _ in 0..=MAX_GOTO_CHAIN {
            let state = self.lookup(slot)?;
            self.current = slot;
            self.pause = None;

            if let Some(text) = state.text {
                host.show(text);
            }
            if let Some(command) = state.command {
                host.execute(command);
            }

            if let Some(pause_ms) = state.pause_ms {
                self.pause = Some(ticks_for(pause_ms, self.tick_period));
                return Ok(());
            }
            if state.buttons.is_some() {
                return Ok(());
            }
            match state.goto {
                Some(next) => slot = MenuSlot::State(next),
                None => return Ok(()),
            }
        }

        Err(MenuError::GotoChain { from: origin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::ButtonId;
    use heapless::Vec;

    #[derive(Default)]
    struct Recorder {
        shown: Vec<&'static str, 16>,
        executed: Vec<u8, 16>,
    }

    impl MenuHost<u8> for Recorder {
        fn show(&mut self, text: &'static str) {
            self.shown.push(text).unwrap();
        }

        fn execute(&mut self, command: u8) {
            self.executed.push(command).unwrap();
        }
    }

    const TICK: Duration = Duration::from_millis(100);

    const OPS: [MenuOp<u8>; 13] = [
        MenuOp::Show("banner"),
        MenuOp::Pause(250),
        MenuOp::State(0),
        MenuOp::Execute(10),
        MenuOp::Buttons(1, 2, 0),
        MenuOp::State(1),
        MenuOp::Execute(11),
        MenuOp::Goto(0),
        MenuOp::State(2),
        MenuOp::Show("parked"),
        MenuOp::State(3),
        MenuOp::Goto(3),
        MenuOp::End,
    ];

    fn engine(ops: &[MenuOp<u8>]) -> MenuEngine<u8> {
        MenuEngine::new(MenuTable::build(ops).expect("valid table"), TICK)
    }

    #[test]
    fn prologue_pauses_then_enters_state_zero() {
        let ops = [
            MenuOp::Show("banner"),
            MenuOp::Pause(250),
            MenuOp::State(0),
            MenuOp::Execute(10),
            MenuOp::Buttons(0, 0, 0),
            MenuOp::End,
        ];
        let mut menu = engine(&ops);
        let mut host = Recorder::default();

        menu.start(&mut host).unwrap();
        assert_eq!(host.shown.as_slice(), &["banner"]);
        assert!(menu.is_paused());
        assert_eq!(menu.current_state(), None);

        // 250 ms at 100 ms per tick rounds up to 3 ticks.
        for _ in 0..2 {
            menu.tick();
            assert!(!menu.poll(&mut host).unwrap());
        }
        menu.tick();
        assert!(menu.poll(&mut host).unwrap());
        assert_eq!(menu.current_state(), Some(0));
        assert_eq!(host.executed.as_slice(), &[10]);
    }

    #[test]
    fn presses_during_pause_are_ignored() {
        let ops = [
            MenuOp::Pause(100),
            MenuOp::State(0),
            MenuOp::Buttons(0, 0, 0),
            MenuOp::End,
        ];
        let mut menu = engine(&ops);
        let mut host = Recorder::default();
        menu.start(&mut host).unwrap();

        let press = ButtonEvent::down(ButtonId::Up);
        assert!(!menu.handle_button(press, &mut host).unwrap());
        assert_eq!(menu.current(), MenuSlot::Prologue);
    }

    #[test]
    fn button_down_follows_table_and_goto_runs_in_same_pass() {
        let mut menu = engine(&[
            MenuOp::State(0),
            MenuOp::Execute(10),
            MenuOp::Buttons(1, 2, 0),
            MenuOp::State(1),
            MenuOp::Execute(11),
            MenuOp::Goto(0),
            MenuOp::State(2),
            MenuOp::Show("parked"),
            MenuOp::End,
        ]);
        let mut host = Recorder::default();
        menu.start(&mut host).unwrap();
        assert_eq!(menu.current_state(), Some(0));

        assert!(!menu.handle_button(ButtonEvent::up(ButtonId::Up), &mut host).unwrap());
        assert!(menu.handle_button(ButtonEvent::down(ButtonId::Up), &mut host).unwrap());
        assert_eq!(menu.current_state(), Some(0));
        assert_eq!(host.executed.as_slice(), &[10, 11, 10]);

        assert!(menu.handle_button(ButtonEvent::down(ButtonId::Down), &mut host).unwrap());
        assert_eq!(menu.current_state(), Some(2));
        assert_eq!(host.shown.as_slice(), &["parked"]);

        // Parked: no buttons, no pause, no successor.
        assert!(!menu.handle_button(ButtonEvent::down(ButtonId::Up), &mut host).unwrap());
        assert_eq!(menu.current_state(), Some(2));
    }

    #[test]
    fn self_loop_is_rejected_by_the_builder() {
        assert!(matches!(
            MenuTable::build(&OPS),
            Err(MenuTableError::GotoChain {
                slot: MenuSlot::State(3)
            })
        ));
    }
}
