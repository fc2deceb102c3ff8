//! Opcode table compilation.
//!
//! A menu is authored as a flat `const` slice of [`MenuOp`]s. The builder
//! folds it into dense [`MenuState`] records once at startup and rejects
//! tables the engine could not run safely.

use core::fmt;

use heapless::Vec;

use crate::hal::BUTTON_COUNT;

/// Upper bound on the number of states in a table.
pub const MAX_MENU_STATES: usize = 16;

/// Longest run of immediate `Goto` hops allowed within one dispatcher pass.
pub const MAX_GOTO_CHAIN: usize = 4;

/// One instruction of the declarative menu table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MenuOp<C> {
    /// Replace the screen with text while the state is active.
    Show(&'static str),
    /// Wait this many milliseconds, then follow the state's `Goto`.
    Pause(u16),
    /// Start the state with this id. Ids must be dense and ascending.
    State(u8),
    /// Run a command on entry.
    Execute(C),
    /// Targets for button 0, 1 and 2.
    Buttons(u8, u8, u8),
    /// Successor state.
    Goto(u8),
    /// Terminates the table.
    End,
}

/// Opcode kinds, used in diagnostics.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OpKind {
    Show,
    Pause,
    Execute,
    Buttons,
    Goto,
}

/// Location of a state within a table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MenuSlot {
    /// Opcodes before the first `State`, run once at startup.
    Prologue,
    State(u8),
}

impl fmt::Display for MenuSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuSlot::Prologue => f.write_str("prologue"),
            MenuSlot::State(id) => write!(f, "state {id}"),
        }
    }
}

/// A compiled menu state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MenuState<C> {
    pub text: Option<&'static str>,
    pub command: Option<C>,
    pub pause_ms: Option<u16>,
    pub buttons: Option<[u8; BUTTON_COUNT]>,
    pub goto: Option<u8>,
}

impl<C> MenuState<C> {
    pub const fn empty() -> Self {
        Self {
            text: None,
            command: None,
            pause_ms: None,
            buttons: None,
            goto: None,
        }
    }

    /// Whether entering this state continues straight to its successor.
    pub const fn is_immediate(&self) -> bool {
        self.pause_ms.is_none() && self.buttons.is_none() && self.goto.is_some()
    }

    /// Whether entering this state leaves the engine waiting forever.
    pub const fn is_parked(&self) -> bool {
        self.pause_ms.is_none() && self.buttons.is_none() && self.goto.is_none()
    }
}

/// Reasons a table is rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MenuTableError {
    NoStates,
    TooManyStates,
    NonDenseState { expected: u8, found: u8 },
    DuplicateOp { slot: MenuSlot, op: OpKind },
    PauseWithoutSuccessor { slot: MenuSlot },
    UnknownTarget { slot: MenuSlot, target: u8 },
    GotoChain { slot: MenuSlot },
    MissingEnd,
    TrailingOps { index: usize },
}

impl fmt::Display for MenuTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuTableError::NoStates => f.write_str("menu table declares no states"),
            MenuTableError::TooManyStates => {
                write!(f, "menu table exceeds {MAX_MENU_STATES} states")
            }
            MenuTableError::NonDenseState { expected, found } => {
                write!(f, "expected state {expected}, found state {found}")
            }
            MenuTableError::DuplicateOp { slot, op } => {
                write!(f, "{slot} repeats {op:?}")
            }
            MenuTableError::PauseWithoutSuccessor { slot } => {
                write!(f, "{slot} pauses without a successor")
            }
            MenuTableError::UnknownTarget { slot, target } => {
                write!(f, "{slot} targets unknown state {target}")
            }
            MenuTableError::GotoChain { slot } => {
                write!(f, "{slot} starts a goto chain longer than {MAX_GOTO_CHAIN}")
            }
            MenuTableError::MissingEnd => f.write_str("menu table is missing End"),
            MenuTableError::TrailingOps { index } => {
                write!(f, "opcode {index} follows End")
            }
        }
    }
}

/// Compiled menu: a prologue plus dense states indexed by id.
#[derive(Clone, Debug)]
pub struct MenuTable<C> {
    prologue: MenuState<C>,
    states: Vec<MenuState<C>, MAX_MENU_STATES>,
}

impl<C: Copy> MenuTable<C> {
    /// Compiles and validates an opcode table.
    pub fn build(ops: &[MenuOp<C>]) -> Result<Self, MenuTableError> {
        let mut prologue = MenuState::empty();
        let mut states: Vec<MenuState<C>, MAX_MENU_STATES> = Vec::new();
        let mut slot = MenuSlot::Prologue;
        let mut current = MenuState::empty();
        let mut ended = false;

        for (index, op) in ops.iter().enumerate() {
            if ended {
                return Err(MenuTableError::TrailingOps { index });
            }
            match *op {
                MenuOp::State(id) => {
                    finish(slot, current, &mut prologue, &mut states)?;
                    let expected = dense_id(states.len());
                    if id != expected {
                        return Err(MenuTableError::NonDenseState {
                            expected,
                            found: id,
                        });
                    }
                    slot = MenuSlot::State(id);
                    current = MenuState::empty();
                }
                MenuOp::Show(text) => set_once(&mut current.text, text, slot, OpKind::Show)?,
                MenuOp::Pause(ms) => set_once(&mut current.pause_ms, ms, slot, OpKind::Pause)?,
                MenuOp::Execute(command) => {
                    set_once(&mut current.command, command, slot, OpKind::Execute)?;
                }
                MenuOp::Buttons(b0, b1, b2) => {
                    set_once(&mut current.buttons, [b0, b1, b2], slot, OpKind::Buttons)?;
                }
                MenuOp::Goto(id) => set_once(&mut current.goto, id, slot, OpKind::Goto)?,
                MenuOp::End => {
                    finish(slot, current, &mut prologue, &mut states)?;
                    ended = true;
                }
            }
        }

        if !ended {
            return Err(MenuTableError::MissingEnd);
        }
        if states.is_empty() {
            return Err(MenuTableError::NoStates);
        }
        if prologue.goto.is_none() && prologue.buttons.is_none() {
            prologue.goto = Some(0);
        }

        let table = Self { prologue, states };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), MenuTableError> {
        for (slot, state) in self.slots() {
            if state.pause_ms.is_some() && state.goto.is_none() {
                return Err(MenuTableError::PauseWithoutSuccessor { slot });
            }
            let targets = state.buttons.into_iter().flatten().chain(state.goto);
            for target in targets {
                if usize::from(target) >= self.states.len() {
                    return Err(MenuTableError::UnknownTarget { slot, target });
                }
            }
        }

        for (slot, state) in self.slots() {
            if !state.is_immediate() {
                continue;
            }
            let mut next = state.goto;
            let mut hops = 0;
            while let Some(target) = next {
                hops += 1;
                if hops > MAX_GOTO_CHAIN {
                    return Err(MenuTableError::GotoChain { slot });
                }
                next = self
                    .state(target)
                    .filter(|state| state.is_immediate())
                    .and_then(|state| state.goto);
            }
        }
        Ok(())
    }

    fn slots(&self) -> impl Iterator<Item = (MenuSlot, &MenuState<C>)> {
        core::iter::once((MenuSlot::Prologue, &self.prologue)).chain(
            self.states
                .iter()
                .enumerate()
                .map(|(index, state)| (MenuSlot::State(dense_id(index)), state)),
        )
    }

    pub fn prologue(&self) -> &MenuState<C> {
        &self.prologue
    }

    pub fn state(&self, id: u8) -> Option<&MenuState<C>> {
        self.states.get(usize::from(id))
    }

    pub fn slot(&self, slot: MenuSlot) -> Option<&MenuState<C>> {
        match slot {
            MenuSlot::Prologue => Some(&self.prologue),
            MenuSlot::State(id) => self.state(id),
        }
    }

    /// Number of navigable states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

fn finish<C>(
    slot: MenuSlot,
    state: MenuState<C>,
    prologue: &mut MenuState<C>,
    states: &mut Vec<MenuState<C>, MAX_MENU_STATES>,
) -> Result<(), MenuTableError> {
    match slot {
        MenuSlot::Prologue => {
            *prologue = state;
            Ok(())
        }
        MenuSlot::State(_) => states
            .push(state)
            .map_err(|_| MenuTableError::TooManyStates),
    }
}

fn set_once<T>(
    field: &mut Option<T>,
    value: T,
    slot: MenuSlot,
    op: OpKind,
) -> Result<(), MenuTableError> {
    if field.is_some() {
        return Err(MenuTableError::DuplicateOp { slot, op });
    }
    *field = Some(value);
    Ok(())
}

// MAX_MENU_STATES fits in a u8.
#[allow(clippy::cast_possible_truncation)]
const fn dense_id(index: usize) -> u8 {
    index as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    type Op = MenuOp<u8>;

    #[test]
    fn builds_prologue_and_states() {
        const OPS: [Op; 9] = [
            MenuOp::Show("hello"),
            MenuOp::Pause(500),
            MenuOp::State(0),
            MenuOp::Execute(7),
            MenuOp::Buttons(1, 0, 0),
            MenuOp::State(1),
            MenuOp::Show("one"),
            MenuOp::Goto(0),
            MenuOp::End,
        ];
        let table = MenuTable::build(&OPS).expect("valid table");

        assert_eq!(table.len(), 2);
        assert_eq!(table.prologue().text, Some("hello"));
        assert_eq!(table.prologue().pause_ms, Some(500));
        assert_eq!(table.prologue().goto, Some(0));

        let zero = table.state(0).unwrap();
        assert_eq!(zero.command, Some(7));
        assert_eq!(zero.buttons, Some([1, 0, 0]));
        assert!(table.state(1).unwrap().is_immediate());
        assert!(table.state(2).is_none());
    }

    #[test]
    fn rejects_sparse_ids() {
        let ops: [Op; 3] = [MenuOp::State(0), MenuOp::State(2), MenuOp::End];
        assert_eq!(
            MenuTable::build(&ops).unwrap_err(),
            MenuTableError::NonDenseState {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn rejects_duplicate_opcodes() {
        let ops: [Op; 4] = [
            MenuOp::State(0),
            MenuOp::Show("a"),
            MenuOp::Show("b"),
            MenuOp::End,
        ];
        assert_eq!(
            MenuTable::build(&ops).unwrap_err(),
            MenuTableError::DuplicateOp {
                slot: MenuSlot::State(0),
                op: OpKind::Show
            }
        );
    }

    #[test]
    fn rejects_dangling_targets_and_missing_successors() {
        let dangling: [Op; 3] = [MenuOp::State(0), MenuOp::Buttons(0, 0, 3), MenuOp::End];
        assert_eq!(
            MenuTable::build(&dangling).unwrap_err(),
            MenuTableError::UnknownTarget {
                slot: MenuSlot::State(0),
                target: 3
            }
        );

        let paused: [Op; 3] = [MenuOp::State(0), MenuOp::Pause(100), MenuOp::End];
        assert_eq!(
            MenuTable::build(&paused).unwrap_err(),
            MenuTableError::PauseWithoutSuccessor {
                slot: MenuSlot::State(0)
            }
        );
    }

    #[test]
    fn rejects_goto_cycles() {
        let ops: [Op; 5] = [
            MenuOp::State(0),
            MenuOp::Goto(1),
            MenuOp::State(1),
            MenuOp::Goto(0),
            MenuOp::End,
        ];
        assert!(matches!(
            MenuTable::build(&ops).unwrap_err(),
            MenuTableError::GotoChain { .. }
        ));
    }

    #[test]
    fn paused_goto_does_not_count_as_a_chain() {
        let ops: [Op; 6] = [
            MenuOp::State(0),
            MenuOp::Pause(100),
            MenuOp::Goto(1),
            MenuOp::State(1),
            MenuOp::Goto(0),
            MenuOp::End,
        ];
        assert!(MenuTable::build(&ops).is_ok());
    }

    #[test]
    fn requires_terminated_non_empty_table() {
        let unterminated: [Op; 1] = [MenuOp::State(0)];
        assert_eq!(
            MenuTable::build(&unterminated).unwrap_err(),
            MenuTableError::MissingEnd
        );

        let empty: [Op; 2] = [MenuOp::Show("x"), MenuOp::End];
        assert_eq!(MenuTable::build(&empty).unwrap_err(), MenuTableError::NoStates);

        let trailing: [Op; 3] = [MenuOp::State(0), MenuOp::End, MenuOp::State(1)];
        assert_eq!(
            MenuTable::build(&trailing).unwrap_err(),
            MenuTableError::TrailingOps { index: 2 }
        );
    }

    #[test]
    fn rejects_oversized_tables() {
        let mut ops: heapless::Vec<Op, 24> = heapless::Vec::new();
        for id in 0..=16u8 {
            ops.push(MenuOp::State(id)).unwrap();
        }
        ops.push(MenuOp::End).unwrap();
        assert_eq!(
            MenuTable::build(&ops).unwrap_err(),
            MenuTableError::TooManyStates
        );
    }
}
