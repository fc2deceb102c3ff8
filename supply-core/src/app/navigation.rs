//! The front-panel menu of the bench supply.
//!
//! State 0 shows live readings. UP and DOWN cycle the top and bottom line
//! modes; SELECT enters the current-limit editor, where the supply is picked
//! first and then its limit is stepped before a save prompt.

use crate::display::DisplayLine;
use crate::hal::SupplyId;
use crate::menu::MenuOp;

use super::Command;

/// Startup banner. `\n` starts the second line.
pub const BANNER: &str = "Bench Supply\n      v0.1";
pub const CURRENT_LIMIT_TITLE: &str = "Cur Limit";
pub const SAVE_PROMPT: &str = "Save? (UP=YES)";
pub const LIMIT_SAVED: &str = "Cur Limit Set";

/// How long the banner and the save confirmation stay up.
pub const MESSAGE_PAUSE_MS: u16 = 2000;

/// Id of the live readings state.
pub const LIVE_READINGS: u8 = 0;

pub const SUPPLY_MENU: &[MenuOp<Command>] = &[
    MenuOp::Show(BANNER),
    MenuOp::Pause(MESSAGE_PAUSE_MS),
    // Live readings.
    MenuOp::State(0),
    MenuOp::Execute(Command::EnableReadings),
    MenuOp::Buttons(1, 2, 3),
    MenuOp::State(1),
    MenuOp::Execute(Command::CycleLine(DisplayLine::Top)),
    MenuOp::Goto(0),
    MenuOp::State(2),
    MenuOp::Execute(Command::CycleLine(DisplayLine::Bottom)),
    MenuOp::Goto(0),
    // Current-limit editor.
    MenuOp::State(3),
    MenuOp::Show(CURRENT_LIMIT_TITLE),
    MenuOp::Goto(4),
    MenuOp::State(4),
    MenuOp::Execute(Command::SelectSupply(SupplyId::A)),
    MenuOp::Buttons(5, 6, 0),
    MenuOp::State(5),
    MenuOp::Execute(Command::SelectSupply(SupplyId::B)),
    MenuOp::Buttons(4, 6, 0),
    MenuOp::State(6),
    MenuOp::Execute(Command::AdjustLimit),
    MenuOp::Buttons(7, 8, 9),
    MenuOp::State(7),
    MenuOp::Execute(Command::IncrementLimit),
    MenuOp::Goto(6),
    MenuOp::State(8),
    MenuOp::Execute(Command::DecrementLimit),
    MenuOp::Goto(6),
    // Save prompt.
    MenuOp::State(9),
    MenuOp::Show(SAVE_PROMPT),
    MenuOp::Execute(Command::ShowLimit),
    MenuOp::Buttons(10, 11, 11),
    MenuOp::State(10),
    MenuOp::Show(LIMIT_SAVED),
    MenuOp::Execute(Command::AcceptLimit),
    MenuOp::Pause(MESSAGE_PAUSE_MS),
    MenuOp::Goto(0),
    MenuOp::State(11),
    MenuOp::Execute(Command::RejectLimit),
    MenuOp::Goto(0),
    MenuOp::End,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuTable;

    #[test]
    fn supply_menu_compiles() {
        let table = MenuTable::build(SUPPLY_MENU).expect("navigation table is valid");
        assert_eq!(table.len(), 12);
        assert_eq!(table.prologue().text, Some(BANNER));
        assert_eq!(table.prologue().goto, Some(LIVE_READINGS));
        assert_eq!(
            table.state(9).and_then(|state| state.buttons),
            Some([10, 11, 11])
        );
    }
}
