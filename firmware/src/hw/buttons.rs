//! Front-panel push buttons.
//!
//! The buttons short their line to ground and rely on the internal pull-ups,
//! so a low level reads as pressed.

use core::convert::Infallible;

use embedded_hal::digital::InputPin;
use supply_core::hal::{BUTTON_COUNT, ButtonId, ButtonInput};

pub struct PanelButtons<P> {
    pins: [P; BUTTON_COUNT],
}

impl<P: InputPin<Error = Infallible>> PanelButtons<P> {
    /// Pins in UP, DOWN, SELECT order.
    pub fn new(pins: [P; BUTTON_COUNT]) -> Self {
        Self { pins }
    }
}

impl<P: InputPin<Error = Infallible>> ButtonInput for PanelButtons<P> {
    fn read_raw(&mut self, button: ButtonId) -> bool {
        let Ok(low) = self.pins[button.as_index()].is_low();
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::ErrorType;
    use supply_core::buttons::{ButtonDebouncer, ButtonEvent};

    struct Level(bool);

    impl ErrorType for Level {
        type Error = Infallible;
    }

    impl InputPin for Level {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0)
        }
    }

    #[test]
    fn low_level_reads_as_pressed() {
        let mut buttons = PanelButtons::new([Level(true), Level(false), Level(true)]);
        assert!(!buttons.read_raw(ButtonId::Up));
        assert!(buttons.read_raw(ButtonId::Down));
        assert!(!buttons.read_raw(ButtonId::Select));
    }

    #[test]
    fn held_button_debounces_to_one_edge() {
        let mut buttons = PanelButtons::new([Level(true), Level(true), Level(false)]);
        let mut debouncer = ButtonDebouncer::new(4);

        let edges: Vec<ButtonEvent> = (0..10)
            .flat_map(|_| debouncer.scan(&mut buttons))
            .collect();
        assert_eq!(edges, [ButtonEvent::down(ButtonId::Select)]);
    }
}
