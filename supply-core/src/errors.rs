//! Error codes and the on-screen error console.
//!
//! Faults are reported synchronously where they are detected. Notes and
//! warnings take over the display for a fixed hold time and then hand it
//! back; a fatal error stays on screen and halts the controller.

use core::fmt;

use crate::hal::{SupplyId, SystemControl, TextSink};

/// How severe a reported fault is.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    Note,
    Warning,
    Fatal,
}

impl Severity {
    /// Screen prefix shown before the code.
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Note => "Note:",
            Severity::Warning => "Warn:",
            Severity::Fatal => "Fatl:",
        }
    }
}

/// Fault identifiers, displayed as raw hexadecimal codes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// A sensor register read failed during a poll.
    SensorRead(SupplyId),
    /// A sensor rejected its startup configuration.
    SensorConfig(SupplyId),
    /// An ADC channel produced a sample above full scale.
    AdcRange(u8),
    /// The debounced edge queue was full.
    ButtonOverflow,
    /// The menu table failed validation at startup.
    MenuTable,
    /// The menu engine hit an impossible transition.
    MenuRuntime,
    Custom(u32),
}

impl ErrorCode {
    const SENSOR_READ: u32 = 0x10;
    const SENSOR_CONFIG: u32 = 0x20;
    const ADC_RANGE: u32 = 0x30;
    const BUTTON_OVERFLOW: u32 = 0x40;
    const MENU_TABLE: u32 = 0x50;
    const MENU_RUNTIME: u32 = 0x51;

    pub fn to_raw(self) -> u32 {
        match self {
            ErrorCode::SensorRead(supply) => Self::SENSOR_READ + supply_offset(supply),
            ErrorCode::SensorConfig(supply) => Self::SENSOR_CONFIG + supply_offset(supply),
            ErrorCode::AdcRange(channel) => Self::ADC_RANGE + u32::from(channel),
            ErrorCode::ButtonOverflow => Self::BUTTON_OVERFLOW,
            ErrorCode::MenuTable => Self::MENU_TABLE,
            ErrorCode::MenuRuntime => Self::MENU_RUNTIME,
            ErrorCode::Custom(raw) => raw,
        }
    }

    pub fn from_raw(raw: u32) -> Self {
        let offset = usize::try_from(raw & 0x0f).unwrap_or(usize::MAX);
        let supply = SupplyId::from_index(offset);
        match (raw & !0x0f, supply) {
            (Self::SENSOR_READ, Some(supply)) => ErrorCode::SensorRead(supply),
            (Self::SENSOR_CONFIG, Some(supply)) => ErrorCode::SensorConfig(supply),
            (Self::ADC_RANGE, _) if offset < crate::hal::ADC_CHANNEL_COUNT => {
                ErrorCode::AdcRange(u8::try_from(offset).unwrap_or(0))
            }
            _ => match raw {
                Self::BUTTON_OVERFLOW => ErrorCode::ButtonOverflow,
                Self::MENU_TABLE => ErrorCode::MenuTable,
                Self::MENU_RUNTIME => ErrorCode::MenuRuntime,
                other => ErrorCode::Custom(other),
            },
        }
    }

    /// Severity the controller reports this code with.
    pub const fn severity(self) -> Severity {
        match self {
            ErrorCode::SensorRead(_) | ErrorCode::AdcRange(_) | ErrorCode::Custom(_) => {
                Severity::Warning
            }
            ErrorCode::ButtonOverflow => Severity::Note,
            ErrorCode::SensorConfig(_) | ErrorCode::MenuTable | ErrorCode::MenuRuntime => {
                Severity::Fatal
            }
        }
    }
}

const fn supply_offset(supply: SupplyId) -> u32 {
    match supply {
        SupplyId::A => 0,
        SupplyId::B => 1,
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        HexCode(self.to_raw()).fmt(f)
    }
}

/// `0x` followed by the value in whole lowercase bytes: `0x00`, `0x21`,
/// `0x0123`, `0xab`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HexCode(pub u32);

impl fmt::Display for HexCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = match self.0 {
            0..=0xff => 2,
            0x100..=0xffff => 4,
            0x1_0000..=0xff_ffff => 6,
            _ => 8,
        };
        write!(f, "0x{:0width$x}", self.0)
    }
}

/// Renders faults on the display and enforces the severity policy.
pub struct ErrorConsole<C> {
    system: C,
    hold_ms: u32,
    reported: u32,
    last: Option<(ErrorCode, Severity)>,
}

impl<C: SystemControl> ErrorConsole<C> {
    pub const fn new(system: C, hold_ms: u32) -> Self {
        Self {
            system,
            hold_ms,
            reported: 0,
            last: None,
        }
    }

    /// Number of non-fatal reports so far.
    pub const fn reported(&self) -> u32 {
        self.reported
    }

    pub const fn last(&self) -> Option<(ErrorCode, Severity)> {
        self.last
    }

    pub fn system(&mut self) -> &mut C {
        &mut self.system
    }

    /// Shows the fault and holds it on screen. A fatal severity never
    /// returns. The caller owns marking the passive display dirty.
    pub fn report<T: TextSink>(&mut self, sink: &mut T, code: ErrorCode, severity: Severity) {
        if severity == Severity::Fatal {
            self.fatal(sink, code);
        }

        render(sink, code, severity);
        self.reported = self.reported.saturating_add(1);
        self.last = Some((code, severity));
        self.system.delay_ms(self.hold_ms);
    }

    /// Shows a fatal fault and stops.
    pub fn fatal<T: TextSink>(&mut self, sink: &mut T, code: ErrorCode) -> ! {
        render(sink, code, Severity::Fatal);
        self.last = Some((code, Severity::Fatal));
        self.system.halt()
    }
}

fn render<T: TextSink>(sink: &mut T, code: ErrorCode, severity: Severity) {
    use core::fmt::Write;

    let mut text: heapless::String<16> = heapless::String::new();
    // Prefix and an eight-digit code always fit.
    let _ = write!(text, "{}{}", severity.label(), code);
    sink.clear();
    sink.write_text(&text);
}
