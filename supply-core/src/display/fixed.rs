//! Fixed-point decimal formatting.
//!
//! Values are stored as integers with an implied scale (for example
//! millivolts with scale 1000 render as volts). Fractional digits are
//! truncated toward zero, never rounded, so a displayed value never exceeds
//! the measured one.

use core::fmt;

/// Integer value rendered as a decimal with a fixed number of digits.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FixedPoint {
    value: i32,
    scale: u32,
    digits: u8,
}

impl FixedPoint {
    /// `value / scale`, rendered with no fractional digits until
    /// [`digits`](Self::digits) is called. A zero scale is treated as one.
    pub const fn new(value: i32, scale: u32) -> Self {
        Self {
            value,
            scale: if scale == 0 { 1 } else { scale },
            digits: 0,
        }
    }

    /// Sets the number of fractional digits (at most 6).
    #[must_use]
    pub const fn digits(mut self, digits: u8) -> Self {
        self.digits = if digits > 6 { 6 } else { digits };
        self
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = u64::from(self.value.unsigned_abs());
        let scale = u64::from(self.scale);
        let whole = magnitude / scale;
        let unit = 10u64.pow(u32::from(self.digits));
        let fraction = (magnitude % scale) * unit / scale;

        if self.value < 0 && (whole > 0 || fraction > 0) {
            f.write_str("-")?;
        }
        write!(f, "{whole}")?;
        if self.digits > 0 {
            write!(f, ".{fraction:0width$}", width = usize::from(self.digits))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::String;

    fn render(value: FixedPoint) -> String<16> {
        let mut out = String::new();
        write!(out, "{value}").unwrap();
        out
    }

    #[test]
    fn renders_millivolts_as_volts() {
        assert_eq!(render(FixedPoint::new(1234, 1000).digits(2)), "1.23");
        assert_eq!(render(FixedPoint::new(0, 1000).digits(2)), "0.00");
        assert_eq!(render(FixedPoint::new(12_005, 1000).digits(2)), "12.00");
        assert_eq!(render(FixedPoint::new(50, 1000).digits(2)), "0.05");
    }

    #[test]
    fn truncates_instead_of_rounding() {
        assert_eq!(render(FixedPoint::new(1239, 1000).digits(2)), "1.23");
        assert_eq!(render(FixedPoint::new(999, 1000).digits(2)), "0.99");
        assert_eq!(render(FixedPoint::new(19, 10).digits(0)), "1");
    }

    #[test]
    fn renders_tenths_of_milliamps() {
        assert_eq!(render(FixedPoint::new(1234, 10).digits(1)), "123.4");
        assert_eq!(render(FixedPoint::new(7, 10).digits(1)), "0.7");
    }

    #[test]
    fn sign_only_when_visible() {
        assert_eq!(render(FixedPoint::new(-1234, 1000).digits(2)), "-1.23");
        assert_eq!(render(FixedPoint::new(-4, 1000).digits(2)), "0.00");
        assert_eq!(render(FixedPoint::new(i32::MIN, 1).digits(0)), "-2147483648");
    }
}
