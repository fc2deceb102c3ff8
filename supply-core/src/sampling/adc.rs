//! Round-robin ADC averaging.

use crate::config::{ADC_AVERAGE_WINDOW, ADC_FULL_SCALE_MILLIVOLTS, ADC_STEPS};
use crate::hal::ADC_CHANNEL_COUNT;

/// Largest code a 10-bit conversion can produce.
pub const ADC_MAX_CODE: u16 = 1023;

/// Result of folding one conversion into the averaging state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FoldOutcome {
    /// The sample was accumulated; no averages were published.
    Accumulated,
    /// A full window completed and new averages were published.
    Published { changed: bool },
}

/// A conversion exceeded the 10-bit range and was clamped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutOfRange {
    pub channel: u8,
    pub raw: u16,
}

/// Accumulates conversions for the four auxiliary channels and publishes
/// rounded averages once every channel has a full window of samples.
#[derive(Clone, Debug)]
pub struct AdcAverager {
    accumulators: [u32; ADC_CHANNEL_COUNT],
    millivolts: [u16; ADC_CHANNEL_COUNT],
    channel: u8,
    rounds: u16,
    window: u16,
    full_scale_mv: u32,
}

impl AdcAverager {
    pub const fn new(window: u16, full_scale_mv: u32) -> Self {
        Self {
            accumulators: [0; ADC_CHANNEL_COUNT],
            millivolts: [0; ADC_CHANNEL_COUNT],
            channel: 0,
            rounds: 0,
            window: if window == 0 { 1 } else { window },
            full_scale_mv,
        }
    }

    /// Channel whose conversion the next fold will consume.
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// Raw sum collected for `channel` since the last publish.
    pub fn accumulator(&self, channel: u8) -> u32 {
        self.accumulators[usize::from(channel)]
    }

    /// Last published average for `channel`.
    pub fn millivolts(&self, channel: u8) -> u16 {
        self.millivolts[usize::from(channel)]
    }

    /// Last published averages for every channel.
    pub const fn all_millivolts(&self) -> [u16; ADC_CHANNEL_COUNT] {
        self.millivolts
    }

    /// Adds `raw` to the current channel and advances the round-robin.
    ///
    /// Codes above [`ADC_MAX_CODE`] are clamped and reported through the
    /// error value; the clamped sample still counts toward the window.
    pub fn fold(&mut self, raw: u16) -> (FoldOutcome, Option<OutOfRange>) {
        let channel = self.channel;
        let range_error = (raw > ADC_MAX_CODE).then_some(OutOfRange { channel, raw });
        let sample = raw.min(ADC_MAX_CODE);

        self.accumulators[usize::from(channel)] += u32::from(sample);
        self.channel += 1;
        if usize::from(self.channel) < ADC_CHANNEL_COUNT {
            return (FoldOutcome::Accumulated, range_error);
        }

        self.channel = 0;
        self.rounds += 1;
        if self.rounds < self.window {
            return (FoldOutcome::Accumulated, range_error);
        }

        self.rounds = 0;
        let mut changed = false;
        for (sum, published) in self.accumulators.iter_mut().zip(self.millivolts.iter_mut()) {
            let value = average_millivolts(*sum, self.window, self.full_scale_mv);
            if value != *published {
                *published = value;
                changed = true;
            }
            *sum = 0;
        }
        (FoldOutcome::Published { changed }, range_error)
    }
}

impl Default for AdcAverager {
    fn default() -> Self {
        Self::new(ADC_AVERAGE_WINDOW, ADC_FULL_SCALE_MILLIVOLTS)
    }
}

/// `((sum + window / 2) / window) * full_scale / 1024`, in integer arithmetic.
pub fn average_millivolts(sum: u32, window: u16, full_scale_mv: u32) -> u16 {
    let window = u32::from(window.max(1));
    let mean = (sum + window / 2) / window;
    let millivolts = mean * full_scale_mv / ADC_STEPS;
    u16::try_from(millivolts).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_round(averager: &mut AdcAverager, samples: [u16; ADC_CHANNEL_COUNT]) -> FoldOutcome {
        let mut outcome = FoldOutcome::Accumulated;
        for sample in samples {
            outcome = averager.fold(sample).0;
        }
        outcome
    }

    #[test]
    fn channels_advance_round_robin() {
        let mut averager = AdcAverager::default();
        assert_eq!(averager.channel(), 0);
        averager.fold(10);
        assert_eq!(averager.channel(), 1);
        averager.fold(20);
        averager.fold(30);
        averager.fold(40);
        assert_eq!(averager.channel(), 0);
        assert_eq!(averager.accumulator(0), 10);
        assert_eq!(averager.accumulator(3), 40);
    }

    #[test]
    fn publishes_rounded_average_after_full_window() {
        let mut averager = AdcAverager::default();
        // Channel 0 alternates 511/512 so its sum is 8184.
        for round in 0..15 {
            let first = if round % 2 == 0 { 511 } else { 512 };
            assert_eq!(
                feed_round(&mut averager, [first, 1023, 0, 100]),
                FoldOutcome::Accumulated
            );
        }
        let outcome = feed_round(&mut averager, [512, 1023, 0, 100]);
        assert_eq!(outcome, FoldOutcome::Published { changed: true });

        let sum0: u32 = 8 * 511 + 8 * 512;
        assert_eq!(averager.millivolts(0), average_millivolts(sum0, 16, 5000));
        assert_eq!(averager.millivolts(0), u16::try_from(((sum0 + 8) / 16) * 5000 / 1024).unwrap());
        assert_eq!(averager.millivolts(1), 4995);
        assert_eq!(averager.millivolts(2), 0);
        assert_eq!(averager.millivolts(3), 488);

        for channel in 0..4 {
            assert_eq!(averager.accumulator(channel), 0);
        }
    }

    #[test]
    fn unchanged_window_reports_no_change() {
        let mut averager = AdcAverager::default();
        for _ in 0..16 {
            feed_round(&mut averager, [200, 200, 200, 200]);
        }
        let mut last = FoldOutcome::Accumulated;
        for _ in 0..16 {
            last = feed_round(&mut averager, [200, 200, 200, 200]);
        }
        assert_eq!(last, FoldOutcome::Published { changed: false });
    }

    #[test]
    fn out_of_range_samples_are_clamped_and_reported() {
        let mut averager = AdcAverager::default();
        let (_, error) = averager.fold(4095);
        assert_eq!(error, Some(OutOfRange { channel: 0, raw: 4095 }));
        assert_eq!(averager.accumulator(0), 1023);
        assert_eq!(averager.channel(), 1);
    }
}
