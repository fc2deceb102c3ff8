//! Auxiliary analog inputs.
//!
//! The dispatcher starts conversions through [`SlotAdc`], which only posts
//! the channel number into a [`ConversionSlot`]. The ADC task owns the
//! peripheral, performs the read, stores the result back into the slot and
//! raises the conversion flag.

use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU16, Ordering};
use supply_core::hal::AnalogInput;

use crate::events::BoardMutex;

/// Right shift from the converter's 12-bit samples to the 10-bit scale used
/// by the averaging window.
pub const SAMPLE_SHIFT: u32 = 2;

/// Hand-off between the dispatcher and the ADC task.
pub struct ConversionSlot {
    request: Signal<BoardMutex, u8>,
    result: AtomicU16,
}

impl ConversionSlot {
    pub const fn new() -> Self {
        Self {
            request: Signal::new(),
            result: AtomicU16::new(0),
        }
    }

    /// Waits for the next requested channel.
    pub async fn requested(&self) -> u8 {
        self.request.wait().await
    }

    /// Takes a pending request without waiting.
    pub fn try_requested(&self) -> Option<u8> {
        self.request.try_take()
    }

    /// Publishes a raw 12-bit sample.
    pub fn complete(&self, sample: u16) {
        self.result.store(sample >> SAMPLE_SHIFT, Ordering::Release);
    }
}

/// [`AnalogInput`] view of a [`ConversionSlot`].
#[derive(Clone, Copy)]
pub struct SlotAdc<'a> {
    slot: &'a ConversionSlot,
}

impl<'a> SlotAdc<'a> {
    pub const fn new(slot: &'a ConversionSlot) -> Self {
        Self { slot }
    }
}

impl AnalogInput for SlotAdc<'_> {
    fn start_conversion(&mut self, channel: u8) {
        self.slot.request.signal(channel);
    }

    fn last_conversion(&mut self) -> u16 {
        self.slot.result.load(Ordering::Acquire)
    }
}

#[cfg(target_os = "none")]
pub mod task {
    use embassy_stm32::adc::{Adc, AnyAdcChannel, SampleTime};
    use embassy_stm32::peripherals::ADC1;
    use supply_core::hal::ADC_CHANNEL_COUNT;
    use supply_core::signals::EventSignals;

    use super::ConversionSlot;

    pub struct AuxAdc {
        pub adc: Adc<'static, ADC1>,
        pub channels: [AnyAdcChannel<ADC1>; ADC_CHANNEL_COUNT],
    }

    impl AuxAdc {
        pub fn new(
            mut adc: Adc<'static, ADC1>,
            channels: [AnyAdcChannel<ADC1>; ADC_CHANNEL_COUNT],
        ) -> Self {
            adc.set_sample_time(SampleTime::CYCLES79_5);
            Self { adc, channels }
        }
    }

    #[embassy_executor::task]
    pub async fn run(
        mut aux: AuxAdc,
        slot: &'static ConversionSlot,
        signals: &'static EventSignals,
    ) -> ! {
        loop {
            let channel = slot.requested().await;
            let Some(input) = aux.channels.get_mut(usize::from(channel)) else {
                defmt::warn!("adc: ignoring request for channel {=u8}", channel);
                continue;
            };
            let sample = aux.adc.blocking_read(input);
            slot.complete(sample);
            signals.raise_conversion();
        }
    }
}
