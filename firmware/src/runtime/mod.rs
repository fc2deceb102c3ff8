use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::i2c::{self, I2c, Master};
use embassy_stm32::mode::Blocking;
use embassy_stm32::time::Hertz;
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Duration};
use static_cell::StaticCell;
use supply_core::app::Board;
use supply_core::buttons::ButtonDebouncer;
use supply_core::config::ControllerConfig;
use supply_core::dispatcher::EventDispatcher;
use supply_core::signals::EventSignals;

use crate::events::EdgeChannel;
use crate::hw::adc::task::AuxAdc;
use crate::hw::adc::{self, ConversionSlot, SlotAdc};
use crate::hw::buttons::PanelButtons;
use crate::hw::ina219::Ina219;
use crate::hw::lcd::{Hd44780, LcdPins};
use crate::hw::outputs::ShutdownOutputs;
use crate::hw::system::BoardSystem;

mod button_task;
mod control_task;
mod tick_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Sensor bus clock.
const I2C_FREQUENCY: Hertz = Hertz(100_000);

pub(super) type BoardDispatcher = EventDispatcher<
    ShutdownOutputs<Output<'static>>,
    SlotAdc<'static>,
    Ina219<I2c<'static, Blocking, Master>>,
    Hd44780<Output<'static>, Delay>,
    BoardSystem,
>;

pub(super) static SIGNALS: EventSignals = EventSignals::new();
pub(super) static EDGES: EdgeChannel = Channel::new();
pub(super) static CONVERSION: ConversionSlot = ConversionSlot::new();
static DISPATCHER: StaticCell<BoardDispatcher> = StaticCell::new();

/// Converts a core duration into the executor's timebase.
pub(super) fn embassy_duration(period: core::time::Duration) -> Duration {
    Duration::from_micros(u64::try_from(period.as_micros()).unwrap_or(u64::MAX))
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA2,
        PA3,
        PB0,
        PB1,
        PB2,
        PB3,
        PB4,
        PB5,
        PB8,
        PB9,
        PB12,
        PB13,
        PB14,
        PB15,
        PC6,
        PC7,
        I2C1,
        ADC1,
        ..
    } = hal::init(config);

    let controller = ControllerConfig::DEFAULT;

    let outputs = ShutdownOutputs::new(
        [
            Output::new(PC6, Level::Low, Speed::Low),
            Output::new(PC7, Level::Low, Speed::Low),
        ],
        Output::new(PB5, Level::Low, Speed::Low),
    );

    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY;
    let bus = I2c::new_blocking(I2C1, PB8, PB9, i2c_config);
    let addresses = controller.sensors.map(|sensor| sensor.address);
    let sensor = Ina219::new(bus, addresses);

    let lcd = Hd44780::new(
        LcdPins {
            rs: Output::new(PB3, Level::Low, Speed::Low),
            enable: Output::new(PB4, Level::Low, Speed::Low),
            data: [
                Output::new(PB12, Level::Low, Speed::Low),
                Output::new(PB13, Level::Low, Speed::Low),
                Output::new(PB14, Level::Low, Speed::Low),
                Output::new(PB15, Level::Low, Speed::Low),
            ],
        },
        Delay,
    );

    let aux = AuxAdc::new(
        Adc::new(ADC1),
        [
            PA0.degrade_adc(),
            PA1.degrade_adc(),
            PA2.degrade_adc(),
            PA3.degrade_adc(),
        ],
    );

    let buttons = PanelButtons::new([
        Input::new(PB0, Pull::Up),
        Input::new(PB1, Pull::Up),
        Input::new(PB2, Pull::Up),
    ]);

    let board = Board::new(outputs, SlotAdc::new(&CONVERSION), sensor, lcd);
    let dispatcher = DISPATCHER.init(EventDispatcher::new(board, BoardSystem, controller));
    dispatcher.start();
    defmt::info!("controller: started");

    spawner
        .spawn(adc::task::run(aux, &CONVERSION, &SIGNALS))
        .expect("failed to spawn ADC task");

    spawner
        .spawn(tick_task::run(
            &SIGNALS,
            embassy_duration(controller.tick_period),
        ))
        .expect("failed to spawn tick task");

    spawner
        .spawn(button_task::run(
            buttons,
            ButtonDebouncer::new(controller.debounce_samples),
            EDGES.sender(),
            embassy_duration(controller.scan_period),
        ))
        .expect("failed to spawn button task");

    spawner
        .spawn(control_task::run(dispatcher, EDGES.receiver()))
        .expect("failed to spawn control task");

    core::future::pending::<()>().await;
}
