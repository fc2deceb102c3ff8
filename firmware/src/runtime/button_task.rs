use embassy_stm32::gpio::Input;
use embassy_time::{Duration, Ticker};
use supply_core::buttons::ButtonDebouncer;

use crate::events::EdgeSender;
use crate::hw::buttons::PanelButtons;

#[embassy_executor::task]
pub async fn run(
    mut buttons: PanelButtons<Input<'static>>,
    mut debouncer: ButtonDebouncer,
    edges: EdgeSender<'static>,
    period: Duration,
) -> ! {
    let mut ticker = Ticker::every(period);
    loop {
        ticker.next().await;
        for edge in debouncer.scan(&mut buttons) {
            // The dispatcher reports its own overflow once edges reach it.
            if edges.try_send(edge).is_err() {
                defmt::warn!("buttons: edge channel full");
            }
        }
    }
}
