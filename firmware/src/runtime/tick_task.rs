use embassy_time::{Duration, Ticker};
use supply_core::signals::EventSignals;

#[embassy_executor::task]
pub async fn run(signals: &'static EventSignals, period: Duration) -> ! {
    let mut ticker = Ticker::every(period);
    loop {
        ticker.next().await;
        signals.raise_tick();
    }
}
