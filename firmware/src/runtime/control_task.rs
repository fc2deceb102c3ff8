use crate::events::{EdgeReceiver, drain};
use crate::report::log_pass;

use super::{BoardDispatcher, SIGNALS};

#[embassy_executor::task]
pub async fn run(dispatcher: &'static mut BoardDispatcher, edges: EdgeReceiver<'static>) -> ! {
    loop {
        let summary = dispatcher.pump(&SIGNALS, drain(&edges));
        log_pass(&summary);
        embassy_futures::yield_now().await;
    }
}
