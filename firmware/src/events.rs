//! Queues shared between the firmware tasks.

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use supply_core::buttons::ButtonEvent;
use supply_core::dispatcher::EDGE_QUEUE_CAPACITY;

#[cfg(target_os = "none")]
pub type BoardMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
pub type BoardMutex = NoopRawMutex;

/// Debounced edges travelling from the button scanner to the dispatcher.
pub type EdgeChannel = Channel<BoardMutex, ButtonEvent, EDGE_QUEUE_CAPACITY>;

pub type EdgeSender<'a> = Sender<'a, BoardMutex, ButtonEvent, EDGE_QUEUE_CAPACITY>;

pub type EdgeReceiver<'a> = Receiver<'a, BoardMutex, ButtonEvent, EDGE_QUEUE_CAPACITY>;

/// Everything currently queued, oldest first, without waiting.
pub fn drain<'a>(receiver: &'a EdgeReceiver<'_>) -> impl Iterator<Item = ButtonEvent> + 'a {
    core::iter::from_fn(move || receiver.try_receive().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use supply_core::hal::ButtonId;

    #[test]
    fn drain_yields_edges_in_order_and_empties_the_queue() {
        let channel = EdgeChannel::new();
        let sender = channel.sender();
        sender.try_send(ButtonEvent::down(ButtonId::Up)).unwrap();
        sender.try_send(ButtonEvent::up(ButtonId::Up)).unwrap();

        let receiver = channel.receiver();
        let edges: Vec<ButtonEvent> = drain(&receiver).collect();
        assert_eq!(
            edges,
            [ButtonEvent::down(ButtonId::Up), ButtonEvent::up(ButtonId::Up)]
        );
        assert_eq!(drain(&receiver).count(), 0);
    }

    #[test]
    fn full_queue_rejects_further_edges() {
        let channel = EdgeChannel::new();
        let sender = channel.sender();
        for _ in 0..EDGE_QUEUE_CAPACITY {
            sender.try_send(ButtonEvent::down(ButtonId::Select)).unwrap();
        }
        assert!(sender.try_send(ButtonEvent::up(ButtonId::Select)).is_err());
    }
}
