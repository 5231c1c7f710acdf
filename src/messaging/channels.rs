// Lock-free change notification channel

use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub type ChangeProducer = ringbuf::HeapProd<Notification>;
pub type ChangeConsumer = ringbuf::HeapCons<Notification>;

/// Bounded SPSC channel from an editing session to one subscriber
pub fn create_change_channel(capacity: usize) -> (ChangeProducer, ChangeConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::notification::ChangeEvent;
    use ringbuf::traits::{Consumer, Producer};

    #[test]
    fn test_channel_is_bounded() {
        let (mut tx, mut rx) = create_change_channel(2);
        assert!(tx.try_push(Notification::new(1, ChangeEvent::Saved)).is_ok());
        assert!(tx.try_push(Notification::new(2, ChangeEvent::Saved)).is_ok());
        assert!(tx.try_push(Notification::new(3, ChangeEvent::Saved)).is_err());

        assert_eq!(rx.try_pop().map(|n| n.sequence), Some(1));
        assert_eq!(rx.try_pop().map(|n| n.sequence), Some(2));
        assert!(rx.try_pop().is_none());
    }
}
