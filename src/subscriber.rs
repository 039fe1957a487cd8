//! Subscriber registry for decoded messages.
//!
//! Subscribers are invoked synchronously, in registration order, on the
//! task that performs the dispatch (the frame assembler's task). There is
//! no deduplication and no unsubscribe; a slow callback delays the ones
//! registered after it.

use std::sync::Mutex;

use crate::protocol::Message;

/// A registered message callback.
pub type Subscriber = Box<dyn Fn(Message) + Send>;

/// Ordered, lock-guarded list of message subscribers.
///
/// `subscribe` may be called from any thread; `notify` runs on the
/// assembler task.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a callback to the registry.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(Message) + Send + 'static,
    {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push(Box::new(callback));
    }

    /// Invokes every subscriber in registration order.
    ///
    /// Each subscriber receives its own clone of the message.
    pub fn notify(&self, message: &Message) {
        let subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        tracing::trace!(
            index = message.index,
            message_type = message.message_type.as_str(),
            subscribers = subscribers.len(),
            "dispatching message"
        );
        for subscriber in subscribers.iter() {
            subscriber(message.clone());
        }
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .len()
    }

    /// Returns true if no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    use super::*;
    use crate::protocol::MessageType;

    fn message() -> Message {
        Message::new(1, MessageType::Data, vec![0xAB]).unwrap()
    }

    #[test]
    fn test_notify_in_registration_order() {
        let registry = SubscriberRegistry::new();
        let (tx, rx) = mpsc::channel();

        for id in 0..3 {
            let tx = tx.clone();
            registry.subscribe(move |_| tx.send(id).unwrap());
        }

        registry.notify(&message());

        assert_eq!(rx.try_recv().unwrap(), 0);
        assert_eq!(rx.try_recv().unwrap(), 1);
        assert_eq!(rx.try_recv().unwrap(), 2);
    }

    #[test]
    fn test_each_subscriber_gets_own_copy() {
        let registry = SubscriberRegistry::new();
        let (tx, rx) = mpsc::channel();

        for _ in 0..2 {
            let tx = tx.clone();
            registry.subscribe(move |msg| tx.send(msg.payload).unwrap());
        }

        registry.notify(&message());

        assert_eq!(rx.try_recv().unwrap().as_ref(), &[0xAB]);
        assert_eq!(rx.try_recv().unwrap().as_ref(), &[0xAB]);
    }

    #[test]
    fn test_notify_without_subscribers() {
        let registry = SubscriberRegistry::new();
        registry.notify(&message());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_subscriptions_kept() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let count = Arc::clone(&count);
            registry.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(registry.len(), 2);
        registry.notify(&message());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
