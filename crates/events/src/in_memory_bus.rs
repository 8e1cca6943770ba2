//! In-process bus backed by std channels.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, mpsc};

use crate::bus::{EventBus, Subscription};

#[derive(Debug, PartialEq, Eq)]
pub enum InMemoryBusError {
    /// The subscriber table lock was poisoned by a panicking publisher.
    Poisoned,
}

/// Fan-out bus: each subscriber owns an unbounded channel, keyed by the
/// order in which it subscribed.
///
/// Subscribers whose receiver was dropped are pruned on the next publish.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<BTreeMap<u64, mpsc::Sender<M>>>,
    next_subscriber: AtomicU64,
    published: AtomicU64,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages accepted by `publish` so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Number of live subscribers as of the last publish/subscribe.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl<M: Clone> InMemoryEventBus<M> {
    /// Hand `message` to every live subscriber, oldest first, and return how
    /// many received it.
    pub fn deliver(&self, message: M) -> Result<usize, InMemoryBusError> {
        let mut subs = self.subscribers.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        let mut gone = Vec::new();
        for (&key, tx) in subs.iter() {
            if tx.send(message.clone()).is_err() {
                gone.push(key);
            }
        }
        for key in &gone {
            subs.remove(key);
        }
        if !gone.is_empty() {
            tracing::debug!(pruned = gone.len(), live = subs.len(), "dropped closed subscriptions");
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(subs.len())
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(BTreeMap::new()),
            next_subscriber: AtomicU64::new(0),
            published: AtomicU64::new(0),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        self.deliver(message).map(|_| ())
    }

    /// On a poisoned table the sender is dropped at once, so the returned
    /// subscription reports a disconnect instead of waiting forever.
    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        let key = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        match self.subscribers.lock() {
            Ok(mut subs) => {
                subs.insert(key, tx);
            }
            Err(_) => tracing::warn!(subscriber = key, "event bus poisoned; subscription is closed"),
        }
        Subscription::new(rx)
    }
}
