//! The audio resource contract and event fan-out.

use crate::error::PlaybackResult;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Future returned by [`AudioResource::play`].
pub type PlayFuture = BoxFuture<'static, PlaybackResult>;

/// Lifecycle signals an audio resource reports to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceEvent {
    /// Enough data is buffered to play through without stalling.
    /// May be reported more than once.
    CanPlayThrough,
    /// Playback reached the natural end of the track.
    Ended,
}

/// Identifies one subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Receiving end of a subscription.
///
/// The channel closes once the resource drops the matching sender, which
/// happens on [`AudioResource::unsubscribe`] or when the resource goes away.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    events: UnboundedReceiver<ResourceEvent>,
}

impl Subscription {
    /// Pairs an id with the receiver created for it.
    pub fn new(id: SubscriptionId, events: UnboundedReceiver<ResourceEvent>) -> Self {
        Self { id, events }
    }

    /// The id to pass to [`AudioResource::unsubscribe`].
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event, `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<ResourceEvent> {
        self.events.recv().await
    }

    /// Returns an event that is already queued, if any.
    pub fn try_recv(&mut self) -> Option<ResourceEvent> {
        self.events.try_recv().ok()
    }

    /// Splits the subscription into its id and receiver.
    pub fn into_parts(self) -> (SubscriptionId, UnboundedReceiver<ResourceEvent>) {
        (self.id, self.events)
    }
}

/// Capabilities the music toggle needs from an audio backend.
///
/// Implementations own exactly one track. `play` may be refused (for example
/// by an autoplay policy) and reports that through its future; `pause` never
/// fails. Lifecycle signals are delivered through subscriptions, and every
/// subscription taken must be given back with `unsubscribe`.
pub trait AudioResource: Send + Sync {
    /// Requests playback. Resolves once the backend has started or refused.
    fn play(&self) -> PlayFuture;

    /// Stops playback, keeping the position.
    fn pause(&self);

    /// Registers a listener for [`ResourceEvent`]s.
    fn subscribe(&self) -> Subscription;

    /// Removes a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Fan-out of resource events to any number of subscribers.
///
/// Resource implementations embed a hub and forward their `subscribe` and
/// `unsubscribe` calls to it.
#[derive(Debug, Default)]
pub struct EventHub {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, UnboundedSender<ResourceEvent>)>>,
}

impl EventHub {
    /// Creates a hub without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let (tx, rx) = unbounded_channel();
        self.listeners.lock().push((id, tx));
        Subscription::new(id, rx)
    }

    /// Removes a listener, closing its channel. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener, _)| *listener != id);
        listeners.len() != before
    }

    /// Sends `event` to one listener. Returns whether it was delivered.
    pub fn notify(&self, id: SubscriptionId, event: ResourceEvent) -> bool {
        self.listeners
            .lock()
            .iter()
            .find(|(listener, _)| *listener == id)
            .is_some_and(|(_, tx)| tx.send(event).is_ok())
    }

    /// Sends `event` to every listener and returns how many received it.
    /// Listeners whose receiver was dropped are removed.
    pub fn emit(&self, event: ResourceEvent) -> usize {
        let mut listeners = self.listeners.lock();
        listeners.retain(|(_, tx)| tx.send(event).is_ok());
        listeners.len()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Whether nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_every_listener() {
        let hub = EventHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_ne!(a.id(), b.id());

        assert_eq!(hub.emit(ResourceEvent::CanPlayThrough), 2);
        assert_eq!(a.try_recv(), Some(ResourceEvent::CanPlayThrough));
        assert_eq!(b.try_recv(), Some(ResourceEvent::CanPlayThrough));
        assert_eq!(a.try_recv(), None);
    }

    #[test]
    fn test_unsubscribe_closes_channel() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe();
        assert!(hub.unsubscribe(sub.id()));
        assert!(!hub.unsubscribe(sub.id()));
        assert!(hub.is_empty());

        assert_eq!(hub.emit(ResourceEvent::Ended), 0);
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_unsubscribe() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe();
        hub.emit(ResourceEvent::Ended);
        hub.unsubscribe(sub.id());

        // Queued events are still delivered before the channel reports closed.
        assert_eq!(sub.recv().await, Some(ResourceEvent::Ended));
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let hub = EventHub::new();
        let kept = hub.subscribe();
        drop(hub.subscribe());

        assert_eq!(hub.emit(ResourceEvent::CanPlayThrough), 1);
        assert_eq!(hub.len(), 1);
        assert!(hub.notify(kept.id(), ResourceEvent::Ended));
    }
}
