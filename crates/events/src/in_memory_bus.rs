//! Process-local bus: every subscriber gets its own channel.

use std::convert::Infallible;
use std::sync::mpsc::{self, Sender, SyncSender, TrySendError};

use parking_lot::Mutex;
use tracing::warn;

use crate::bus::{EventBus, Subscription};

type Filter<M> = Box<dyn Fn(&M) -> bool + Send + Sync>;

enum Outbox<M> {
    Unbounded(Sender<M>),
    Bounded(SyncSender<M>),
}

struct Subscriber<M> {
    outbox: Outbox<M>,
    filter: Option<Filter<M>>,
}

impl<M> Subscriber<M> {
    fn wants(&self, message: &M) -> bool {
        self.filter.as_ref().is_none_or(|f| f(message))
    }

    /// False once the receiving side is gone.
    fn deliver(&self, message: M) -> bool {
        match &self.outbox {
            Outbox::Unbounded(tx) => tx.send(message).is_ok(),
            Outbox::Bounded(tx) => match tx.try_send(message) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!("bounded subscriber is full; message dropped");
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            },
        }
    }
}

/// Subscriptions from [`EventBus::subscribe`] and [`Self::subscribe_where`]
/// queue without limit until drained; a consumer that may fall behind should
/// use [`Self::subscribe_bounded`].
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<Subscriber<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the messages `filter` accepts, e.g. only owner audits.
    pub fn subscribe_where(&self, filter: impl Fn(&M) -> bool + Send + Sync + 'static) -> Subscription<M> {
        let (sender, receiver) = mpsc::channel();
        self.register(Outbox::Unbounded(sender), Some(Box::new(filter)));
        Subscription::new(receiver)
    }

    /// At most `capacity` undrained messages; newer ones are dropped while full.
    pub fn subscribe_bounded(&self, capacity: usize) -> Subscription<M> {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        self.register(Outbox::Bounded(sender), None);
        Subscription::new(receiver)
    }

    /// Live subscribers; dropped ones are pruned on the next publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    fn register(&self, outbox: Outbox<M>, filter: Option<Filter<M>>) {
        self.subscribers.lock().push(Subscriber { outbox, filter });
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<M> core::fmt::Debug for InMemoryEventBus<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = Infallible;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        // A filtered-out subscriber is only pruned once a message reaches it.
        self.subscribers
            .lock()
            .retain(|sub| !sub.wants(&message) || sub.deliver(message.clone()));
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (sender, receiver) = mpsc::channel();
        self.register(Outbox::Unbounded(sender), None);
        Subscription::new(receiver)
    }
}
