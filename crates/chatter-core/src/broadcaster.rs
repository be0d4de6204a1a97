//! Message broadcaster with snapshot-atomic subscription.
//!
//! The [`Broadcaster`] owns the [`HistoryLog`] and a registry of live
//! subscribers. Both live behind one mutex, and that mutex is the single
//! critical section for the two operations that matter:
//!
//! - **publish** -- stamp, append to the log, push to every registered
//!   subscriber.
//! - **subscribe** -- copy the log, register a new subscriber.
//!
//! Because neither step can interleave with the other, every published
//! message lands either in a new subscriber's snapshot or in its live
//! channel, never both and never neither.
//!
//! Each subscriber gets its own unbounded [`mpsc`] channel, so publishing
//! never waits on a consumer. A subscriber whose receiving side is gone is
//! removed on the next publish, or immediately when its [`Subscription`]
//! is dropped.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use chatter_types::{Message, MessageDraft, SubscriberId};
use futures::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::CoreError;
use crate::history::HistoryLog;

/// Point-in-time counters for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BroadcasterStats {
    /// Messages in the history log.
    pub messages: usize,
    /// Currently registered subscribers.
    pub subscribers: usize,
}

/// State guarded by the broadcaster's mutex.
#[derive(Debug, Default)]
struct Shared {
    history: HistoryLog,
    subscribers: BTreeMap<SubscriberId, mpsc::UnboundedSender<Message>>,
}

/// Publishes chat messages and fans them out to live subscribers.
///
/// Construct one per process and share it (typically behind an [`Arc`])
/// with whatever needs to publish or subscribe.
#[derive(Debug, Default)]
pub struct Broadcaster {
    shared: Arc<Mutex<Shared>>,
}

impl Broadcaster {
    /// Create a broadcaster with an empty history and no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a message.
    ///
    /// The draft is validated, stamped with the current time, appended to
    /// the history, and delivered to every subscriber registered before
    /// this call. Subscribers whose receiving side has gone away are
    /// deregistered. Returns the stamped message.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingField`] if `user` or `text` is absent.
    /// Nothing is recorded in that case.
    pub fn publish(&self, draft: MessageDraft) -> Result<Message, CoreError> {
        let user = draft.user.ok_or(CoreError::MissingField { field: "user" })?;
        let text = draft.text.ok_or(CoreError::MissingField { field: "text" })?;

        let mut shared = self.lock();

        // Stamp under the lock so timestamps follow publication order.
        let message = Message::stamped(user, text);
        shared.history.append(message.clone());

        let registered = shared.subscribers.len();
        shared.subscribers.retain(|id, tx| {
            if tx.send(message.clone()).is_ok() {
                true
            } else {
                debug!(subscriber_id = %id, "Subscriber gone, deregistering");
                false
            }
        });
        let delivered = shared.subscribers.len();
        let history_len = shared.history.len();
        drop(shared);

        debug!(
            user = %message.user,
            history_len,
            delivered,
            dropped = registered.saturating_sub(delivered),
            "Message published"
        );

        Ok(message)
    }

    /// Subscribe to the message feed.
    ///
    /// Atomically snapshots the history and registers a new subscriber.
    /// The returned [`Subscription`] yields the snapshot in order and then
    /// every message published afterwards, until it is dropped or the
    /// broadcaster goes away.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut shared = self.lock();
        let snapshot = shared.history.snapshot();
        shared.subscribers.insert(id, tx);
        let subscribers = shared.subscribers.len();
        drop(shared);

        let snapshot_len = snapshot.len();
        debug!(subscriber_id = %id, snapshot_len, subscribers, "Subscriber registered");

        Subscription {
            id,
            snapshot_len,
            snapshot: snapshot.into_iter(),
            live: rx,
            registry: Arc::downgrade(&self.shared),
        }
    }

    /// Return every message published so far, in publication order.
    pub fn history(&self) -> Vec<Message> {
        self.lock().history.snapshot()
    }

    /// Current message and subscriber counts.
    ///
    /// The subscriber count may include subscribers whose consumer has
    /// already gone but who have not yet been pruned by a publish.
    pub fn stats(&self) -> BroadcasterStats {
        let shared = self.lock();
        BroadcasterStats {
            messages: shared.history.len(),
            subscribers: shared.subscribers.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock_shared(&self.shared)
    }
}

/// Acquire the shared state, recovering from poisoning.
///
/// No code path panics while holding the lock, and every mutation leaves
/// the log and registry consistent, so the inner value is always usable.
fn lock_shared(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A live view of the message feed.
///
/// Implements [`Stream`]: it first yields the history snapshot captured at
/// subscription time, then each message published afterwards. The stream
/// only ends if the [`Broadcaster`] itself is dropped.
///
/// Dropping a `Subscription` deregisters it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    snapshot_len: usize,
    snapshot: std::vec::IntoIter<Message>,
    live: mpsc::UnboundedReceiver<Message>,
    registry: Weak<Mutex<Shared>>,
}

impl Subscription {
    /// The identity this subscription is registered under.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Number of messages in the history snapshot taken at subscription.
    pub const fn snapshot_len(&self) -> usize {
        self.snapshot_len
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(message) = this.snapshot.next() {
            return Poll::Ready(Some(message));
        }
        this.live.poll_recv(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.snapshot.len(), None)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.registry.upgrade() {
            let removed = lock_shared(&shared).subscribers.remove(&self.id).is_some();
            if removed {
                debug!(subscriber_id = %self.id, "Subscriber dropped, deregistered");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

    use std::time::Duration;

    use futures::StreamExt;
    use tokio::time::timeout;

    use super::*;

    const WAIT: Duration = Duration::from_secs(2);
    const QUIET: Duration = Duration::from_millis(50);

    fn draft(user: &str, text: &str) -> MessageDraft {
        MessageDraft::new(user, text)
    }

    async fn next(sub: &mut Subscription) -> Message {
        timeout(WAIT, sub.next())
            .await
            .expect("timed out waiting for message")
            .expect("subscription ended")
    }

    async fn assert_pending(sub: &mut Subscription) {
        assert!(
            timeout(QUIET, sub.next()).await.is_err(),
            "expected no further messages"
        );
    }

    #[tokio::test]
    async fn history_then_waits() {
        let broadcaster = Broadcaster::new();
        let published = broadcaster.publish(draft("Ann", "hi")).unwrap();

        let mut sub = broadcaster.subscribe();
        assert_eq!(sub.snapshot_len(), 1);

        let first = next(&mut sub).await;
        assert_eq!(first, published);
        assert_pending(&mut sub).await;
    }

    #[tokio::test]
    async fn empty_history_then_live() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe();
        assert_eq!(sub.snapshot_len(), 0);

        let published = broadcaster.publish(draft("Bob", "yo")).unwrap();
        assert_eq!(next(&mut sub).await, published);
    }

    #[tokio::test]
    async fn late_subscriber_splits_snapshot_and_live() {
        let broadcaster = Broadcaster::new();
        let mut s1 = broadcaster.subscribe();
        broadcaster.publish(draft("X", "1")).unwrap();
        let mut s2 = broadcaster.subscribe();
        broadcaster.publish(draft("X", "2")).unwrap();

        assert_eq!(next(&mut s1).await.text, "1");
        assert_eq!(next(&mut s1).await.text, "2");

        assert_eq!(s2.snapshot_len(), 1);
        assert_eq!(next(&mut s2).await.text, "1");
        assert_eq!(next(&mut s2).await.text, "2");

        assert_pending(&mut s1).await;
        assert_pending(&mut s2).await;
    }

    #[tokio::test]
    async fn disconnect_does_not_affect_others() {
        let broadcaster = Broadcaster::new();
        let mut leaving = broadcaster.subscribe();
        let mut staying = broadcaster.subscribe();

        broadcaster.publish(draft("X", "1")).unwrap();
        assert_eq!(next(&mut leaving).await.text, "1");
        drop(leaving);

        broadcaster.publish(draft("X", "2")).unwrap();
        broadcaster.publish(draft("X", "3")).unwrap();

        let texts: Vec<String> = vec![
            next(&mut staying).await.text,
            next(&mut staying).await.text,
            next(&mut staying).await.text,
        ];
        assert_eq!(texts, ["1", "2", "3"]);
        assert_eq!(broadcaster.stats().subscribers, 1);
    }

    #[tokio::test]
    async fn drop_deregisters_immediately() {
        let broadcaster = Broadcaster::new();
        let sub = broadcaster.subscribe();
        assert_eq!(broadcaster.stats().subscribers, 1);
        drop(sub);
        assert_eq!(broadcaster.stats().subscribers, 0);
    }

    #[tokio::test]
    async fn closed_receiver_is_pruned_on_publish() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe();
        sub.live.close();

        broadcaster.publish(draft("X", "1")).unwrap();
        assert_eq!(broadcaster.stats().subscribers, 0);
        assert_eq!(broadcaster.history().len(), 1);
    }

    #[tokio::test]
    async fn order_preserved_for_early_subscriber() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe();

        for i in 0..50 {
            broadcaster.publish(draft("seq", &i.to_string())).unwrap();
        }
        for i in 0..50 {
            assert_eq!(next(&mut sub).await.text, i.to_string());
        }
        assert_pending(&mut sub).await;
    }

    #[tokio::test]
    async fn history_lists_everything_in_order() {
        let broadcaster = Broadcaster::new();
        let published: Vec<Message> = (0..10)
            .map(|i| broadcaster.publish(draft("Ann", &i.to_string())).unwrap())
            .collect();

        assert_eq!(broadcaster.history(), published);
        assert_eq!(broadcaster.stats().messages, 10);
    }

    #[tokio::test]
    async fn timestamps_follow_publication_order() {
        let broadcaster = Broadcaster::new();
        for i in 0..20 {
            broadcaster.publish(draft("Ann", &i.to_string())).unwrap();
        }
        let history = broadcaster.history();
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn missing_fields_are_rejected_without_side_effects() {
        let broadcaster = Broadcaster::new();

        let no_user = MessageDraft {
            user: None,
            text: Some(String::from("hi")),
        };
        assert_eq!(
            broadcaster.publish(no_user),
            Err(CoreError::MissingField { field: "user" })
        );

        let no_text = MessageDraft {
            user: Some(String::from("Ann")),
            text: None,
        };
        assert_eq!(
            broadcaster.publish(no_text),
            Err(CoreError::MissingField { field: "text" })
        );

        assert!(broadcaster.history().is_empty());
    }

    #[test]
    fn empty_strings_are_accepted() {
        let broadcaster = Broadcaster::new();
        let message = broadcaster.publish(draft("", "")).unwrap();
        assert_eq!(message.user, "");
        assert_eq!(message.text, "");
        assert_eq!(broadcaster.history().len(), 1);
    }

    #[tokio::test]
    async fn stream_ends_when_broadcaster_dropped() {
        let broadcaster = Broadcaster::new();
        broadcaster.publish(draft("Ann", "last")).unwrap();
        let mut sub = broadcaster.subscribe();
        drop(broadcaster);

        assert_eq!(next(&mut sub).await.text, "last");
        assert!(timeout(WAIT, sub.next()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn slow_subscriber_does_not_hold_back_fast_one() {
        let broadcaster = Broadcaster::new();
        let mut fast = broadcaster.subscribe();
        let mut slow = broadcaster.subscribe();

        for i in 0..100 {
            broadcaster.publish(draft("seq", &i.to_string())).unwrap();
            assert_eq!(next(&mut fast).await.text, i.to_string());
        }

        // The slow one has buffered everything.
        for i in 0..100 {
            assert_eq!(next(&mut slow).await.text, i.to_string());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_subscribers_see_every_message_exactly_once() {
        const TOTAL: usize = 500;
        const SUBSCRIBERS: usize = 16;

        let broadcaster = Arc::new(Broadcaster::new());
        let last = (TOTAL - 1).to_string();

        let publisher = {
            let broadcaster = Arc::clone(&broadcaster);
            tokio::spawn(async move {
                for i in 0..TOTAL {
                    broadcaster.publish(draft("seq", &i.to_string())).unwrap();
                    if i % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..SUBSCRIBERS {
            let broadcaster = Arc::clone(&broadcaster);
            let last = last.clone();
            readers.push(tokio::spawn(async move {
                tokio::task::yield_now().await;
                let mut sub = broadcaster.subscribe();
                let mut seen = Vec::with_capacity(TOTAL);
                loop {
                    let message = timeout(WAIT, sub.next()).await.unwrap().unwrap();
                    let done = message.text == last;
                    seen.push(message.text);
                    if done {
                        break;
                    }
                }
                seen
            }));
        }

        publisher.await.unwrap();
        let expected: Vec<String> = (0..TOTAL).map(|i| i.to_string()).collect();
        for reader in readers {
            assert_eq!(reader.await.unwrap(), expected);
        }
    }
}
