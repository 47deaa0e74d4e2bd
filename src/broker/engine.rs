//! Topic registry
//!
//! `Broker` maps topic names to their subscriber lists and implements the
//! registry side of every protocol operation.
//!
//! Concurrency and usage notes:
//! - The API is synchronous and designed to be held behind a single lock
//!   (`Mutex<Broker>` inside [`BrokerContext`](crate::context::BrokerContext)).
//!   Every lookup, mutation, traversal and fan-out happens while that lock is
//!   held, so a concurrent subscribe can never interleave with a fan-out.
//! - Fan-out only pushes lines into per-client channels; socket writes happen
//!   in each connection's writer task, so the lock is never held across I/O.
//! - Delivery is best effort. Each channel is bounded by
//!   [`OUTBOUND_CAPACITY`](crate::client::OUTBOUND_CAPACITY) and fan-out never
//!   waits: a subscriber that stops reading loses lines instead of growing
//!   the broker's memory or stalling publishers.
//! - Topics are never removed. A topic whose last subscriber leaves stays in
//!   the registry with an empty subscriber list.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace};

use crate::broker::message::Message;
use crate::broker::topic::{Removal, Topic};
use crate::client::{Client, ClientId};

#[derive(Debug, Default)]
pub struct Broker {
    topics: HashMap<String, Topic>,
}

impl Broker {
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
        }
    }

    /// Looks up a topic by exact name.
    pub fn lookup(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }

    /// Creates an empty topic.
    ///
    /// Returns `None` if a topic with this name already exists; the existing
    /// topic is left untouched.
    pub fn create(&mut self, name: &str) -> Option<&mut Topic> {
        if self.topics.contains_key(name) {
            return None;
        }
        debug!(topic = name, "created topic");
        Some(
            self.topics
                .entry(name.to_string())
                .or_insert_with(|| Topic::new(name)),
        )
    }

    /// Visits every topic, in no particular order.
    pub fn traverse(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Subscribes a client to a topic, creating the topic if it is new.
    ///
    /// Returns `true` if the client was newly subscribed, `false` if it was
    /// already a subscriber.
    pub fn subscribe(&mut self, topic: &str, client: &Arc<Client>) -> bool {
        let added = match self.topics.get_mut(topic) {
            Some(existing) => existing.subscribe(Arc::clone(client)),
            None => match self.create(topic) {
                Some(created) => created.subscribe(Arc::clone(client)),
                None => false,
            },
        };
        if added {
            debug!(client = %client.id, topic, "subscribed");
        }
        added
    }

    /// Unsubscribes a client from a topic.
    ///
    /// An unknown topic is reported as [`Removal::NotFound`].
    pub fn unsubscribe(&mut self, topic: &str, client_id: &ClientId) -> Removal {
        let removal = self
            .topics
            .get_mut(topic)
            .map_or(Removal::NotFound, |t| t.unsubscribe(client_id));
        if removal.removed() {
            debug!(client = %client_id, topic, "unsubscribed");
        }
        removal
    }

    /// Delivers a message to every current subscriber of its topic.
    ///
    /// Returns `None` if the topic does not exist, otherwise the number of
    /// subscribers the line was handed to. A subscriber whose connection is
    /// already closing, or whose outbound queue is full, is skipped.
    pub fn publish(&self, msg: &Message) -> Option<usize> {
        let Some(topic) = self.topics.get(&msg.topic) else {
            debug!(topic = %msg.topic, "publish to unknown topic");
            return None;
        };
        let line = msg.to_line();
        let mut delivered = 0;
        for client in topic.subscribers.iter() {
            match client.send(line.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(client = %client.id, topic = %msg.topic, "queue full, line dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    trace!(client = %client.id, "subscriber channel closed");
                }
            }
        }
        Some(delivered)
    }

    /// Removes a client from every topic it is subscribed to.
    ///
    /// Returns the number of topics the client was removed from.
    pub fn cleanup_client(&mut self, client_id: &ClientId) -> usize {
        let removed = self
            .topics
            .values_mut()
            .map(|topic| topic.unsubscribe(client_id))
            .filter(|removal| removal.removed())
            .count();
        debug!(client = %client_id, topics = removed, "cleaned up client");
        removed
    }
}
