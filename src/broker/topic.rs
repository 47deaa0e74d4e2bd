use std::sync::Arc;

use crate::client::{Client, ClientId};

/// Outcome of removing a client from a [`SubscriberList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The client was the only subscriber; the list is now empty but the
    /// topic still exists.
    NowEmpty,
    /// The client was removed and other subscribers remain.
    Removed,
    /// The client was not subscribed.
    NotFound,
}

impl Removal {
    /// Whether a subscriber was actually removed.
    pub fn removed(self) -> bool {
        !matches!(self, Removal::NotFound)
    }
}

/// The subscribers of one topic.
///
/// A topic with no subscribers is `Empty`, which is distinct from the topic
/// being absent from the registry. `Populated` never holds an empty vector.
#[derive(Debug, Default)]
pub enum SubscriberList {
    #[default]
    Empty,
    Populated(Vec<Arc<Client>>),
}

impl SubscriberList {
    /// Appends `client` unless it is already subscribed.
    ///
    /// Returns `true` if the client was added.
    pub fn add(&mut self, client: Arc<Client>) -> bool {
        match self {
            SubscriberList::Empty => {
                *self = SubscriberList::Populated(vec![client]);
                true
            }
            SubscriberList::Populated(clients) => {
                if clients.iter().any(|c| c.id == client.id) {
                    return false;
                }
                clients.push(client);
                true
            }
        }
    }

    /// Removes the client with the given id.
    pub fn remove(&mut self, id: &ClientId) -> Removal {
        let SubscriberList::Populated(clients) = self else {
            return Removal::NotFound;
        };
        let Some(pos) = clients.iter().position(|c| &c.id == id) else {
            return Removal::NotFound;
        };
        if clients.len() == 1 {
            *self = SubscriberList::Empty;
            return Removal::NowEmpty;
        }
        clients.remove(pos);
        Removal::Removed
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.iter().any(|c| &c.id == id)
    }

    /// Every current subscriber, in subscription order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Client>> {
        let clients: &[Arc<Client>] = match self {
            SubscriberList::Empty => &[],
            SubscriberList::Populated(clients) => clients,
        };
        clients.iter()
    }

    pub fn len(&self) -> usize {
        match self {
            SubscriberList::Empty => 0,
            SubscriberList::Populated(clients) => clients.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SubscriberList::Empty)
    }
}

/// A named topic and its subscribers.
///
/// Topics are created by the first successful subscribe and live for the
/// rest of the process, even once every subscriber has left.
#[derive(Debug)]
pub struct Topic {
    pub name: String,
    pub subscribers: SubscriberList,
}

impl Topic {
    /// Creates a topic with no subscribers.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: SubscriberList::Empty,
        }
    }

    /// Subscribes a client to the topic. Has no effect if it is already
    /// subscribed.
    pub fn subscribe(&mut self, client: Arc<Client>) -> bool {
        self.subscribers.add(client)
    }

    /// Unsubscribes a client from the topic.
    pub fn unsubscribe(&mut self, id: &ClientId) -> Removal {
        self.subscribers.remove(id)
    }
}
