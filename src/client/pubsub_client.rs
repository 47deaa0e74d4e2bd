use std::sync::OnceLock;

use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

pub type ClientId = Uuid;

/// Number of lines that may wait in a client's outbound queue. Lines
/// published to a client whose queue is full are dropped for that client.
pub const OUTBOUND_CAPACITY: usize = 1024;

/// Represents one connected session.
///
/// The `id` distinguishes sessions inside subscriber lists. The name starts
/// out unset and can be assigned exactly once; later assignments are
/// ignored.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for the session.
    pub id: ClientId,

    name: OnceLock<String>,

    /// Lines queued for the connection's writer task.
    sender: Sender<String>,
}

impl Client {
    /// Create a new, unnamed client with a sender channel.
    pub fn new(sender: Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: OnceLock::new(),
            sender,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// Assigns the client's name if it has none yet.
    ///
    /// Returns `false` if the client was already named.
    pub fn set_name(&self, name: &str) -> bool {
        self.name.set(name.to_string()).is_ok()
    }

    /// Queues a line for delivery to this client without waiting.
    ///
    /// Fails with `Full` when the peer has fallen [`OUTBOUND_CAPACITY`] lines
    /// behind and with `Closed` once its writer task is gone.
    pub fn send(&self, line: String) -> Result<(), TrySendError<String>> {
        self.sender.try_send(line)
    }
}
