use std::fmt;

/// Reply sent to a client whose command was rejected.
pub const INVALID_REPLY: &str = ":invalid\n";

/// A value published to a topic.
///
/// On the wire a message is delivered to each subscriber as the single line
/// `publisher:topic:value`.
///
/// # Example
///
/// ```rust
/// use psbroker::broker::Message;
///
/// let msg = Message::new("alice", "news", "hello world");
/// assert_eq!(msg.to_line(), "alice:news:hello world\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub publisher: String,
    pub topic: String,
    pub value: String,
}

impl Message {
    pub fn new(publisher: &str, topic: &str, value: &str) -> Self {
        Self {
            publisher: publisher.to_string(),
            topic: topic.to_string(),
            value: value.to_string(),
        }
    }

    /// The newline-terminated line delivered to subscribers.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.publisher, self.topic, self.value)
    }
}
