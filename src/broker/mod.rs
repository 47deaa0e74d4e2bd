pub mod engine;
pub mod message;
pub mod topic;

pub use engine::Broker;
pub use message::Message;
pub use topic::{Removal, SubscriberList, Topic};
