//! The `client` module defines the representation of a connected session.
//!
//! It provides the `Client` struct, which holds the session's unique
//! identifier, its name once assigned, and the channel used to push lines to
//! the connection's writer task. A `Client` is shared by `Arc` between every
//! subscriber list it appears in.

pub mod pubsub_client;
pub use pubsub_client::{Client, ClientId, OUTBOUND_CAPACITY};
