//! # psbroker
//!
//! `psbroker` is a line-oriented publish/subscribe broker built on tokio.
//! Clients connect over TCP, name themselves, subscribe to topics and publish
//! values that are fanned out to every current subscriber of a topic.
//!
//! ## Core Modules
//!
//! - `broker`: the topic registry and per-topic subscriber lists.
//! - `client`: the shared handle representing one connected session.
//! - `config`: layered server configuration.
//! - `context`: the state shared by the accept loop and every handler.
//! - `stats`: broker-wide counters and the signal-driven reporter.
//! - `transport`: command parsing, admission control, connection handling and
//!   the TCP server.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod context;
pub mod stats;
pub mod transport;
pub mod utils;

pub use context::BrokerContext;
