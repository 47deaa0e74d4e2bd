//! The `transport` module is responsible for network communication with
//! clients over TCP.
//!
//! It parses the line-oriented command protocol, bounds the number of active
//! connections, runs one handler per connection and implements the accept
//! loop itself.

pub mod admission;
pub mod command;
pub mod handler;
pub mod server;

pub use admission::{Admission, AdmissionPermit};
pub use server::Server;
