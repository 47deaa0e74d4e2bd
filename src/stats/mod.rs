//! The `stats` module keeps broker-wide activity counters and prints them on
//! demand.
//!
//! Counters live behind their own lock, independent of the topic registry, so
//! statistics updates never wait on registry traffic. The reporter is a
//! long-lived task that stays dormant until an administrative trigger (SIGHUP
//! on unix) arrives.

pub mod counters;
pub mod reporter;

pub use counters::{SharedStats, StatKind, Stats};
pub use reporter::{ReportTrigger, Reporter};
