use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A single counter adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    ClientConnected,
    ClientDisconnected,
    ClientCompleted,
    PubOk,
    SubOk,
    UnsubOk,
}

/// Snapshot of the broker's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Clients currently connected.
    pub connected: u64,
    /// Clients that connected and have since disconnected.
    pub completed: u64,
    pub pub_ops: u64,
    pub sub_ops: u64,
    pub unsub_ops: u64,
}

impl Stats {
    pub fn update(&mut self, kind: StatKind) {
        match kind {
            StatKind::ClientConnected => self.connected += 1,
            StatKind::ClientDisconnected => self.connected = self.connected.saturating_sub(1),
            StatKind::ClientCompleted => self.completed += 1,
            StatKind::PubOk => self.pub_ops += 1,
            StatKind::SubOk => self.sub_ops += 1,
            StatKind::UnsubOk => self.unsub_ops += 1,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Connected clients:{}", self.connected)?;
        writeln!(f, "Completed clients:{}", self.completed)?;
        writeln!(f, "pub operations:{}", self.pub_ops)?;
        writeln!(f, "sub operations:{}", self.sub_ops)?;
        writeln!(f, "unsub operations:{}", self.unsub_ops)
    }
}

/// The counters shared by every connection handler and the reporter.
#[derive(Debug, Default)]
pub struct SharedStats {
    inner: Mutex<Stats>,
}

impl SharedStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Stats> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update(&self, kind: StatKind) {
        self.lock().update(kind);
    }

    pub fn snapshot(&self) -> Stats {
        *self.lock()
    }

    /// Writes the current counters to `out` while holding the counters lock.
    pub fn write_snapshot<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let stats = self.lock();
        write!(out, "{}", *stats)?;
        out.flush()
    }
}
