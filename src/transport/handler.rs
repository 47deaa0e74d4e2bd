//! Connection handler
//!
//! One handler runs per admitted connection. Responsibilities:
//! - Create a `Client` for the connection and forward everything queued on
//!   its channel to the socket from a dedicated writer task
//! - Read newline-terminated command lines and drive the registry and the
//!   statistics counters
//! - Answer rejected commands with `:invalid`
//! - On end-of-stream, remove the client from every topic, update the
//!   lifetime counters and release the admission permit
//!
//! Teardown lives in `Session`'s `Drop` impl so it also runs when the read
//! loop fails or the task panics.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::broker::message::{INVALID_REPLY, Message};
use crate::client::{Client, ClientId, OUTBOUND_CAPACITY};
use crate::context::BrokerContext;
use crate::stats::StatKind;
use crate::transport::admission::AdmissionPermit;
use crate::transport::command::{self, Command};

/// Serves one connection until its input reaches end-of-stream.
pub async fn handle_connection<S>(stream: S, ctx: Arc<BrokerContext>, permit: AdmissionPermit)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let (tx, rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
    let client = Arc::new(Client::new(tx));
    let client_id = client.id;

    let writer = tokio::spawn(forward_lines(rx, write_half, client_id));

    {
        let session = Session::open(ctx, client, permit);
        let mut reader = BufReader::new(read_half);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                    }
                    session.handle_line(&String::from_utf8_lossy(&buf));
                }
                Err(e) => {
                    debug!(client = %client_id, error = %e, "read failed");
                    break;
                }
            }
        }
    }

    // The session held the last sender, so the writer drains and exits.
    if let Err(e) = writer.await {
        debug!(client = %client_id, error = %e, "writer task failed");
    }
    debug!(client = %client_id, "connection closed");
}

/// Writes queued lines to the socket until every sender is gone or a write
/// fails.
async fn forward_lines<W>(mut rx: mpsc::Receiver<String>, mut out: W, client_id: ClientId)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        let written = match out.write_all(line.as_bytes()).await {
            Ok(()) => out.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            debug!(client = %client_id, error = %e, "failed to write to client");
            return;
        }
    }
    let _ = out.shutdown().await;
}

/// The per-connection protocol state.
///
/// The client is Unnamed until its first valid `name` command and Named from
/// then on.
struct Session {
    ctx: Arc<BrokerContext>,
    client: Arc<Client>,
    _permit: AdmissionPermit,
}

impl Session {
    fn open(ctx: Arc<BrokerContext>, client: Arc<Client>, permit: AdmissionPermit) -> Self {
        ctx.stats().update(StatKind::ClientConnected);
        debug!(client = %client.id, "client connected");
        Self {
            ctx,
            client,
            _permit: permit,
        }
    }

    fn handle_line(&self, line: &str) {
        trace!(client = %self.client.id, line, "command");
        match command::parse(line) {
            Ok(cmd) => self.execute(cmd),
            Err(e) => {
                debug!(client = %self.client.id, error = %e, "rejected command");
                self.reply(INVALID_REPLY);
            }
        }
    }

    fn execute(&self, cmd: Command<'_>) {
        if let Command::Name(name) = cmd {
            if !self.client.set_name(name) {
                trace!(client = %self.client.id, "already named");
            }
            return;
        }

        // Everything else is ignored until the client has a name.
        let Some(publisher) = self.client.name() else {
            trace!(client = %self.client.id, "ignoring command from unnamed client");
            return;
        };

        let counted = match cmd {
            Command::Name(_) => None,
            Command::Sub(topic) => self
                .ctx
                .registry()
                .subscribe(topic, &self.client)
                .then_some(StatKind::SubOk),
            Command::Unsub(topic) => self
                .ctx
                .registry()
                .unsubscribe(topic, &self.client.id)
                .removed()
                .then_some(StatKind::UnsubOk),
            Command::Pub { topic, value } => {
                let msg = Message::new(publisher, topic, value);
                self.ctx
                    .registry()
                    .publish(&msg)
                    .map(|_| StatKind::PubOk)
            }
        };

        // The registry guard is gone by now; the two locks are never nested.
        if let Some(kind) = counted {
            self.ctx.stats().update(kind);
        }
    }

    fn reply(&self, line: &str) {
        if self.client.send(line.to_string()).is_err() {
            trace!(client = %self.client.id, "reply dropped");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.ctx.registry().cleanup_client(&self.client.id);
        let stats = self.ctx.stats();
        stats.update(StatKind::ClientDisconnected);
        stats.update(StatKind::ClientCompleted);
        debug!(client = %self.client.id, "client disconnected");
        // `_permit` is dropped after this, releasing the admission slot.
    }
}
