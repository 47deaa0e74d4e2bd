//! TCP server
//!
//! Binds the listening socket, then runs the accept loop: acquire an
//! admission permit, accept one connection, and spawn a handler task that
//! owns the permit for the connection's lifetime.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::context::BrokerContext;
use crate::transport::handler::handle_connection;
use crate::utils::BrokerError;

pub struct Server {
    listener: TcpListener,
    ctx: Arc<BrokerContext>,
}

impl Server {
    /// Binds to the configured host and port and builds the shared state.
    pub async fn bind(settings: &Settings) -> Result<Self, BrokerError> {
        let addr = (settings.server.host.as_str(), settings.server.port);
        let listener = TcpListener::bind(addr).await.map_err(BrokerError::Bind)?;
        let ctx = Arc::new(BrokerContext::new(settings.broker.max_connections));
        Ok(Self { listener, ctx })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BrokerError> {
        self.listener.local_addr().map_err(BrokerError::Bind)
    }

    /// The port actually bound, which differs from the configured one when
    /// an ephemeral port was requested.
    pub fn local_port(&self) -> Result<u16, BrokerError> {
        Ok(self.local_addr()?.port())
    }

    pub fn context(&self) -> Arc<BrokerContext> {
        Arc::clone(&self.ctx)
    }

    /// Accepts and serves connections forever.
    ///
    /// Accept failures are logged and the loop carries on; it only returns
    /// if the admission pool is closed.
    pub async fn run(self) -> Result<(), BrokerError> {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "broker listening");
        }

        loop {
            let permit = self.ctx.admission().acquire().await?;

            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(%peer, "connection admitted");
            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                handle_connection(stream, ctx, permit).await;
                debug!(%peer, "connection finished");
            });
        }
    }
}
