use crate::{BroadcastHub, CoreError, CoreResult, preview::PreviewState, preview::router};

use std::{
    net::{Ipv4Addr, SocketAddr},
    panic::Location,
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::{debug, error, info, instrument, warn};

/// How long `shutdown` waits for open connections before aborting the server.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Running loopback HTTP server for the preview UI.
#[derive(Debug)]
pub struct PreviewServer {
    addr: SocketAddr,
    hub: BroadcastHub,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl PreviewServer {
    /// Bind `127.0.0.1:port` and serve the preview router in the background.
    ///
    /// Port `0` picks a free port; see [`addr`](Self::addr).
    #[instrument(skip(state))]
    pub async fn start(state: PreviewState, port: u16) -> CoreResult<Self> {
        let caller = Location::caller();
        let requested = SocketAddr::from((Ipv4Addr::LOCALHOST, port));

        let listener = TcpListener::bind(requested)
            .await
            .map_err(|e| CoreError::Server {
                reason: format!("Failed to bind {}: {}", requested, e),
                location: ErrorLocation::from(caller),
            })?;

        let addr = listener.local_addr().map_err(|e| CoreError::Server {
            reason: format!("Failed to read bound address: {}", e),
            location: ErrorLocation::from(caller),
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let hub = state.hub.clone();
        let app = router(state);

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;

            match result {
                Ok(()) => debug!("Preview server stopped"),
                Err(e) => error!(error = ?e, "Preview server failed"),
            }
        });

        info!(addr = %addr, "Preview server listening");

        Ok(Self {
            addr,
            hub,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }

    /// Address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL for opening the viewer in a browser.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.addr.port())
    }

    /// Stop accepting connections and wait (bounded) for the server to exit.
    ///
    /// Event streams only end when their subscription closes, so every
    /// subscriber is closed before the graceful shutdown starts.
    #[instrument(skip(self), fields(addr = %self.addr))]
    pub async fn shutdown(mut self) {
        let closed = self.hub.close_all();
        debug!(closed, "Closed open event streams");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut self.handle).await {
            Ok(Ok(())) => info!("Preview server shut down"),
            Ok(Err(e)) => warn!(error = ?e, "Preview server task panicked"),
            Err(_) => {
                warn!("Preview server did not drain within timeout, aborting open connections");
                self.handle.abort();
            }
        }
    }
}
