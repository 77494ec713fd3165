use crate::error::Result;
use crate::routing::Router;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server as HyperServer;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct Server {
    router: Arc<Router>,
}

impl Server {
    /// Freeze a router for serving. Prioritization runs here, so the tree
    /// is immutable and read-only from this point on.
    pub fn new(mut router: Router) -> Self {
        router.prioritize();
        Self {
            router: Arc::new(router),
        }
    }

    pub async fn serve(self, addr: &str) -> Result<()> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| crate::error::Error::internal(format!("Invalid address: {}", e)))?;

        log::info!(
            "routef server listening on {} ({} routes)",
            addr,
            self.router.len()
        );

        // Setup signal handling for graceful shutdown
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        // Spawn signal handler task
        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};

                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(sig) => sig,
                    Err(e) => {
                        log::error!("Failed to install SIGTERM handler: {}", e);
                        return;
                    }
                };

                let mut sigint = match signal(SignalKind::interrupt()) {
                    Ok(sig) => sig,
                    Err(e) => {
                        log::error!("Failed to install SIGINT handler: {}", e);
                        return;
                    }
                };

                tokio::select! {
                    _ = sigterm.recv() => {
                        log::info!("Received SIGTERM signal - initiating graceful shutdown");
                    }
                    _ = sigint.recv() => {
                        log::info!("Received SIGINT signal (Ctrl+C) - initiating graceful shutdown");
                    }
                }
            }

            #[cfg(not(unix))]
            {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        log::info!("Received Ctrl+C signal - initiating graceful shutdown");
                    }
                    Err(e) => {
                        log::error!("Failed to listen for Ctrl+C signal: {}", e);
                        return;
                    }
                }
            }

            // Send shutdown signal
            let _ = shutdown_tx.send(());
        });

        let router = Arc::clone(&self.router);
        let make_svc = make_service_fn(move |_conn| {
            let router = Arc::clone(&router);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let router = Arc::clone(&router);
                    async move {
                        let response = router.dispatch(req).await;
                        Ok::<_, Infallible>(response.into_hyper())
                    }
                }))
            }
        });

        let server = HyperServer::bind(&addr)
            .serve(make_svc)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });

        // Wait for server to finish
        if let Err(e) = server.await {
            log::error!("Server error: {}", e);
        }

        log::info!("Server stopped");
        Ok(())
    }
}
