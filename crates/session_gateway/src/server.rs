//! Gateway server: listeners, accept loops, and shutdown coordination.

use crate::auth::ConnectionAuth;
use crate::config::GatewayConfig;
use crate::connection::handle_connection;
use crate::error::GatewayError;
use crate::router::Router;
use futures::stream::{FuturesUnordered, StreamExt};
use session_core::GameService;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, warn};

/// The WebSocket gateway.
///
/// Owns the listening sockets and the accept loops; each accepted
/// connection is handed to its own task. When `use_reuse_port` is enabled
/// the gateway binds one listener per CPU core so the kernel balances
/// accepts across them.
pub struct GatewayServer {
    config: Arc<GatewayConfig>,
    router: Arc<Router>,
    auth: Arc<dyn ConnectionAuth>,
    shutdown_sender: broadcast::Sender<()>,
}

impl GatewayServer {
    pub fn new(
        config: GatewayConfig,
        service: Arc<GameService>,
        auth: Arc<dyn ConnectionAuth>,
    ) -> Self {
        let (shutdown_sender, _) = broadcast::channel(1);
        Self {
            config: Arc::new(config),
            router: Arc::new(Router::new(service)),
            auth,
            shutdown_sender,
        }
    }

    /// Handle for requesting shutdown from another task or a signal
    /// handler. Sending on it stops the accept loops.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_sender.clone()
    }

    /// Binds the listeners and runs until shutdown is requested or the
    /// accept loops fail.
    pub async fn run(&self) -> Result<(), GatewayError> {
        info!("🚀 Starting session gateway on {}", self.config.bind_address);

        let core_count = num_cpus::get();
        let num_acceptors = if self.config.use_reuse_port {
            core_count
        } else {
            1
        };
        info!(
            "🧠 Detected {} CPU cores, using {} acceptor(s)",
            core_count, num_acceptors
        );

        let mut listeners = Vec::new();
        for i in 0..num_acceptors {
            let listener = self.bind_listener()?;
            listeners.push(listener);
            info!("✅ Listener {} bound on {}", i, self.config.bind_address);
        }

        // Connection cap shared by all acceptors.
        let connection_permits = Arc::new(Semaphore::new(self.config.max_connections));

        let mut shutdown_receiver = self.shutdown_sender.subscribe();

        let mut accept_futures = listeners
            .into_iter()
            .map(|listener| {
                let router = self.router.clone();
                let auth = self.auth.clone();
                let config = self.config.clone();
                let connection_permits = connection_permits.clone();

                async move {
                    loop {
                        match listener.accept().await {
                            Ok((stream, addr)) => {
                                let Ok(permit) =
                                    connection_permits.clone().try_acquire_owned()
                                else {
                                    warn!("🛑 Connection limit reached, refusing {}", addr);
                                    continue;
                                };

                                let router = router.clone();
                                let auth = auth.clone();
                                let config = config.clone();

                                tokio::spawn(async move {
                                    let _permit = permit;
                                    if let Err(e) =
                                        handle_connection(stream, addr, router, auth, config).await
                                    {
                                        debug!("Connection {} ended with error: {}", addr, e);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {}", e);
                                break;
                            }
                        }
                    }
                }
            })
            .collect::<FuturesUnordered<_>>();

        tokio::select! {
            _ = accept_futures.next() => {}
            _ = shutdown_receiver.recv() => {
                info!("Shutdown signal received");
            }
        }

        info!("Gateway stopped");
        Ok(())
    }

    fn bind_listener(&self) -> Result<TcpListener, GatewayError> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| GatewayError::Network(format!("Socket creation failed: {e}")))?;
        socket.set_reuse_address(true).ok();

        if self.config.use_reuse_port {
            #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
            {
                if let Err(e) = socket.set_reuse_port(true) {
                    warn!("Failed to set SO_REUSEPORT: {}", e);
                } else {
                    info!("SO_REUSEPORT enabled for load balancing across acceptors");
                }
            }
            #[cfg(not(all(unix, not(any(target_os = "solaris", target_os = "illumos")))))]
            warn!("SO_REUSEPORT is not supported on this platform");
        }

        socket
            .bind(&self.config.bind_address.into())
            .map_err(|e| GatewayError::Network(format!("Bind failed: {e}")))?;
        socket
            .listen(1024)
            .map_err(|e| GatewayError::Network(format!("Listen failed: {e}")))?;

        let std_listener: StdTcpListener = socket.into();
        std_listener.set_nonblocking(true).ok();

        TcpListener::from_std(std_listener)
            .map_err(|e| GatewayError::Network(format!("Tokio listener creation failed: {e}")))
    }
}
