//! Signaling server listener
//!
//! Owns the TCP accept loop, the dispatcher thread and the shutdown sequence.
//!
//! Shutdown starts when the caller's shutdown future resolves or when the
//! pipeline reports a fatal error. It runs in a fixed order:
//! 1. clear the running flag, which wakes every network wait
//! 2. join the accept loop and all connection tasks
//! 3. hand `Shutdown` to the dispatcher, which stops the producer and then
//!    the pipeline
//! 4. join the dispatcher and discard anything still queued

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use crate::error::Result;
use crate::media::{FrameSource, MediaPipeline};
use crate::outbound::OutboundQueue;
use crate::server::config::ServerConfig;
use crate::server::connection::{Connection, ConnectionShared};
use crate::server::gate::ConnectionGate;
use crate::server::shutdown::RunningFlag;
use crate::session::SessionLifecycle;
use crate::signaling::{self, EventReceiver, SignalingDispatcher, SignalingEvent};

/// Single-peer WebSocket signaling server
pub struct SignalingServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    shared: Arc<ConnectionShared>,
    dispatcher: SignalingDispatcher,
    events: EventReceiver,
}

impl SignalingServer {
    /// Validate the configuration and bind the listening socket
    ///
    /// The pipeline is not started until a peer is admitted.
    pub async fn bind(
        config: ServerConfig,
        pipeline: Arc<dyn MediaPipeline>,
        source: Box<dyn FrameSource>,
    ) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let (tx, rx) = signaling::event::channel();
        let outbound = Arc::new(OutboundQueue::new());
        let lifecycle = SessionLifecycle::new(pipeline, source, config.frame_period());
        let running = RunningFlag::new();
        let dispatcher = SignalingDispatcher::new(
            lifecycle,
            Arc::clone(&outbound),
            tx.clone(),
            running.clone(),
        );

        let shared = Arc::new(ConnectionShared {
            config,
            gate: ConnectionGate::new(),
            outbound,
            events: tx,
            running,
        });

        Ok(Self {
            listener,
            local_addr,
            shared,
            dispatcher,
            events: rx,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.shared.config
    }

    /// Run the server until the process exits
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    ///
    /// Returns when `shutdown` resolves, or earlier if the pipeline fails.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let SignalingServer {
            listener,
            local_addr,
            shared,
            dispatcher,
            events,
        } = self;

        let dispatcher = dispatcher.spawn(events)?;

        tracing::info!(
            addr = %local_addr,
            fps = shared.config.fps,
            width = shared.config.width,
            height = shared.config.height,
            "Signaling server listening"
        );

        let io_task = tokio::spawn(accept_loop(listener, Arc::clone(&shared)));

        tokio::select! {
            _ = shutdown => tracing::info!("Shutdown signal received"),
            _ = shared.running.stopped() => tracing::warn!("Stopping after pipeline failure"),
        }

        shared.running.stop();
        if let Err(e) = io_task.await {
            tracing::error!(error = %e, "Network task failed");
        }

        let _ = shared.events.send(SignalingEvent::Shutdown);
        match tokio::task::spawn_blocking(move || dispatcher.join()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => tracing::error!("Dispatcher thread panicked"),
            Err(e) => tracing::error!(error = %e, "Failed to join dispatcher"),
        }

        let discarded = shared.outbound.drain_all();
        tracing::info!(discarded = discarded.len(), "Signaling server stopped");

        Ok(())
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<ConnectionShared>) {
    let mut connections = JoinSet::new();
    let mut next_connection_id: u64 = 1;

    loop {
        tokio::select! {
            _ = shared.running.stopped() => break,

            accepted = listener.accept() => match accepted {
                Ok((socket, peer_addr)) => {
                    let connection_id = next_connection_id;
                    next_connection_id += 1;

                    tracing::debug!(
                        connection_id = connection_id,
                        peer = %peer_addr,
                        "New connection"
                    );

                    if let Err(e) = configure_socket(&socket, &shared.config) {
                        tracing::error!(error = %e, "Failed to configure socket");
                        continue;
                    }

                    let connection =
                        Connection::new(connection_id, socket, peer_addr, Arc::clone(&shared));
                    connections.spawn(async move {
                        if let Err(e) = connection.run().await {
                            tracing::debug!(
                                connection_id = connection_id,
                                error = %e,
                                "Connection error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            },

            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Connection task failed");
                }
            }
        }
    }

    // Stop accepting before waiting on the connections still open
    drop(listener);
    while let Some(joined) = connections.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Connection task failed");
        }
    }
}

fn configure_socket(socket: &TcpStream, config: &ServerConfig) -> std::io::Result<()> {
    if config.tcp_nodelay {
        socket.set_nodelay(true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::error::Error;
    use crate::media::testing::{Call, RecordingPipeline};

    fn source() -> Box<dyn FrameSource> {
        Box::new(|_elapsed: Duration| Bytes::from_static(b"frame"))
    }

    fn local_config() -> ServerConfig {
        ServerConfig::with_addr("127.0.0.1:0".parse().unwrap())
    }

    #[tokio::test]
    async fn test_bind_reports_ephemeral_port() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let server = SignalingServer::bind(local_config(), pipeline, source())
            .await
            .unwrap();

        assert_ne!(server.local_addr().port(), 0);
        assert_eq!(server.config().fps, 30);
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_config() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let result =
            SignalingServer::bind(local_config().resolution(0, 0), pipeline, source()).await;

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_run_until_returns_when_running_flag_clears() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let server = SignalingServer::bind(local_config(), pipeline, source())
            .await
            .unwrap();
        let running = server.shared.running.clone();

        let task = tokio::spawn(server.run_until(std::future::pending()));
        running.stop();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_until_without_peers_never_starts_pipeline() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let server = SignalingServer::bind(local_config(), pipeline.clone(), source())
            .await
            .unwrap();

        server
            .run_until(tokio::time::sleep(Duration::from_millis(20)))
            .await
            .unwrap();

        assert_eq!(pipeline.count(|c| *c == Call::Start), 0);
    }
}
