//! Per-peer WebSocket task
//!
//! Completes the WebSocket handshake, asks the gate for admission, then
//! multiplexes three readiness sources until the peer leaves:
//!
//! - readable: one application message per wake-up, handed to the
//!   dispatcher as `MessageReceived`
//! - writable: one queued message per wake-up; re-armed while more remain.
//!   Messages addressed to an earlier connection are discarded unsent.
//! - shutdown: close with `Away` and exit
//!
//! A refused peer is closed with a policy-violation code and never produces
//! a dispatcher event. A peer closed by shutdown frees the slot without a
//! `Disconnected` event; the dispatcher's `Shutdown` tears the session down.

use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;

use crate::error::{Error, Result};
use crate::outbound::OutboundQueue;
use crate::server::config::ServerConfig;
use crate::server::gate::ConnectionGate;
use crate::server::shutdown::RunningFlag;
use crate::signaling::{EventSender, SignalingEvent};

/// Why the readiness loop ended
#[derive(Debug)]
enum Exit {
    PeerClosed,
    Shutdown,
    TransportError(tungstenite::Error),
}

impl Exit {
    /// Whether the dispatcher must hear about the departure
    ///
    /// On shutdown the session is stopped by the dispatcher's own
    /// `Shutdown` event, after every connection has been joined.
    fn reports_disconnect(&self) -> bool {
        !matches!(self, Exit::Shutdown)
    }
}

/// State shared by every connection task
pub(crate) struct ConnectionShared {
    pub config: ServerConfig,
    pub gate: ConnectionGate,
    pub outbound: Arc<OutboundQueue>,
    pub events: EventSender,
    pub running: RunningFlag,
}

/// One accepted TCP connection
pub(crate) struct Connection {
    id: u64,
    peer_addr: SocketAddr,
    socket: TcpStream,
    shared: Arc<ConnectionShared>,
}

impl Connection {
    pub(crate) fn new(
        id: u64,
        socket: TcpStream,
        peer_addr: SocketAddr,
        shared: Arc<ConnectionShared>,
    ) -> Self {
        Self {
            id,
            peer_addr,
            socket,
            shared,
        }
    }

    /// Run the connection to completion
    pub(crate) async fn run(self) -> Result<()> {
        let Connection {
            id,
            peer_addr,
            socket,
            shared,
        } = self;

        let handshake = tokio::time::timeout(
            shared.config.handshake_timeout,
            tokio_tungstenite::accept_async(socket),
        );
        let mut ws = tokio::select! {
            _ = shared.running.stopped() => return Ok(()),
            result = handshake => match result {
                Ok(ws) => ws?,
                Err(_) => {
                    tracing::debug!(connection_id = id, peer = %peer_addr, "WebSocket handshake timed out");
                    return Ok(());
                }
            },
        };

        let admitted = shared.gate.try_admit(id, || {
            let _ = shared.events.send(SignalingEvent::Connected {
                connection_id: id,
                peer_addr,
            });
        });

        if !admitted {
            tracing::warn!(connection_id = id, peer = %peer_addr, "Connection rejected: peer already admitted");
            reject(&mut ws, &shared).await;
            return Ok(());
        }

        let exit = serve(id, ws, &shared).await;

        // The slot is cleared before the dispatcher hears about it, so a
        // replacement can be admitted right away
        let report = exit.reports_disconnect();
        shared.gate.release(id, || {
            if report {
                let _ = shared
                    .events
                    .send(SignalingEvent::Disconnected { connection_id: id });
            }
        });

        tracing::debug!(connection_id = id, peer = %peer_addr, exit = ?exit, "Connection finished");

        match exit {
            Exit::TransportError(e) => Err(Error::WebSocket(e)),
            Exit::PeerClosed | Exit::Shutdown => Ok(()),
        }
    }
}

async fn reject(ws: &mut WebSocketStream<TcpStream>, shared: &ConnectionShared) {
    let frame = CloseFrame {
        code: CloseCode::Policy,
        reason: Cow::Owned(shared.config.busy_reason.clone()),
    };
    if ws.close(Some(frame)).await.is_err() {
        return;
    }

    // Give the peer a moment to acknowledge the close
    let _ = tokio::time::timeout(shared.config.close_timeout, async {
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;
}

async fn serve(id: u64, ws: WebSocketStream<TcpStream>, shared: &ConnectionShared) -> Exit {
    let (mut sink, mut stream) = ws.split();

    let exit = loop {
        tokio::select! {
            _ = shared.running.stopped() => break Exit::Shutdown,

            frame = stream.next() => {
                let data = match frame {
                    Some(Ok(Message::Text(text))) => Bytes::from(text),
                    Some(Ok(Message::Binary(data))) => Bytes::from(data),
                    Some(Ok(Message::Close(_))) | None => break Exit::PeerClosed,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break Exit::TransportError(e),
                };

                tracing::trace!(connection_id = id, len = data.len(), "Inbound message");
                let _ = shared.events.send(SignalingEvent::MessageReceived {
                    connection_id: id,
                    data,
                });
            }

            _ = shared.outbound.writable() => {
                let Some(message) = shared.outbound.drain_one() else {
                    continue;
                };

                if !message.is_for(id) {
                    // Left over from the previous session, whose teardown has
                    // not run yet
                    tracing::debug!(
                        connection_id = id,
                        addressed_to = message.connection_id(),
                        "Discarding message for earlier connection"
                    );
                } else {
                    tracing::trace!(connection_id = id, len = message.len(), "Outbound message");
                    if let Err(e) = sink.send(Message::Text(message.into_text())).await {
                        break Exit::TransportError(e);
                    }
                }

                if !shared.outbound.is_empty() {
                    shared.outbound.rearm();
                }
            }
        }
    };

    if matches!(exit, Exit::Shutdown) {
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: Cow::Borrowed("shutdown"),
        };
        let _ = sink.send(Message::Close(Some(frame))).await;
    }

    exit
}
