//! cube-signal: single-peer WebRTC signaling and media session server
//!
//! A browser connects over WebSocket, receives `ready`, sends an SDP offer
//! and trickles ICE candidates. The server answers through a pluggable
//! [`MediaPipeline`] and, while a peer is admitted, feeds it one frame per
//! tick from a [`FrameSource`].
//!
//! # Threads
//!
//! ```text
//!   tokio runtime                    signaling-dispatcher        frame-producer
//!   ┌──────────────────────┐         ┌──────────────────┐        ┌─────────────┐
//!   │ accept loop          │ events  │ NegotiationState │ start  │ source tick │
//!   │ connection task ─────┼────────►│ SessionLifecycle ├───────►│ pipeline    │
//!   │   ▲ writable         │         │                  │        │   .feed()   │
//!   └───┼──────────────────┘         └────────┬─────────┘        └─────────────┘
//!       └──────────── OutboundQueue ◄─────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use cube_signal::{MediaPipeline, ServerConfig, SignalingServer};
//!
//! async fn serve(pipeline: Arc<dyn MediaPipeline>) -> cube_signal::Result<()> {
//!     let config = ServerConfig::from_env();
//!     let source = Box::new(|_elapsed: Duration| Bytes::from_static(&[0u8; 4]));
//!
//!     let server = SignalingServer::bind(config, pipeline, source).await?;
//!     server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```

pub mod error;
pub mod media;
pub mod outbound;
pub mod server;
pub mod session;
pub mod signaling;
pub mod stats;

pub use error::{Error, FlowError, MessageError, PipelineError, Result};
pub use media::{
    CandidateCallback, ErrorCallback, FrameSource, MediaPipeline, MediaProfile, VideoFrame,
};
pub use outbound::{OutboundMessage, OutboundQueue};
pub use server::{ServerConfig, SignalingServer};
pub use session::{PipelineState, SessionLifecycle};
pub use signaling::{SignalMessage, SignalingEvent};
pub use stats::{ProducerExit, ProducerStats};
