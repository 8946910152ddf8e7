//! Cube server - serves a generated test pattern to one browser peer
//!
//! Run with: cargo run --example cube_server
//!
//! Configuration comes from the environment:
//!   CS_PORT=8080 CS_WIDTH=640 CS_HEIGHT=480 CS_FPS=30 cargo run --example cube_server
//!
//! This example demonstrates:
//! - Implementing `FrameSource` for a CPU-rendered RGBA pattern
//! - Implementing `MediaPipeline` as a stand-in that counts frames and
//!   answers offers with an inactive SDP
//! - Graceful shutdown on Ctrl+C
//!
//! Connect with any WebSocket client:
//!
//! ```text
//!   websocat ws://localhost:8080
//!   < {"type":"ready"}
//!   > {"type":"offer","sdp":"v=0\r\n..."}
//!   < {"type":"answer","sdp":"v=0\r\n..."}
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use parking_lot::Mutex;

use cube_signal::{
    CandidateCallback, FlowError, FrameSource, MediaPipeline, MediaProfile, PipelineError,
    ServerConfig, SignalingServer, VideoFrame,
};

/// Rotating color bands, one RGBA buffer per tick
struct TestPattern {
    width: u32,
    height: u32,
    frame_size: usize,
    buffer: BytesMut,
}

impl TestPattern {
    fn new(profile: &MediaProfile) -> Self {
        Self {
            width: profile.width,
            height: profile.height,
            frame_size: profile.rgba_frame_size(),
            buffer: BytesMut::new(),
        }
    }
}

impl FrameSource for TestPattern {
    fn produce(&mut self, elapsed: Duration) -> Bytes {
        // One radian per second
        let angle = elapsed.as_secs_f32();
        let (sin, cos) = angle.sin_cos();
        let cx = self.width as f32 / 2.0;
        let cy = self.height as f32 / 2.0;
        self.buffer.reserve(self.frame_size);

        for y in 0..self.height {
            for x in 0..self.width {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let u = dx * cos - dy * sin;
                let v = dx * sin + dy * cos;

                let inside = u.abs() < cy / 2.0 && v.abs() < cy / 2.0;
                if inside {
                    let shade = ((u / cy + 0.5) * 255.0).clamp(0.0, 255.0) as u8;
                    self.buffer.put_slice(&[shade, 96, 255 - shade, 255]);
                } else {
                    self.buffer.put_slice(&[20, 20, 28, 255]);
                }
            }
        }

        self.buffer.split().freeze()
    }
}

/// Pipeline stand-in: no encoder, no transport
struct LoggingPipeline {
    active: AtomicBool,
    frames: AtomicU64,
    bytes: AtomicU64,
    candidate_callback: Mutex<Option<CandidateCallback>>,
}

impl LoggingPipeline {
    fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            frames: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            candidate_callback: Mutex::new(None),
        }
    }
}

impl MediaPipeline for LoggingPipeline {
    fn start(&self) -> Result<(), PipelineError> {
        self.frames.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
        self.active.store(true, Ordering::SeqCst);
        tracing::info!("Pipeline started");
        Ok(())
    }

    fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        tracing::info!(
            frames = self.frames.load(Ordering::Relaxed),
            bytes = self.bytes.load(Ordering::Relaxed),
            "Pipeline stopped"
        );
    }

    fn feed(&self, frame: VideoFrame) -> Result<(), FlowError> {
        if !self.active.load(Ordering::SeqCst) {
            return Err(FlowError::Flushing);
        }

        let frames = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        self.bytes.fetch_add(frame.size() as u64, Ordering::Relaxed);
        if frames % 300 == 0 {
            tracing::debug!(frames = frames, pts = ?frame.pts, "Frames fed");
        }
        Ok(())
    }

    fn on_local_candidate(&self, callback: CandidateCallback) {
        *self.candidate_callback.lock() = Some(callback);
    }

    fn ingest_remote_offer(&self, sdp: &str) -> Result<String, PipelineError> {
        if !sdp.starts_with("v=0") {
            return Err(PipelineError::InvalidOffer("missing version line".into()));
        }

        // Advertise one host candidate so the peer sees trickle traffic
        if let Some(callback) = self.candidate_callback.lock().as_ref() {
            callback("candidate:1 1 UDP 2130706431 127.0.0.1 9 typ host".into(), 0);
        }

        Ok(concat!(
            "v=0\r\n",
            "o=- 0 0 IN IP4 127.0.0.1\r\n",
            "s=cube\r\n",
            "t=0 0\r\n",
            "m=video 9 UDP/TLS/RTP/SAVPF 96\r\n",
            "c=IN IP4 0.0.0.0\r\n",
            "a=inactive\r\n",
        )
        .to_string())
    }

    fn ingest_remote_candidate(&self, candidate: &str, sdp_mline_index: u32) {
        tracing::debug!(candidate = candidate, sdp_mline_index = sdp_mline_index, "Remote candidate");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cube_signal=debug".parse()?)
                .add_directive("cube_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig::from_env();
    let profile = config.media_profile();

    println!(
        "Starting cube server on {} ({}x{} @ {}fps)",
        config.bind_addr, profile.width, profile.height, profile.fps
    );

    let source = Box::new(TestPattern::new(&profile));
    let server = SignalingServer::bind(config, Arc::new(LoggingPipeline::new()), source).await?;

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
