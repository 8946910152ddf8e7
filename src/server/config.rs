//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::media::MediaProfile;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Frames per second fed to the pipeline
    pub fps: u32,

    /// Encoder bitrate hint
    pub bitrate_kbps: u32,

    /// STUN server handed to the pipeline
    pub stun_server: Option<String>,

    /// WebSocket handshake must complete within this time
    pub handshake_timeout: Duration,

    /// How long to wait for the peer to acknowledge a close frame
    pub close_timeout: Duration,

    /// Close reason sent to a peer refused because another is admitted
    pub busy_reason: String,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            width: 1280,
            height: 720,
            fps: 30,
            bitrate_kbps: 2500,
            stun_server: None,
            handshake_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(1),
            busy_reason: "busy".to_string(),
            tcp_nodelay: true, // Signaling messages are small and latency sensitive
        }
    }
}

impl ServerConfig {
    /// Load from `CS_*` environment variables
    ///
    /// Unset or empty variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = parse_or(value("CS_PORT"), "CS_PORT", defaults.bind_addr.port());

        Self {
            bind_addr: SocketAddr::new(defaults.bind_addr.ip(), port),
            width: parse_or(value("CS_WIDTH"), "CS_WIDTH", defaults.width),
            height: parse_or(value("CS_HEIGHT"), "CS_HEIGHT", defaults.height),
            fps: parse_or(value("CS_FPS"), "CS_FPS", defaults.fps).max(1),
            bitrate_kbps: parse_or(
                value("CS_BITRATE_KBPS"),
                "CS_BITRATE_KBPS",
                defaults.bitrate_kbps,
            ),
            stun_server: value("CS_STUN_SERVER"),
            ..defaults
        }
    }

    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set frame dimensions
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set frame rate (at least 1)
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Set encoder bitrate hint
    pub fn bitrate_kbps(mut self, kbps: u32) -> Self {
        self.bitrate_kbps = kbps;
        self
    }

    /// Set STUN server
    pub fn stun_server(mut self, server: impl Into<String>) -> Self {
        self.stun_server = Some(server.into());
        self
    }

    /// Set handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the close reason sent to refused peers
    pub fn busy_reason(mut self, reason: impl Into<String>) -> Self {
        self.busy_reason = reason.into();
        self
    }

    /// Interval between produced frames
    pub fn frame_period(&self) -> Duration {
        self.media_profile().frame_period()
    }

    /// Geometry and encoder hints for the pipeline
    pub fn media_profile(&self) -> MediaProfile {
        MediaProfile {
            width: self.width,
            height: self.height,
            fps: self.fps,
            bitrate_kbps: self.bitrate_kbps,
            stun_server: self.stun_server.clone(),
        }
    }

    /// Reject configurations the pipeline cannot use
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "invalid resolution {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(Error::Config("fps must be positive".into()));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = key, value = %raw, "Ignoring unparseable setting");
            default
        }),
    }
}
