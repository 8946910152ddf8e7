//! Media geometry shared by the source and the pipeline

use std::time::Duration;

/// Output geometry and encoder hints for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaProfile {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Target frame rate
    pub fps: u32,
    /// Target encoder bitrate
    pub bitrate_kbps: u32,
    /// STUN server handed to the peer connection, if any
    pub stun_server: Option<String>,
}

impl MediaProfile {
    /// Interval between two frames
    pub fn frame_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }

    /// Size of one RGBA frame in bytes
    pub fn rgba_frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl Default for MediaProfile {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            bitrate_kbps: 2500,
            stun_server: None,
        }
    }
}
