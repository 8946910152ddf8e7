//! Timestamped frame handed to the pipeline

use std::time::Duration;

use bytes::Bytes;

/// One unit of media produced per tick
///
/// Cheap to clone: the payload is reference counted.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Presentation timestamp, relative to session start
    pub pts: Duration,
    /// Nominal display duration (one frame period)
    pub duration: Duration,
    /// Raw frame payload as produced by the source
    pub data: Bytes,
}

impl VideoFrame {
    /// Create a frame
    pub fn new(pts: Duration, duration: Duration, data: Bytes) -> Self {
        Self {
            pts,
            duration,
            data,
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
