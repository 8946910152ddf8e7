//! Frame source contract

use std::time::Duration;

use bytes::Bytes;

/// Produces one payload per producer tick
///
/// Called from the producer thread only. `produce` must not block longer
/// than one frame period under normal operation.
pub trait FrameSource: Send + 'static {
    /// Produce the payload for a frame at `elapsed` since session start
    fn produce(&mut self, elapsed: Duration) -> Bytes;
}

impl<F> FrameSource for F
where
    F: FnMut(Duration) -> Bytes + Send + 'static,
{
    fn produce(&mut self, elapsed: Duration) -> Bytes {
        self(elapsed)
    }
}
