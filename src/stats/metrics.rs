//! Frame producer statistics

use std::time::{Duration, Instant};

use crate::error::FlowError;

/// Why the producer loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerExit {
    /// Still running (stats snapshot taken mid-loop)
    Running,
    /// Cooperative stop requested by the lifecycle
    Stopped,
    /// The pipeline rejected a frame and the loop stopped itself
    FlowError(FlowError),
}

/// Counters accumulated by one producer run
#[derive(Debug, Clone)]
pub struct ProducerStats {
    /// When the loop started
    pub started_at: Instant,
    /// Frames accepted by the pipeline
    pub frames_fed: u64,
    /// Ticks that began more than one period behind schedule
    pub late_ticks: u64,
    /// How the loop ended
    pub exit: ProducerExit,
}

impl ProducerStats {
    /// Create stats for a loop starting now
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_fed: 0,
            late_ticks: 0,
            exit: ProducerExit::Running,
        }
    }

    /// Time since the loop started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Average frames per second over the run
    pub fn average_fps(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.frames_fed as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for ProducerStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_running() {
        let stats = ProducerStats::new();
        assert_eq!(stats.frames_fed, 0);
        assert_eq!(stats.exit, ProducerExit::Running);
    }

    #[test]
    fn test_average_fps_without_frames() {
        let stats = ProducerStats::new();
        assert_eq!(stats.average_fps(), 0.0);
    }
}
