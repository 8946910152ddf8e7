//! Statistics for the streaming side of a session

pub mod metrics;

pub use metrics::{ProducerExit, ProducerStats};
