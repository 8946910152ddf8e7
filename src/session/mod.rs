//! Media session lifecycle
//!
//! - [`SessionLifecycle`]: idempotent start/stop of the pipeline
//! - [`FrameProducer`]: the periodic thread feeding it

pub mod lifecycle;
pub mod producer;

pub use lifecycle::{PipelineState, SessionLifecycle};
pub use producer::{FrameProducer, SharedSource};
