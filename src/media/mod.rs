//! Media collaborators
//!
//! This module defines the contracts the session lifecycle drives:
//! - [`FrameSource`] produces one payload per tick
//! - [`MediaPipeline`] consumes frames and handles offer/answer and candidates
//!
//! Neither is implemented here; applications plug in their own.

pub mod frame;
pub mod pipeline;
pub mod profile;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use frame::VideoFrame;
pub use pipeline::{CandidateCallback, ErrorCallback, MediaPipeline};
pub use profile::MediaProfile;
pub use source::FrameSource;
