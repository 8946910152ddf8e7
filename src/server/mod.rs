//! WebSocket signaling server
//!
//! - [`SignalingServer`]: accept loop, dispatcher thread, shutdown sequence
//! - [`ServerConfig`]: bind address, media geometry and timeouts
//! - [`ConnectionGate`]: the single peer slot
//! - [`RunningFlag`]: process-wide running state that wakes network waits

pub mod config;
pub(crate) mod connection;
pub mod gate;
pub mod listener;
pub mod shutdown;

pub use config::ServerConfig;
pub use gate::ConnectionGate;
pub use listener::SignalingServer;
pub use shutdown::RunningFlag;
