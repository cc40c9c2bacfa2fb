//! Listening socket, worker pool and the start/stop state machine.

pub mod lifecycle;
pub mod listener;
pub mod pool;
pub mod shutdown;

pub use lifecycle::{OnStart, ServerState, WebServer};
