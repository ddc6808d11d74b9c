//! Application lifecycle: start-up wiring, the HTTP server and graceful shutdown

pub mod lifetime;
pub mod modes;

pub use modes::run_server;
