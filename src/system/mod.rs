//! System-level modules
//!
//! Process-wide concerns that sit outside the shortening core.

pub mod logging;

pub use logging::init_logging;
