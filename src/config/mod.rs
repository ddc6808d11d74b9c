pub mod args;
mod r#impl;
mod structs;
pub mod validators;

pub use args::Args;
pub use r#impl::{get_config, install_config};
pub use structs::*;
pub use validators::{ensure_auth_secret, validate_config};
