//! Service layer
//!
//! HTTP handlers talk to [`ShortenerService`]; it owns the storage handle,
//! the code generator and the background deletion queue.

pub mod deletion;
pub mod shortener;

pub use deletion::{DeletionHandle, DeletionQueue};
pub use shortener::{BatchItem, BatchResult, ShortenOutcome, ShortenerService};
