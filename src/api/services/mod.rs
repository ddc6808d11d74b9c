pub mod health;
pub mod helpers;
pub mod internal;
pub mod redirect;
pub mod shorten;
pub mod user_urls;

pub use health::HealthService;
pub use internal::{InternalService, StatsResponse};
pub use redirect::RedirectService;
pub use shorten::{BatchResponseItem, ShortenResponse, ShortenService};
pub use user_urls::{UserUrl, UserUrlsService};
