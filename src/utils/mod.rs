pub mod ip;
pub mod url_validator;

pub use ip::{ip_in_cidr, ip_in_subnet};
pub use url_validator::{UrlValidationError, validate_url};
