pub mod request_log;
pub mod trusted_subnet;

pub use request_log::RequestLogMiddleware;
pub use trusted_subnet::TrustedSubnetGuard;
