//! Anonymous owner identity
//!
//! Owners are identified by a random id carried in a signed cookie:
//! `auth_token=<owner_id>:<hex(hmac_sha256(secret, owner_id))>`.
//! Nothing is stored server-side; every request re-validates the signature.

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::trace;

use crate::errors::{Result, ShortenerError};

type HmacSha256 = Hmac<Sha256>;

/// Cookie 名称
pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// Cookie 有效期（天）
const COOKIE_MAX_AGE_DAYS: i64 = 365;

#[derive(Clone)]
pub struct IdentityService {
    mac: HmacSha256,
    secure: bool,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl IdentityService {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ShortenerError::validation("identity secret cannot be empty"));
        }

        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| ShortenerError::validation(format!("invalid identity secret: {}", e)))?;

        Ok(Self { mac, secure: false })
    }

    /// Mark issued cookies as `Secure` (HTTPS deployments)
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Hex HMAC digest of an owner id
    pub fn sign(&self, owner_id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(owner_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Cookie value `owner_id:digest`
    pub fn sign_cookie_value(&self, owner_id: &str) -> String {
        format!("{}:{}", owner_id, self.sign(owner_id))
    }

    /// Validate a raw cookie value, returning the embedded owner id
    pub fn verify_value(&self, value: &str) -> Option<String> {
        let (owner_id, digest) = value.split_once(':')?;
        if owner_id.is_empty() {
            return None;
        }

        let expected = self.sign(owner_id);
        if expected.as_bytes().ct_eq(digest.as_bytes()).into() {
            Some(owner_id.to_string())
        } else {
            trace!("Rejected identity cookie with bad signature");
            None
        }
    }

    /// Read-only check, never mints a new identity
    pub fn validate(&self, cookie_value: Option<&str>) -> Option<String> {
        cookie_value.and_then(|v| self.verify_value(v))
    }

    /// Return the owner id from a valid cookie, or mint a new one together
    /// with the cookie that must be set on the response
    pub fn get_or_issue(&self, cookie_value: Option<&str>) -> (String, Option<Cookie<'static>>) {
        if let Some(owner_id) = self.validate(cookie_value) {
            return (owner_id, None);
        }

        let owner_id = uuid::Uuid::new_v4().to_string();
        let cookie = self.build_cookie(self.sign_cookie_value(&owner_id));
        trace!("Issued new owner identity {}", owner_id);
        (owner_id, Some(cookie))
    }

    /// `validate` against the request's `auth_token` cookie
    pub fn validate_request(&self, req: &HttpRequest) -> Option<String> {
        let cookie = req.cookie(AUTH_COOKIE_NAME);
        self.validate(cookie.as_ref().map(|c| c.value()))
    }

    /// `get_or_issue` against the request's `auth_token` cookie
    pub fn get_or_issue_request(&self, req: &HttpRequest) -> (String, Option<Cookie<'static>>) {
        let cookie = req.cookie(AUTH_COOKIE_NAME);
        self.get_or_issue(cookie.as_ref().map(|c| c.value()))
    }

    fn build_cookie(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(AUTH_COOKIE_NAME, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_max_age(CookieDuration::days(COOKIE_MAX_AGE_DAYS));
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> IdentityService {
        IdentityService::new("test-secret").unwrap()
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(IdentityService::new("").is_err());
    }

    #[test]
    fn test_signed_value_round_trips() {
        let identity = service();
        let value = identity.sign_cookie_value("owner-1");
        assert_eq!(identity.validate(Some(&value)), Some("owner-1".to_string()));
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let a = IdentityService::new("secret-a").unwrap();
        let b = IdentityService::new("secret-b").unwrap();
        let value = a.sign_cookie_value("owner-1");
        assert!(b.validate(Some(&value)).is_none());
    }

    #[test]
    fn test_malformed_values_are_absent() {
        let identity = service();
        assert!(identity.validate(None).is_none());
        assert!(identity.validate(Some("no-separator")).is_none());
        assert!(identity.validate(Some(":deadbeef")).is_none());
        let value = identity.sign_cookie_value("owner-1");
        assert!(identity.validate(Some(&format!("{}:extra", value))).is_none());
    }

    #[test]
    fn test_issued_cookie_attributes() {
        let identity = service();
        let (owner_id, cookie) = identity.get_or_issue(None);
        let cookie = cookie.expect("a new identity sets a cookie");

        assert_eq!(cookie.name(), AUTH_COOKIE_NAME);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(CookieDuration::days(365)));
        assert_eq!(identity.validate(Some(cookie.value())), Some(owner_id));
    }

    #[test]
    fn test_valid_cookie_is_not_reissued() {
        let identity = service();
        let value = identity.sign_cookie_value("owner-1");
        let (owner_id, cookie) = identity.get_or_issue(Some(&value));
        assert_eq!(owner_id, "owner-1");
        assert!(cookie.is_none());
    }
}
