//! 配置值验证模块
//!
//! 启动时对合并后的静态配置做一次检查，失败时拒绝启动。

use std::net::IpAddr;

use base64::Engine;
use rand::RngExt;
use tracing::warn;

use super::StaticConfig;
use crate::errors::{Result, ShortenerError};

/// 验证静态配置
pub fn validate_config(config: &StaticConfig) -> Result<()> {
    if config.server.host.trim().is_empty() {
        return Err(ShortenerError::validation("server.host cannot be empty"));
    }

    let base = url::Url::parse(&config.server.base_url).map_err(|e| {
        ShortenerError::validation(format!(
            "server.base_url '{}' is not a valid URL: {}",
            config.server.base_url, e
        ))
    })?;
    if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
        return Err(ShortenerError::validation(format!(
            "server.base_url '{}' must be an absolute http(s) URL",
            config.server.base_url
        )));
    }

    if let Some(ref subnet) = config.server.trusted_subnet
        && !subnet.trim().is_empty()
    {
        validate_cidr(subnet)?;
    }

    if config.deletion.batch_size == 0 {
        return Err(ShortenerError::validation(
            "deletion.batch_size must be greater than 0",
        ));
    }
    if config.deletion.queue_capacity == 0 {
        return Err(ShortenerError::validation(
            "deletion.queue_capacity must be greater than 0",
        ));
    }

    Ok(())
}

/// 检查 CIDR 格式（如 "192.168.1.0/24"）
pub fn validate_cidr(cidr: &str) -> Result<()> {
    let invalid = || ShortenerError::validation(format!("Invalid CIDR: '{}'", cidr));

    let (network, prefix_len) = cidr.trim().split_once('/').ok_or_else(invalid)?;
    let network: IpAddr = network.parse().map_err(|_| invalid())?;
    let prefix_len: u8 = prefix_len.parse().map_err(|_| invalid())?;

    let max = if network.is_ipv4() { 32 } else { 128 };
    if prefix_len > max {
        return Err(invalid());
    }
    Ok(())
}

/// 密钥为空时生成随机密钥，返回是否生成了新密钥
pub fn ensure_auth_secret(config: &mut StaticConfig) -> bool {
    if !config.auth.secret_key.trim().is_empty() {
        return false;
    }

    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    config.auth.secret_key = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);

    warn!(
        "auth.secret_key is not configured, generated a random one. \
         Identity cookies will not survive a restart."
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&StaticConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let mut config = StaticConfig::default();
        config.server.base_url = "/short".to_string();
        assert!(validate_config(&config).is_err());

        config.server.base_url = "ftp://example.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_trusted_subnet() {
        let mut config = StaticConfig::default();
        config.server.trusted_subnet = Some("10.0.0.0/33".to_string());
        assert!(validate_config(&config).is_err());

        config.server.trusted_subnet = Some("not-a-subnet".to_string());
        assert!(validate_config(&config).is_err());

        config.server.trusted_subnet = Some("10.0.0.0/8".to_string());
        assert!(validate_config(&config).is_ok());

        config.server.trusted_subnet = Some("fd00::/8".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let mut config = StaticConfig::default();
        config.deletion.batch_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_ensure_auth_secret_only_fills_empty() {
        let mut config = StaticConfig::default();
        assert!(ensure_auth_secret(&mut config));
        let generated = config.auth.secret_key.clone();
        assert!(!generated.is_empty());

        assert!(!ensure_auth_secret(&mut config));
        assert_eq!(config.auth.secret_key, generated);
    }
}
