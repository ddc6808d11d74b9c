//! Command-line argument parsing
//!
//! Flags override values loaded from `config.toml` and `SHORTENER__*`
//! variables. Each flag can also be supplied through its legacy
//! environment variable (`SERVER_ADDRESS`, `BASE_URL`, ...).

use clap::Parser;

use super::StaticConfig;
use crate::errors::{Result, ShortenerError};

/// Shortener - a multi-tenant URL shortener service
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "shortener")]
#[command(version)]
#[command(about = "A multi-tenant URL shortener service", long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long = "config", env = "CONFIG")]
    pub config: Option<String>,

    /// Address to listen on (host:port)
    #[arg(short = 'a', long = "address", env = "SERVER_ADDRESS")]
    pub server_address: Option<String>,

    /// Base URL prepended to generated codes
    #[arg(short = 'b', long = "base-url", env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Path of the append-only journal used by the file backend
    #[arg(short = 'f', long = "file-storage-path", env = "FILE_STORAGE_PATH")]
    pub file_storage_path: Option<String>,

    /// Database DSN; enables the relational backend
    #[arg(short = 'd', long = "database-dsn", env = "DATABASE_DSN")]
    pub database_dsn: Option<String>,

    /// CIDR allowed to query internal statistics
    #[arg(short = 't', long = "trusted-subnet", env = "TRUSTED_SUBNET")]
    pub trusted_subnet: Option<String>,

    /// Secret used to sign identity cookies
    #[arg(short = 'k', long = "auth-secret", env = "AUTH_SECRET", hide_env_values = true)]
    pub auth_secret: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long = "generate-config")]
    pub generate_config: bool,
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_to(&self, config: &mut StaticConfig) -> Result<()> {
        if let Some(ref address) = self.server_address {
            let (host, port) = split_address(address)?;
            config.server.host = host;
            config.server.port = port;
        }
        if let Some(ref base_url) = self.base_url {
            config.server.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(ref path) = self.file_storage_path {
            config.storage.file_storage_path = path.clone();
        }
        if let Some(ref dsn) = self.database_dsn {
            config.storage.database_url = dsn.clone();
        }
        if let Some(ref subnet) = self.trusted_subnet {
            config.server.trusted_subnet = Some(subnet.clone());
        }
        if let Some(ref secret) = self.auth_secret {
            config.auth.secret_key = secret.clone();
        }
        Ok(())
    }
}

/// Split `host:port`; an empty host (":8080") binds every interface
fn split_address(address: &str) -> Result<(String, u16)> {
    let (host, port) = address.rsplit_once(':').ok_or_else(|| {
        ShortenerError::validation(format!(
            "Invalid server address '{}', expected host:port",
            address
        ))
    })?;

    let port: u16 = port.parse().map_err(|_| {
        ShortenerError::validation(format!("Invalid port in server address '{}'", address))
    })?;

    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok((host.to_string(), port))
}
