use serde::{Deserialize, Serialize};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 存储后端类型（启动时确定，进程生命周期内不变）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Relational { database_url: String },
    File { path: String },
    Memory,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Relational { .. } => "relational",
            BackendKind::File { .. } => "file",
            BackendKind::Memory => "memory",
        }
    }
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 优先级：命令行参数 > ENV > config.toml > 默认值
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub deletion: DeletionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从默认路径加载
    pub fn load() -> Self {
        Self::load_from(None)
    }

    /// 从 TOML 文件和环境变量加载配置
    ///
    /// ENV 前缀：SHORTENER，分隔符：__
    /// 示例：SHORTENER__SERVER__PORT=9999
    pub fn load_from(path: Option<&str>) -> Self {
        use config::{Config, Environment, File};

        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SHORTENER")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 存储后端选择：database_url > file_storage_path > memory
    pub fn backend_kind(&self) -> BackendKind {
        let database_url = self.storage.database_url.trim();
        let file_path = self.storage.file_storage_path.trim();

        if !database_url.is_empty() {
            BackendKind::Relational {
                database_url: database_url.to_string(),
            }
        } else if !file_path.is_empty() {
            BackendKind::File {
                path: file_path.to_string(),
            }
        } else {
            BackendKind::Memory
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// 短链接前缀，返回给调用方的链接为 `{base_url}/{code}`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 允许访问统计接口的子网（CIDR），为空时统计接口拒绝所有请求
    #[serde(default)]
    pub trusted_subnet: Option<String>,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub file_storage_path: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
}

/// 身份 cookie 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// HMAC 密钥，为空时启动时随机生成（重启后旧 cookie 失效）
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub cookie_secure: bool,
}

/// 异步删除配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionConfig {
    #[serde(default = "default_deletion_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_deletion_chunk_timeout")]
    pub chunk_timeout_secs: u64,
    #[serde(default = "default_deletion_queue_capacity")]
    pub queue_capacity: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "localhost".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    8
}

fn default_deletion_batch_size() -> usize {
    100
}

fn default_deletion_chunk_timeout() -> u64 {
    10
}

fn default_deletion_queue_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            base_url: default_base_url(),
            trusted_subnet: None,
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            file_storage_path: String::new(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
        }
    }
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_deletion_batch_size(),
            chunk_timeout_secs: default_deletion_chunk_timeout(),
            queue_capacity: default_deletion_queue_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_prefers_database() {
        let mut config = StaticConfig::default();
        assert_eq!(config.backend_kind(), BackendKind::Memory);

        config.storage.file_storage_path = "/tmp/urls.jsonl".to_string();
        assert_eq!(
            config.backend_kind(),
            BackendKind::File {
                path: "/tmp/urls.jsonl".to_string()
            }
        );

        config.storage.database_url = "sqlite://urls.db?mode=rwc".to_string();
        assert!(matches!(
            config.backend_kind(),
            BackendKind::Relational { .. }
        ));
    }

    #[test]
    fn test_blank_paths_fall_back_to_memory() {
        let mut config = StaticConfig::default();
        config.storage.database_url = "   ".to_string();
        config.storage.file_storage_path = " ".to_string();
        assert_eq!(config.backend_kind(), BackendKind::Memory);
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).expect("sample config should parse");
        assert_eq!(parsed.deletion.batch_size, 100);
        assert_eq!(parsed.server.base_url, "http://localhost:8080");
    }
}
