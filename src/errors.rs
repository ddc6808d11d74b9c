use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenerError {
    InvalidUrl(String),
    /// origin 已存在，携带已有的短码
    Conflict { existing_code: String },
    CodeCollision(String),
    NotFound(String),
    Gone(String),
    BackendUnavailable(String),
    DatabaseConfig(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
    Validation(String),
    Unauthorized(String),
}

impl ShortenerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::InvalidUrl(_) => "E001",
            ShortenerError::Conflict { .. } => "E002",
            ShortenerError::CodeCollision(_) => "E003",
            ShortenerError::NotFound(_) => "E004",
            ShortenerError::Gone(_) => "E005",
            ShortenerError::BackendUnavailable(_) => "E006",
            ShortenerError::DatabaseConfig(_) => "E007",
            ShortenerError::DatabaseOperation(_) => "E008",
            ShortenerError::FileOperation(_) => "E009",
            ShortenerError::Serialization(_) => "E010",
            ShortenerError::Validation(_) => "E011",
            ShortenerError::Unauthorized(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::InvalidUrl(_) => "Invalid URL",
            ShortenerError::Conflict { .. } => "Origin Conflict",
            ShortenerError::CodeCollision(_) => "Code Collision",
            ShortenerError::NotFound(_) => "Resource Not Found",
            ShortenerError::Gone(_) => "Resource Gone",
            ShortenerError::BackendUnavailable(_) => "Backend Unavailable",
            ShortenerError::DatabaseConfig(_) => "Database Configuration Error",
            ShortenerError::DatabaseOperation(_) => "Database Operation Error",
            ShortenerError::FileOperation(_) => "File Operation Error",
            ShortenerError::Serialization(_) => "Serialization Error",
            ShortenerError::Validation(_) => "Validation Error",
            ShortenerError::Unauthorized(_) => "Unauthorized",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortenerError::Conflict { existing_code } => existing_code,
            ShortenerError::InvalidUrl(msg)
            | ShortenerError::CodeCollision(msg)
            | ShortenerError::NotFound(msg)
            | ShortenerError::Gone(msg)
            | ShortenerError::BackendUnavailable(msg)
            | ShortenerError::DatabaseConfig(msg)
            | ShortenerError::DatabaseOperation(msg)
            | ShortenerError::FileOperation(msg)
            | ShortenerError::Serialization(msg)
            | ShortenerError::Validation(msg)
            | ShortenerError::Unauthorized(msg) => msg,
        }
    }

    /// HTTP 状态码映射（供 transport 层使用）
    pub fn http_status(&self) -> StatusCode {
        match self {
            ShortenerError::InvalidUrl(_) | ShortenerError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ShortenerError::Conflict { .. } => StatusCode::CONFLICT,
            ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortenerError::Gone(_) => StatusCode::GONE,
            ShortenerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ShortenerError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ShortenerError::CodeCollision(_)
            | ShortenerError::DatabaseConfig(_)
            | ShortenerError::DatabaseOperation(_)
            | ShortenerError::FileOperation(_)
            | ShortenerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

// 便捷的构造函数
impl ShortenerError {
    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        ShortenerError::InvalidUrl(msg.into())
    }

    pub fn conflict<T: Into<String>>(existing_code: T) -> Self {
        ShortenerError::Conflict {
            existing_code: existing_code.into(),
        }
    }

    pub fn code_collision<T: Into<String>>(msg: T) -> Self {
        ShortenerError::CodeCollision(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortenerError::NotFound(msg.into())
    }

    pub fn gone<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Gone(msg.into())
    }

    pub fn backend_unavailable<T: Into<String>>(msg: T) -> Self {
        ShortenerError::BackendUnavailable(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConfig(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Serialization(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Validation(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Unauthorized(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortenerError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::DbErr;

        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                ShortenerError::BackendUnavailable(err.to_string())
            }
            other => ShortenerError::DatabaseOperation(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ShortenerError {
    fn from(err: std::io::Error) -> Self {
        ShortenerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_carries_existing_code() {
        let err = ShortenerError::conflict("abc123");
        assert_eq!(err.message(), "abc123");
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_gone_and_not_found_are_distinct() {
        let gone = ShortenerError::gone("x");
        let missing = ShortenerError::not_found("x");
        assert_ne!(gone.code(), missing.code());
        assert_eq!(gone.http_status(), StatusCode::GONE);
        assert_eq!(missing.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_connection_errors_map_to_backend_unavailable() {
        let err: ShortenerError =
            sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".into())).into();
        assert!(matches!(err, ShortenerError::BackendUnavailable(_)));

        let err: ShortenerError = sea_orm::DbErr::Custom("boom".into()).into();
        assert!(matches!(err, ShortenerError::DatabaseOperation(_)));
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = ShortenerError::invalid_url("missing host");
        assert_eq!(err.to_string(), "Invalid URL: missing host");
    }
}
