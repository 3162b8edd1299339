use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum ClickmatchError {
    InvalidInput(String),
    NotFound(String),
    Conflict(String),
    TokenSpaceExhausted(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
}

impl ClickmatchError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ClickmatchError::InvalidInput(_) => "E001",
            ClickmatchError::NotFound(_) => "E002",
            ClickmatchError::Conflict(_) => "E003",
            ClickmatchError::TokenSpaceExhausted(_) => "E004",
            ClickmatchError::DatabaseConfig(_) => "E005",
            ClickmatchError::DatabaseConnection(_) => "E006",
            ClickmatchError::DatabaseOperation(_) => "E007",
            ClickmatchError::Serialization(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ClickmatchError::InvalidInput(_) => "Invalid Input",
            ClickmatchError::NotFound(_) => "Resource Not Found",
            ClickmatchError::Conflict(_) => "Conflict",
            ClickmatchError::TokenSpaceExhausted(_) => "Token Space Exhausted",
            ClickmatchError::DatabaseConfig(_) => "Database Configuration Error",
            ClickmatchError::DatabaseConnection(_) => "Database Connection Error",
            ClickmatchError::DatabaseOperation(_) => "Database Operation Error",
            ClickmatchError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ClickmatchError::InvalidInput(msg)
            | ClickmatchError::NotFound(msg)
            | ClickmatchError::Conflict(msg)
            | ClickmatchError::TokenSpaceExhausted(msg)
            | ClickmatchError::DatabaseConfig(msg)
            | ClickmatchError::DatabaseConnection(msg)
            | ClickmatchError::DatabaseOperation(msg)
            | ClickmatchError::Serialization(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            ClickmatchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ClickmatchError::NotFound(_) => StatusCode::NOT_FOUND,
            ClickmatchError::Conflict(_) => StatusCode::CONFLICT,
            ClickmatchError::TokenSpaceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            ClickmatchError::DatabaseConfig(_)
            | ClickmatchError::DatabaseConnection(_)
            | ClickmatchError::DatabaseOperation(_)
            | ClickmatchError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ClickmatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ClickmatchError {}

// 便捷的构造函数
impl ClickmatchError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        ClickmatchError::InvalidInput(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ClickmatchError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        ClickmatchError::Conflict(msg.into())
    }

    pub fn token_space_exhausted<T: Into<String>>(msg: T) -> Self {
        ClickmatchError::TokenSpaceExhausted(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ClickmatchError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ClickmatchError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ClickmatchError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ClickmatchError::Serialization(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClickmatchError::Conflict(_))
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ClickmatchError {
    fn from(err: sea_orm::DbErr) -> Self {
        ClickmatchError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ClickmatchError {
    fn from(err: serde_json::Error) -> Self {
        ClickmatchError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClickmatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            ClickmatchError::invalid_input("x"),
            ClickmatchError::not_found("x"),
            ClickmatchError::conflict("x"),
            ClickmatchError::token_space_exhausted("x"),
            ClickmatchError::database_config("x"),
            ClickmatchError::database_connection("x"),
            ClickmatchError::database_operation("x"),
            ClickmatchError::serialization("x"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            ClickmatchError::invalid_input("missing origin").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ClickmatchError::not_found("install").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ClickmatchError::database_operation("boom").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = ClickmatchError::not_found("Invalid install_id");
        assert_eq!(err.to_string(), "Resource Not Found: Invalid install_id");
        assert_eq!(err.message(), "Invalid install_id");
    }

    #[test]
    fn test_from_db_err() {
        let err: ClickmatchError = sea_orm::DbErr::Custom("broken".to_string()).into();
        assert!(matches!(err, ClickmatchError::DatabaseOperation(_)));
        assert!(!err.is_conflict());
    }
}
