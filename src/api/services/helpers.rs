//! API 帮助函数

use actix_web::http::StatusCode;
use actix_web::error::InternalError;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use tracing::{debug, error};

use crate::errors::ClickmatchError;

/// `{status:"error", code, message}`
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub status: &'static str,
    pub code: &'static str,
    pub message: &'a str,
}

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

/// 从 ClickmatchError 构建错误响应（自动映射 HTTP 状态码）
pub fn error_from_clickmatch(err: &ClickmatchError) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected: {}", err);
    }
    json_response(
        status,
        &ErrorBody {
            status: "error",
            code: err.code(),
            message: err.message(),
        },
    )
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: Result<T, ClickmatchError>) -> HttpResponse {
    match result {
        Ok(data) => json_response(StatusCode::OK, &data),
        Err(e) => error_from_clickmatch(&e),
    }
}

/// 请求体解析失败时也返回统一的 JSON 错误
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let clickmatch = ClickmatchError::invalid_input(format!("invalid JSON body: {}", err));
            InternalError::from_response(err, error_from_clickmatch(&clickmatch)).into()
        })
}

/// 请求自身的 `scheme://host`，用于拼接生成的链接
pub fn request_base(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

/// 读取 User-Agent 头
pub fn user_agent(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
}
