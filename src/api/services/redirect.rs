use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, error, trace};

use super::helpers::{error_from_clickmatch, json_response, user_agent};
use super::landing::render_landing_page;
use crate::errors::ClickmatchError;
use crate::services::{ClickService, CollectRequest, RedirectDecision};
use crate::utils::ip::extract_network_origin;
use crate::utils::is_valid_click_token;

pub struct RedirectService;

impl RedirectService {
    /// `GET /{token}`
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        service: web::Data<Arc<ClickService>>,
    ) -> impl Responder {
        let token = path.into_inner();
        if !is_valid_click_token(&token) {
            // 非法 token 直接 404，不查库
            trace!("Invalid click token rejected: {}", token);
            return Self::not_found_response();
        }

        let origin = extract_network_origin(&req);
        match service
            .resolve_redirect(&token, user_agent(&req), origin)
            .await
        {
            Ok(RedirectDecision::Store { location }) => HttpResponse::build(StatusCode::FOUND)
                .insert_header(("Location", location))
                .finish(),
            Ok(RedirectDecision::Landing { platform, target }) => {
                debug!("Serving landing page for {} ({})", token, platform.as_ref());
                HttpResponse::Ok()
                    .insert_header(("Content-Type", "text/html; charset=utf-8"))
                    .body(render_landing_page(
                        &token,
                        platform.as_ref(),
                        target.as_deref(),
                    ))
            }
            Err(ClickmatchError::NotFound(_)) => Self::not_found_response(),
            Err(e) => {
                error!("Redirect for {} failed: {}", token, e);
                Self::error_response()
            }
        }
    }

    /// `HEAD /{token}`
    ///
    /// 链接预览 / 预取只探测目标，不写点击事件也不计数。
    pub async fn handle_head(
        req: HttpRequest,
        path: web::Path<String>,
        service: web::Data<Arc<ClickService>>,
    ) -> impl Responder {
        let token = path.into_inner();
        if !is_valid_click_token(&token) {
            return Self::not_found_response();
        }

        match service.peek_redirect(&token, user_agent(&req)).await {
            Ok(RedirectDecision::Store { location }) => HttpResponse::build(StatusCode::FOUND)
                .insert_header(("Location", location))
                .finish(),
            Ok(RedirectDecision::Landing { .. }) => HttpResponse::Ok()
                .insert_header(("Content-Type", "text/html; charset=utf-8"))
                .finish(),
            Err(ClickmatchError::NotFound(_)) => Self::not_found_response(),
            Err(e) => {
                error!("HEAD for {} failed: {}", token, e);
                Self::error_response()
            }
        }
    }

    /// `POST /{token}/collect`
    pub async fn collect(
        req: HttpRequest,
        path: web::Path<String>,
        body: web::Json<CollectRequest>,
        service: web::Data<Arc<ClickService>>,
    ) -> HttpResponse {
        let token = path.into_inner();
        let origin = extract_network_origin(&req);
        match service
            .collect(&token, body.into_inner(), origin, user_agent(&req))
            .await
        {
            Ok(event) => {
                debug!("Landing data collected for {} (event {})", token, event.id);
                json_response(StatusCode::OK, &json!({ "status": "ok" }))
            }
            Err(e) => error_from_clickmatch(&e),
        }
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .body("invalid url")
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .body("Internal Server Error")
    }
}

/// Redirect 路由配置（最后注册，`/{token}` 会匹配任意单段路径）
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{token}/collect", web::post().to(RedirectService::collect))
        .route("/{token}", web::get().to(RedirectService::handle_redirect))
        .route("/{token}", web::head().to(RedirectService::handle_head))
}
