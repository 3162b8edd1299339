//! SDK 接口：安装上报、指纹匹配、用户补充、deeplink

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::helpers::{api_result, error_from_clickmatch, json_response};
use crate::services::{DeeplinkPayload, InstallRequest, InstallService, MatchResult};
use crate::utils::ip::extract_network_origin;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub install_id: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeeplinkRequest {
    pub install_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct InstallResponse {
    status: &'static str,
    install_id: String,
}

#[derive(Debug, Serialize)]
struct DeeplinkResponse {
    deeplink_payload: DeeplinkPayload,
}

pub struct InstallApi;

impl InstallApi {
    /// `POST /api/install`
    pub async fn report_install(
        req: HttpRequest,
        body: web::Json<InstallRequest>,
        service: web::Data<Arc<InstallService>>,
    ) -> impl Responder {
        let origin = extract_network_origin(&req);
        api_result(
            service
                .report_install(body.into_inner(), origin)
                .await
                .map(|install| InstallResponse {
                    status: "ok",
                    install_id: install.install_id,
                }),
        )
    }

    /// `POST /api/match_install`
    pub async fn match_install(
        req: HttpRequest,
        body: web::Json<InstallRequest>,
        service: web::Data<Arc<InstallService>>,
    ) -> HttpResponse {
        let origin = extract_network_origin(&req);
        match service.match_install(body.into_inner(), origin).await {
            Ok(MatchResult::Matched {
                install_id,
                matched_click_id,
                match_score,
                deeplink_payload,
            }) => json_response(
                StatusCode::OK,
                &json!({
                    "status": "ok",
                    "install_id": install_id,
                    "matched_click_id": matched_click_id,
                    "match_score": match_score,
                    "deeplink_payload": deeplink_payload,
                }),
            ),
            Ok(MatchResult::NoMatch(reason)) => json_response(
                StatusCode::NOT_FOUND,
                &json!({
                    "status": "no_match",
                    "reason": reason.message(),
                    "reason_code": reason,
                }),
            ),
            Err(e) => error_from_clickmatch(&e),
        }
    }

    /// `POST /api/update_user`
    pub async fn update_user(
        body: web::Json<UpdateUserRequest>,
        service: web::Data<Arc<InstallService>>,
    ) -> impl Responder {
        let body = body.into_inner();
        api_result(
            service
                .update_user(body.install_id.as_deref(), body.phone_number.as_deref())
                .await
                .map(|_| {
                    json!({
                        "status": "ok",
                        "message": "User data updated successfully.",
                    })
                }),
        )
    }

    /// `POST /api/deeplink`
    pub async fn deeplink(
        body: web::Json<DeeplinkRequest>,
        service: web::Data<Arc<InstallService>>,
    ) -> impl Responder {
        api_result(
            service
                .deeplink(body.install_id.as_deref())
                .await
                .map(|deeplink_payload| DeeplinkResponse { deeplink_payload }),
        )
    }
}

/// SDK 路由 `/api`
pub fn install_routes() -> actix_web::Scope {
    web::scope("/api")
        .route("/install", web::post().to(InstallApi::report_install))
        .route("/match_install", web::post().to(InstallApi::match_install))
        .route("/update_user", web::post().to(InstallApi::update_user))
        .route("/deeplink", web::post().to(InstallApi::deeplink))
}
