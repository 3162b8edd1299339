use std::sync::Arc;

use actix_web::{HttpRequest, Responder, web};
use tracing::trace;

use super::helpers::{api_result, request_base};
use crate::services::ClickService;
use crate::storage::NewClick;

pub struct LinkApi;

impl LinkApi {
    /// `POST /generate_link`
    pub async fn generate_link(
        req: HttpRequest,
        body: web::Json<NewClick>,
        service: web::Data<Arc<ClickService>>,
    ) -> impl Responder {
        trace!("Received generate_link request");
        let base = request_base(&req);
        api_result(service.generate_link(body.into_inner(), &base).await)
    }
}

pub fn link_routes() -> actix_web::Resource {
    web::resource("/generate_link").route(web::post().to(LinkApi::generate_link))
}
