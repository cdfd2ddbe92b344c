use crate::{
    error::DesignError,
    models::{DesignPayload, DesignResponse, ErrorBody},
    pipeline::DesignPipeline,
};
use actix_web::{
    error::InternalError,
    http::{header::HeaderValue, Method, StatusCode},
    middleware, web, HttpResponse, ResponseError,
};
use serde_json::json;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

impl ResponseError for DesignError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self.to_string()))
    }
}

/// Registers every route of the service. The caller provides the
/// `web::Data<DesignPipeline>` app data.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(liveness))
        .route("/health", web::get().to(health))
        .service(
            web::resource("/api/design")
                .route(web::post().to(design))
                .route(web::method(Method::OPTIONS).to(preflight)),
        );
}

/// CORS headers added to every response so the page builder can call us
/// straight from the browser.
pub fn cors_headers(allow_origin: &str) -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", allow_origin.to_string()))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
        .add(("Access-Control-Expose-Headers", REQUEST_ID_HEADER))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err, _req| {
            let message = format!("Invalid JSON body: {}", err);
            log::warn!("{}", message);
            InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(ErrorBody::new(message)),
            )
            .into()
        })
}

async fn liveness() -> &'static str {
    "slabgen is up"
}

async fn health(pipeline: web::Data<DesignPipeline>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true, "model": pipeline.model() }))
}

async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

async fn design(
    pipeline: web::Data<DesignPipeline>,
    payload: web::Json<DesignPayload>,
) -> HttpResponse {
    let request_id = Uuid::new_v4().simple().to_string()[..12].to_string();
    let payload = payload.into_inner();

    log::info!(
        "[req:{}] Design request: prompt {} chars, reference {:?}, label {:?}",
        request_id,
        payload.prompt.as_deref().map_or(0, str::len),
        payload.slab_image_url,
        payload.slab_label
    );

    let mut response = match pipeline.run(&request_id, &payload).await {
        Ok(result) => {
            log::info!("[req:{}] ✅ Design generated with {}", request_id, result.model);
            HttpResponse::Ok().json(DesignResponse {
                ok: true,
                image_base64: result.image_base64,
                mime_type: result.mime_type,
                model: result.model,
                received: payload,
            })
        }
        Err(e) => e.error_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(
            actix_web::http::header::HeaderName::from_static(REQUEST_ID_HEADER),
            value,
        );
    }
    response
}
