use actix_web::http::Method;
use actix_web::{web, HttpResponse, HttpResponseBuilder, Responder};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gemini::RecommendError;
use crate::geo::EnvLocator;
use crate::images::PexelsClient;
use crate::models::{GeoPoint, PlaceFilters};
use crate::suggest::SuggestionEngine;

/// Engine shape the server runs with in production.
pub type AppEngine = SuggestionEngine<EnvLocator, PexelsClient>;

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(flatten)]
    pub filters: PlaceFilters,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RecommendationRequest {
    fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                let point = GeoPoint {
                    latitude,
                    longitude,
                };
                point.is_finite().then_some(point)
            }
            _ => None,
        }
    }
}

// The endpoint is called straight from browsers: any origin, POST + preflight.
fn with_cors(mut builder: HttpResponseBuilder) -> HttpResponseBuilder {
    builder
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .insert_header(("Access-Control-Allow-Headers", "Content-Type"));
    builder
}

fn json_response(builder: HttpResponseBuilder, body: impl serde::Serialize) -> HttpResponse {
    with_cors(builder).json(body)
}

pub async fn recommendations(
    engine: web::Data<AppEngine>,
    payload: web::Json<Value>,
) -> impl Responder {
    let request: RecommendationRequest = match serde_json::from_value(payload.into_inner()) {
        Ok(request) => request,
        Err(err) => {
            return json_response(
                HttpResponse::BadRequest(),
                json!({ "error": format!("Requisição inválida: {}", err) }),
            );
        }
    };

    let location = match request.location() {
        Some(location) if request.filters.required().is_some() => location,
        _ => {
            return json_response(
                HttpResponse::BadRequest(),
                json!({ "error": "Filtros incompletos" }),
            );
        }
    };

    match engine.recommendations(&request.filters, location).await {
        Ok(suggestion) => json_response(HttpResponse::Ok(), suggestion),
        Err(RecommendError::InvalidRequest) => json_response(
            HttpResponse::BadRequest(),
            json!({ "error": "Filtros incompletos" }),
        ),
        Err(err) => {
            log::error!("falha ao gerar recomendações: {}", err);
            json_response(
                HttpResponse::InternalServerError(),
                json!({ "error": err.to_string() }),
            )
        }
    }
}

pub async fn preflight() -> impl Responder {
    with_cors(HttpResponse::Ok()).finish()
}

pub async fn method_not_allowed() -> impl Responder {
    json_response(
        HttpResponse::MethodNotAllowed(),
        json!({ "error": "Method not allowed" }),
    )
}

pub async fn health() -> impl Responder {
    json_response(
        HttpResponse::Ok(),
        json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }),
    )
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/recommendations")
            .route(web::post().to(recommendations))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::route().to(method_not_allowed)),
    )
    .route("/health", web::get().to(health));
}
