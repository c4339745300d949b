use crate::infra::{preview, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use request_intake::catalog::{Catalog, CatalogEntry};
use request_intake::error::AppError;
use request_intake::request_types::{
    request_type_router, RequestTypeId, RequestTypeRepository, RequestTypeService,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Body of a stateless resolution preview.
#[derive(Debug, Deserialize)]
pub(crate) struct ResolvePreviewRequest {
    pub(crate) catalog: Vec<CatalogEntry>,
    pub(crate) id: RequestTypeId,
    #[serde(default = "expand_by_default")]
    pub(crate) expand: bool,
}

fn expand_by_default() -> bool {
    true
}

pub(crate) fn with_request_type_routes<R>(service: Arc<RequestTypeService<R>>) -> axum::Router
where
    R: RequestTypeRepository + 'static,
{
    request_type_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/request_types/resolve",
            axum::routing::post(resolve_preview_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn resolve_preview_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ResolvePreviewRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ResolvePreviewRequest {
        catalog,
        id,
        expand,
    } = payload;

    let catalog = Catalog::new(catalog)?;
    tracing::debug!(entries = catalog.len(), request_type = %id, "resolution preview");
    let rendered = preview(catalog, &id, expand, &state.intake)?;
    Ok(Json(rendered))
}
