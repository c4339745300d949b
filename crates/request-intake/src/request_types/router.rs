use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::domain::{RequestTypeDraft, RequestTypeId};
use super::projection::{render_request_type, strip_unwritable};
use super::repository::{RepositoryError, RequestTypeFilter, RequestTypeRepository};
use super::resolver::ResolveError;
use super::service::{RequestTypeService, RequestTypeServiceError};

/// Router builder exposing the request type catalog over HTTP.
pub fn request_type_router<R>(service: Arc<RequestTypeService<R>>) -> Router
where
    R: RequestTypeRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/request_types",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/api/v1/request_types/:request_type_id",
            get(read_handler::<R>)
                .put(update_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .route(
            "/api/v1/request_types/:request_type_id/extended_by",
            get(extended_by_handler::<R>),
        )
        .with_state(service)
}

/// Query string of a single read.
#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    #[serde(default)]
    pub extend: Option<String>,
}

impl ReadQuery {
    pub fn expand(&self) -> bool {
        self.extend.as_deref().map_or(false, parse_flag)
    }
}

/// Boolean-like query flag: `true`, `1`, `yes` or `on`, in any case.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<RequestTypeService<R>>>,
    axum::Json(payload): axum::Json<Value>,
) -> Response
where
    R: RequestTypeRepository + 'static,
{
    let draft = match parse_draft(payload) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match service.create(draft) {
        Ok(request_type) => {
            let body = render_request_type(&request_type, &request_type.properties);
            (StatusCode::CREATED, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<RequestTypeService<R>>>,
    Query(filter): Query<RequestTypeFilter>,
) -> Response
where
    R: RequestTypeRepository + 'static,
{
    match service.list(&filter) {
        Ok(request_types) => {
            let body: Vec<Value> = request_types
                .iter()
                .map(|request_type| render_request_type(request_type, &request_type.properties))
                .collect();
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn read_handler<R>(
    State(service): State<Arc<RequestTypeService<R>>>,
    Path(request_type_id): Path<String>,
    Query(query): Query<ReadQuery>,
) -> Response
where
    R: RequestTypeRepository + 'static,
{
    let id = match parse_id(&request_type_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.get(&id, query.expand()) {
        Ok(view) => {
            let body = render_request_type(&view.request_type, &view.properties);
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<RequestTypeService<R>>>,
    Path(request_type_id): Path<String>,
    axum::Json(payload): axum::Json<Value>,
) -> Response
where
    R: RequestTypeRepository + 'static,
{
    let id = match parse_id(&request_type_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let draft = match parse_draft(payload) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match service.update(&id, draft) {
        Ok(request_type) => {
            let body = render_request_type(&request_type, &request_type.properties);
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<RequestTypeService<R>>>,
    Path(request_type_id): Path<String>,
) -> Response
where
    R: RequestTypeRepository + 'static,
{
    let id = match parse_id(&request_type_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.delete(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn extended_by_handler<R>(
    State(service): State<Arc<RequestTypeService<R>>>,
    Path(request_type_id): Path<String>,
) -> Response
where
    R: RequestTypeRepository + 'static,
{
    let id = match parse_id(&request_type_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.extended_by(&id) {
        Ok(children) => {
            let payload = json!({
                "id": id,
                "extendedBy": children,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn parse_id(raw: &str) -> Result<RequestTypeId, Response> {
    raw.parse::<RequestTypeId>().map_err(|_| {
        let payload = json!({
            "error": format!("'{raw}' is not a valid request type id"),
        });
        (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
    })
}

fn parse_draft(mut payload: Value) -> Result<RequestTypeDraft, Response> {
    strip_unwritable(&mut payload);
    serde_json::from_value(payload).map_err(|error| {
        let payload = json!({
            "error": format!("malformed request type: {error}"),
        });
        (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
    })
}

pub(crate) fn error_response(error: RequestTypeServiceError) -> Response {
    let (status, payload) = match &error {
        RequestTypeServiceError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string(), "id": id }),
        ),
        RequestTypeServiceError::UnknownParent(parent) => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string(), "extends": parent }),
        ),
        RequestTypeServiceError::InvalidDefinition(report) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": error.to_string(), "issues": report.issues() }),
        ),
        RequestTypeServiceError::StillExtended { id, children } => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "id": id, "extendedBy": children }),
        ),
        RequestTypeServiceError::Resolve(ResolveError::CycleDetected { id, name }) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "id": id, "name": name }),
        ),
        RequestTypeServiceError::Resolve(ResolveError::DepthExceeded { id, max_depth }) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "id": id, "maxDepth": max_depth }),
        ),
        RequestTypeServiceError::Resolve(ResolveError::MissingParent { child, parent }) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "id": child, "extends": parent }),
        ),
        RequestTypeServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "request type already exists" }),
        ),
        RequestTypeServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string() }),
        ),
        RequestTypeServiceError::Resolve(ResolveError::Repository(_))
        | RequestTypeServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };
    (status, axum::Json(payload)).into_response()
}
