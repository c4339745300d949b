use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::request_types::{ResolveError, RequestTypeServiceError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Catalog(CatalogError),
    Resolve(ResolveError),
    Service(RequestTypeServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Resolve(err) => write!(f, "resolution error: {}", err),
            AppError::Service(err) => write!(f, "request type error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Resolve(err) => Some(err),
            AppError::Service(err) => Some(err),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Catalog(CatalogError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Catalog(CatalogError::InvalidDefinition { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Catalog(_) => StatusCode::BAD_REQUEST,
            AppError::Resolve(ResolveError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Resolve(_) => StatusCode::CONFLICT,
            AppError::Service(RequestTypeServiceError::NotFound(_))
            | AppError::Service(RequestTypeServiceError::UnknownParent(_)) => StatusCode::NOT_FOUND,
            AppError::Service(RequestTypeServiceError::InvalidDefinition(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Service(RequestTypeServiceError::StillExtended { .. }) => {
                StatusCode::CONFLICT
            }
            AppError::Service(RequestTypeServiceError::Resolve(inner)) => {
                if matches!(inner, ResolveError::Repository(_)) {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    StatusCode::CONFLICT
                }
            }
            AppError::Service(RequestTypeServiceError::Repository(_))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ResolveError> for AppError {
    fn from(value: ResolveError) -> Self {
        Self::Resolve(value)
    }
}

impl From<RequestTypeServiceError> for AppError {
    fn from(value: RequestTypeServiceError) -> Self {
        Self::Service(value)
    }
}
