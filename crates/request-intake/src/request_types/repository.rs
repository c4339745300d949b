use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{RequestType, RequestTypeId};

/// Storage abstraction so the service and resolver can be exercised in isolation.
pub trait RequestTypeRepository: Send + Sync {
    fn insert(&self, request_type: RequestType) -> Result<RequestType, RepositoryError>;
    fn update(&self, request_type: RequestType) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RequestTypeId) -> Result<Option<RequestType>, RepositoryError>;
    fn list(&self, filter: &RequestTypeFilter) -> Result<Vec<RequestType>, RepositoryError>;
    fn delete(&self, id: &RequestTypeId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Exact-match listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RequestTypeFilter {
    #[serde(default)]
    pub source_organization: Option<String>,
    #[serde(default)]
    pub available_at: Option<DateTime<Utc>>,
}

impl RequestTypeFilter {
    pub fn matches(&self, request_type: &RequestType) -> bool {
        let organization = self
            .source_organization
            .as_deref()
            .map_or(true, |wanted| request_type.source_organization == wanted);
        let available = self
            .available_at
            .map_or(true, |instant| request_type.is_available_at(instant));
        organization && available
    }
}
