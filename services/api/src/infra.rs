use metrics_exporter_prometheus::PrometheusHandle;
use request_intake::catalog::Catalog;
use request_intake::config::IntakeConfig;
use request_intake::error::AppError;
use request_intake::request_types::{
    render_request_type, RepositoryError, RequestType, RequestTypeFilter, RequestTypeId,
    RequestTypeRepository, RequestTypeService,
};
use serde_json::Value;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) intake: IntakeConfig,
}

/// Process-local store. Listing follows insertion order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRequestTypeRepository {
    records: Arc<Mutex<Vec<RequestType>>>,
}

impl InMemoryRequestTypeRepository {
    pub(crate) fn seeded(catalog: Catalog, intake: &IntakeConfig) -> Result<Self, AppError> {
        let repository = Self::default();
        catalog.load_into(&repository, intake)?;
        Ok(repository)
    }
}

impl RequestTypeRepository for InMemoryRequestTypeRepository {
    fn insert(&self, request_type: RequestType) -> Result<RequestType, RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        if guard.iter().any(|record| record.id == request_type.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(request_type.clone());
        Ok(request_type)
    }

    fn update(&self, request_type: RequestType) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        match guard.iter_mut().find(|record| record.id == request_type.id) {
            Some(record) => {
                *record = request_type;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &RequestTypeId) -> Result<Option<RequestType>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|record| record.id == *id).cloned())
    }

    fn list(&self, filter: &RequestTypeFilter) -> Result<Vec<RequestType>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn delete(&self, id: &RequestTypeId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        let before = guard.len();
        guard.retain(|record| record.id != *id);
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("request type store lock poisoned".to_string())
}

/// Read one catalog entry the way `GET /api/v1/request_types/:id` would render it.
pub(crate) fn preview(
    catalog: Catalog,
    id: &RequestTypeId,
    expand: bool,
    intake: &IntakeConfig,
) -> Result<Value, AppError> {
    let repository = Arc::new(InMemoryRequestTypeRepository::seeded(catalog, intake)?);
    let service = RequestTypeService::new(repository, intake);
    let view = service.get(id, expand)?;
    Ok(render_request_type(&view.request_type, &view.properties))
}
