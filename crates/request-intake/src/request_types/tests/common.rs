use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::IntakeConfig;
use crate::request_types::domain::{
    Availability, PropertyDraft, PropertyFormat, PropertySchema, PropertyType, RequestType,
    RequestTypeDraft, RequestTypeId,
};
use crate::request_types::repository::{
    RepositoryError, RequestTypeFilter, RequestTypeRepository,
};
use crate::request_types::{request_type_router, RequestTypeService};

pub(super) fn property(title: &str, property_type: PropertyType) -> PropertyDraft {
    PropertyDraft::new(title, PropertySchema::new(property_type))
}

pub(super) fn draft(name: &str, properties: Vec<PropertyDraft>) -> RequestTypeDraft {
    RequestTypeDraft {
        source_organization: "0000".to_string(),
        name: name.to_string(),
        description: None,
        properties,
        extends: None,
        availability: Availability::default(),
    }
}

pub(super) fn request_type(
    name: &str,
    properties: Vec<PropertyDraft>,
    extends: Option<RequestTypeId>,
) -> RequestType {
    let mut definition = draft(name, properties);
    definition.extends = extends;
    RequestType::from_draft(RequestTypeId::generate(), definition)
}

/// National "Verhuizen" definition with Datum, Adress and Wie.
pub(super) fn national_move() -> RequestType {
    let mut definition = draft(
        "Verhuizen",
        vec![
            PropertyDraft::new(
                "Datum",
                PropertySchema::new(PropertyType::String)
                    .with_format(PropertyFormat::Date)
                    .with_description("Waneer gaat u verhuizen?"),
            ),
            PropertyDraft::new(
                "Adress",
                PropertySchema::new(PropertyType::String)
                    .with_format(PropertyFormat::Bag)
                    .with_description("Waar gaat u heen verhuizen?")
                    .required(),
            ),
            PropertyDraft::new(
                "Wie",
                PropertySchema::new(PropertyType::Array)
                    .with_format(PropertyFormat::Bsn)
                    .with_description("Wie gaan er verhuizen?")
                    .required(),
            ),
        ],
    );
    definition.description = Some("Het doorgeven van een verhuizing aan een gemeente".to_string());
    RequestType::from_draft(RequestTypeId::generate(), definition)
}

/// National marriage definition with seven properties, none titled "Order".
pub(super) fn national_marriage() -> RequestType {
    let bsn = |title: &str| {
        PropertyDraft::new(
            title,
            PropertySchema::new(PropertyType::String)
                .with_format(PropertyFormat::Bsn)
                .required(),
        )
    };
    request_type(
        "Huwelijk / Partnerschap",
        vec![
            PropertyDraft::new(
                "Melding",
                PropertySchema::new(PropertyType::String).with_format(PropertyFormat::Uri),
            ),
            PropertyDraft::new(
                "Datum",
                PropertySchema::new(PropertyType::String).with_format(PropertyFormat::Date),
            ),
            property("Type", PropertyType::String),
            bsn("Partner 1"),
            bsn("Partner 2"),
            PropertyDraft::new(
                "Getuigen van partner 1",
                PropertySchema::new(PropertyType::Array).with_format(PropertyFormat::Bsn),
            ),
            PropertyDraft::new(
                "Getuigen2",
                PropertySchema::new(PropertyType::Array).with_format(PropertyFormat::Bsn),
            ),
        ],
        None,
    )
}

pub(super) fn intake_config() -> IntakeConfig {
    IntakeConfig::default()
}

pub(super) fn repository_with(request_types: &[RequestType]) -> Arc<MemoryRepository> {
    let repository = Arc::new(MemoryRepository::default());
    for request_type in request_types {
        repository
            .insert(request_type.clone())
            .expect("fixture inserts");
    }
    repository
}

pub(super) fn build_service(
    request_types: &[RequestType],
) -> (RequestTypeService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = repository_with(request_types);
    let service = RequestTypeService::new(repository.clone(), &intake_config());
    (service, repository)
}

pub(super) fn router_with(request_types: &[RequestType]) -> (axum::Router, Arc<MemoryRepository>) {
    let (service, repository) = build_service(request_types);
    (request_type_router(Arc::new(service)), repository)
}

/// Insertion-ordered store so listings are deterministic.
#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<Vec<RequestType>>,
    fetches: AtomicUsize,
}

impl MemoryRepository {
    pub(super) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(super) fn stored(&self, id: &RequestTypeId) -> RequestType {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .iter()
            .find(|record| record.id == *id)
            .cloned()
            .expect("record stored")
    }
}

impl RequestTypeRepository for MemoryRepository {
    fn insert(&self, request_type: RequestType) -> Result<RequestType, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|record| record.id == request_type.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(request_type.clone());
        Ok(request_type)
    }

    fn update(&self, request_type: RequestType) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.iter_mut().find(|record| record.id == request_type.id) {
            Some(record) => {
                *record = request_type;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &RequestTypeId) -> Result<Option<RequestType>, RepositoryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|record| record.id == *id).cloned())
    }

    fn list(&self, filter: &RequestTypeFilter) -> Result<Vec<RequestType>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn delete(&self, id: &RequestTypeId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let before = guard.len();
        guard.retain(|record| record.id != *id);
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}

pub(super) struct UnavailableRepository;

impl RequestTypeRepository for UnavailableRepository {
    fn insert(&self, _request_type: RequestType) -> Result<RequestType, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _request_type: RequestType) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RequestTypeId) -> Result<Option<RequestType>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &RequestTypeFilter) -> Result<Vec<RequestType>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &RequestTypeId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
