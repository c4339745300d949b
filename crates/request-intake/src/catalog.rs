//! JSON catalogs of request type definitions with fixed ids.
//!
//! A catalog is a JSON array; every entry is a request type draft plus its `id`:
//!
//! ```json
//! [
//!   { "id": "2bfb3cea-b5b5-459c-b3e0-e1100089a11a", "sourceOrganization": "0000",
//!     "name": "Verhuizen", "properties": [{ "title": "Datum", "type": "string" }] },
//!   { "id": "939f5d60-e5bd-40b2-9ccd-117cea8b3cbe", "sourceOrganization": "001709124",
//!     "name": "Verhuizen", "extends": "2bfb3cea-b5b5-459c-b3e0-e1100089a11a" }
//! ]
//! ```

use std::collections::HashSet;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::config::IntakeConfig;
use crate::request_types::domain::{RequestType, RequestTypeDraft, RequestTypeId};
use crate::request_types::repository::{RepositoryError, RequestTypeRepository};
use crate::request_types::validation::{DefinitionReport, DefinitionValidator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: RequestTypeId,
    #[serde(flatten)]
    pub definition: RequestTypeDraft,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("request type {0} is defined more than once in the catalog")]
    DuplicateId(RequestTypeId),
    #[error("catalog entry {id} is not a valid definition: {}", .report.summary())]
    InvalidDefinition {
        id: RequestTypeId,
        report: DefinitionReport,
    },
    #[error("catalog could not be stored: {0}")]
    Repository(#[from] RepositoryError),
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = entries.iter().find(|entry| !seen.insert(entry.id)) {
            return Err(CatalogError::DuplicateId(duplicate.id));
        }
        Ok(Self { entries })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_reader(reader)?;
        Self::new(entries)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_value(value)?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_request_types(self) -> Vec<RequestType> {
        self.entries
            .into_iter()
            .map(|entry| RequestType::from_draft(entry.id, entry.definition))
            .collect()
    }

    /// Run every entry through the definition validator. `extends` targets are
    /// not checked; loops and dangling parents surface when a type is resolved.
    pub fn validate(&self, validator: &DefinitionValidator) -> Result<(), CatalogError> {
        for entry in &self.entries {
            let report = validator.validate(&entry.definition);
            for issue in report.warnings() {
                tracing::warn!(request_type = %entry.id, path = %issue.path, "{}", issue.message);
            }
            if !report.is_valid() {
                return Err(CatalogError::InvalidDefinition {
                    id: entry.id,
                    report,
                });
            }
        }
        Ok(())
    }

    /// Validate, then insert every entry. Nothing is inserted when an entry is
    /// invalid; stops at the first repository failure.
    pub fn load_into<R>(self, repository: &R, config: &IntakeConfig) -> Result<usize, CatalogError>
    where
        R: RequestTypeRepository + ?Sized,
    {
        self.validate(&DefinitionValidator::from_config(config))?;

        let mut loaded = 0;
        for request_type in self.into_request_types() {
            repository.insert(request_type)?;
            loaded += 1;
        }
        tracing::debug!(loaded, "catalog loaded into repository");
        Ok(loaded)
    }
}
