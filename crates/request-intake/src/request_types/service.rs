use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{Property, RequestType, RequestTypeDraft, RequestTypeId};
use super::index::ExtensionIndex;
use super::repository::{RepositoryError, RequestTypeFilter, RequestTypeRepository};
use super::resolver::{ExtensionResolver, ResolveError};
use super::validation::{DefinitionReport, DefinitionValidator};
use crate::config::IntakeConfig;

/// Service composing the repository, definition validator, and extension resolver.
pub struct RequestTypeService<R> {
    repository: Arc<R>,
    validator: DefinitionValidator,
    resolver: ExtensionResolver,
}

/// A request type as exposed by a read, with either its own or its effective
/// properties.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTypeView {
    pub request_type: RequestType,
    pub properties: Vec<Property>,
    pub expanded: bool,
}

impl<R> RequestTypeService<R>
where
    R: RequestTypeRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: &IntakeConfig) -> Self {
        Self {
            repository,
            validator: DefinitionValidator::from_config(config),
            resolver: ExtensionResolver::new(config.max_extension_depth),
        }
    }

    pub fn resolver(&self) -> &ExtensionResolver {
        &self.resolver
    }

    /// Validate and store a new definition under a fresh id.
    pub fn create(&self, draft: RequestTypeDraft) -> Result<RequestType, RequestTypeServiceError> {
        self.check_definition(&draft)?;
        self.check_parent(&draft)?;

        let request_type = RequestType::from_draft(RequestTypeId::generate(), draft);
        let stored = self.repository.insert(request_type)?;
        info!(
            request_type = %stored.id,
            organization = %stored.source_organization,
            properties = stored.properties.len(),
            "request type created"
        );
        Ok(stored)
    }

    /// Replace a definition. Properties keep their ids when their title is unchanged.
    ///
    /// A new `extends` that closes a loop is stored as given; reads report it.
    pub fn update(
        &self,
        id: &RequestTypeId,
        draft: RequestTypeDraft,
    ) -> Result<RequestType, RequestTypeServiceError> {
        let existing = self
            .repository
            .fetch(id)?
            .ok_or(RequestTypeServiceError::NotFound(*id))?;

        self.check_definition(&draft)?;
        self.check_parent(&draft)?;

        let updated = RequestType::from_draft_reusing(*id, draft, &existing.properties);
        self.repository.update(updated.clone())?;
        info!(request_type = %id, "request type updated");
        Ok(updated)
    }

    /// Fetch a request type; with `expand`, inherited properties are merged in.
    pub fn get(
        &self,
        id: &RequestTypeId,
        expand: bool,
    ) -> Result<RequestTypeView, RequestTypeServiceError> {
        let request_type = self
            .repository
            .fetch(id)?
            .ok_or(RequestTypeServiceError::NotFound(*id))?;

        if !expand {
            let properties = request_type.properties.clone();
            return Ok(RequestTypeView {
                request_type,
                properties,
                expanded: false,
            });
        }

        let effective = self.resolver.resolve(&request_type, &*self.repository)?;
        Ok(RequestTypeView {
            request_type,
            properties: effective.into_vec(),
            expanded: true,
        })
    }

    pub fn list(
        &self,
        filter: &RequestTypeFilter,
    ) -> Result<Vec<RequestType>, RequestTypeServiceError> {
        Ok(self.repository.list(filter)?)
    }

    /// Ids of the request types whose `extends` points at `id`.
    pub fn extended_by(
        &self,
        id: &RequestTypeId,
    ) -> Result<Vec<RequestTypeId>, RequestTypeServiceError> {
        if self.repository.fetch(id)?.is_none() {
            return Err(RequestTypeServiceError::NotFound(*id));
        }
        let all = self.repository.list(&RequestTypeFilter::default())?;
        Ok(ExtensionIndex::build(&all).extended_by(id).to_vec())
    }

    /// Remove a request type that no other type extends.
    pub fn delete(&self, id: &RequestTypeId) -> Result<(), RequestTypeServiceError> {
        let children: Vec<RequestTypeId> = self
            .extended_by(id)?
            .into_iter()
            .filter(|child| child != id)
            .collect();
        if !children.is_empty() {
            return Err(RequestTypeServiceError::StillExtended { id: *id, children });
        }

        self.repository.delete(id)?;
        info!(request_type = %id, "request type deleted");
        Ok(())
    }

    fn check_definition(&self, draft: &RequestTypeDraft) -> Result<(), RequestTypeServiceError> {
        let report = self.validator.validate(draft);
        for issue in report.warnings() {
            warn!(path = %issue.path, rule = ?issue.rule, "{}", issue.message);
        }
        if report.is_valid() {
            Ok(())
        } else {
            Err(RequestTypeServiceError::InvalidDefinition(report))
        }
    }

    fn check_parent(&self, draft: &RequestTypeDraft) -> Result<(), RequestTypeServiceError> {
        if let Some(parent) = draft.extends {
            if self.repository.fetch(&parent)?.is_none() {
                return Err(RequestTypeServiceError::UnknownParent(parent));
            }
        }
        Ok(())
    }
}

/// Error raised by the request type service.
#[derive(Debug, thiserror::Error)]
pub enum RequestTypeServiceError {
    #[error("request type {0} not found")]
    NotFound(RequestTypeId),
    #[error("request type extends unknown request type {0}")]
    UnknownParent(RequestTypeId),
    #[error("invalid request type definition: {}", .0.summary())]
    InvalidDefinition(DefinitionReport),
    #[error("request type {id} is still extended by {} other request type(s)", .children.len())]
    StillExtended {
        id: RequestTypeId,
        children: Vec<RequestTypeId>,
    },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
