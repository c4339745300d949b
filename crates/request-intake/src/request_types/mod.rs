//! Request type definitions, their properties, and resolution of inherited
//! properties along `extends` chains.

pub mod domain;
pub mod index;
pub mod naming;
pub mod projection;
pub mod repository;
pub mod resolver;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    Availability, Property, PropertyDraft, PropertyFormat, PropertyId, PropertySchema,
    PropertyType, RequestType, RequestTypeDraft, RequestTypeId,
};
pub use index::ExtensionIndex;
pub use naming::derive_name;
pub use projection::{render_request_type, strip_unwritable, Operation};
pub use repository::{RepositoryError, RequestTypeFilter, RequestTypeRepository};
pub use resolver::{AncestorLookup, EffectivePropertySet, ExtensionResolver, ResolveError};
pub use router::{parse_flag, request_type_router};
pub use service::{RequestTypeService, RequestTypeServiceError, RequestTypeView};
pub use validation::{
    DefinitionIssue, DefinitionReport, DefinitionRule, DefinitionValidator, Severity,
};
