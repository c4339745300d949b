//! Effective property computation along a request type's extension chain.
//!
//! A request type sees its own properties plus every property of its ancestors
//! whose title it (or a closer ancestor) does not already define. The walk is
//! lazy: each parent is fetched through [`AncestorLookup`] only when reached, and
//! it stops with an error as soon as an id repeats or the configured depth is
//! exceeded. Stored properties are never touched; the result is a new set.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};
use tracing::{debug, warn};

use super::domain::{Property, RequestType, RequestTypeId};
use super::repository::{RepositoryError, RequestTypeRepository};

/// Read access to the direct parent of a request type.
pub trait AncestorLookup {
    fn parent_of(&self, request_type: &RequestType) -> Result<Option<RequestType>, ResolveError>;
}

impl<R> AncestorLookup for R
where
    R: RequestTypeRepository + ?Sized,
{
    fn parent_of(&self, request_type: &RequestType) -> Result<Option<RequestType>, ResolveError> {
        let Some(parent_id) = request_type.extends else {
            return Ok(None);
        };

        self.fetch(&parent_id)?
            .map(Some)
            .ok_or(ResolveError::MissingParent {
                child: request_type.id,
                parent: parent_id,
            })
    }
}

/// Failure of a single resolution call. No partial result accompanies any variant.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("request type {name} (id: {id}) appears more than once in its extension chain")]
    CycleDetected { id: RequestTypeId, name: String },
    #[error("extension chain of {id} is deeper than the allowed {max_depth} ancestors")]
    DepthExceeded {
        id: RequestTypeId,
        max_depth: usize,
    },
    #[error("request type {child} extends {parent}, which does not exist")]
    MissingParent {
        child: RequestTypeId,
        parent: RequestTypeId,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Ordered, title-keyed view of the properties a request type exposes once its
/// ancestors are merged in.
///
/// Serializes as a plain list of properties, exactly like an unresolved
/// request type's own `properties`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectivePropertySet {
    properties: IndexMap<String, Property>,
}

impl EffectivePropertySet {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            properties: IndexMap::with_capacity(capacity),
        }
    }

    /// Keeps the first property seen for a title; returns whether it was added.
    fn insert_if_absent(&mut self, property: &Property) -> bool {
        if self.properties.contains_key(&property.title) {
            return false;
        }
        self.properties
            .insert(property.title.clone(), property.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&Property> {
        self.properties.get(title)
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn into_vec(self) -> Vec<Property> {
        self.properties.into_values().collect()
    }
}

impl Serialize for EffectivePropertySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.properties.values())
    }
}

/// Walks extension chains; holds only the depth bound, so one instance can be
/// shared by every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionResolver {
    max_depth: usize,
}

impl Default for ExtensionResolver {
    fn default() -> Self {
        Self::new(32)
    }
}

impl ExtensionResolver {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn resolve<L>(
        &self,
        request_type: &RequestType,
        lookup: &L,
    ) -> Result<EffectivePropertySet, ResolveError>
    where
        L: AncestorLookup + ?Sized,
    {
        let mut visited = HashSet::from([request_type.id]);
        let mut effective = EffectivePropertySet::with_capacity(request_type.properties.len());

        for property in &request_type.properties {
            effective.insert_if_absent(property);
        }

        let mut depth = 0usize;
        let mut current = lookup.parent_of(request_type)?;

        while let Some(ancestor) = current {
            if !visited.insert(ancestor.id) {
                warn!(
                    request_type = %request_type.id,
                    repeated = %ancestor.id,
                    "extension cycle detected"
                );
                return Err(ResolveError::CycleDetected {
                    id: ancestor.id,
                    name: ancestor.name,
                });
            }

            depth += 1;
            if depth > self.max_depth {
                return Err(self.past_bound(request_type, ancestor, visited, lookup));
            }

            let inherited = ancestor
                .properties
                .iter()
                .filter(|property| effective.insert_if_absent(property))
                .count();
            debug!(
                request_type = %request_type.id,
                ancestor = %ancestor.id,
                depth,
                inherited,
                "merged ancestor properties"
            );

            current = lookup.parent_of(&ancestor)?;
        }

        Ok(effective)
    }

    /// Keeps following `extends` without merging once the bound is passed, so a
    /// long loop still reports as a cycle. Only a chain that really ends is
    /// `DepthExceeded`.
    fn past_bound<L>(
        &self,
        request_type: &RequestType,
        ancestor: RequestType,
        mut visited: HashSet<RequestTypeId>,
        lookup: &L,
    ) -> ResolveError
    where
        L: AncestorLookup + ?Sized,
    {
        let mut current = ancestor;
        loop {
            let next = match lookup.parent_of(&current) {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(error) => return error,
            };
            if !visited.insert(next.id) {
                warn!(
                    request_type = %request_type.id,
                    repeated = %next.id,
                    "extension cycle detected beyond depth bound"
                );
                return ResolveError::CycleDetected {
                    id: next.id,
                    name: next.name,
                };
            }
            current = next;
        }

        ResolveError::DepthExceeded {
            id: request_type.id,
            max_depth: self.max_depth,
        }
    }
}
