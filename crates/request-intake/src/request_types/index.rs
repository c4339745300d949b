use std::collections::HashMap;

use super::domain::{RequestType, RequestTypeId};

/// Inverse of the `extends` relation, computed on demand from stored types.
#[derive(Debug, Clone, Default)]
pub struct ExtensionIndex {
    children: HashMap<RequestTypeId, Vec<RequestTypeId>>,
}

impl ExtensionIndex {
    pub fn build<'a, I>(request_types: I) -> Self
    where
        I: IntoIterator<Item = &'a RequestType>,
    {
        let mut children: HashMap<RequestTypeId, Vec<RequestTypeId>> = HashMap::new();
        for request_type in request_types {
            if let Some(parent) = request_type.extends {
                children.entry(parent).or_default().push(request_type.id);
            }
        }
        Self { children }
    }

    /// Direct children of `id`, in the order they were indexed.
    pub fn extended_by(&self, id: &RequestTypeId) -> &[RequestTypeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_extended(&self, id: &RequestTypeId) -> bool {
        !self.extended_by(id).is_empty()
    }
}
