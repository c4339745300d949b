use super::common::*;
use crate::request_types::domain::{PropertyType, RequestTypeId};
use crate::request_types::repository::{RepositoryError, RequestTypeFilter, RequestTypeRepository};
use crate::request_types::resolver::ResolveError;
use crate::request_types::validation::DefinitionRule;
use crate::request_types::{RequestTypeService, RequestTypeServiceError};
use std::sync::Arc;

#[test]
fn create_assigns_ids_and_owner_to_every_property() {
    let (service, repository) = build_service(&[]);

    let created = service
        .create(draft(
            "Verhuizen",
            vec![
                property("Datum", PropertyType::String),
                property("Wie", PropertyType::Array),
            ],
        ))
        .expect("valid definition");

    assert_eq!(created.properties.len(), 2);
    assert!(created
        .properties
        .iter()
        .all(|property| property.request_type == created.id));
    assert_eq!(repository.stored(&created.id), created);
}

#[test]
fn create_rejects_duplicate_property_titles() {
    let (service, repository) = build_service(&[]);

    let result = service.create(draft(
        "Verhuizen",
        vec![
            property("Datum", PropertyType::String),
            property("Datum", PropertyType::Integer),
        ],
    ));

    match result {
        Err(RequestTypeServiceError::InvalidDefinition(report)) => {
            assert!(report.has_rule(DefinitionRule::DuplicateTitle));
        }
        other => panic!("expected invalid definition, got {other:?}"),
    }
    let stored = repository
        .list(&RequestTypeFilter::default())
        .expect("list");
    assert!(stored.is_empty());
}

#[test]
fn create_rejects_unknown_parent() {
    let (service, _) = build_service(&[]);
    let missing = RequestTypeId::generate();
    let mut definition = draft("Verhuizen", Vec::new());
    definition.extends = Some(missing);

    match service.create(definition) {
        Err(RequestTypeServiceError::UnknownParent(parent)) => assert_eq!(parent, missing),
        other => panic!("expected unknown parent, got {other:?}"),
    }
}

#[test]
fn get_without_expand_returns_only_own_properties() {
    let national = national_move();
    let child = request_type(
        "Verhuizen",
        vec![property("Sleutels", PropertyType::Boolean)],
        Some(national.id),
    );
    let (service, repository) = build_service(&[national, child.clone()]);
    let fetches_before = repository.fetch_count();

    let view = service.get(&child.id, false).expect("found");

    assert!(!view.expanded);
    assert_eq!(view.properties, child.properties);
    assert_eq!(repository.fetch_count(), fetches_before + 1);
}

#[test]
fn get_with_expand_merges_ancestors() {
    let national = national_move();
    let child = request_type("Verhuizen", Vec::new(), Some(national.id));
    let (service, _) = build_service(&[national.clone(), child.clone()]);

    let view = service.get(&child.id, true).expect("resolves");

    assert!(view.expanded);
    assert_eq!(view.request_type.id, child.id);
    assert_eq!(view.properties, national.properties);
}

#[test]
fn get_reports_cycles_introduced_by_update() {
    let national = national_move();
    let child = request_type("Verhuizen", Vec::new(), Some(national.id));
    let (service, _) = build_service(&[national.clone(), child.clone()]);

    let mut looped = draft("Verhuizen", vec![property("Datum", PropertyType::String)]);
    looped.extends = Some(child.id);
    service
        .update(&national.id, looped)
        .expect("cycles are accepted on write");

    match service.get(&child.id, true) {
        Err(RequestTypeServiceError::Resolve(ResolveError::CycleDetected { id, .. })) => {
            assert_eq!(id, child.id);
        }
        other => panic!("expected cycle, got {other:?}"),
    }
    assert!(service.get(&child.id, false).is_ok());
}

#[test]
fn get_missing_request_type_is_not_found() {
    let (service, _) = build_service(&[]);
    let missing = RequestTypeId::generate();

    match service.get(&missing, true) {
        Err(RequestTypeServiceError::NotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn update_keeps_property_ids_for_unchanged_titles() {
    let national = national_move();
    let datum_id = national.property("Datum").expect("datum").id;
    let (service, _) = build_service(&[national.clone()]);

    let updated = service
        .update(
            &national.id,
            draft(
                "Verhuizen",
                vec![
                    property("Datum", PropertyType::String),
                    property("Reden", PropertyType::String),
                ],
            ),
        )
        .expect("update succeeds");

    assert_eq!(updated.property("Datum").expect("kept").id, datum_id);
    assert!(updated.property("Adress").is_none());
    assert_eq!(updated.properties.len(), 2);
}

#[test]
fn update_missing_request_type_is_not_found() {
    let (service, _) = build_service(&[]);
    let missing = RequestTypeId::generate();

    let result = service.update(&missing, draft("Verhuizen", Vec::new()));
    assert!(matches!(result, Err(RequestTypeServiceError::NotFound(_))));
}

#[test]
fn extended_by_lists_direct_children_only() {
    let national = national_move();
    let den_bosch = request_type("Verhuizen", Vec::new(), Some(national.id));
    let eindhoven = request_type("Verhuizen", Vec::new(), Some(national.id));
    let grandchild = request_type("Verhuizen", Vec::new(), Some(den_bosch.id));
    let (service, _) = build_service(&[
        national.clone(),
        den_bosch.clone(),
        eindhoven.clone(),
        grandchild,
    ]);

    let children = service.extended_by(&national.id).expect("found");
    assert_eq!(children, vec![den_bosch.id, eindhoven.id]);
}

#[test]
fn delete_refuses_while_extended() {
    let national = national_move();
    let child = request_type("Verhuizen", Vec::new(), Some(national.id));
    let (service, repository) = build_service(&[national.clone(), child.clone()]);

    match service.delete(&national.id) {
        Err(RequestTypeServiceError::StillExtended { id, children }) => {
            assert_eq!(id, national.id);
            assert_eq!(children, vec![child.id]);
        }
        other => panic!("expected still extended, got {other:?}"),
    }

    service.delete(&child.id).expect("leaf deletes");
    service.delete(&national.id).expect("parent deletes once free");
    let remaining = repository
        .list(&RequestTypeFilter::default())
        .expect("list");
    assert!(remaining.is_empty());
}

#[test]
fn delete_allows_self_extending_type() {
    let mut looped = national_move();
    looped.extends = Some(looped.id);
    let (service, _) = build_service(&[looped.clone()]);

    service.delete(&looped.id).expect("self reference does not block");
}

#[test]
fn list_filters_by_organization() {
    let national = national_move();
    let mut den_bosch = request_type("Verhuizen", Vec::new(), Some(national.id));
    den_bosch.source_organization = "001709124".to_string();
    let (service, _) = build_service(&[national, den_bosch.clone()]);

    let filter = RequestTypeFilter {
        source_organization: Some("001709124".to_string()),
        ..RequestTypeFilter::default()
    };
    let listed = service.list(&filter).expect("list");
    assert_eq!(listed, vec![den_bosch]);
}

#[test]
fn repository_outage_surfaces_as_repository_error() {
    let service = RequestTypeService::new(Arc::new(UnavailableRepository), &intake_config());

    let result = service.get(&RequestTypeId::generate(), false);
    assert!(matches!(
        result,
        Err(RequestTypeServiceError::Repository(
            RepositoryError::Unavailable(_)
        ))
    ));
}
