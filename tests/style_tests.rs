mod common;

use common::sample_document;
use openapi_slicer::filter::{FilterCriteria, Predicate};
use openapi_slicer::style::apply_style;
use openapi_slicer::subset::build_subset;
use openapi_slicer::{slice, Document, ErrorKind, Style, StyleOptions};
use serde_json::Value;

fn subset_all() -> Document {
    let doc = sample_document();
    let predicate =
        Predicate::build(&doc, &FilterCriteria::from_operation_ids("*"), "v1.0").expect("predicate");
    build_subset(&doc, &predicate, "v1.0").expect("subset")
}

fn operation_ids(doc: &Document) -> Vec<String> {
    doc.paths
        .values()
        .flat_map(|item| item.operations())
        .filter_map(|(_, op)| op.operation_id.clone())
        .collect()
}

#[test]
fn test_plain_is_a_no_op() {
    let subset = subset_all();
    let styled = apply_style(&subset, Style::Plain, &StyleOptions::default()).expect("styled");
    assert_eq!(styled, subset);
}

#[test]
fn test_styling_never_mutates_its_input() {
    let subset = subset_all();
    let before = subset.clone();
    let _ = apply_style(&subset, Style::PowerShell, &StyleOptions::default()).expect("styled");
    assert_eq!(subset, before);
}

#[test]
fn test_powershell_operation_id_synthesis() {
    let styled =
        apply_style(&subset_all(), Style::PowerShell, &StyleOptions::default()).expect("styled");
    let ids = operation_ids(&styled);
    for expected in [
        "administrativeUnits_restore",
        "users.user_UpdateUser",
        "applications.application_SetLogo",
        "applications_GetCreatedOnBehalfOfByRef",
        "users_ListUser",
        "users.user_GetUser",
    ] {
        assert!(ids.iter().any(|id| id == expected), "missing id {expected}");
    }
}

#[test]
fn test_powershell_removes_root_path_powerplatform_keeps_it() {
    let subset = subset_all();
    assert!(subset.paths.contains_key("/"));

    let powershell =
        apply_style(&subset, Style::PowerShell, &StyleOptions::default()).expect("styled");
    assert!(!powershell.paths.contains_key("/"));

    let powerplatform =
        apply_style(&subset, Style::PowerPlatform, &StyleOptions::default()).expect("styled");
    assert!(powerplatform.paths.contains_key("/"));
}

#[test]
fn test_powershell_version_prefix() {
    // "v1.0" already matches the digit.digit shape and stays untouched.
    let styled =
        apply_style(&subset_all(), Style::PowerShell, &StyleOptions::default()).expect("styled");
    assert_eq!(styled.info.version, "v1.0");

    let mut beta = subset_all();
    beta.info.version = "beta".to_string();
    let styled = apply_style(&beta, Style::PowerShell, &StyleOptions::default()).expect("styled");
    assert_eq!(styled.info.version, "v1.0-beta");
}

#[test]
fn test_composition_flattening_document_wide() {
    for style in [Style::PowerShell, Style::PowerPlatform] {
        let styled = apply_style(&subset_all(), style, &StyleOptions::default()).expect("styled");
        let schemas = serde_json::to_value(&styled.components.schemas).expect("schemas");
        assert_no_composition(&schemas);

        let user = &styled.components.schemas["microsoft.graph.user"];
        let display_name = &user["allOf"][1]["properties"]["displayName"];
        assert_eq!(display_name["type"], "string");
        assert_eq!(display_name["nullable"], true);
    }
}

fn assert_no_composition(value: &Value) {
    match value {
        Value::Object(obj) => {
            assert!(obj.get("anyOf").is_none(), "anyOf left in {obj:?}");
            assert!(obj.get("oneOf").is_none(), "oneOf left in {obj:?}");
            for nested in obj.values() {
                assert_no_composition(nested);
            }
        }
        Value::Array(items) => {
            for nested in items {
                assert_no_composition(nested);
            }
        }
        _ => {}
    }
}

#[test]
fn test_powerplatform_leaves_operation_ids_and_version_alone() {
    let subset = subset_all();
    let styled =
        apply_style(&subset, Style::PowerPlatform, &StyleOptions::default()).expect("styled");
    assert_eq!(operation_ids(&styled), operation_ids(&subset));
    assert_eq!(styled.info.version, subset.info.version);
}

#[test]
fn test_powershell_pound_token_fix() {
    let styled =
        apply_style(&subset_all(), Style::PowerShell, &StyleOptions::default()).expect("styled");
    let description = styled.components.schemas["microsoft.graph.workbookRangeView"]["properties"]
        ["cellAddresses"]["description"]
        .as_str()
        .expect("description");
    assert!(description.contains("<#/>"));
    assert!(!description.contains("<#>"));
}

#[test]
fn test_geautocomplete_keeps_content_by_default() {
    let styled = apply_style(&subset_all(), Style::GeAutocomplete, &StyleOptions::default())
        .expect("styled");
    let get_users = styled.paths["/users"].get.as_ref().expect("operation");
    assert!(get_users.responses["200"].get("content").is_some());
    assert!(styled
        .components
        .schemas
        .contains_key("microsoft.graph.user"));
}

#[test]
fn test_geautocomplete_without_request_bodies_strips_content() {
    let options = StyleOptions {
        include_request_body: false,
    };
    let styled = apply_style(&subset_all(), Style::GeAutocomplete, &options).expect("styled");

    for (path, item) in &styled.paths {
        for (_, operation) in item.operations() {
            if let Some(body) = &operation.request_body {
                assert!(body.get("content").is_none(), "request content in {path}");
            }
            for response in operation.responses.values() {
                assert!(
                    response.get("content").is_none(),
                    "response content in {path}"
                );
            }
        }
    }
    // Schemas that were reachable only through stripped bodies are pruned.
    assert!(!styled.components.schemas.contains_key("microsoft.graph.user"));
    assert!(!styled
        .components
        .schemas
        .contains_key("microsoft.graph.userCollectionResponse"));
    // Parameter components are still referenced and stay.
    assert!(styled.components.parameters.contains_key("top"));
}

#[test]
fn test_styling_that_empties_the_document_is_not_found() {
    let doc = sample_document();
    let styled = slice(
        &doc,
        &FilterCriteria::from_operation_ids("root_Get"),
        "v1.0",
        Style::PowerShell,
        &StyleOptions::default(),
    );
    assert_eq!(styled.unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_slice_end_to_end() {
    common::init_tracing();
    let doc = sample_document();
    let styled = slice(
        &doc,
        &FilterCriteria::from_url("/users/12345"),
        "v1.0",
        Style::PowerShell,
        &StyleOptions::default(),
    )
    .expect("sliced");
    let ids = operation_ids(&styled);
    assert_eq!(ids, vec!["users.user_GetUser", "users.user_UpdateUser"]);
    openapi_slicer::document::validate_references(&styled).expect("closure invariant");
}
