//! JSON export of a projected package.
#![cfg(feature = "serde")]

use crate::helpers::graph_fixtures::widget_service;
use crate::helpers::package_assertions::{assert_no_errors, project};

#[test]
fn test_package_exports_as_json() {
    let service = widget_service();
    let package = project(&service.graph);
    assert_no_errors(&package);

    let json = package.to_json().expect("package should serialize");
    assert!(json.contains("\"ContosoClient\""), "client name missing from export");
    assert!(json.contains("\"200\":"), "status code keys should serialize as strings");
    assert!(json.contains("\"Widget\""));
}

#[test]
fn test_exported_json_parses_back_as_a_document() {
    let service = widget_service();
    let package = project(&service.graph);

    let json = package.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let clients = value["clients"].as_array().expect("clients should be an array");
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["name"], "ContosoClient");
    assert!(value["diagnostics"].is_array());
}
