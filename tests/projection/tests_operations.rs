//! Operation projection tests: wire parameters, bodies, responses and the
//! correspondence between wire and method parameters.

use clientgen::base::{SdkTypeId, TypeDeclId};
use clientgen::diagnostics::codes;
use clientgen::graph::{BodyBinding, HttpBinding, LiteralValue, ResponseBinding, ResponseBody, StatusCodes, Verb};
use clientgen::model::{BuiltinKind, ParamRef, PropertyKind, SdkTypeKind};
use clientgen::{ApiVersionSelection, ProjectionOptions, SdkPackage, Severity};
use rstest::rstest;

use crate::helpers::graph_fixtures::{ServiceFixture, widget_service};
use crate::helpers::package_assertions::{
    assert_diagnostic, assert_no_errors, client, constant_value, method, project, project_with,
};

// ============================================================================
// HELPERS
// ============================================================================

fn is_string_builtin(package: &SdkPackage, ty: SdkTypeId) -> bool {
    matches!(
        &package.catalogue.get(ty).kind,
        SdkTypeKind::Builtin(b) if b.builtin == BuiltinKind::String
    )
}

fn response(status: u16, ty: TypeDeclId) -> ResponseBinding {
    let mut response = ResponseBinding::new(StatusCodes::Code(status));
    response.body = Some(ResponseBody {
        ty,
        content_types: vec!["application/json".into()],
    });
    response
}

// ============================================================================
// CORRESPONDENCE
// ============================================================================

#[test]
fn test_every_wire_parameter_has_a_source() {
    let service = widget_service();
    let package = project(&service.graph);
    assert_no_errors(&package);

    for method in &client(&package, "ContosoClient").methods {
        let Some(operation) = method.operation() else {
            continue;
        };
        for param in operation.wire_parameters() {
            assert!(
                !param.corresponding_method_params.is_empty(),
                "{}.{} has no corresponding parameter",
                method.name,
                param.serialized_name
            );
        }
    }
}

#[test]
fn test_api_version_resolves_to_client_parameter() {
    let service = widget_service();
    let package = project(&service.graph);

    let get = method(&package, "ContosoClient", "getWidget");
    assert!(get.parameter("apiVersion").is_none(), "api-version is client scoped");

    let wire = get.operation().unwrap().parameter("api-version").unwrap();
    assert!(wire.is_api_version_param);
    let source = wire.corresponding_method_params[0].root();
    assert!(source.on_client);
    assert_eq!(
        source.client_default_value,
        Some(LiteralValue::String("2024-01-01".into()))
    );
}

#[rstest]
#[case(ApiVersionSelection::Latest, "2024-01-01")]
#[case(ApiVersionSelection::All, "2024-01-01")]
#[case(ApiVersionSelection::Specific("2023-01-01".into()), "2023-01-01")]
fn test_api_version_default_follows_selection(#[case] selection: ApiVersionSelection, #[case] expected: &str) {
    let service = widget_service();
    let options = ProjectionOptions::default().with_api_version(selection);
    let package = project_with(&service.graph, &options);

    let init = &client(&package, "ContosoClient").initialization;
    let api_version = init.api_version().expect("api-version on the client");
    assert_eq!(
        api_version.client_default_value,
        Some(LiteralValue::String(expected.into()))
    );
}

#[test]
fn test_parameter_alias_matches_wire_name() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let op = fixture.operation(root, "getBlob", Verb::Get, "/blobs/{name}");
    let wire = fixture.builder.free_property("name", string, Some(HttpBinding::Path("name".into())));
    fixture.builder.unbound_wire_parameter(op, wire);
    let blob_name = fixture.builder.method_parameter(op, "blobName", string);
    fixture.builder.overrides_mut().set_parameter_alias(blob_name, None, "name");
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let wire = method(&package, "ContosoClient", "getBlob")
        .operation()
        .unwrap()
        .parameter("name")
        .unwrap();
    assert_eq!(wire.corresponding_method_params[0].path(), "blobName");
}

#[test]
fn test_wire_parameter_from_composite_method_parameter() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let options = fixture.model("ListOptions", &[("filter", string)]);
    let op = fixture.operation(root, "listWidgets", Verb::Get, "/widgets");
    fixture.builder.method_parameter(op, "options", options);
    let filter = fixture.builder.free_property("filter", string, Some(HttpBinding::Query("filter".into())));
    fixture.builder.unbound_wire_parameter(op, filter);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let wire = method(&package, "ContosoClient", "listWidgets")
        .operation()
        .unwrap()
        .parameter("filter")
        .unwrap();
    match &wire.corresponding_method_params[0] {
        ParamRef::Property { parent, property } => {
            assert_eq!(parent.name, "options");
            assert_eq!(property, "filter");
        }
        other => panic!("expected a property reference, got {}", other.path()),
    }
}

#[test]
fn test_spread_body_maps_each_member() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let int32 = fixture.builder.scalar("int32");
    let op = fixture.operation(root, "createThing", Verb::Post, "/things");
    let name = fixture.builder.method_parameter(op, "name", string);
    let size = fixture.builder.method_parameter(op, "size", int32);
    fixture.builder.spread_body(op, &[name, size], &["application/json"]);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let create = method(&package, "ContosoClient", "createThing");
    let names: Vec<&str> = create.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["name", "size", "contentType"]);

    let body = create.operation().unwrap().body.as_ref().unwrap();
    assert_eq!(body.name, "body");
    let paths: Vec<String> = body.corresponding_method_params.iter().map(ParamRef::path).collect();
    assert_eq!(paths, vec!["name", "size"]);
}

// ============================================================================
// STRUCTURAL ERRORS
// ============================================================================

#[test]
fn test_partially_resolved_spread_drops_method() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let op = fixture.operation(root, "createThing", Verb::Post, "/things");
    let name = fixture.builder.method_parameter(op, "name", string);
    let stray = fixture.builder.free_property("stray", string, None);
    fixture.builder.spread_body(op, &[name, stray], &["application/json"]);
    fixture.operation(root, "ping", Verb::Get, "/ping");
    let graph = fixture.finish();

    let package = project(&graph);
    assert_diagnostic(&package, codes::SPREAD_NOT_RESOLVED, Severity::Error);
    let owner = client(&package, "ContosoClient");
    assert!(owner.method("createThing").is_none());
    assert!(owner.method("ping").is_some(), "other methods survive");
}

#[test]
fn test_unresolved_spread_reports_spread_code() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let op = fixture.operation(root, "createThing", Verb::Post, "/things");
    let first = fixture.builder.free_property("first", string, None);
    let second = fixture.builder.free_property("second", string, None);
    fixture.builder.spread_body(op, &[first, second], &["application/json"]);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_diagnostic(&package, codes::SPREAD_NOT_RESOLVED, Severity::Error);
    assert!(
        !package.diagnostics.iter().any(|d| d.has_code(codes::NO_CORRESPONDING_METHOD_PARAM)),
        "an unresolved spread is not a missing parameter"
    );
    assert!(client(&package, "ContosoClient").method("createThing").is_none());
}

#[test]
fn test_wire_parameter_without_source_is_reported() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let op = fixture.operation(root, "trace", Verb::Get, "/trace");
    let header = fixture.builder.free_property("x-trace-id", string, Some(HttpBinding::Header("x-trace-id".into())));
    fixture.builder.unbound_wire_parameter(op, header);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_diagnostic(&package, codes::NO_CORRESPONDING_METHOD_PARAM, Severity::Error);
    assert!(client(&package, "ContosoClient").method("trace").is_none());
}

#[test]
fn test_unclassified_wire_parameter_is_reported() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let op = fixture.operation(root, "mystery", Verb::Get, "/mystery");
    let param = fixture.builder.free_property("something", string, None);
    fixture.builder.unbound_wire_parameter(op, param);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_diagnostic(&package, codes::UNEXPECTED_HTTP_PARAM_TYPE, Severity::Error);
}

#[test]
fn test_divergent_bodies_are_reported() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let widget = fixture.widget();
    let gadget = fixture.model("Gadget", &[("id", string)]);
    let op = fixture.operation(root, "send", Verb::Post, "/send");
    for ty in [widget, gadget] {
        fixture.builder.set_body(
            op,
            BodyBinding {
                property: None,
                ty,
                content_types: vec!["application/json".into()],
                spread: false,
            },
        );
    }
    let graph = fixture.finish();

    let package = project(&graph);
    assert_diagnostic(&package, codes::MULTIPLE_BODY_TYPES, Severity::Error);
    assert!(client(&package, "ContosoClient").method("send").is_none());
}

// ============================================================================
// CONTENT NEGOTIATION
// ============================================================================

#[test]
fn test_json_body_gets_constant_content_type() {
    let service = widget_service();
    let package = project(&service.graph);

    let operation = method(&package, "ContosoClient", "createWidget").operation().unwrap();
    let header = operation.parameter("Content-Type").expect("synthesized Content-Type");
    assert_eq!(header.kind, PropertyKind::Header);
    assert_eq!(constant_value(&package, header.ty).as_deref(), Some("application/json"));
    assert!(!header.corresponding_method_params.is_empty());
}

#[test]
fn test_single_response_type_gets_constant_accept() {
    let service = widget_service();
    let package = project(&service.graph);

    let operation = method(&package, "ContosoClient", "getWidget").operation().unwrap();
    let accept = operation.parameter("Accept").expect("synthesized Accept");
    assert_eq!(constant_value(&package, accept.ty).as_deref(), Some("application/json"));
    assert!(operation.parameter("Content-Type").is_none(), "no body, no Content-Type");
}

#[test]
fn test_content_negotiation_constants_are_named_per_header() {
    let service = widget_service();
    let package = project(&service.graph);
    assert_no_errors(&package);

    let operation = method(&package, "ContosoClient", "createWidget").operation().unwrap();
    let name_of = |header: &str| {
        let param = operation.parameter(header).unwrap();
        package.catalogue.get(param.ty).name().map(str::to_string)
    };
    assert_eq!(name_of("Content-Type").as_deref(), Some("CreateWidgetContentType"));
    assert_eq!(name_of("Accept").as_deref(), Some("CreateWidgetAccept"));
}

#[test]
fn test_two_response_content_types_give_open_accept() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let widget = fixture.widget();
    let op = fixture.operation(root, "getWidget", Verb::Get, "/widget");
    fixture.respond(op, widget, &["application/json", "application/xml"]);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let operation = method(&package, "ContosoClient", "getWidget").operation().unwrap();
    let accept = operation.parameter("Accept").unwrap();
    assert!(is_string_builtin(&package, accept.ty), "Accept should not be a constant");
    let ok = &operation.responses[&StatusCodes::Code(200)];
    assert_eq!(ok.default_content_type.as_deref(), Some("application/json"));
}

#[test]
fn test_binary_body_gets_open_content_type() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let bytes = fixture.builder.scalar("bytes");
    let op = fixture.operation(root, "upload", Verb::Put, "/blob");
    fixture.builder.parameter(op, "data", bytes, HttpBinding::Body);
    fixture.builder.operation_mut(op).binding.bodies[0].content_types = vec!["application/octet-stream".into()];
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let operation = method(&package, "ContosoClient", "upload").operation().unwrap();
    let header = operation.parameter("Content-Type").unwrap();
    assert!(is_string_builtin(&package, header.ty));
    let body = operation.body.as_ref().unwrap();
    assert_eq!(body.content_types(), &["application/octet-stream"]);
}

#[test]
fn test_declared_content_type_header_is_kept() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let widget = fixture.widget();
    let op = fixture.operation(root, "send", Verb::Post, "/send");
    fixture.builder.parameter(op, "contentType", string, HttpBinding::Header("content-type".into()));
    fixture.builder.parameter(op, "widget", widget, HttpBinding::Body);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let operation = method(&package, "ContosoClient", "send").operation().unwrap();
    let headers = operation
        .parameters
        .iter()
        .filter(|p| p.serialized_name.eq_ignore_ascii_case("content-type"))
        .count();
    assert_eq!(headers, 1);
}

// ============================================================================
// METHOD SHAPE
// ============================================================================

#[test]
fn test_unused_path_parameter_is_dropped() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let op = fixture.operation(root, "getThing", Verb::Get, "/things/{id}");
    fixture.path_param(op, "id");
    let ghost = fixture.builder.method_parameter(op, "ghost", string);
    fixture.builder.property_mut(ghost).binding = Some(HttpBinding::Path("ghost".into()));
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let get = method(&package, "ContosoClient", "getThing");
    assert!(get.parameter("id").is_some());
    assert!(get.parameter("ghost").is_none());
}

#[test]
fn test_distinct_success_types_form_response_union() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let widget = fixture.widget();
    let gadget = fixture.model("Gadget", &[("id", string)]);
    let op = fixture.operation(root, "getThing", Verb::Get, "/thing");
    fixture.builder.response(op, response(200, widget));
    fixture.builder.response(op, response(201, gadget));
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let ty = method(&package, "ContosoClient", "getThing").response().unwrap().ty.unwrap();
    let union = package.catalogue.union(ty).expect("response union");
    assert_eq!(union.name.as_deref(), Some("GetThingResponse"));
    assert!(union.is_generated_name);
    assert_eq!(union.variants.len(), 2);
}

#[test]
fn test_empty_success_response_makes_result_nullable() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let widget = fixture.widget();
    let op = fixture.operation(root, "getWidget", Verb::Get, "/widget");
    fixture.respond_json(op, widget);
    fixture.respond_empty(op, 204);
    let graph = fixture.finish();

    let package = project(&graph);
    let ty = method(&package, "ContosoClient", "getWidget").response().unwrap().ty.unwrap();
    let node = package.catalogue.get(ty);
    assert!(node.nullable);
    let union = package.catalogue.union(ty).unwrap();
    assert_eq!(union.variants, vec![package.model("Widget").unwrap().0]);
}

#[test]
fn test_conflicting_types_for_one_status_warn() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let widget = fixture.widget();
    let gadget = fixture.model("Gadget", &[("id", string)]);
    let op = fixture.operation(root, "getThing", Verb::Get, "/thing");
    fixture.builder.response(op, response(200, widget));
    fixture.builder.response(op, response(200, gadget));
    let graph = fixture.finish();

    let package = project(&graph);
    assert_diagnostic(&package, codes::MULTIPLE_RESPONSE_TYPES, Severity::Warning);
    let get = method(&package, "ContosoClient", "getThing");
    assert_eq!(get.response().unwrap().ty, Some(package.model("Widget").unwrap().0));
}

#[test]
fn test_response_headers_are_projected() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let widget = fixture.widget();
    let op = fixture.operation(root, "getWidget", Verb::Get, "/widget");
    let etag = fixture.builder.free_property("etag", string, Some(HttpBinding::Header("ETag".into())));
    let mut ok = response(200, widget);
    ok.headers.push(etag);
    fixture.builder.response(op, ok);
    let graph = fixture.finish();

    let package = project(&graph);
    let operation = method(&package, "ContosoClient", "getWidget").operation().unwrap();
    let headers = &operation.responses[&StatusCodes::Code(200)].headers;
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].name, "etag");
    assert_eq!(headers[0].serialized_name, "ETag");
}
