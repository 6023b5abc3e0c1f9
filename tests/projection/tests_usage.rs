//! Usage and access propagation tests.

use clientgen::base::{Access, UsageFlags};
use clientgen::diagnostics::codes;
use clientgen::graph::{Graph, HttpBinding, ResponseBinding, ResponseBody, StatusCodes, Verb};
use clientgen::{ProjectionOptions, SdkPackage, Severity};
use rstest::rstest;

use crate::helpers::graph_fixtures::ServiceFixture;
use crate::helpers::package_assertions::{assert_diagnostic, assert_no_errors, method, project, project_with};

// ============================================================================
// HELPERS
// ============================================================================

fn usage_of(package: &SdkPackage, name: &str) -> UsageFlags {
    package
        .catalogue
        .find_model(name)
        .map(|(_, m)| m.usage)
        .unwrap_or(UsageFlags::NONE)
}

/// `Widget { part: Part }` sent by `createWidget`, optionally also returned by `getWidget`.
fn widget_graph(with_output: bool) -> Graph {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let part = fixture.model("Part", &[("serial", string)]);
    let widget = fixture.model("Widget", &[("name", string), ("part", part)]);

    let create = fixture.operation(root, "createWidget", Verb::Post, "/widgets");
    fixture.builder.parameter(create, "widget", widget, HttpBinding::Body);

    if with_output {
        let get = fixture.operation(root, "getWidget", Verb::Get, "/widgets/{name}");
        fixture.path_param(get, "name");
        fixture.respond_json(get, widget);
    }
    fixture.finish()
}

// ============================================================================
// PROPAGATION
// ============================================================================

#[test]
fn test_adding_an_operation_never_removes_usage() {
    let before = project(&widget_graph(false));
    let after = project(&widget_graph(true));
    assert_no_errors(&before);
    assert_no_errors(&after);

    for name in ["Widget", "Part"] {
        let a = usage_of(&before, name);
        let b = usage_of(&after, name);
        assert!(b.contains(a), "{}: {:?} is not a subset of {:?}", name, a, b);
    }
    assert!(usage_of(&before, "Part").contains(UsageFlags::INPUT | UsageFlags::JSON));
    assert!(!usage_of(&before, "Part").contains(UsageFlags::OUTPUT));
    assert!(usage_of(&after, "Part").contains(UsageFlags::INPUT | UsageFlags::OUTPUT));
}

#[rstest]
#[case("application/json", UsageFlags::JSON)]
#[case("application/merge-patch+json", UsageFlags::JSON_MERGE_PATCH)]
#[case("application/xml", UsageFlags::XML)]
#[case("multipart/form-data", UsageFlags::MULTIPART_FORM_DATA)]
fn test_body_content_type_sets_format_usage(#[case] content_type: &str, #[case] expected: UsageFlags) {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let widget = fixture.widget();
    let op = fixture.operation(root, "sendWidget", Verb::Post, "/widgets");
    fixture.builder.parameter(op, "widget", widget, HttpBinding::Body);
    fixture.builder.operation_mut(op).binding.bodies[0].content_types = vec![content_type.into()];
    let graph = fixture.finish();

    let package = project(&graph);
    let usage = usage_of(&package, "Widget");
    assert!(usage.contains(UsageFlags::INPUT | expected), "got {:?}", usage);
}

#[test]
fn test_error_response_marks_exception_usage() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let widget = fixture.widget();
    let error = fixture.builder.error_model("ApiError", Some(root));
    fixture.builder.property(error, "message", string);

    let op = fixture.operation(root, "getWidget", Verb::Get, "/widget");
    fixture.respond_json(op, widget);
    let mut failure = ResponseBinding::new(StatusCodes::Wildcard);
    failure.body = Some(ResponseBody {
        ty: error,
        content_types: vec!["application/json".into()],
    });
    fixture.builder.response(op, failure);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let usage = usage_of(&package, "ApiError");
    assert!(usage.contains(UsageFlags::OUTPUT | UsageFlags::EXCEPTION | UsageFlags::JSON));
    assert!(!usage_of(&package, "Widget").contains(UsageFlags::EXCEPTION));

    let operation = method(&package, "ContosoClient", "getWidget").operation().unwrap();
    assert_eq!(operation.responses.len(), 1);
    assert!(operation.exceptions.contains_key(&StatusCodes::Wildcard));
}

#[test]
fn test_spread_body_flag_stays_on_generated_model() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let part = fixture.model("Part", &[("serial", string)]);
    let op = fixture.operation(root, "createThing", Verb::Post, "/things");
    let name = fixture.builder.method_parameter(op, "name", string);
    let part_param = fixture.builder.method_parameter(op, "part", part);
    fixture.builder.spread_body(op, &[name, part_param], &["application/json"]);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let request = usage_of(&package, "CreateThingRequest");
    assert!(request.contains(UsageFlags::INPUT | UsageFlags::SPREAD | UsageFlags::JSON));
    let part = usage_of(&package, "Part");
    assert!(part.contains(UsageFlags::INPUT));
    assert!(!part.contains(UsageFlags::SPREAD), "spread does not propagate");
}

#[test]
fn test_multipart_and_json_body_conflict() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let widget = fixture.widget();

    let upload = fixture.operation(root, "uploadWidget", Verb::Post, "/widgets:upload");
    fixture.builder.parameter(upload, "widget", widget, HttpBinding::Body);
    fixture.builder.operation_mut(upload).binding.bodies[0].content_types = vec!["multipart/form-data".into()];

    let create = fixture.operation(root, "createWidget", Verb::Post, "/widgets");
    fixture.builder.parameter(create, "widget", widget, HttpBinding::Body);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_diagnostic(&package, codes::CONFLICTING_MULTIPART_USAGE, Severity::Error);
}

// ============================================================================
// CONVENIENT METHODS
// ============================================================================

#[test]
fn test_protocol_only_method_adds_no_usage() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let raw = fixture.model("RawPayload", &[("data", string)]);
    let widget = fixture.widget();

    let send = fixture.operation(root, "sendRaw", Verb::Post, "/raw");
    fixture.builder.parameter(send, "payload", raw, HttpBinding::Body);
    fixture.respond_json(send, raw);
    fixture.builder.overrides_mut().set_convenient_api(send, None, false);

    let get = fixture.operation(root, "getWidget", Verb::Get, "/widget");
    fixture.respond_json(get, widget);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    assert_eq!(usage_of(&package, "RawPayload"), UsageFlags::NONE);
    assert!(package.model("RawPayload").is_none());
    assert!(usage_of(&package, "Widget").contains(UsageFlags::OUTPUT));

    let raw_method = method(&package, "ContosoClient", "sendRaw");
    assert!(!raw_method.generate_convenient);
    assert!(raw_method.generate_protocol);
    assert!(raw_method.operation().unwrap().body.is_some(), "the wire shape is still projected");
    assert!(method(&package, "ContosoClient", "getWidget").generate_convenient);
}

#[test]
fn test_convenient_override_beats_package_default() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let kept = fixture.model("Kept", &[("id", string)]);
    let dropped = fixture.model("Dropped", &[("id", string)]);

    let keep = fixture.operation(root, "getKept", Verb::Get, "/kept");
    fixture.respond_json(keep, kept);
    fixture.builder.overrides_mut().set_convenient_api(keep, Some("python"), true);
    let discard = fixture.operation(root, "getDropped", Verb::Get, "/dropped");
    fixture.respond_json(discard, dropped);
    fixture.builder.overrides_mut().set_protocol_api(discard, None, false);
    let graph = fixture.finish();

    let options = ProjectionOptions {
        generate_convenience_methods: false,
        ..ProjectionOptions::default()
    }
    .with_scope("python");
    let package = project_with(&graph, &options);
    assert_no_errors(&package);

    assert!(usage_of(&package, "Kept").contains(UsageFlags::OUTPUT | UsageFlags::JSON));
    assert_eq!(usage_of(&package, "Dropped"), UsageFlags::NONE);

    let dropped_method = method(&package, "ContosoClient", "getDropped");
    assert!(!dropped_method.generate_convenient);
    assert!(!dropped_method.generate_protocol);
}

// ============================================================================
// ACCESS
// ============================================================================

#[test]
fn test_access_follows_method_access() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let shared = fixture.model("Shared", &[("id", string)]);
    let secret = fixture.model("Secret", &[("shared", shared)]);
    let public = fixture.model("Public", &[("shared", shared)]);

    let hidden = fixture.operation(root, "getSecret", Verb::Get, "/secret");
    fixture.respond_json(hidden, secret);
    fixture.builder.overrides_mut().set_access(hidden, None, Access::Internal);
    let open = fixture.operation(root, "getPublic", Verb::Get, "/public");
    fixture.respond_json(open, public);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let access = |name: &str| package.model(name).and_then(|(_, m)| m.access);
    assert_eq!(access("Secret"), Some(Access::Internal));
    assert_eq!(access("Public"), Some(Access::Public));
    assert_eq!(access("Shared"), Some(Access::Public));
    assert_eq!(method(&package, "ContosoClient", "getSecret").access, Access::Internal);
}

#[test]
fn test_explicit_access_override_wins() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let widget = fixture.widget();
    fixture.builder.overrides_mut().set_access(widget, None, Access::Internal);
    let op = fixture.operation(root, "getWidget", Verb::Get, "/widget");
    fixture.respond_json(op, widget);
    let graph = fixture.finish();

    let package = project(&graph);
    let (_, model) = package.model("Widget").unwrap();
    assert_eq!(model.access, Some(Access::Internal));
}

#[test]
fn test_orphan_with_usage_override_is_exported() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let orphan = fixture.model("Standalone", &[("id", string)]);
    let ignored = fixture.model("Ignored", &[("id", string)]);
    fixture.builder.service_mut(root).orphan_types.extend([orphan, ignored]);
    fixture.builder.overrides_mut().set_usage(orphan, None, UsageFlags::INPUT | UsageFlags::JSON);
    let graph = fixture.finish();

    let package = project(&graph);
    assert_no_errors(&package);

    let (_, model) = package.model("Standalone").expect("orphan should be exported");
    assert!(model.usage.contains(UsageFlags::INPUT | UsageFlags::JSON));
    assert_eq!(model.access, Some(Access::Public));
    assert!(package.model("Ignored").is_none());
}
