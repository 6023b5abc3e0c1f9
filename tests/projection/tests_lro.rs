//! Paging and long-running operation tests.

use clientgen::base::{OperationId, TypeDeclId, UsageFlags};
use clientgen::diagnostics::codes;
use clientgen::graph::{
    HttpBinding, LroDecl, LroState, PagingDecl, ParameterMapping, ParameterSource, ResponseBinding, ResponseBody,
    StatusCodes, TypeDeclKind, Verb,
};
use clientgen::model::{LinkLocation, SdkTypeKind, SourceKind};
use clientgen::Severity;

use crate::helpers::graph_fixtures::ServiceFixture;
use crate::helpers::package_assertions::{assert_diagnostic, assert_no_errors, method, model_id, project};

// ============================================================================
// FIXTURE
// ============================================================================

/// `createWidget` polled through `getOperationStatus`.
struct LroFixture {
    fixture: ServiceFixture,
    states: Option<TypeDeclId>,
    create: OperationId,
    status_op: OperationId,
}

/// Build the initiating and polling operations. `status_members` are the
/// values of the status enum; an empty list leaves the monitor without a
/// status property.
fn lro_fixture(status_members: &[&str]) -> LroFixture {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let widget = fixture.widget();

    let monitor = fixture.builder.model("OperationStatus", Some(root));
    fixture.builder.property(monitor, "id", string);
    let states = (!status_members.is_empty())
        .then(|| fixture.builder.enum_type("OperationState", Some(root), status_members));
    if let Some(states) = states {
        fixture.builder.property(monitor, "status", states);
    }
    fixture.builder.property(monitor, "result", widget);

    let status_op = fixture.operation(root, "getOperationStatus", Verb::Get, "/operations/{name}");
    fixture.path_param(status_op, "name");
    fixture.respond_json(status_op, monitor);

    let create = fixture.operation(root, "createWidget", Verb::Put, "/widgets/{name}");
    fixture.path_param(create, "name");
    fixture.builder.parameter(create, "widget", widget, HttpBinding::Body);
    let location = fixture
        .builder
        .free_property("operationLocation", string, Some(HttpBinding::Header("Operation-Location".into())));
    let mut accepted = ResponseBinding::new(StatusCodes::Code(201));
    accepted.headers.push(location);
    accepted.body = Some(ResponseBody {
        ty: widget,
        content_types: vec!["application/json".into()],
    });
    fixture.builder.response(create, accepted);

    LroFixture {
        fixture,
        states,
        create,
        status_op,
    }
}

impl LroFixture {
    fn link(&mut self, parameters: Vec<ParameterMapping>) {
        let status_op = self.status_op;
        self.fixture.builder.operation_mut(self.create).lro = Some(LroDecl {
            polling_operation: status_op,
            parameters,
        });
    }
}

const STATES: &[&str] = &["Running", "Succeeded", "Failed", "Canceled"];

// ============================================================================
// LINKING
// ============================================================================

#[test]
fn test_operation_location_lro_is_linked() {
    let mut lro = lro_fixture(STATES);
    lro.link(Vec::new());
    let package = project(&lro.fixture.finish());
    assert_no_errors(&package);

    let create = method(&package, "ContosoClient", "createWidget");
    assert_eq!(create.kind.kind_name(), "lro");
    let metadata = create.kind.lro().unwrap();

    assert_eq!(metadata.initial_operation.name, "createWidget");
    assert_eq!(metadata.polling_operation.name, "getOperationStatus");
    assert_eq!(metadata.polling_operation.cross_language_id, "Contoso.getOperationStatus");

    let name = &metadata.parameter_map["name"];
    assert_eq!(name.source_kind, SourceKind::RequestParameter);
    assert_eq!(name.source, "name");

    let link = metadata.polling_link.as_ref().unwrap();
    assert_eq!(link.location, LinkLocation::ResponseHeader);
    assert_eq!(link.name, "Operation-Location");

    let monitor = &metadata.status_monitor;
    assert_eq!(monitor.status_property.name, "status");
    assert_eq!(monitor.terminal_states.succeeded, vec!["Succeeded"]);
    assert_eq!(monitor.terminal_states.failed, vec!["Failed"]);
    assert_eq!(monitor.terminal_states.canceled, vec!["Canceled"]);
    assert_eq!(monitor.terminal_states.states, STATES);
    assert!(monitor.error_property.is_none());

    let widget = model_id(&package, "Widget");
    assert_eq!(metadata.final_result, Some(widget));
    let response = create.response().unwrap();
    assert_eq!(response.ty, Some(widget));
    assert_eq!(response.result_segments, Some(vec!["result".into()]));

    let (_, status_model) = package.model("OperationStatus").unwrap();
    assert!(status_model.usage.contains(UsageFlags::OUTPUT | UsageFlags::JSON));
}

#[test]
fn test_polling_parameter_marker_links_differently_named_source() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let states = fixture.builder.enum_type("JobState", Some(root), STATES);
    let job = fixture.model("Job", &[("status", states)]);

    let poll = fixture.operation(root, "getJob", Verb::Get, "/jobs/{jobId}");
    fixture.path_param(poll, "jobId");
    fixture.respond_json(poll, job);

    let start = fixture.operation(root, "startJob", Verb::Post, "/jobs/{jobName}:start");
    let job_name = fixture.path_param(start, "jobName");
    fixture.builder.property_mut(job_name).markers.polling_parameter = Some("jobId".into());
    fixture.respond_json(start, job);
    fixture.builder.operation_mut(start).lro = Some(LroDecl {
        polling_operation: poll,
        parameters: Vec::new(),
    });
    let package = project(&fixture.finish());
    assert_no_errors(&package);

    let metadata = method(&package, "ContosoClient", "startJob").kind.lro().unwrap();
    let mapping = &metadata.parameter_map["jobId"];
    assert_eq!(mapping.source, "jobName");
    assert_eq!(mapping.source_kind, SourceKind::RequestParameter);
    assert!(metadata.polling_link.is_none());
    assert!(metadata.status_monitor.success_property.is_none());
    assert_eq!(metadata.final_result, Some(model_id(&package, "Job")));
}

#[test]
fn test_response_property_directive() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let states = fixture.builder.enum_type("JobState", Some(root), STATES);
    let job = fixture.model("Job", &[("id", string), ("status", states)]);

    let poll = fixture.operation(root, "getJob", Verb::Get, "/jobs/{operationId}");
    fixture.path_param(poll, "operationId");
    fixture.respond_json(poll, job);

    let start = fixture.operation(root, "startJob", Verb::Post, "/jobs");
    fixture.respond_json(start, job);
    fixture.builder.operation_mut(start).lro = Some(LroDecl {
        polling_operation: poll,
        parameters: vec![ParameterMapping {
            target: "operationId".into(),
            source: ParameterSource::ResponseProperty("id".into()),
        }],
    });
    let package = project(&fixture.finish());
    assert_no_errors(&package);

    let start = method(&package, "ContosoClient", "startJob");
    let mapping = &start.kind.lro().unwrap().parameter_map["operationId"];
    assert_eq!(mapping.source_kind, SourceKind::ResponseBody);
    assert_eq!(mapping.source, "id");
    assert_eq!(mapping.target, "operationId");
}

#[test]
fn test_nested_provisioning_state_is_found() {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let states = fixture.builder.enum_type("ProvisioningState", Some(root), STATES);
    let props = fixture.model("WidgetProperties", &[("provisioningState", states)]);
    let resource = fixture.model("WidgetResource", &[("properties", props)]);

    let get = fixture.operation(root, "getResource", Verb::Get, "/resources/{name}");
    fixture.path_param(get, "name");
    fixture.respond_json(get, resource);

    let put = fixture.operation(root, "putResource", Verb::Put, "/resources/{name}");
    fixture.path_param(put, "name");
    fixture.builder.parameter(put, "resource", resource, HttpBinding::Body);
    fixture.respond_json(put, resource);
    fixture.builder.operation_mut(put).lro = Some(LroDecl {
        polling_operation: get,
        parameters: Vec::new(),
    });
    let package = project(&fixture.finish());
    assert_no_errors(&package);

    let put = method(&package, "ContosoClient", "putResource");
    let monitor = &put.kind.lro().unwrap().status_monitor;
    assert_eq!(monitor.status_property.name, "provisioningState");
    assert_eq!(monitor.monitor_type, model_id(&package, "WidgetResource"));
    assert_eq!(put.response().unwrap().ty, Some(model_id(&package, "WidgetResource")));
}

#[test]
fn test_terminal_state_markers_override_names() {
    let mut lro = lro_fixture(&["Working", "Done", "Broken"]);
    let states = lro.states.unwrap();
    let members = lro.fixture.builder.enum_members(states).to_vec();
    for (member, state) in members[1..].iter().zip([LroState::Succeeded, LroState::Failed]) {
        if let TypeDeclKind::EnumMember(m) = &mut lro.fixture.builder.type_mut(*member).kind {
            m.lro_state = Some(state);
        }
    }
    lro.link(Vec::new());
    let package = project(&lro.fixture.finish());
    assert_no_errors(&package);

    let create = method(&package, "ContosoClient", "createWidget");
    let states = &create.kind.lro().unwrap().status_monitor.terminal_states;
    assert_eq!(states.succeeded, vec!["Done"]);
    assert_eq!(states.failed, vec!["Broken"]);
    assert!(states.canceled.is_empty());
}

// ============================================================================
// DEGRADED LINKS
// ============================================================================

#[test]
fn test_missing_status_degrades_to_basic() {
    let mut lro = lro_fixture(&[]);
    lro.link(Vec::new());
    let package = project(&lro.fixture.finish());

    assert_no_errors(&package);
    assert_diagnostic(&package, codes::LRO_STATUS_MISSING, Severity::Warning);
    let create = method(&package, "ContosoClient", "createWidget");
    assert_eq!(create.kind.kind_name(), "basic");
    assert_eq!(create.response().unwrap().ty, Some(model_id(&package, "Widget")));
}

#[test]
fn test_status_without_failed_state_is_not_a_monitor() {
    let mut lro = lro_fixture(&["Running", "Succeeded"]);
    lro.link(Vec::new());
    let package = project(&lro.fixture.finish());

    assert_diagnostic(&package, codes::LRO_STATUS_MISSING, Severity::Warning);
    assert_eq!(method(&package, "ContosoClient", "createWidget").kind.kind_name(), "basic");
}

#[test]
fn test_unmatched_polling_parameter_degrades_to_basic() {
    let mut lro = lro_fixture(STATES);
    let status_op = lro.status_op;
    lro.fixture.path_param(status_op, "region");
    lro.link(Vec::new());
    let package = project(&lro.fixture.finish());

    assert_diagnostic(&package, codes::LRO_INVALID_LINK, Severity::Warning);
    let create = method(&package, "ContosoClient", "createWidget");
    assert_eq!(create.kind.kind_name(), "basic");
    assert!(create.kind.lro().is_none());
}

#[test]
fn test_invalid_directive_target_is_reported_and_skipped() {
    let mut lro = lro_fixture(STATES);
    lro.link(vec![ParameterMapping {
        target: "missing".into(),
        source: ParameterSource::RequestParameter("name".into()),
    }]);
    let package = project(&lro.fixture.finish());

    assert_diagnostic(&package, codes::OPERATION_LINK_PARAMETER_INVALID_TARGET, Severity::Error);
    assert_eq!(method(&package, "ContosoClient", "createWidget").kind.kind_name(), "lro");
}

#[test]
fn test_unknown_request_parameter_directive() {
    let mut lro = lro_fixture(STATES);
    lro.link(vec![ParameterMapping {
        target: "name".into(),
        source: ParameterSource::RequestParameter("widgetName".into()),
    }]);
    let package = project(&lro.fixture.finish());

    assert_diagnostic(&package, codes::REQUEST_PARAMETER_INVALID, Severity::Error);
    let create = method(&package, "ContosoClient", "createWidget");
    let mapping = &create.kind.lro().unwrap().parameter_map["name"];
    assert_eq!(mapping.source, "name", "falls back to the automatic match");
}

#[test]
fn test_duplicate_directive_is_reported() {
    let mut lro = lro_fixture(STATES);
    let directive = ParameterMapping {
        target: "name".into(),
        source: ParameterSource::RequestParameter("name".into()),
    };
    lro.link(vec![directive.clone(), directive]);
    let package = project(&lro.fixture.finish());

    assert_diagnostic(&package, codes::CONFLICTING_PARAMETER_MAPPING, Severity::Error);
}

// ============================================================================
// PAGING
// ============================================================================

/// `listWidgets` returning `WidgetPage { value: Widget[], nextLink: string }`.
fn paged_fixture() -> (ServiceFixture, OperationId, TypeDeclId) {
    let mut fixture = ServiceFixture::new();
    let root = fixture.root;
    let string = fixture.string;
    let widget = fixture.widget();
    let widgets = fixture.builder.array(widget);
    let page = fixture.model("WidgetPage", &[("value", widgets), ("nextLink", string)]);

    let list = fixture.operation(root, "listWidgets", Verb::Get, "/widgets");
    fixture.respond_json(list, page);
    fixture.builder.operation_mut(list).paging = Some(PagingDecl {
        item_segments: vec!["value".into()],
        next_link_segments: Some(vec!["nextLink".into()]),
        next_link_operation: None,
    });
    (fixture, list, widget)
}

#[test]
fn test_paging_returns_items() {
    let (fixture, _, _) = paged_fixture();
    let package = project(&fixture.finish());
    assert_no_errors(&package);

    let list = method(&package, "ContosoClient", "listWidgets");
    assert_eq!(list.kind.kind_name(), "paging");
    let paging = list.kind.paging().unwrap();
    assert_eq!(paging.item_segments, vec!["value"]);
    assert_eq!(paging.next_link_segments, Some(vec!["nextLink".into()]));

    let response = list.response().unwrap();
    assert_eq!(response.result_segments, Some(vec!["value".into()]));
    let items = response.ty.unwrap();
    match &package.catalogue.get(items).kind {
        SdkTypeKind::Array { value } => assert_eq!(*value, model_id(&package, "Widget")),
        other => panic!("expected the item array, got {}", other.kind_name()),
    }
}

#[test]
fn test_paged_lro_without_status_stays_paging() {
    let (mut fixture, list, widget) = paged_fixture();
    let root = fixture.root;
    let poll = fixture.operation(root, "getListStatus", Verb::Get, "/widgets/status");
    fixture.respond_json(poll, widget);
    fixture.builder.operation_mut(list).lro = Some(LroDecl {
        polling_operation: poll,
        parameters: Vec::new(),
    });
    let package = project(&fixture.finish());

    assert_diagnostic(&package, codes::LRO_STATUS_MISSING, Severity::Warning);
    assert_eq!(method(&package, "ContosoClient", "listWidgets").kind.kind_name(), "paging");
}
