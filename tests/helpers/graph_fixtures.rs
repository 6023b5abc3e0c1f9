//! Service graph fixtures.

use clientgen::graph::{
    ApiKeyLocation, AuthScheme, Graph, GraphBuilder, HttpBinding, ResponseBinding, ResponseBody,
    ServerDecl, ServiceDecl, StatusCodes, Verb,
};
use clientgen::base::{ContainerId, OperationId, PropertyId, TypeDeclId};

/// Version list used by versioned fixtures, oldest first.
pub const VERSIONS: &[&str] = &["2023-01-01", "2024-01-01"];

/// A `Contoso` service root with a single `{endpoint}` server, plus the
/// builder so each test can add what it needs.
pub struct ServiceFixture {
    pub builder: GraphBuilder,
    pub root: ContainerId,
    pub string: TypeDeclId,
}

impl ServiceFixture {
    pub fn new() -> Self {
        Self::with_service("Contoso", ServiceDecl::default())
    }

    /// A service declaring [`VERSIONS`].
    pub fn versioned() -> Self {
        Self::with_service(
            "Contoso",
            ServiceDecl {
                api_versions: VERSIONS.iter().map(|v| (*v).into()).collect(),
                ..ServiceDecl::default()
            },
        )
    }

    pub fn with_service(name: &str, service: ServiceDecl) -> Self {
        let mut builder = GraphBuilder::new();
        let root = builder.namespace(name, None);
        let string = builder.scalar("string");
        let endpoint = builder.free_property("endpoint", string, Some(HttpBinding::Path("endpoint".into())));
        let mut service = service;
        if service.servers.is_empty() {
            service.servers.push(ServerDecl {
                url: "{endpoint}".into(),
                parameters: vec![endpoint],
                description: None,
            });
        }
        builder.set_service(root, service);
        Self { builder, root, string }
    }

    /// Require an api key in the `x-api-key` header.
    pub fn with_api_key(mut self) -> Self {
        self.builder.service_mut(self.root).auth.push(AuthScheme::ApiKey {
            location: ApiKeyLocation::Header,
            name: "x-api-key".into(),
        });
        self
    }

    /// A named model in the root namespace with the given properties.
    pub fn model(&mut self, name: &str, properties: &[(&str, TypeDeclId)]) -> TypeDeclId {
        let model = self.builder.model(name, Some(self.root));
        for (prop, ty) in properties {
            self.builder.property(model, prop, *ty);
        }
        model
    }

    /// `model Widget { name: string; color: string; }`
    pub fn widget(&mut self) -> TypeDeclId {
        let string = self.string;
        self.model("Widget", &[("name", string), ("color", string)])
    }

    pub fn operation(&mut self, container: ContainerId, name: &str, verb: Verb, path: &str) -> OperationId {
        self.builder.operation(container, name, verb, path)
    }

    /// A `200` response carrying `ty` with the given content types.
    pub fn respond(&mut self, op: OperationId, ty: TypeDeclId, content_types: &[&str]) {
        let mut response = ResponseBinding::new(StatusCodes::Code(200));
        response.body = Some(ResponseBody {
            ty,
            content_types: content_types.iter().map(|c| (*c).into()).collect(),
        });
        self.builder.response(op, response);
    }

    /// A `200` JSON response carrying `ty`.
    pub fn respond_json(&mut self, op: OperationId, ty: TypeDeclId) {
        self.respond(op, ty, &["application/json"]);
    }

    /// A body-less response.
    pub fn respond_empty(&mut self, op: OperationId, status: u16) {
        self.builder.response(op, ResponseBinding::new(StatusCodes::Code(status)));
    }

    /// `@query("api-version") apiVersion: string`
    pub fn api_version_param(&mut self, op: OperationId) -> PropertyId {
        let string = self.string;
        self.builder
            .parameter(op, "apiVersion", string, HttpBinding::Query("api-version".into()))
    }

    pub fn path_param(&mut self, op: OperationId, name: &str) -> PropertyId {
        let string = self.string;
        self.builder.parameter(op, name, string, HttpBinding::Path(name.into()))
    }

    pub fn finish(self) -> Graph {
        self.builder.finish()
    }
}

impl Default for ServiceFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles into [`widget_service`].
pub struct WidgetService {
    pub graph: Graph,
    pub root: ContainerId,
    pub widget: TypeDeclId,
    pub get_widget: OperationId,
    pub create_widget: OperationId,
}

/// A versioned, api-key protected service with `getWidget` and `createWidget`.
pub fn widget_service() -> WidgetService {
    let mut fixture = ServiceFixture::versioned().with_api_key();
    let root = fixture.root;
    let widget = fixture.widget();

    let get_widget = fixture.operation(root, "getWidget", Verb::Get, "/widgets/{name}");
    fixture.path_param(get_widget, "name");
    fixture.api_version_param(get_widget);
    fixture.respond_json(get_widget, widget);

    let create_widget = fixture.operation(root, "createWidget", Verb::Put, "/widgets/{name}");
    fixture.path_param(create_widget, "name");
    fixture.api_version_param(create_widget);
    fixture.builder.parameter(create_widget, "widget", widget, HttpBinding::Body);
    fixture.respond_json(create_widget, widget);

    WidgetService {
        graph: fixture.finish(),
        root,
        widget,
        get_widget,
        create_widget,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_declares_endpoint_server() {
        let fixture = ServiceFixture::new();
        let root = fixture.root;
        let graph = fixture.finish();

        let service = graph.service(root).expect("root should be a service");
        assert_eq!(service.servers.len(), 1);
        assert_eq!(service.servers[0].url, "{endpoint}");
    }

    #[test]
    fn test_widget_service_shape() {
        let service = widget_service();
        let decl = service.graph.operation(service.create_widget);
        assert_eq!(decl.binding.bodies.len(), 1);
        assert_eq!(decl.binding.parameters.len(), 2);
        assert_eq!(service.graph.container(service.root).operations.len(), 2);
    }
}
