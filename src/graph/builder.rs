//! Incremental construction of a [`Graph`].

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::container::{ContainerDecl, ContainerKind, ServiceDecl};
use super::decl::{
    EnumDecl, EnumMemberDecl, HttpBinding, Intrinsic, LiteralValue, ModelDecl, PropertyDecl,
    ScalarDecl, TypeDecl, TypeDeclKind, UnionDecl, UnionVariantDecl,
};
use super::operation::{
    BodyBinding, HttpParameter, OperationBinding, OperationDecl, ParamLocation, ResponseBinding,
    Verb, VersionRange,
};
use super::overrides::Overrides;
use super::Graph;
use crate::base::{ContainerId, OperationId, PropertyId, TypeDeclId};

/// Builds a [`Graph`]. Standard scalars and intrinsics are interned so that
/// asking for `string` twice yields the same declaration.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
    std_scalars: FxHashMap<SmolStr, TypeDeclId>,
    intrinsics: FxHashMap<u8, TypeDeclId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Graph {
        self.graph
    }

    pub fn overrides_mut(&mut self) -> &mut Overrides {
        &mut self.graph.overrides
    }

    // ========================================================================
    // CONTAINERS
    // ========================================================================

    fn container(&mut self, name: &str, kind: ContainerKind, parent: Option<ContainerId>) -> ContainerId {
        let id = ContainerId::new(self.graph.containers.len());
        self.graph.containers.push(ContainerDecl::new(name, kind, parent));
        if let Some(parent) = parent {
            self.graph.containers[parent.index()].children.push(id);
        }
        id
    }

    pub fn namespace(&mut self, name: &str, parent: Option<ContainerId>) -> ContainerId {
        self.container(name, ContainerKind::Namespace, parent)
    }

    pub fn interface(&mut self, name: &str, parent: Option<ContainerId>) -> ContainerId {
        self.container(name, ContainerKind::Interface, parent)
    }

    /// Mark `container` as a service root.
    pub fn set_service(&mut self, container: ContainerId, service: ServiceDecl) {
        self.graph.containers[container.index()].service = Some(service);
    }

    /// Service metadata of `container`, creating an empty service if needed.
    pub fn service_mut(&mut self, container: ContainerId) -> &mut ServiceDecl {
        self.graph.containers[container.index()]
            .service
            .get_or_insert_with(ServiceDecl::default)
    }

    // ========================================================================
    // TYPES
    // ========================================================================

    pub fn add_type(&mut self, decl: TypeDecl) -> TypeDeclId {
        let id = TypeDeclId::new(self.graph.types.len());
        self.graph.types.push(decl);
        id
    }

    pub fn type_mut(&mut self, id: TypeDeclId) -> &mut TypeDecl {
        &mut self.graph.types[id.index()]
    }

    pub fn model_mut(&mut self, id: TypeDeclId) -> Option<&mut ModelDecl> {
        match &mut self.graph.types[id.index()].kind {
            TypeDeclKind::Model(m) => Some(m),
            _ => None,
        }
    }

    /// A standard scalar such as `string`, `int32` or `utcDateTime`.
    pub fn scalar(&mut self, name: &str) -> TypeDeclId {
        if let Some(&id) = self.std_scalars.get(name) {
            return id;
        }
        let id = self.add_type(TypeDecl::new(TypeDeclKind::Scalar(ScalarDecl {
            name: name.into(),
            namespace: None,
            base: None,
            encode: None,
        })));
        self.std_scalars.insert(name.into(), id);
        id
    }

    pub fn custom_scalar(&mut self, name: &str, namespace: ContainerId, base: TypeDeclId) -> TypeDeclId {
        self.add_type(TypeDecl::new(TypeDeclKind::Scalar(ScalarDecl {
            name: name.into(),
            namespace: Some(namespace),
            base: Some(base),
            encode: None,
        })))
    }

    /// A scalar with an explicit wire encoding, e.g. `utcDateTime` as `rfc7231`.
    pub fn encoded_scalar(&mut self, name: &str, encode: &str) -> TypeDeclId {
        let base = self.scalar(name);
        self.add_type(TypeDecl::new(TypeDeclKind::Scalar(ScalarDecl {
            name: name.into(),
            namespace: None,
            base: Some(base),
            encode: Some(encode.into()),
        })))
    }

    pub fn intrinsic(&mut self, intrinsic: Intrinsic) -> TypeDeclId {
        let key = intrinsic as u8;
        if let Some(&id) = self.intrinsics.get(&key) {
            return id;
        }
        let id = self.add_type(TypeDecl::new(TypeDeclKind::Intrinsic(intrinsic)));
        self.intrinsics.insert(key, id);
        id
    }

    pub fn literal(&mut self, value: LiteralValue) -> TypeDeclId {
        self.add_type(TypeDecl::new(TypeDeclKind::Literal(value)))
    }

    pub fn string_literal(&mut self, value: &str) -> TypeDeclId {
        self.literal(LiteralValue::String(value.into()))
    }

    /// An enum whose members take their names as string values.
    pub fn enum_type(&mut self, name: &str, namespace: Option<ContainerId>, members: &[&str]) -> TypeDeclId {
        let enum_id = self.add_type(TypeDecl::new(TypeDeclKind::Enum(EnumDecl {
            name: name.into(),
            namespace,
            members: Vec::new(),
        })));
        let mut member_ids = Vec::with_capacity(members.len());
        for member in members {
            member_ids.push(self.add_type(TypeDecl::new(TypeDeclKind::EnumMember(EnumMemberDecl {
                name: (*member).into(),
                value: None,
                parent: enum_id,
                lro_state: None,
            }))));
        }
        if let TypeDeclKind::Enum(e) = &mut self.graph.types[enum_id.index()].kind {
            e.members = member_ids;
        }
        enum_id
    }

    pub fn enum_members(&self, enum_id: TypeDeclId) -> &[TypeDeclId] {
        match &self.graph.types[enum_id.index()].kind {
            TypeDeclKind::Enum(e) => &e.members,
            _ => &[],
        }
    }

    pub fn union(&mut self, name: Option<&str>, namespace: Option<ContainerId>, variants: &[TypeDeclId]) -> TypeDeclId {
        self.add_type(TypeDecl::new(TypeDeclKind::Union(UnionDecl {
            name: name.map(SmolStr::new),
            namespace,
            variants: variants
                .iter()
                .map(|ty| UnionVariantDecl {
                    name: None,
                    ty: *ty,
                    lro_state: None,
                })
                .collect(),
        })))
    }

    /// `T | null`.
    pub fn nullable(&mut self, ty: TypeDeclId) -> TypeDeclId {
        let null = self.intrinsic(Intrinsic::Null);
        self.union(None, None, &[ty, null])
    }

    pub fn array(&mut self, element: TypeDeclId) -> TypeDeclId {
        self.add_type(TypeDecl::new(TypeDeclKind::Array(element)))
    }

    pub fn record(&mut self, value: TypeDeclId) -> TypeDeclId {
        self.add_type(TypeDecl::new(TypeDeclKind::Record(value)))
    }

    pub fn model(&mut self, name: &str, namespace: Option<ContainerId>) -> TypeDeclId {
        self.add_type(TypeDecl::new(TypeDeclKind::Model(ModelDecl {
            name: Some(name.into()),
            namespace,
            ..ModelDecl::default()
        })))
    }

    pub fn anonymous_model(&mut self) -> TypeDeclId {
        self.add_type(TypeDecl::new(TypeDeclKind::Model(ModelDecl::default())))
    }

    pub fn error_model(&mut self, name: &str, namespace: Option<ContainerId>) -> TypeDeclId {
        let id = self.model(name, namespace);
        if let Some(m) = self.model_mut(id) {
            m.is_error = true;
        }
        id
    }

    pub fn set_base(&mut self, derived: TypeDeclId, base: TypeDeclId) {
        if let Some(m) = self.model_mut(derived) {
            m.base = Some(base);
        }
        if let Some(m) = self.model_mut(base) {
            m.derived.push(derived);
        }
    }

    pub fn set_discriminator(&mut self, model: TypeDeclId, property: &str) {
        if let Some(m) = self.model_mut(model) {
            m.discriminator = Some(property.into());
        }
    }

    // ========================================================================
    // PROPERTIES
    // ========================================================================

    fn add_property(&mut self, decl: PropertyDecl) -> PropertyId {
        let id = PropertyId::new(self.graph.properties.len());
        self.graph.properties.push(decl);
        id
    }

    /// Add a property to a composite.
    pub fn property(&mut self, model: TypeDeclId, name: &str, ty: TypeDeclId) -> PropertyId {
        let mut decl = PropertyDecl::new(name, ty);
        decl.model = Some(model);
        let id = self.add_property(decl);
        if let Some(m) = self.model_mut(model) {
            m.properties.push(id);
        }
        id
    }

    /// A property owned by nothing: response headers and server arguments.
    pub fn free_property(&mut self, name: &str, ty: TypeDeclId, binding: Option<HttpBinding>) -> PropertyId {
        let mut decl = PropertyDecl::new(name, ty);
        decl.binding = binding;
        self.add_property(decl)
    }

    pub fn property_mut(&mut self, id: PropertyId) -> &mut PropertyDecl {
        &mut self.graph.properties[id.index()]
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    pub fn operation(&mut self, container: ContainerId, name: &str, verb: Verb, path: &str) -> OperationId {
        let id = OperationId::new(self.graph.operations.len());
        self.graph.operations.push(OperationDecl {
            name: name.into(),
            container,
            parameters: Vec::new(),
            binding: OperationBinding {
                verb,
                path: path.into(),
                parameters: Vec::new(),
                bodies: Vec::new(),
                responses: Vec::new(),
            },
            paging: None,
            lro: None,
            versions: VersionRange::default(),
            deprecation: None,
            doc: None,
        });
        self.graph.containers[container.index()].operations.push(id);
        id
    }

    pub fn operation_mut(&mut self, id: OperationId) -> &mut OperationDecl {
        &mut self.graph.operations[id.index()]
    }

    /// Declare an operation parameter and wire it according to `binding`.
    ///
    /// Body bindings register an explicit request body; every other binding
    /// registers a wire parameter.
    pub fn parameter(&mut self, op: OperationId, name: &str, ty: TypeDeclId, binding: HttpBinding) -> PropertyId {
        let location = match &binding {
            HttpBinding::Header(_) => Some(ParamLocation::Header),
            HttpBinding::Query(_) => Some(ParamLocation::Query),
            HttpBinding::Path(_) => Some(ParamLocation::Path),
            HttpBinding::Body | HttpBinding::BodyRoot => Some(ParamLocation::Body),
            HttpBinding::StatusCode => None,
        };
        let id = self.free_property(name, ty, Some(binding));
        let operation = &mut self.graph.operations[op.index()];
        operation.parameters.push(id);
        match location {
            Some(ParamLocation::Body) => operation.binding.bodies.push(BodyBinding {
                property: Some(id),
                ty,
                content_types: Vec::new(),
                spread: false,
            }),
            _ => operation.binding.parameters.push(HttpParameter {
                property: id,
                location,
            }),
        }
        id
    }

    /// Declare an operation parameter that is not on the wire.
    pub fn method_parameter(&mut self, op: OperationId, name: &str, ty: TypeDeclId) -> PropertyId {
        let id = self.free_property(name, ty, None);
        self.graph.operations[op.index()].parameters.push(id);
        id
    }

    /// Register a wire parameter that was never given a location.
    pub fn unbound_wire_parameter(&mut self, op: OperationId, property: PropertyId) {
        self.graph.operations[op.index()]
            .binding
            .parameters
            .push(HttpParameter {
                property,
                location: None,
            });
    }

    /// Build an anonymous body out of `params` and register it as a spread body.
    pub fn spread_body(&mut self, op: OperationId, params: &[PropertyId], content_types: &[&str]) -> TypeDeclId {
        let body = self.anonymous_model();
        for param in params {
            let source = self.graph.properties[param.index()].clone();
            let copy = self.property(body, &source.name, source.ty);
            let decl = self.property_mut(copy);
            decl.optional = source.optional;
            decl.wire_name = source.wire_name.clone();
            decl.source_property = Some(*param);
        }
        self.set_body(op, BodyBinding {
            property: None,
            ty: body,
            content_types: content_types.iter().map(|c| SmolStr::new(c)).collect(),
            spread: true,
        });
        body
    }

    pub fn set_body(&mut self, op: OperationId, body: BodyBinding) {
        self.graph.operations[op.index()].binding.bodies.push(body);
    }

    pub fn response(&mut self, op: OperationId, response: ResponseBinding) {
        self.graph.operations[op.index()].binding.responses.push(response);
    }
}
