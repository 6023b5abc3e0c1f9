//! Wire-level projection of an operation.
//!
//! Builds the path/query/header parameters, the body, the responses and the
//! synthesized `Content-Type`/`Accept` headers, then ties every wire
//! parameter back to the method or client parameter that supplies it.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::trace;

use super::{ProjectionError, ProjectionSession};
use crate::base::text_utils::{lower_first, pascal_case};
use crate::base::{Access, ContainerId, DeclRef, OperationId, PropertyId, SdkTypeId, UsageFlags};
use crate::diagnostics::codes;
use crate::graph::{HttpBinding, LiteralValue, ParamLocation, StatusCodes};
use crate::model::{
    BuiltinKind, ParamRef, PropertyKind, SdkHttpOperation, SdkHttpResponse, SdkProperty,
    SdkResponseHeader,
};

pub(crate) const JSON: &str = "application/json";

fn is_json(content_type: &str) -> bool {
    content_type.contains("json")
}

/// Usage bits implied by a set of content types.
pub(crate) fn format_usage(content_types: &[SmolStr]) -> UsageFlags {
    let mut usage = UsageFlags::NONE;
    for ct in content_types {
        if ct.contains("merge-patch+json") {
            usage |= UsageFlags::JSON_MERGE_PATCH | UsageFlags::JSON;
        } else if is_json(ct) {
            usage |= UsageFlags::JSON;
        } else if ct.starts_with("multipart/") {
            usage |= UsageFlags::MULTIPART_FORM_DATA;
        } else if ct.contains("xml") {
            usage |= UsageFlags::XML;
        }
    }
    usage
}

fn default_content_type(content_types: &[SmolStr]) -> Option<SmolStr> {
    content_types
        .iter()
        .find(|ct| ct.as_str() == JSON)
        .or_else(|| content_types.first())
        .cloned()
}

type ResponseMap = IndexMap<StatusCodes, SdkHttpResponse>;

impl<'g> ProjectionSession<'g> {
    pub(crate) fn project_http_operation(
        &mut self,
        op: OperationId,
        client: ContainerId,
        access: Access,
        method_params: &mut Vec<Arc<SdkProperty>>,
    ) -> Result<SdkHttpOperation, ProjectionError> {
        let graph = self.graph;
        let decl = graph.operation(op);
        let cross_id = self.operation_cross_id(op);

        let (responses, exceptions) = self.project_responses(op, access)?;

        let mut parameters = Vec::with_capacity(decl.binding.parameters.len());
        for http_param in &decl.binding.parameters {
            let prop = graph.property(http_param.property);
            if graph.is_void_like(prop.ty) {
                continue;
            }
            let param = self.project_wire_parameter(op, http_param.property, http_param.location, client)?;
            if param.is_body() {
                return Err(ProjectionError::UnexpectedParameterKind {
                    param: prop.name.to_string(),
                    expected: "path, query or header",
                    found: "body",
                    property: http_param.property,
                });
            }
            self.seed(param.ty, UsageFlags::INPUT, access);
            parameters.push(param);
        }

        let mut body = self.project_body(op, client, access)?;

        if let Some(body) = &body {
            let has_content_type = parameters
                .iter()
                .any(|p| p.is_header() && p.serialized_name.eq_ignore_ascii_case("content-type"));
            if !has_content_type {
                let content_types = body.content_types().to_vec();
                let header = self.content_negotiation_header(
                    op,
                    &cross_id,
                    "contentType",
                    "Content-Type",
                    &content_types,
                    body.optional,
                    false,
                );
                add_method_param(method_params, &header);
                parameters.push(header);
            }
        }

        let accept_types = responses
            .values()
            .chain(exceptions.values())
            .find(|r| r.ty.is_some())
            .map(|r| r.content_types.clone());
        if let Some(content_types) = accept_types {
            let has_accept = parameters
                .iter()
                .any(|p| p.is_header() && p.serialized_name.eq_ignore_ascii_case("accept"));
            if !has_accept {
                let header = self.content_negotiation_header(
                    op,
                    &cross_id,
                    "accept",
                    "Accept",
                    &content_types,
                    false,
                    true,
                );
                add_method_param(method_params, &header);
                parameters.push(header);
            }
        }

        self.drop_unused_path_parameters(&parameters, method_params);

        for param in parameters.iter().filter(|p| p.on_client) {
            let mut elevated = param.clone();
            elevated.kind = PropertyKind::Method;
            elevated.serialized_name = param.name.clone();
            self.elevate_client_parameter(client, elevated);
        }

        for param in parameters.iter_mut() {
            param.corresponding_method_params =
                self.resolve_correspondence(op, client, method_params, param)?;
        }
        if let Some(body) = body.as_mut() {
            body.corresponding_method_params =
                self.resolve_correspondence(op, client, method_params, body)?;
        }

        Ok(SdkHttpOperation {
            origin: op,
            verb: decl.binding.verb,
            path: decl.binding.path.clone(),
            parameters,
            body,
            responses,
            exceptions,
        })
    }

    // ========================================================================
    // PARAMETERS
    // ========================================================================

    /// Project a wire parameter. `location` overrides the property's binding.
    pub(crate) fn project_wire_parameter(
        &mut self,
        op: OperationId,
        pid: PropertyId,
        location: Option<ParamLocation>,
        client: ContainerId,
    ) -> Result<SdkProperty, ProjectionError> {
        let graph = self.graph;
        let p = graph.property(pid);
        let location = location.or(match &p.binding {
            Some(HttpBinding::Header(_)) => Some(ParamLocation::Header),
            Some(HttpBinding::Query(_)) => Some(ParamLocation::Query),
            Some(HttpBinding::Path(_)) => Some(ParamLocation::Path),
            Some(HttpBinding::Body | HttpBinding::BodyRoot) => Some(ParamLocation::Body),
            Some(HttpBinding::StatusCode) | None => None,
        });
        let Some(location) = location else {
            return Err(ProjectionError::UnclassifiedParameter {
                operation: graph.operation(op).name.to_string(),
                param: p.name.to_string(),
                property: pid,
            });
        };

        let kind = match location {
            ParamLocation::Path => PropertyKind::Path { url_encode: true },
            ParamLocation::Query => PropertyKind::Query { explode: false },
            ParamLocation::Header => PropertyKind::Header,
            ParamLocation::Body => PropertyKind::Body {
                content_types: vec![SmolStr::new(JSON)],
                default_content_type: SmolStr::new(JSON),
            },
        };
        let ty = self.project_type(p.ty)?;
        let cross_id = self.operation_cross_id(op);
        Ok(self.parameter_from_decl(pid, ty, kind, &cross_id, client))
    }

    /// Common fields of any parameter projected from a property declaration.
    pub(crate) fn parameter_from_decl(
        &self,
        pid: PropertyId,
        ty: SdkTypeId,
        kind: PropertyKind,
        owner_id: &str,
        client: ContainerId,
    ) -> SdkProperty {
        let p = self.graph.property(pid);
        let mut prop = SdkProperty::new(p.name.clone(), ty, kind);
        prop.origin = Some(pid);
        prop.client_name = self
            .overrides
            .client_name(pid)
            .cloned()
            .unwrap_or_else(|| p.name.clone());
        prop.serialized_name = match &p.binding {
            Some(HttpBinding::Header(n) | HttpBinding::Query(n) | HttpBinding::Path(n)) => n.clone(),
            _ => p.serialized_name().into(),
        };
        prop.optional = p.optional;
        prop.client_default_value = p.default_value.clone();
        prop.cross_language_id = format!("{}.{}", owner_id, p.name).into();
        prop.deprecation = p.deprecation.clone();
        prop.doc = p.doc.clone();
        self.apply_client_parameter_info(&mut prop, client);
        prop
    }

    /// Mark api-version and subscription parameters as client scoped.
    pub(crate) fn apply_client_parameter_info(&self, prop: &mut SdkProperty, client: ContainerId) {
        let graph = self.graph;
        if let Some(service) = graph.service(client) {
            prop.api_versions = service.api_versions.clone();
            if is_api_version_name(&prop.name) && !service.api_versions.is_empty() {
                prop.is_api_version_param = true;
                prop.on_client = true;
                prop.client_default_value = self
                    .options
                    .selected_version(&service.api_versions)
                    .map(|v| LiteralValue::String(v.clone()));
            }
        }
        if self.is_arm(client) && is_subscription_id_name(&prop.name) {
            prop.on_client = true;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn content_negotiation_header(
        &mut self,
        op: OperationId,
        cross_id: &str,
        name: &str,
        serialized_name: &str,
        content_types: &[SmolStr],
        optional: bool,
        is_accept: bool,
    ) -> SdkProperty {
        let content_types: Vec<SmolStr> = if content_types.is_empty() {
            vec![SmolStr::new(JSON)]
        } else {
            content_types.to_vec()
        };
        let ty = match content_types.as_slice() {
            [only] if is_accept || is_json(only) => {
                let suffix = if is_accept { "Accept" } else { "ContentType" };
                let candidate = format!("{}{}", pascal_case(&self.graph.operation(op).name), suffix);
                let constant_name = self.synthesized_name(&candidate);
                self.constant(LiteralValue::String(only.clone()), Some(constant_name))
            }
            _ => self.builtin(BuiltinKind::String, "string"),
        };
        let mut header = SdkProperty::new(name, ty, PropertyKind::Header);
        header.serialized_name = serialized_name.into();
        header.optional = optional;
        header.is_generated_name = true;
        header.cross_language_id = format!("{}.{}", cross_id, name).into();
        header
    }

    /// Remove method parameters bound to path segments the operation does not have.
    fn drop_unused_path_parameters(&self, wire: &[SdkProperty], method_params: &mut Vec<Arc<SdkProperty>>) {
        let graph = self.graph;
        let wire_roots: Vec<PropertyId> = wire
            .iter()
            .filter(|p| matches!(p.kind, PropertyKind::Path { .. }))
            .filter_map(|p| p.origin.map(|o| graph.root_source_property(o)))
            .collect();
        method_params.retain(|m| {
            let Some(origin) = m.origin else {
                return true;
            };
            let is_path = matches!(graph.property(origin).binding, Some(HttpBinding::Path(_)));
            !is_path || wire_roots.contains(&graph.root_source_property(origin))
        });
    }

    // ========================================================================
    // BODY
    // ========================================================================

    fn project_body(
        &mut self,
        op: OperationId,
        client: ContainerId,
        access: Access,
    ) -> Result<Option<SdkProperty>, ProjectionError> {
        let graph = self.graph;
        let decl = graph.operation(op);
        let Some(first) = decl.binding.bodies.first() else {
            return Ok(None);
        };

        let effective = self.effective_payload_type(first.ty);
        for other in &decl.binding.bodies[1..] {
            if self.effective_payload_type(other.ty) != effective {
                return Err(ProjectionError::DivergentBodyTypes {
                    operation: decl.name.to_string(),
                    target: op,
                });
            }
        }
        if graph.is_void_like(first.ty) {
            return Ok(None);
        }

        let mut content_types: Vec<SmolStr> = Vec::new();
        for body in &decl.binding.bodies {
            for ct in &body.content_types {
                if !content_types.contains(ct) {
                    content_types.push(ct.clone());
                }
            }
        }
        if content_types.is_empty() {
            content_types.push(SmolStr::new(JSON));
        }
        let default = default_content_type(&content_types).unwrap_or_else(|| SmolStr::new(JSON));
        let kind = PropertyKind::Body {
            content_types: content_types.clone(),
            default_content_type: default,
        };

        let ty = self.project_type(first.ty)?;
        let body = match first.property {
            Some(pid) => {
                let mut param = self.project_wire_parameter(op, pid, Some(ParamLocation::Body), client)?;
                param.kind = kind;
                param.ty = ty;
                param
            }
            None => {
                let name = match self.catalogue.model(ty) {
                    Some(model) if !model.is_generated_name => lower_first(&model.name),
                    _ => "body".to_string(),
                };
                let mut param = SdkProperty::new(name, ty, kind);
                param.serialized_name = "body".into();
                param.is_generated_name = true;
                param.cross_language_id = format!("{}.body", self.operation_cross_id(op)).into();
                self.apply_client_parameter_info(&mut param, client);
                param
            }
        };

        let mut usage = UsageFlags::INPUT | format_usage(&content_types);
        let is_generated = self.catalogue.model(ty).is_some_and(|m| m.is_generated_name);
        if first.spread && is_generated {
            usage |= UsageFlags::SPREAD;
        }
        self.seed(ty, usage, access);
        self.record_body_format(ty, usage.contains(UsageFlags::MULTIPART_FORM_DATA));
        Ok(Some(body))
    }

    // ========================================================================
    // RESPONSES
    // ========================================================================

    fn project_responses(
        &mut self,
        op: OperationId,
        access: Access,
    ) -> Result<(ResponseMap, ResponseMap), ProjectionError> {
        let graph = self.graph;
        let decl = graph.operation(op);
        let mut responses = ResponseMap::new();
        let mut exceptions = ResponseMap::new();

        for binding in &decl.binding.responses {
            let mut headers = Vec::with_capacity(binding.headers.len());
            for hid in &binding.headers {
                let h = graph.property(*hid);
                if graph.is_void_like(h.ty) {
                    continue;
                }
                let ty = self.project_type(h.ty)?;
                self.seed(ty, UsageFlags::OUTPUT, access);
                headers.push(SdkResponseHeader {
                    origin: Some(*hid),
                    name: h.name.clone(),
                    serialized_name: match &h.binding {
                        Some(HttpBinding::Header(n)) => n.clone(),
                        _ => h.name.clone(),
                    },
                    ty,
                });
            }

            let payload = binding.body.as_ref().filter(|b| !graph.is_void_like(b.ty));
            let is_error_model = payload.is_some_and(|b| {
                graph
                    .model(self.effective_payload_type(b.ty))
                    .is_some_and(|m| m.is_error)
            });
            let is_exception = binding.status == StatusCodes::Wildcard || is_error_model;

            let (ty, content_types) = match payload {
                Some(b) => {
                    let ty = self.project_type(b.ty)?;
                    let content_types = if b.content_types.is_empty() {
                        vec![SmolStr::new(JSON)]
                    } else {
                        b.content_types.clone()
                    };
                    let mut usage = UsageFlags::OUTPUT | format_usage(&content_types);
                    if is_exception {
                        usage |= UsageFlags::EXCEPTION;
                    }
                    self.seed(ty, usage, access);
                    (Some(ty), content_types)
                }
                None => (None, Vec::new()),
            };

            let response = SdkHttpResponse {
                ty,
                headers,
                default_content_type: default_content_type(&content_types),
                content_types,
                description: binding.description.clone(),
            };
            let target = if is_exception {
                &mut exceptions
            } else {
                &mut responses
            };
            match target.get(&binding.status) {
                Some(existing) if existing.ty != response.ty => self.diagnostics.warning(
                    DeclRef::Operation(op),
                    codes::MULTIPLE_RESPONSE_TYPES,
                    format!(
                        "status {} of '{}' declares more than one response type; keeping the first",
                        binding.status, decl.name
                    ),
                ),
                Some(_) => {}
                None => {
                    target.insert(binding.status, response);
                }
            }
        }
        Ok((responses, exceptions))
    }

    // ========================================================================
    // CORRESPONDENCE
    // ========================================================================

    fn same_parameter(&self, candidate: &SdkProperty, wire: &SdkProperty) -> bool {
        let graph = self.graph;
        if let (Some(c), Some(w)) = (candidate.origin, wire.origin) {
            if graph.root_source_property(c) == graph.root_source_property(w) {
                return true;
            }
        }
        candidate.name == wire.name
            || candidate
                .origin
                .and_then(|c| self.overrides.parameter_alias(c))
                .is_some_and(|alias| *alias == wire.name)
    }

    /// Find the method or client parameters that supply a wire parameter.
    pub(crate) fn resolve_correspondence(
        &self,
        op: OperationId,
        client: ContainerId,
        method_params: &[Arc<SdkProperty>],
        wire: &SdkProperty,
    ) -> Result<Vec<ParamRef>, ProjectionError> {
        let method_ref = |param: &Arc<SdkProperty>| ParamRef::Method {
            param: Arc::clone(param),
        };
        let client_params = self.client_parameters_in_scope(client);

        if let Some(found) = client_params.iter().find(|c| self.same_parameter(c, wire)) {
            trace!("[HTTP] {} <- client {}", wire.serialized_name, found.name);
            return Ok(vec![method_ref(found)]);
        }
        if wire.is_api_version_param {
            if let Some(api) = client_params.iter().find(|c| c.is_api_version_param) {
                return Ok(vec![method_ref(api)]);
            }
        }
        if self.is_arm(client) && is_subscription_id_name(&wire.name) {
            if let Some(sub) = client_params.iter().find(|c| is_subscription_id_name(&c.name)) {
                return Ok(vec![method_ref(sub)]);
            }
        }

        if let Some(found) = method_params.iter().find(|m| self.same_parameter(m, wire)) {
            trace!("[HTTP] {} <- method {}", wire.serialized_name, found.name);
            return Ok(vec![method_ref(found)]);
        }

        let mut spread_shortfall: Option<(usize, usize)> = None;

        if wire.is_body() {
            if let Some(model) = self.catalogue.model(wire.ty) {
                let members = &model.properties;
                let found: Vec<ParamRef> = members
                    .iter()
                    .filter_map(|member| {
                        client_params
                            .iter()
                            .chain(method_params.iter())
                            .find(|m| self.same_parameter(m, member))
                            .map(method_ref)
                    })
                    .collect();
                if !members.is_empty() {
                    if found.len() == members.len() {
                        return Ok(found);
                    }
                    spread_shortfall = Some((members.len(), found.len()));
                }
            }
        }

        for param in method_params {
            let Some(model) = self.catalogue.model(param.ty) else {
                continue;
            };
            if let Some(member) = model.properties.iter().find(|m| self.same_parameter(m, wire)) {
                return Ok(vec![ParamRef::Property {
                    parent: Arc::clone(param),
                    property: member.name.clone(),
                }]);
            }
        }

        if let Some((expected, found)) = spread_shortfall {
            return Err(ProjectionError::SpreadNotResolved {
                operation: self.graph.operation(op).name.to_string(),
                expected,
                found,
                target: op,
            });
        }

        Err(ProjectionError::NoCorrespondingMethodParam {
            operation: self.graph.operation(op).name.to_string(),
            param: wire.serialized_name.to_string(),
            target: op,
        })
    }
}

fn add_method_param(method_params: &mut Vec<Arc<SdkProperty>>, header: &SdkProperty) {
    if method_params.iter().any(|m| m.name == header.name) {
        return;
    }
    let mut param = header.clone();
    param.kind = PropertyKind::Method;
    param.serialized_name = header.name.clone();
    method_params.push(Arc::new(param));
}

pub(crate) fn is_api_version_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("apiversion") || lower.contains("api-version")
}

pub(crate) fn is_subscription_id_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("subscriptionId")
}
