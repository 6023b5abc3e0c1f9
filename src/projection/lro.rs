//! Long-running operation linkage.
//!
//! An initiating operation is linked to its polling operation by finding a
//! value for every polling parameter. Values come from, in order:
//!
//! 1. explicit mapping directives
//! 2. the initiating request parameters
//! 3. the initiating request body
//! 4. the initiating response headers and body
//!
//! The polling response is then searched for a status monitor.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{trace, warn};

use super::{ProjectionError, ProjectionSession};
use crate::base::{Access, DeclRef, OperationId, PropertyId, TypeDeclId, UsageFlags};
use crate::diagnostics::codes;
use crate::graph::{
    HttpBinding, LiteralValue, LroDecl, LroState, ParameterSource, StatusCodes, TypeDeclKind,
};
use crate::model::{
    LinkLocation, LroLink, MonitorProperty, OperationLink, PropertyMapping, SourceKind,
    StatusMonitorMetadata, TerminalStates,
};

const OPERATION_LOCATION: &str = "operation-location";
const STATUS_NAMES: [&str; 2] = ["status", "provisioningState"];

#[derive(Debug, Clone)]
struct LinkSource {
    kind: SourceKind,
    name: SmolStr,
    property: PropertyId,
    /// Polling parameter this source was explicitly marked to fill.
    marker: Option<SmolStr>,
}

impl LinkSource {
    fn is_request(&self) -> bool {
        matches!(self.kind, SourceKind::RequestParameter | SourceKind::RequestBody)
    }

    fn fills(&self, target: &str) -> bool {
        self.name == target || self.marker.as_deref() == Some(target)
    }
}

impl<'g> ProjectionSession<'g> {
    /// Link `initiating` to the polling operation named by `lro`.
    ///
    /// Returns `None` when some polling parameter cannot be supplied.
    pub(crate) fn link_lro(
        &mut self,
        initiating: OperationId,
        lro: &LroDecl,
        access: Access,
    ) -> Result<Option<LroLink>, ProjectionError> {
        let graph = self.graph;
        let polling = lro.polling_operation;
        let sources = self.link_sources(initiating);
        let targets = self.link_targets(polling);

        let mut parameter_map: IndexMap<SmolStr, PropertyMapping> = IndexMap::new();

        for directive in &lro.parameters {
            let Some((target_name, target_property)) =
                targets.iter().find(|(name, _)| *name == directive.target)
            else {
                self.diagnostics.error(
                    DeclRef::Operation(initiating),
                    codes::OPERATION_LINK_PARAMETER_INVALID_TARGET,
                    format!(
                        "'{}' is not a parameter of polling operation '{}'",
                        directive.target,
                        graph.operation(polling).name
                    ),
                );
                continue;
            };
            if parameter_map.contains_key(target_name) {
                self.diagnostics.error(
                    DeclRef::Operation(initiating),
                    codes::CONFLICTING_PARAMETER_MAPPING,
                    format!("polling parameter '{}' is mapped more than once", target_name),
                );
                continue;
            }

            let source = match &directive.source {
                ParameterSource::RequestParameter(name) => {
                    let found = sources.iter().find(|s| s.is_request() && s.name == *name);
                    if found.is_none() {
                        self.diagnostics.error(
                            DeclRef::Operation(initiating),
                            codes::REQUEST_PARAMETER_INVALID,
                            format!("'{}' is not a request parameter of '{}'", name, graph.operation(initiating).name),
                        );
                    }
                    found
                }
                ParameterSource::ResponseProperty(name) => {
                    let found = sources.iter().find(|s| !s.is_request() && s.name == *name);
                    if found.is_none() {
                        self.diagnostics.error(
                            DeclRef::Operation(initiating),
                            codes::RESPONSE_PROPERTY_INVALID,
                            format!("'{}' is not a response property of '{}'", name, graph.operation(initiating).name),
                        );
                    }
                    found
                }
            };
            if let Some(source) = source {
                parameter_map.insert(target_name.clone(), mapping(source, target_name, *target_property));
            }
        }

        for (target_name, target_property) in &targets {
            if parameter_map.contains_key(target_name) {
                continue;
            }
            if let Some(source) = sources.iter().find(|s| s.fills(target_name)) {
                trace!("[LRO] {} <- {:?} {}", target_name, source.kind, source.name);
                parameter_map.insert(target_name.clone(), mapping(source, target_name, *target_property));
            }
        }

        let unmatched: Vec<&str> = targets
            .iter()
            .filter(|(name, _)| !parameter_map.contains_key(name))
            .map(|(name, _)| name.as_str())
            .collect();
        if !unmatched.is_empty() {
            warn!(
                "[LRO] cannot link {} to {}: unmatched {:?}",
                graph.operation(initiating).name,
                graph.operation(polling).name,
                unmatched
            );
            self.diagnostics.warning(
                DeclRef::Operation(initiating),
                codes::LRO_INVALID_LINK,
                format!(
                    "no value found for polling parameter(s) {} of '{}'",
                    unmatched.join(", "),
                    graph.operation(polling).name
                ),
            );
            return Ok(None);
        }

        let polling_link = self.polling_link(initiating);
        let status_monitor = self.status_monitor(polling, access)?;
        Ok(Some(LroLink {
            polling_operation: self.operation_ref(polling),
            parameter_map,
            polling_link,
            status_monitor,
        }))
    }

    fn link_sources(&self, op: OperationId) -> Vec<LinkSource> {
        let graph = self.graph;
        let decl = graph.operation(op);
        let source = |kind: SourceKind, pid: PropertyId| {
            let p = graph.property(pid);
            LinkSource {
                kind,
                name: p.name.clone(),
                property: pid,
                marker: p.markers.polling_parameter.clone(),
            }
        };

        let mut sources: Vec<LinkSource> = decl
            .binding
            .parameters
            .iter()
            .map(|p| source(SourceKind::RequestParameter, p.property))
            .collect();
        for body in &decl.binding.bodies {
            for pid in self.payload_properties(body.ty) {
                sources.push(source(SourceKind::RequestBody, pid));
            }
        }
        for response in &decl.binding.responses {
            for header in &response.headers {
                sources.push(source(SourceKind::ResponseHeader, *header));
            }
            if let Some(body) = &response.body {
                for pid in self.payload_properties(body.ty) {
                    sources.push(source(SourceKind::ResponseBody, pid));
                }
            }
        }
        sources
    }

    fn link_targets(&self, polling: OperationId) -> Vec<(SmolStr, PropertyId)> {
        let graph = self.graph;
        let decl = graph.operation(polling);
        let mut targets: Vec<(SmolStr, PropertyId)> = decl
            .binding
            .parameters
            .iter()
            .filter(|p| !graph.is_void_like(graph.property(p.property).ty))
            .map(|p| (graph.property(p.property).name.clone(), p.property))
            .collect();
        for body in &decl.binding.bodies {
            for pid in self.payload_properties(body.ty) {
                targets.push((graph.property(pid).name.clone(), pid));
            }
        }
        targets
    }

    /// Payload members of a composite, looking through unions.
    fn payload_properties(&self, ty: TypeDeclId) -> Vec<PropertyId> {
        let graph = self.graph;
        let mut out = Vec::new();
        let mut stack = vec![self.effective_payload_type(ty)];
        let mut seen = Vec::new();
        while let Some(current) = stack.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            match &graph.type_decl(current).kind {
                TypeDeclKind::Model(_) => out.extend(
                    graph
                        .all_properties(current)
                        .into_iter()
                        .filter(|p| !graph.property(*p).is_metadata()),
                ),
                TypeDeclKind::Union(u) => stack.extend(u.variants.iter().rev().map(|v| v.ty)),
                _ => {}
            }
        }
        out
    }

    /// First `operation-location` header, else the first property marked as the polling location.
    fn polling_link(&self, op: OperationId) -> Option<OperationLink> {
        let graph = self.graph;
        let decl = graph.operation(op);

        for response in &decl.binding.responses {
            for header in &response.headers {
                let p = graph.property(*header);
                let wire = match &p.binding {
                    Some(HttpBinding::Header(name)) => name.as_str(),
                    _ => p.name.as_str(),
                };
                if wire.eq_ignore_ascii_case(OPERATION_LOCATION) {
                    return Some(OperationLink {
                        location: LinkLocation::ResponseHeader,
                        name: SmolStr::new(wire),
                        property: *header,
                    });
                }
            }
        }

        for response in &decl.binding.responses {
            for header in &response.headers {
                if graph.property(*header).markers.polling_location {
                    return Some(OperationLink {
                        location: LinkLocation::ResponseHeader,
                        name: graph.property(*header).name.clone(),
                        property: *header,
                    });
                }
            }
            if let Some(body) = &response.body {
                for pid in self.payload_properties(body.ty) {
                    if graph.property(pid).markers.polling_location {
                        return Some(OperationLink {
                            location: LinkLocation::ResponseBody,
                            name: graph.property(pid).name.clone(),
                            property: pid,
                        });
                    }
                }
            }
        }
        None
    }

    // ========================================================================
    // STATUS MONITOR
    // ========================================================================

    /// Find the status monitor in the polling operation's success responses.
    pub(crate) fn status_monitor(
        &mut self,
        polling: OperationId,
        access: Access,
    ) -> Result<Option<StatusMonitorMetadata>, ProjectionError> {
        let graph = self.graph;
        let decl = graph.operation(polling);

        let candidates: Vec<TypeDeclId> = decl
            .binding
            .responses
            .iter()
            .filter(|r| r.status != StatusCodes::Wildcard)
            .filter_map(|r| r.body.as_ref())
            .map(|b| b.ty)
            .collect();

        for ty in candidates {
            let Some((monitor, status)) = self.find_status_property(ty) else {
                continue;
            };
            let states = self.terminal_states(graph.property(status).ty);
            if states.succeeded.is_empty() || states.failed.is_empty() {
                trace!("[LRO] status property of {} has no terminal states", monitor);
                continue;
            }

            let properties = graph.all_properties(monitor);
            let success = properties.iter().copied().find(|p| {
                let p = graph.property(*p);
                p.markers.result || p.name == "result"
            });
            let error = properties.iter().copied().find(|p| {
                let p = graph.property(*p);
                p.markers.error_result || p.name == "error"
            });

            let monitor_type = self.project_type(monitor)?;
            self.seed(monitor_type, UsageFlags::OUTPUT | UsageFlags::JSON, access);
            let status_property = self.monitor_property(status)?;
            let success_property = success.map(|p| self.monitor_property(p)).transpose()?;
            let error_property = error.map(|p| self.monitor_property(p)).transpose()?;
            return Ok(Some(StatusMonitorMetadata {
                monitor_type,
                status_property,
                terminal_states: states,
                success_property,
                error_property,
            }));
        }
        Ok(None)
    }

    fn monitor_property(&mut self, pid: PropertyId) -> Result<MonitorProperty, ProjectionError> {
        let p = self.graph.property(pid);
        Ok(MonitorProperty {
            origin: pid,
            name: p.name.clone(),
            serialized_name: p.serialized_name().into(),
            ty: self.project_type(p.ty)?,
        })
    }

    /// The monitor composite and its status property, looking through unions
    /// and one level of `properties` nesting.
    fn find_status_property(&self, ty: TypeDeclId) -> Option<(TypeDeclId, PropertyId)> {
        let graph = self.graph;
        let ty = self.effective_payload_type(ty);
        match &graph.type_decl(ty).kind {
            TypeDeclKind::Union(u) => u.variants.iter().find_map(|v| self.find_status_property(v.ty)),
            TypeDeclKind::Model(_) => {
                let properties = graph.all_properties(ty);
                let direct = properties
                    .iter()
                    .copied()
                    .find(|p| graph.property(*p).markers.status)
                    .or_else(|| {
                        properties
                            .iter()
                            .copied()
                            .find(|p| STATUS_NAMES.contains(&graph.property(*p).name.as_str()))
                    });
                if let Some(status) = direct {
                    return Some((ty, status));
                }
                let nested = properties
                    .iter()
                    .copied()
                    .find(|p| graph.property(*p).name == "properties")?;
                let nested_ty = graph.property(nested).ty;
                graph
                    .all_properties(nested_ty)
                    .into_iter()
                    .find(|p| {
                        let p = graph.property(*p);
                        p.markers.status || STATUS_NAMES.contains(&p.name.as_str())
                    })
                    .map(|status| (ty, status))
            }
            _ => None,
        }
    }

    fn terminal_states(&self, ty: TypeDeclId) -> TerminalStates {
        let mut states = TerminalStates::default();
        self.collect_states(ty, &mut states, 0);
        states
    }

    fn collect_states(&self, ty: TypeDeclId, states: &mut TerminalStates, depth: usize) {
        let graph = self.graph;
        if depth > 8 {
            return;
        }
        match &graph.type_decl(ty).kind {
            TypeDeclKind::Enum(e) => {
                for member in &e.members {
                    if let TypeDeclKind::EnumMember(m) = &graph.type_decl(*member).kind {
                        let value = match &m.value {
                            Some(LiteralValue::String(v)) => v.clone(),
                            _ => m.name.clone(),
                        };
                        record_state(states, value, m.lro_state);
                    }
                }
            }
            TypeDeclKind::Union(u) => {
                for variant in &u.variants {
                    match &graph.type_decl(variant.ty).kind {
                        TypeDeclKind::Literal(LiteralValue::String(v)) => {
                            record_state(states, v.clone(), variant.lro_state)
                        }
                        TypeDeclKind::Enum(_) | TypeDeclKind::Union(_) => {
                            self.collect_states(variant.ty, states, depth + 1)
                        }
                        _ => {}
                    }
                }
            }
            TypeDeclKind::Literal(LiteralValue::String(v)) => record_state(states, v.clone(), None),
            _ => {}
        }
    }
}

fn record_state(states: &mut TerminalStates, value: SmolStr, marker: Option<LroState>) {
    match marker.or_else(|| LroState::from_name(&value)) {
        Some(LroState::Succeeded) => states.succeeded.push(value.clone()),
        Some(LroState::Failed) => states.failed.push(value.clone()),
        Some(LroState::Canceled) => states.canceled.push(value.clone()),
        None => {}
    }
    if !states.states.contains(&value) {
        states.states.push(value);
    }
}

fn mapping(source: &LinkSource, target: &SmolStr, target_property: PropertyId) -> PropertyMapping {
    PropertyMapping {
        source_kind: source.kind,
        source: source.name.clone(),
        source_property: source.property,
        target: target.clone(),
        target_property,
    }
}
