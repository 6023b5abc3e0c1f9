//! Client methods and their HTTP operations.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::property::SdkProperty;
use crate::base::{Access, OperationId, PropertyId, SdkTypeId};
use crate::graph::{StatusCodes, Verb};

// ============================================================================
// HTTP OPERATION
// ============================================================================

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkResponseHeader {
    pub origin: Option<PropertyId>,
    pub name: SmolStr,
    pub serialized_name: SmolStr,
    pub ty: SdkTypeId,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkHttpResponse {
    pub ty: Option<SdkTypeId>,
    pub headers: Vec<SdkResponseHeader>,
    pub content_types: Vec<SmolStr>,
    pub default_content_type: Option<SmolStr>,
    pub description: Option<SmolStr>,
}

/// The wire-level view of a method.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkHttpOperation {
    pub origin: OperationId,
    pub verb: Verb,
    pub path: SmolStr,
    /// Path, query and header parameters.
    pub parameters: Vec<SdkProperty>,
    pub body: Option<SdkProperty>,
    pub responses: IndexMap<StatusCodes, SdkHttpResponse>,
    pub exceptions: IndexMap<StatusCodes, SdkHttpResponse>,
}

impl SdkHttpOperation {
    pub fn parameter(&self, serialized_name: &str) -> Option<&SdkProperty> {
        self.parameters
            .iter()
            .find(|p| p.serialized_name.eq_ignore_ascii_case(serialized_name))
    }

    /// Every wire parameter, body last.
    pub fn wire_parameters(&self) -> impl Iterator<Item = &SdkProperty> {
        self.parameters.iter().chain(self.body.as_ref())
    }
}

/// What a method hands back to its caller.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkMethodResponse {
    pub ty: Option<SdkTypeId>,
    /// Segments from the final payload to the value returned, for LROs.
    pub result_segments: Option<Vec<SmolStr>>,
}

// ============================================================================
// PAGING AND LRO METADATA
// ============================================================================

/// Reference to a related operation by identity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OperationRef {
    pub origin: OperationId,
    pub name: SmolStr,
    pub cross_language_id: SmolStr,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PagingMetadata {
    pub item_segments: Vec<SmolStr>,
    pub next_link_segments: Option<Vec<SmolStr>>,
    pub next_link_operation: Option<OperationRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SourceKind {
    RequestParameter,
    RequestBody,
    ResponseHeader,
    ResponseBody,
}

/// How one polling-operation parameter gets its value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PropertyMapping {
    pub source_kind: SourceKind,
    pub source: SmolStr,
    pub source_property: PropertyId,
    pub target: SmolStr,
    pub target_property: PropertyId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LinkLocation {
    ResponseHeader,
    ResponseBody,
}

/// Where the polling URL is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OperationLink {
    pub location: LinkLocation,
    pub name: SmolStr,
    pub property: PropertyId,
}

/// A property of the status monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MonitorProperty {
    pub origin: PropertyId,
    pub name: SmolStr,
    pub serialized_name: SmolStr,
    pub ty: SdkTypeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TerminalStates {
    pub succeeded: Vec<SmolStr>,
    pub failed: Vec<SmolStr>,
    pub canceled: Vec<SmolStr>,
    /// Every state the status property can take.
    pub states: Vec<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatusMonitorMetadata {
    pub monitor_type: SdkTypeId,
    pub status_property: MonitorProperty,
    pub terminal_states: TerminalStates,
    pub success_property: Option<MonitorProperty>,
    pub error_property: Option<MonitorProperty>,
}

/// Result of linking an initiating operation to its polling operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LroLink {
    pub polling_operation: OperationRef,
    /// Target parameter name to mapping; every polling parameter is present.
    pub parameter_map: IndexMap<SmolStr, PropertyMapping>,
    pub polling_link: Option<OperationLink>,
    pub status_monitor: Option<StatusMonitorMetadata>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LroMetadata {
    pub initial_operation: OperationRef,
    pub polling_operation: OperationRef,
    pub parameter_map: IndexMap<SmolStr, PropertyMapping>,
    pub polling_link: Option<OperationLink>,
    pub status_monitor: StatusMonitorMetadata,
    pub final_result: Option<SdkTypeId>,
}

// ============================================================================
// METHOD
// ============================================================================

/// A method backed by one HTTP operation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServiceMethod {
    pub operation: SdkHttpOperation,
    pub response: SdkMethodResponse,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum MethodKind {
    Basic {
        method: ServiceMethod,
    },
    Paging {
        method: ServiceMethod,
        paging: PagingMetadata,
    },
    Lro {
        method: ServiceMethod,
        lro: LroMetadata,
    },
    LroPaging {
        method: ServiceMethod,
        paging: PagingMetadata,
        lro: LroMetadata,
    },
    /// Returns a sub-client.
    ClientAccessor { client: SmolStr },
}

impl MethodKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            MethodKind::Basic { .. } => "basic",
            MethodKind::Paging { .. } => "paging",
            MethodKind::Lro { .. } => "lro",
            MethodKind::LroPaging { .. } => "lropaging",
            MethodKind::ClientAccessor { .. } => "clientaccessor",
        }
    }

    pub fn service_method(&self) -> Option<&ServiceMethod> {
        match self {
            MethodKind::Basic { method }
            | MethodKind::Paging { method, .. }
            | MethodKind::Lro { method, .. }
            | MethodKind::LroPaging { method, .. } => Some(method),
            MethodKind::ClientAccessor { .. } => None,
        }
    }

    pub fn lro(&self) -> Option<&LroMetadata> {
        match self {
            MethodKind::Lro { lro, .. } | MethodKind::LroPaging { lro, .. } => Some(lro),
            _ => None,
        }
    }

    pub fn paging(&self) -> Option<&PagingMetadata> {
        match self {
            MethodKind::Paging { paging, .. } | MethodKind::LroPaging { paging, .. } => Some(paging),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkMethod {
    pub name: SmolStr,
    pub origin: Option<OperationId>,
    pub access: Access,
    pub parameters: Vec<Arc<SdkProperty>>,
    pub api_versions: Vec<SmolStr>,
    pub cross_language_id: SmolStr,
    pub deprecation: Option<SmolStr>,
    /// Emit a typed method. Always false for client accessors.
    pub generate_convenient: bool,
    /// Emit a raw request method. Always false for client accessors.
    pub generate_protocol: bool,
    pub kind: MethodKind,
}

impl SdkMethod {
    pub fn operation(&self) -> Option<&SdkHttpOperation> {
        self.kind.service_method().map(|m| &m.operation)
    }

    pub fn response(&self) -> Option<&SdkMethodResponse> {
        self.kind.service_method().map(|m| &m.response)
    }

    pub fn parameter(&self, name: &str) -> Option<&Arc<SdkProperty>> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
