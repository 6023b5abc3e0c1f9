//! Properties and parameters of the projected model.
//!
//! Model properties, method parameters, wire parameters and client
//! parameters share one shape, told apart by [`PropertyKind`].

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{PropertyId, SdkTypeId};
use crate::graph::LiteralValue;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum PropertyKind {
    /// A member of a composite.
    Property { discriminator: bool },
    /// A parameter of a generated method or of client initialization.
    Method,
    Path { url_encode: bool },
    Query { explode: bool },
    Header,
    Body {
        content_types: Vec<SmolStr>,
        default_content_type: SmolStr,
    },
    Endpoint,
    Credential,
}

impl PropertyKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyKind::Property { .. } => "property",
            PropertyKind::Method => "method",
            PropertyKind::Path { .. } => "path",
            PropertyKind::Query { .. } => "query",
            PropertyKind::Header => "header",
            PropertyKind::Body { .. } => "body",
            PropertyKind::Endpoint => "endpoint",
            PropertyKind::Credential => "credential",
        }
    }

    pub fn is_wire(&self) -> bool {
        matches!(
            self,
            PropertyKind::Path { .. }
                | PropertyKind::Query { .. }
                | PropertyKind::Header
                | PropertyKind::Body { .. }
        )
    }
}

/// Where the value of a wire parameter comes from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum ParamRef {
    /// A method parameter or a client parameter (`on_client`).
    Method { param: Arc<SdkProperty> },
    /// A property of a composite-typed method parameter.
    Property {
        parent: Arc<SdkProperty>,
        property: SmolStr,
    },
}

impl ParamRef {
    /// The top-level parameter the value is read from.
    pub fn root(&self) -> &Arc<SdkProperty> {
        match self {
            ParamRef::Method { param } => param,
            ParamRef::Property { parent, .. } => parent,
        }
    }

    /// Dotted access path, e.g. `options.filter`.
    pub fn path(&self) -> String {
        match self {
            ParamRef::Method { param } => param.name.to_string(),
            ParamRef::Property { parent, property } => format!("{}.{}", parent.name, property),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkProperty {
    /// Declaration this was projected from; `None` when synthesized.
    pub origin: Option<PropertyId>,
    /// Name in the service definition.
    pub name: SmolStr,
    /// Name after client customizations.
    pub client_name: SmolStr,
    /// Name on the wire.
    pub serialized_name: SmolStr,
    /// Composite owning this property.
    pub owner: Option<SdkTypeId>,
    pub ty: SdkTypeId,
    pub optional: bool,
    pub kind: PropertyKind,
    /// Filled for wire parameters only.
    pub corresponding_method_params: Vec<ParamRef>,
    pub api_versions: Vec<SmolStr>,
    pub is_api_version_param: bool,
    /// Supplied once at client construction rather than per call.
    pub on_client: bool,
    pub client_default_value: Option<LiteralValue>,
    pub is_generated_name: bool,
    pub cross_language_id: SmolStr,
    pub deprecation: Option<SmolStr>,
    pub doc: Option<SmolStr>,
}

impl SdkProperty {
    pub fn new(name: impl Into<SmolStr>, ty: SdkTypeId, kind: PropertyKind) -> Self {
        let name = name.into();
        Self {
            origin: None,
            client_name: name.clone(),
            serialized_name: name.clone(),
            name,
            owner: None,
            ty,
            optional: false,
            kind,
            corresponding_method_params: Vec::new(),
            api_versions: Vec::new(),
            is_api_version_param: false,
            on_client: false,
            client_default_value: None,
            is_generated_name: false,
            cross_language_id: SmolStr::default(),
            deprecation: None,
            doc: None,
        }
    }

    pub fn is_body(&self) -> bool {
        matches!(self.kind, PropertyKind::Body { .. })
    }

    pub fn is_header(&self) -> bool {
        matches!(self.kind, PropertyKind::Header)
    }

    pub fn is_discriminator(&self) -> bool {
        matches!(self.kind, PropertyKind::Property { discriminator: true })
    }

    pub fn content_types(&self) -> &[SmolStr] {
        match &self.kind {
            PropertyKind::Body { content_types, .. } => content_types,
            _ => &[],
        }
    }
}
