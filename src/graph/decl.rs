//! Type and property declarations of the input graph.

use smol_str::SmolStr;

use crate::base::{ContainerId, PropertyId, TypeDeclId};

/// A literal value: constant types, enum member values and defaults.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum LiteralValue {
    String(SmolStr),
    Number(f64),
    Boolean(bool),
}

impl LiteralValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralValue::String(s) => write!(f, "\"{}\"", s),
            LiteralValue::Number(n) => write!(f, "{}", n),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Terminal state an enum member or union variant stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LroState {
    Succeeded,
    Failed,
    Canceled,
}

impl LroState {
    /// Recognize the conventional terminal state names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Succeeded" => Some(LroState::Succeeded),
            "Failed" => Some(LroState::Failed),
            "Canceled" => Some(LroState::Canceled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    Null,
    Void,
    Never,
    Unknown,
}

// ============================================================================
// TYPE DECLARATIONS
// ============================================================================

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    pub deprecation: Option<SmolStr>,
    pub doc: Option<SmolStr>,
}

impl TypeDecl {
    pub fn new(kind: TypeDeclKind) -> Self {
        Self {
            kind,
            deprecation: None,
            doc: None,
        }
    }

    /// Declared name, if the kind carries one.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TypeDeclKind::Scalar(s) => Some(&s.name),
            TypeDeclKind::Enum(e) => Some(&e.name),
            TypeDeclKind::EnumMember(m) => Some(&m.name),
            TypeDeclKind::Union(u) => u.name.as_deref(),
            TypeDeclKind::Model(m) => m.name.as_deref(),
            TypeDeclKind::Intrinsic(_)
            | TypeDeclKind::Literal(_)
            | TypeDeclKind::Array(_)
            | TypeDeclKind::Record(_) => None,
        }
    }

    pub fn namespace(&self) -> Option<ContainerId> {
        match &self.kind {
            TypeDeclKind::Scalar(s) => s.namespace,
            TypeDeclKind::Enum(e) => e.namespace,
            TypeDeclKind::Union(u) => u.namespace,
            TypeDeclKind::Model(m) => m.namespace,
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeDeclKind {
    Scalar(ScalarDecl),
    Intrinsic(Intrinsic),
    Literal(LiteralValue),
    Enum(EnumDecl),
    EnumMember(EnumMemberDecl),
    Union(UnionDecl),
    Array(TypeDeclId),
    Record(TypeDeclId),
    Model(ModelDecl),
}

/// A scalar. Standard scalars have no namespace and no base; custom scalars
/// extend one through `base`.
#[derive(Debug, Clone)]
pub struct ScalarDecl {
    pub name: SmolStr,
    pub namespace: Option<ContainerId>,
    pub base: Option<TypeDeclId>,
    /// Explicit wire encoding, e.g. `rfc7231` or `base64url`.
    pub encode: Option<SmolStr>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: SmolStr,
    pub namespace: Option<ContainerId>,
    pub members: Vec<TypeDeclId>,
}

#[derive(Debug, Clone)]
pub struct EnumMemberDecl {
    pub name: SmolStr,
    pub value: Option<LiteralValue>,
    pub parent: TypeDeclId,
    pub lro_state: Option<LroState>,
}

#[derive(Debug, Clone)]
pub struct UnionDecl {
    pub name: Option<SmolStr>,
    pub namespace: Option<ContainerId>,
    pub variants: Vec<UnionVariantDecl>,
}

#[derive(Debug, Clone)]
pub struct UnionVariantDecl {
    pub name: Option<SmolStr>,
    pub ty: TypeDeclId,
    pub lro_state: Option<LroState>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelDecl {
    pub name: Option<SmolStr>,
    pub namespace: Option<ContainerId>,
    pub properties: Vec<PropertyId>,
    pub base: Option<TypeDeclId>,
    pub derived: Vec<TypeDeclId>,
    /// Wire name of the discriminator property.
    pub discriminator: Option<SmolStr>,
    pub additional_properties: Option<TypeDeclId>,
    pub is_error: bool,
}

// ============================================================================
// PROPERTY DECLARATIONS
// ============================================================================

/// Where a property lands on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpBinding {
    Header(SmolStr),
    Query(SmolStr),
    Path(SmolStr),
    Body,
    /// The property's value is the whole body, not a member of it.
    BodyRoot,
    StatusCode,
}

impl HttpBinding {
    /// Header, query, path and status-code bindings describe the envelope,
    /// not the payload.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            HttpBinding::Header(_)
                | HttpBinding::Query(_)
                | HttpBinding::Path(_)
                | HttpBinding::StatusCode
        )
    }
}

/// Long-running-operation annotations carried by a property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LroMarkers {
    pub status: bool,
    pub result: bool,
    pub error_result: bool,
    pub polling_location: bool,
    /// Feed this property into the named polling-operation parameter.
    pub polling_parameter: Option<SmolStr>,
}

#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: SmolStr,
    /// The composite owning the property, `None` for operation parameters.
    pub model: Option<TypeDeclId>,
    pub ty: TypeDeclId,
    pub optional: bool,
    pub binding: Option<HttpBinding>,
    /// Property this one was copied from by spreading.
    pub source_property: Option<PropertyId>,
    /// Payload wire name when it differs from `name`.
    pub wire_name: Option<SmolStr>,
    pub default_value: Option<LiteralValue>,
    pub markers: LroMarkers,
    pub deprecation: Option<SmolStr>,
    pub doc: Option<SmolStr>,
}

impl PropertyDecl {
    pub fn new(name: impl Into<SmolStr>, ty: TypeDeclId) -> Self {
        Self {
            name: name.into(),
            model: None,
            ty,
            optional: false,
            binding: None,
            source_property: None,
            wire_name: None,
            default_value: None,
            markers: LroMarkers::default(),
            deprecation: None,
            doc: None,
        }
    }

    pub fn is_metadata(&self) -> bool {
        self.binding.as_ref().is_some_and(HttpBinding::is_metadata)
    }

    /// Name used in a serialized payload.
    pub fn serialized_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }
}
