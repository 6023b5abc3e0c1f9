//! Projected type nodes.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::property::SdkProperty;
use crate::base::{Access, SdkTypeId, TypeDeclId, UsageFlags};
use crate::graph::{AuthScheme, LiteralValue};

/// A node in the type catalogue.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkType {
    /// Declaration this node was projected from; `None` for synthesized nodes.
    pub origin: Option<TypeDeclId>,
    pub nullable: bool,
    pub deprecation: Option<SmolStr>,
    pub doc: Option<SmolStr>,
    pub kind: SdkTypeKind,
}

impl SdkType {
    pub fn new(origin: Option<TypeDeclId>, kind: SdkTypeKind) -> Self {
        Self {
            origin,
            nullable: false,
            deprecation: None,
            doc: None,
            kind,
        }
    }

    pub fn as_model(&self) -> Option<&SdkModel> {
        match &self.kind {
            SdkTypeKind::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&SdkEnum> {
        match &self.kind {
            SdkTypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&SdkUnion> {
        match &self.kind {
            SdkTypeKind::Union(u) => Some(u),
            _ => None,
        }
    }

    /// Name of a named node (model, enum, union, named constant).
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            SdkTypeKind::Model(m) => Some(&m.name),
            SdkTypeKind::Enum(e) => Some(&e.name),
            SdkTypeKind::Union(u) => u.name.as_deref(),
            SdkTypeKind::Constant(c) => c.name.as_deref(),
            SdkTypeKind::EnumValue(v) => Some(&v.name),
            SdkTypeKind::Builtin(b) => Some(&b.name),
            _ => None,
        }
    }

    /// Usage of a usage-carrying node; `None` for everything else.
    pub fn usage(&self) -> Option<UsageFlags> {
        match &self.kind {
            SdkTypeKind::Model(m) => Some(m.usage),
            SdkTypeKind::Enum(e) => Some(e.usage),
            SdkTypeKind::Union(u) => Some(u.usage),
            _ => None,
        }
    }

    pub fn access(&self) -> Option<Access> {
        match &self.kind {
            SdkTypeKind::Model(m) => m.access,
            SdkTypeKind::Enum(e) => e.access,
            SdkTypeKind::Union(u) => u.access,
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.kind_name()
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum SdkTypeKind {
    Builtin(SdkBuiltin),
    Enum(SdkEnum),
    EnumValue(SdkEnumValue),
    Union(SdkUnion),
    Array { value: SdkTypeId },
    Dict { key: SdkTypeId, value: SdkTypeId },
    Constant(SdkConstant),
    Model(SdkModel),
    Credential(SdkCredential),
    Endpoint(SdkEndpoint),
}

impl SdkTypeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SdkTypeKind::Builtin(_) => "builtin",
            SdkTypeKind::Enum(_) => "enum",
            SdkTypeKind::EnumValue(_) => "enumvalue",
            SdkTypeKind::Union(_) => "union",
            SdkTypeKind::Array { .. } => "array",
            SdkTypeKind::Dict { .. } => "dict",
            SdkTypeKind::Constant(_) => "constant",
            SdkTypeKind::Model(_) => "model",
            SdkTypeKind::Credential(_) => "credential",
            SdkTypeKind::Endpoint(_) => "endpoint",
        }
    }
}

// ============================================================================
// BUILTINS AND CONSTANTS
// ============================================================================

/// Language-neutral primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum BuiltinKind {
    Any,
    String,
    Boolean,
    Bytes,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    SafeInt,
    Integer,
    Float32,
    Float64,
    Float,
    Decimal,
    Decimal128,
    Numeric,
    Url,
    PlainDate,
    PlainTime,
    UtcDateTime,
    OffsetDateTime,
    Duration,
}

impl BuiltinKind {
    /// Map a standard scalar name. Unknown names become `Any`.
    pub fn from_scalar_name(name: &str) -> Self {
        match name {
            "string" => BuiltinKind::String,
            "boolean" => BuiltinKind::Boolean,
            "bytes" => BuiltinKind::Bytes,
            "int8" => BuiltinKind::Int8,
            "int16" => BuiltinKind::Int16,
            "int32" => BuiltinKind::Int32,
            "int64" => BuiltinKind::Int64,
            "uint8" => BuiltinKind::Uint8,
            "uint16" => BuiltinKind::Uint16,
            "uint32" => BuiltinKind::Uint32,
            "uint64" => BuiltinKind::Uint64,
            "safeint" => BuiltinKind::SafeInt,
            "integer" => BuiltinKind::Integer,
            "float32" => BuiltinKind::Float32,
            "float64" => BuiltinKind::Float64,
            "float" => BuiltinKind::Float,
            "decimal" => BuiltinKind::Decimal,
            "decimal128" => BuiltinKind::Decimal128,
            "numeric" => BuiltinKind::Numeric,
            "url" => BuiltinKind::Url,
            "plainDate" => BuiltinKind::PlainDate,
            "plainTime" => BuiltinKind::PlainTime,
            "utcDateTime" => BuiltinKind::UtcDateTime,
            "offsetDateTime" => BuiltinKind::OffsetDateTime,
            "duration" => BuiltinKind::Duration,
            _ => BuiltinKind::Any,
        }
    }

    /// Wire encoding used when none is declared.
    pub fn default_encode(self) -> Option<&'static str> {
        match self {
            BuiltinKind::Bytes => Some("base64"),
            BuiltinKind::UtcDateTime | BuiltinKind::OffsetDateTime => Some("rfc3339"),
            BuiltinKind::Duration => Some("ISO8601"),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            BuiltinKind::Int8
                | BuiltinKind::Int16
                | BuiltinKind::Int32
                | BuiltinKind::Int64
                | BuiltinKind::Uint8
                | BuiltinKind::Uint16
                | BuiltinKind::Uint32
                | BuiltinKind::Uint64
                | BuiltinKind::SafeInt
                | BuiltinKind::Integer
                | BuiltinKind::Float32
                | BuiltinKind::Float64
                | BuiltinKind::Float
                | BuiltinKind::Decimal
                | BuiltinKind::Decimal128
                | BuiltinKind::Numeric
        )
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkBuiltin {
    pub builtin: BuiltinKind,
    /// Scalar name as declared, e.g. `ResourceName` for a custom scalar.
    pub name: SmolStr,
    pub encode: Option<SmolStr>,
    /// Projected base of a custom scalar.
    pub base: Option<SdkTypeId>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkConstant {
    pub value: LiteralValue,
    pub value_type: BuiltinKind,
    /// Set for synthesized named constants such as content types.
    pub name: Option<SmolStr>,
    pub is_generated_name: bool,
}

// ============================================================================
// ENUMS AND UNIONS
// ============================================================================

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkEnum {
    pub name: SmolStr,
    pub is_generated_name: bool,
    pub namespace: SmolStr,
    pub value_type: BuiltinKind,
    pub values: Vec<SdkTypeId>,
    /// False when the enum also admits arbitrary values of `value_type`.
    pub is_fixed: bool,
    /// True when the enum was flattened from a union of literals.
    pub is_union_as_enum: bool,
    pub usage: UsageFlags,
    pub access: Option<Access>,
    pub cross_language_id: SmolStr,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkEnumValue {
    pub name: SmolStr,
    pub value: LiteralValue,
    pub enum_type: SdkTypeId,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkUnion {
    pub name: Option<SmolStr>,
    pub is_generated_name: bool,
    pub namespace: SmolStr,
    pub variants: Vec<SdkTypeId>,
    pub usage: UsageFlags,
    pub access: Option<Access>,
    pub cross_language_id: SmolStr,
}

// ============================================================================
// COMPOSITES
// ============================================================================

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkModel {
    pub name: SmolStr,
    pub is_generated_name: bool,
    pub namespace: SmolStr,
    pub properties: Vec<SdkProperty>,
    pub base: Option<SdkTypeId>,
    pub additional_properties: Option<SdkTypeId>,
    /// Wire name of the discriminator property.
    pub discriminator_property: Option<SmolStr>,
    /// Discriminator value this subtype is selected by.
    pub discriminator_value: Option<SmolStr>,
    /// Subtypes by discriminator value. Only kept when more than one
    /// reachable subtype remains after usage propagation.
    pub discriminated_subtypes: Option<IndexMap<SmolStr, SdkTypeId>>,
    pub is_error: bool,
    pub usage: UsageFlags,
    pub access: Option<Access>,
    pub cross_language_id: SmolStr,
}

impl SdkModel {
    pub fn property(&self, name: &str) -> Option<&SdkProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

// ============================================================================
// CLIENT-LEVEL SYNTHESIZED NODES
// ============================================================================

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkCredential {
    pub schemes: Vec<AuthScheme>,
}

/// A server URL template and the client parameters filling it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkEndpoint {
    pub server_url: SmolStr,
    pub template_arguments: Vec<Arc<SdkProperty>>,
}

impl SdkEndpoint {
    /// A single `{arg}` template lets callers supply the whole URL.
    pub fn is_overridable(&self) -> bool {
        self.template_arguments.len() == 1
            && self.server_url.starts_with('{')
            && self.server_url.ends_with('}')
    }
}
