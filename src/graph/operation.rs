//! Operation declarations and their HTTP bindings.

use std::fmt;

use smol_str::SmolStr;

use crate::base::{ContainerId, OperationId, PropertyId, TypeDeclId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Verb {
    Get,
    Put,
    Post,
    Patch,
    Delete,
    Head,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Put => "put",
            Verb::Post => "post",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
            Verb::Head => "head",
        }
    }
}

/// Wire location of an operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

/// A wire parameter of an operation. `location` is `None` when the service
/// definition never said where the parameter goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpParameter {
    pub property: PropertyId,
    pub location: Option<ParamLocation>,
}

/// One declared request body.
#[derive(Debug, Clone)]
pub struct BodyBinding {
    /// Explicit body property, `None` when the body is assembled implicitly.
    pub property: Option<PropertyId>,
    pub ty: TypeDeclId,
    pub content_types: Vec<SmolStr>,
    /// The body is an anonymous composite built by spreading parameters.
    pub spread: bool,
}

/// Status codes a response covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCodes {
    Code(u16),
    Range(u16, u16),
    Wildcard,
}

impl fmt::Display for StatusCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCodes::Code(code) => write!(f, "{}", code),
            StatusCodes::Range(start, end) => write!(f, "{}-{}", start, end),
            StatusCodes::Wildcard => f.write_str("*"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StatusCodes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone)]
pub struct ResponseBody {
    pub ty: TypeDeclId,
    pub content_types: Vec<SmolStr>,
}

#[derive(Debug, Clone)]
pub struct ResponseBinding {
    pub status: StatusCodes,
    pub headers: Vec<PropertyId>,
    pub body: Option<ResponseBody>,
    pub description: Option<SmolStr>,
}

impl ResponseBinding {
    pub fn new(status: StatusCodes) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperationBinding {
    pub verb: Verb,
    pub path: SmolStr,
    pub parameters: Vec<HttpParameter>,
    pub bodies: Vec<BodyBinding>,
    pub responses: Vec<ResponseBinding>,
}

// ============================================================================
// PAGING AND LRO ANNOTATIONS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PagingDecl {
    /// Segments from the response body to the page items.
    pub item_segments: Vec<SmolStr>,
    pub next_link_segments: Option<Vec<SmolStr>>,
    pub next_link_operation: Option<OperationId>,
}

/// Where an explicit polling-parameter mapping takes its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSource {
    RequestParameter(SmolStr),
    ResponseProperty(SmolStr),
}

/// An explicit `target <- source` directive on an operation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMapping {
    pub target: SmolStr,
    pub source: ParameterSource,
}

#[derive(Debug, Clone)]
pub struct LroDecl {
    pub polling_operation: OperationId,
    pub parameters: Vec<ParameterMapping>,
}

/// Versions an operation exists in: `added <= v < removed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRange {
    pub added: Option<SmolStr>,
    pub removed: Option<SmolStr>,
}

// ============================================================================
// OPERATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct OperationDecl {
    pub name: SmolStr,
    pub container: ContainerId,
    /// Declared parameters, in source order.
    pub parameters: Vec<PropertyId>,
    pub binding: OperationBinding,
    pub paging: Option<PagingDecl>,
    pub lro: Option<LroDecl>,
    pub versions: VersionRange,
    pub deprecation: Option<SmolStr>,
    pub doc: Option<SmolStr>,
}
