//! Namespaces, interfaces and service roots.

use smol_str::SmolStr;

use crate::base::{ContainerId, OperationId, PropertyId, TypeDeclId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Namespace,
    Interface,
}

/// A server URL template with its template arguments.
#[derive(Debug, Clone)]
pub struct ServerDecl {
    pub url: SmolStr,
    pub parameters: Vec<PropertyId>,
    pub description: Option<SmolStr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

/// An authentication scheme accepted by a service.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum AuthScheme {
    ApiKey { location: ApiKeyLocation, name: SmolStr },
    Http { scheme: SmolStr },
    OAuth2 { scopes: Vec<SmolStr> },
    NoAuth,
}

/// Service-level metadata carried by a service root.
#[derive(Debug, Clone, Default)]
pub struct ServiceDecl {
    /// Display title; the client name is derived from the container otherwise.
    pub title: Option<SmolStr>,
    pub servers: Vec<ServerDecl>,
    pub auth: Vec<AuthScheme>,
    /// Ordered oldest to newest.
    pub api_versions: Vec<SmolStr>,
    /// Resource-manager style service: subscription ids are client scoped.
    pub arm: bool,
    /// Types to project even when no operation references them.
    pub orphan_types: Vec<TypeDeclId>,
}

#[derive(Debug, Clone)]
pub struct ContainerDecl {
    pub name: SmolStr,
    pub kind: ContainerKind,
    pub parent: Option<ContainerId>,
    pub children: Vec<ContainerId>,
    pub operations: Vec<OperationId>,
    pub service: Option<ServiceDecl>,
}

impl ContainerDecl {
    pub fn new(name: impl Into<SmolStr>, kind: ContainerKind, parent: Option<ContainerId>) -> Self {
        Self {
            name: name.into(),
            kind,
            parent,
            children: Vec::new(),
            operations: Vec::new(),
            service: None,
        }
    }
}
