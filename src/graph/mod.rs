//! The resolved service-definition graph consumed by the projection.
//!
//! ## Design
//!
//! Declarations live in four arenas addressed by typed ids. The graph is
//! read-only once built; projection never mutates it.
//!
//! ```text
//! Graph
//! ├── types:      Vec<TypeDecl>       (TypeDeclId)
//! ├── properties: Vec<PropertyDecl>   (PropertyId)
//! ├── operations: Vec<OperationDecl>  (OperationId)
//! ├── containers: Vec<ContainerDecl>  (ContainerId)
//! └── overrides:  Overrides           (scoped customizations)
//! ```

mod builder;
mod container;
mod decl;
mod operation;
mod overrides;

pub use builder::GraphBuilder;
pub use container::{ApiKeyLocation, AuthScheme, ContainerDecl, ContainerKind, ServerDecl, ServiceDecl};
pub use decl::{
    EnumDecl, EnumMemberDecl, HttpBinding, Intrinsic, LiteralValue, LroMarkers, LroState,
    ModelDecl, PropertyDecl, ScalarDecl, TypeDecl, TypeDeclKind, UnionDecl, UnionVariantDecl,
};
pub use operation::{
    BodyBinding, HttpParameter, LroDecl, OperationBinding, OperationDecl, PagingDecl,
    ParamLocation, ParameterMapping, ParameterSource, ResponseBinding, ResponseBody, StatusCodes,
    Verb, VersionRange,
};
pub use overrides::{ClientDecl, ClientInitializationDecl, Overrides, ResolvedOverrides, Scoped};

use crate::base::{ContainerId, OperationId, PropertyId, TypeDeclId};

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub(crate) types: Vec<TypeDecl>,
    pub(crate) properties: Vec<PropertyDecl>,
    pub(crate) operations: Vec<OperationDecl>,
    pub(crate) containers: Vec<ContainerDecl>,
    pub(crate) overrides: Overrides,
}

impl Graph {
    // ========================================================================
    // ARENA ACCESS
    // ========================================================================

    pub fn type_decl(&self, id: TypeDeclId) -> &TypeDecl {
        &self.types[id.index()]
    }

    pub fn property(&self, id: PropertyId) -> &PropertyDecl {
        &self.properties[id.index()]
    }

    pub fn operation(&self, id: OperationId) -> &OperationDecl {
        &self.operations[id.index()]
    }

    pub fn container(&self, id: ContainerId) -> &ContainerDecl {
        &self.containers[id.index()]
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn operations(&self) -> impl Iterator<Item = (OperationId, &OperationDecl)> {
        self.operations
            .iter()
            .enumerate()
            .map(|(i, op)| (OperationId::new(i), op))
    }

    pub fn containers(&self) -> impl Iterator<Item = (ContainerId, &ContainerDecl)> {
        self.containers
            .iter()
            .enumerate()
            .map(|(i, c)| (ContainerId::new(i), c))
    }

    // ========================================================================
    // TYPE QUERIES
    // ========================================================================

    pub fn model(&self, id: TypeDeclId) -> Option<&ModelDecl> {
        match &self.type_decl(id).kind {
            TypeDeclKind::Model(m) => Some(m),
            _ => None,
        }
    }

    /// `void` and `never` carry no value and are skipped wherever they appear.
    pub fn is_void_like(&self, id: TypeDeclId) -> bool {
        matches!(
            self.type_decl(id).kind,
            TypeDeclKind::Intrinsic(Intrinsic::Void | Intrinsic::Never)
        )
    }

    pub fn is_null(&self, id: TypeDeclId) -> bool {
        matches!(self.type_decl(id).kind, TypeDeclKind::Intrinsic(Intrinsic::Null))
    }

    /// Name of the standard scalar a scalar ultimately extends.
    pub fn std_scalar_name(&self, id: TypeDeclId) -> Option<&str> {
        let mut current = id;
        for _ in 0..self.types.len() {
            let TypeDeclKind::Scalar(scalar) = &self.type_decl(current).kind else {
                return None;
            };
            match scalar.base {
                Some(base) => current = base,
                None => return Some(&scalar.name),
            }
        }
        None
    }

    /// Properties of a composite including inherited ones, base first.
    pub fn all_properties(&self, model: TypeDeclId) -> Vec<PropertyId> {
        let mut chain = Vec::new();
        let mut current = Some(model);
        while let Some(id) = current {
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            current = self.model(id).and_then(|m| m.base);
        }
        chain
            .iter()
            .rev()
            .filter_map(|id| self.model(*id))
            .flat_map(|m| m.properties.iter().copied())
            .collect()
    }

    /// Follow spread back-references to the property originally declared.
    pub fn root_source_property(&self, id: PropertyId) -> PropertyId {
        let mut current = id;
        for _ in 0..self.properties.len() {
            match self.property(current).source_property {
                Some(source) if source != current => current = source,
                _ => break,
            }
        }
        current
    }

    // ========================================================================
    // CONTAINER QUERIES
    // ========================================================================

    /// Dotted name from the outermost container down to `id`.
    pub fn full_name(&self, id: ContainerId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let container = self.container(c);
            parts.push(container.name.as_str());
            current = container.parent;
        }
        parts.reverse();
        parts.join(".")
    }

    /// The namespace a container's generated code lives in.
    pub fn namespace_of(&self, id: ContainerId) -> String {
        let container = self.container(id);
        match (container.kind, container.parent) {
            (ContainerKind::Interface, Some(parent)) => self.full_name(parent),
            _ => self.full_name(id),
        }
    }

    /// Nearest container at or above `id` that declares a service.
    pub fn service_root(&self, id: ContainerId) -> Option<ContainerId> {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.container(c).service.is_some() {
                return Some(c);
            }
            current = self.container(c).parent;
        }
        None
    }

    pub fn service(&self, id: ContainerId) -> Option<&ServiceDecl> {
        self.service_root(id)
            .and_then(|root| self.container(root).service.as_ref())
    }

    /// True when `ancestor` is `id` or one of its parents.
    pub fn is_within(&self, id: ContainerId, ancestor: ContainerId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.container(c).parent;
        }
        false
    }
}
