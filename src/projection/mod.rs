//! Projection from a service graph to an SDK package.
//!
//! ```text
//! project_package
//!   ├── clients   root clients, operation groups, initialization parameters
//!   │     └── methods   signature, response, paging, LRO
//!   │           ├── http   wire parameters, body, responses, correspondence
//!   │           └── lro    polling link and status monitor
//!   ├── types     identity-preserving type catalogue, generated names (naming)
//!   └── usage     usage/access fixed point, discriminator pruning
//! ```
//!
//! One [`ProjectionSession`] owns every per-run cache. It is created by
//! [`project_package`] and dropped when the call returns.

mod clients;
mod error;
mod http;
mod lro;
mod methods;
mod naming;
mod options;
mod types;
mod usage;

pub use error::ProjectionError;
pub use options::{ApiVersionSelection, ProjectionOptions};

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::debug;

use crate::base::{Access, ContainerId, DeclRef, OperationId, SdkTypeId, UsageFlags};
use crate::diagnostics::{codes, DiagnosticCollector};
use crate::graph::{Graph, ResolvedOverrides};
use crate::model::{BuiltinKind, OperationRef, SdkPackage, SdkProperty, SdkTypeKind, TypeCatalogue};
use naming::NameRegistry;
use usage::{UsagePropagator, UsageSeed};

/// Identity-map key. One catalogue node per key per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ProjectionKey {
    Decl(crate::base::TypeDeclId),
    Builtin(BuiltinKind),
    Credential(ContainerId),
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BodyFormats {
    multipart: bool,
    other: bool,
}

/// State of one projection run.
pub(crate) struct ProjectionSession<'g> {
    pub(crate) graph: &'g Graph,
    pub(crate) options: &'g ProjectionOptions,
    pub(crate) overrides: ResolvedOverrides,
    pub(crate) catalogue: TypeCatalogue,
    pub(crate) identity: FxHashMap<ProjectionKey, SdkTypeId>,
    pub(crate) names: NameRegistry,
    /// Client-scoped parameters discovered per client container.
    pub(crate) client_params: FxHashMap<ContainerId, Vec<Arc<SdkProperty>>>,
    /// Endpoint parameter per service root.
    pub(crate) endpoints: FxHashMap<ContainerId, Arc<SdkProperty>>,
    /// Credential parameter per service root; `None` when no scheme is declared.
    pub(crate) credentials: FxHashMap<ContainerId, Option<Arc<SdkProperty>>>,
    pub(crate) seeds: Vec<UsageSeed>,
    /// Body types with whether each use was multipart.
    pub(crate) body_formats: Vec<(SdkTypeId, bool)>,
    pub(crate) roots: FxHashSet<ContainerId>,
    pub(crate) diagnostics: DiagnosticCollector,
}

impl<'g> ProjectionSession<'g> {
    pub(crate) fn new(graph: &'g Graph, options: &'g ProjectionOptions) -> Self {
        Self {
            graph,
            options,
            overrides: graph.overrides().resolve(options.scope()),
            catalogue: TypeCatalogue::new(),
            identity: FxHashMap::default(),
            names: NameRegistry::default(),
            client_params: FxHashMap::default(),
            endpoints: FxHashMap::default(),
            credentials: FxHashMap::default(),
            seeds: Vec::new(),
            body_formats: Vec::new(),
            roots: FxHashSet::default(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Record a propagation root. Usage is computed once every method is projected.
    pub(crate) fn seed(&mut self, ty: SdkTypeId, usage: UsageFlags, access: Access) {
        self.seeds.push(UsageSeed { ty, usage, access });
    }

    pub(crate) fn record_body_format(&mut self, ty: SdkTypeId, multipart: bool) {
        self.body_formats.push((ty, multipart));
    }

    /// Position in the pending usage records, for [`Self::discard_usage_since`].
    pub(crate) fn usage_mark(&self) -> (usize, usize) {
        (self.seeds.len(), self.body_formats.len())
    }

    /// Drop usage recorded after `mark`.
    pub(crate) fn discard_usage_since(&mut self, mark: (usize, usize)) {
        self.seeds.truncate(mark.0);
        self.body_formats.truncate(mark.1);
    }

    /// Resource-manager conventions apply to `container`.
    pub(crate) fn is_arm(&self, container: ContainerId) -> bool {
        self.options
            .arm
            .unwrap_or_else(|| self.graph.service(container).is_some_and(|s| s.arm))
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    pub(crate) fn operation_cross_id(&self, op: OperationId) -> SmolStr {
        let decl = self.graph.operation(op);
        SmolStr::new(format!("{}.{}", self.graph.full_name(decl.container), decl.name))
    }

    pub(crate) fn operation_ref(&self, op: OperationId) -> OperationRef {
        OperationRef {
            origin: op,
            name: self
                .overrides
                .client_name(op)
                .cloned()
                .unwrap_or_else(|| self.graph.operation(op).name.clone()),
            cross_language_id: self.operation_cross_id(op),
        }
    }

    pub(crate) fn namespace_of_operation(&self, op: OperationId) -> SmolStr {
        SmolStr::new(self.graph.namespace_of(self.graph.operation(op).container))
    }

    /// Service versions inside the operation's added/removed window.
    pub(crate) fn operation_api_versions(&self, op: OperationId) -> Vec<SmolStr> {
        let decl = self.graph.operation(op);
        let Some(service) = self.graph.service(decl.container) else {
            return Vec::new();
        };
        let versions = &service.api_versions;
        let position = |v: &Option<SmolStr>| v.as_ref().and_then(|v| versions.iter().position(|x| x == v));
        let start = position(&decl.versions.added).unwrap_or(0);
        let end = position(&decl.versions.removed).unwrap_or(versions.len());
        versions
            .get(start..end.max(start))
            .map(<[SmolStr]>::to_vec)
            .unwrap_or_default()
    }

    /// The operation exists in the selected service version.
    pub(crate) fn is_operation_available(&self, op: OperationId) -> bool {
        if self.options.api_version == ApiVersionSelection::All {
            return true;
        }
        let decl = self.graph.operation(op);
        let Some(service) = self.graph.service(decl.container) else {
            return true;
        };
        match self.options.selected_version(&service.api_versions) {
            Some(selected) => self.operation_api_versions(op).contains(selected),
            None => true,
        }
    }

    // ========================================================================
    // CLIENT PARAMETER CACHE
    // ========================================================================

    /// Client parameters visible from `client`: its own, then its ancestors'.
    pub(crate) fn client_parameters_in_scope(&self, client: ContainerId) -> Vec<Arc<SdkProperty>> {
        let mut out = Vec::new();
        let mut current = Some(client);
        while let Some(container) = current {
            if let Some(params) = self.client_params.get(&container) {
                out.extend(params.iter().cloned());
            }
            current = self.graph.container(container).parent;
        }
        out
    }

    /// Make `param` a client parameter of `client` unless one already serves it.
    pub(crate) fn elevate_client_parameter(&mut self, client: ContainerId, param: SdkProperty) {
        let exists = self.client_parameters_in_scope(client).iter().any(|c| {
            c.name == param.name || (c.is_api_version_param && param.is_api_version_param)
        });
        if exists {
            return;
        }
        debug!("[CLIENT] elevating '{}' onto {}", param.name, self.graph.full_name(client));
        let mut param = param;
        param.on_client = true;
        param.kind = crate::model::PropertyKind::Method;
        self.client_params.entry(client).or_default().push(Arc::new(param));
    }

    // ========================================================================
    // FINISH
    // ========================================================================

    fn finish(mut self, clients: Vec<crate::model::SdkClient>) -> SdkPackage {
        let seeds = std::mem::take(&mut self.seeds);
        let mut propagator = UsagePropagator::new(
            &mut self.catalogue,
            &self.overrides,
            !self.options.disable_usage_access_propagation_to_base,
        );
        for seed in propagator.override_seeds() {
            propagator.apply(seed);
        }
        for seed in seeds {
            propagator.apply(seed);
        }
        propagator.finish();

        let mut formats: FxHashMap<SdkTypeId, BodyFormats> = FxHashMap::default();
        for (ty, multipart) in &self.body_formats {
            let entry = formats.entry(*ty).or_default();
            if *multipart {
                entry.multipart = true;
            } else {
                entry.other = true;
            }
        }
        let mut conflicts: Vec<SdkTypeId> = formats
            .iter()
            .filter(|(_, f)| f.multipart && f.other)
            .map(|(id, _)| *id)
            .collect();
        conflicts.sort();
        for id in conflicts {
            let node = self.catalogue.get(id);
            let name = node.name().unwrap_or("anonymous").to_string();
            self.diagnostics.error(
                node.origin.map(DeclRef::Type),
                codes::CONFLICTING_MULTIPART_USAGE,
                format!("'{}' is used both as a multipart body and as a regular body", name),
            );
        }

        let mut models = Vec::new();
        let mut enums = Vec::new();
        let mut unions = Vec::new();
        for (id, ty) in self.catalogue.iter() {
            match &ty.kind {
                SdkTypeKind::Model(m) if !m.usage.is_empty() => models.push(id),
                SdkTypeKind::Enum(e) if !e.usage.is_empty() => enums.push(id),
                SdkTypeKind::Union(u) if u.name.is_some() && !u.usage.is_empty() => unions.push(id),
                _ => {}
            }
        }

        let name = clients
            .first()
            .map(|c| c.namespace.clone())
            .unwrap_or_default();
        debug!(
            "[PROJECTION] package '{}': {} clients, {} models, {} enums",
            name,
            clients.len(),
            models.len(),
            enums.len()
        );
        SdkPackage {
            name,
            clients,
            catalogue: self.catalogue,
            models,
            enums,
            unions,
            diagnostics: self.diagnostics.finish(),
        }
    }
}

/// Project `graph` into an SDK package.
///
/// Structural problems in one operation drop that method and are reported in
/// [`SdkPackage::diagnostics`]. Only an internal invariant violation fails
/// the whole run.
pub fn project_package(graph: &Graph, options: &ProjectionOptions) -> Result<SdkPackage, ProjectionError> {
    let mut session = ProjectionSession::new(graph, options);
    let roots = session.root_clients();
    session.roots = roots.iter().map(|(container, _)| *container).collect();

    let mut clients = Vec::with_capacity(roots.len());
    for (container, name) in roots {
        clients.push(session.project_root_client(container, name)?);
    }
    session.project_orphans()?;
    Ok(session.finish(clients))
}
