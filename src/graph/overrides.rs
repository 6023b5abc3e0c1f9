//! Scoped customizations.
//!
//! Every customization may target all emitters or a named language scope.
//! A value recorded for the active scope beats the value recorded for all
//! scopes. [`Overrides::resolve`] picks the winners once per run so the
//! projection never consults scopes again.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{
    Access, ContainerId, DeclRef, InitializedBy, OperationId, PropertyId, TypeDeclId, UsageFlags,
};

// ============================================================================
// SCOPED VALUES
// ============================================================================

/// A value recorded for all scopes and/or specific scopes.
#[derive(Debug, Clone)]
pub struct Scoped<T> {
    all: Option<T>,
    scoped: IndexMap<SmolStr, T>,
}

impl<T> Default for Scoped<T> {
    fn default() -> Self {
        Self {
            all: None,
            scoped: IndexMap::new(),
        }
    }
}

impl<T: Clone> Scoped<T> {
    /// Record a value. `scope` may list several comma-separated scopes.
    pub fn set(&mut self, scope: Option<&str>, value: T) {
        match scope {
            None => self.all = Some(value),
            Some(scopes) => {
                for scope in scopes.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    self.scoped.insert(SmolStr::new(scope), value.clone());
                }
            }
        }
    }

    /// The value for `scope`, falling back to the all-scopes value.
    pub fn select(&self, scope: Option<&str>) -> Option<&T> {
        scope
            .and_then(|s| self.scoped.get(s))
            .or(self.all.as_ref())
    }
}

// ============================================================================
// OVERRIDE PAYLOADS
// ============================================================================

/// Customized client initialization for a container.
#[derive(Debug, Clone, Default)]
pub struct ClientInitializationDecl {
    pub initialized_by: Option<InitializedBy>,
    /// Extra parameters lifted onto the client.
    pub parameters: Vec<PropertyId>,
}

/// Explicit root-client declaration.
#[derive(Debug, Clone, Default)]
pub struct ClientDecl {
    pub name: Option<SmolStr>,
}

// ============================================================================
// OVERRIDES
// ============================================================================

/// All customizations recorded against a graph, for every scope.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    client_names: IndexMap<DeclRef, Scoped<SmolStr>>,
    usage: IndexMap<TypeDeclId, Scoped<UsageFlags>>,
    access: IndexMap<DeclRef, Scoped<Access>>,
    initialization: IndexMap<ContainerId, Scoped<ClientInitializationDecl>>,
    client_location: IndexMap<OperationId, Scoped<ContainerId>>,
    parameter_alias: IndexMap<PropertyId, Scoped<SmolStr>>,
    clients: IndexMap<ContainerId, Scoped<ClientDecl>>,
    protocol_api: IndexMap<OperationId, Scoped<bool>>,
    convenient_api: IndexMap<OperationId, Scoped<bool>>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_client_name(
        &mut self,
        decl: impl Into<DeclRef>,
        scope: Option<&str>,
        name: impl Into<SmolStr>,
    ) {
        self.client_names
            .entry(decl.into())
            .or_default()
            .set(scope, name.into());
    }

    /// Usage bits added on top of whatever propagation computes.
    pub fn set_usage(&mut self, decl: TypeDeclId, scope: Option<&str>, usage: UsageFlags) {
        self.usage.entry(decl).or_default().set(scope, usage);
    }

    pub fn set_access(&mut self, decl: impl Into<DeclRef>, scope: Option<&str>, access: Access) {
        self.access
            .entry(decl.into())
            .or_default()
            .set(scope, access);
    }

    pub fn set_client_initialization(
        &mut self,
        container: ContainerId,
        scope: Option<&str>,
        init: ClientInitializationDecl,
    ) {
        self.initialization
            .entry(container)
            .or_default()
            .set(scope, init);
    }

    /// Move an operation into another client or operation group.
    pub fn set_client_location(
        &mut self,
        operation: OperationId,
        scope: Option<&str>,
        target: ContainerId,
    ) {
        self.client_location
            .entry(operation)
            .or_default()
            .set(scope, target);
    }

    /// Let a method-level parameter stand in for a client parameter of another name.
    pub fn set_parameter_alias(
        &mut self,
        property: PropertyId,
        scope: Option<&str>,
        alias: impl Into<SmolStr>,
    ) {
        self.parameter_alias
            .entry(property)
            .or_default()
            .set(scope, alias.into());
    }

    /// Declare `container` as a root client explicitly.
    pub fn add_client(&mut self, container: ContainerId, scope: Option<&str>, client: ClientDecl) {
        self.clients
            .entry(container)
            .or_default()
            .set(scope, client);
    }

    /// Whether a protocol (raw request) method is generated for `operation`.
    pub fn set_protocol_api(&mut self, operation: OperationId, scope: Option<&str>, enabled: bool) {
        self.protocol_api
            .entry(operation)
            .or_default()
            .set(scope, enabled);
    }

    /// Whether a convenient (typed) method is generated for `operation`.
    /// Operations without one contribute no usage to their types.
    pub fn set_convenient_api(&mut self, operation: OperationId, scope: Option<&str>, enabled: bool) {
        self.convenient_api
            .entry(operation)
            .or_default()
            .set(scope, enabled);
    }

    /// Pick the winning value of every customization for `scope`.
    pub fn resolve(&self, scope: Option<&str>) -> ResolvedOverrides {
        fn pick<K: Copy + Eq + std::hash::Hash, T: Clone>(
            map: &IndexMap<K, Scoped<T>>,
            scope: Option<&str>,
        ) -> FxHashMap<K, T> {
            map.iter()
                .filter_map(|(key, scoped)| scoped.select(scope).map(|v| (*key, v.clone())))
                .collect()
        }

        let mut clients: Vec<(ContainerId, ClientDecl)> = self
            .clients
            .iter()
            .filter_map(|(key, scoped)| scoped.select(scope).map(|v| (*key, v.clone())))
            .collect();
        clients.sort_by_key(|(container, _)| *container);

        let mut client_location: Vec<(OperationId, ContainerId)> = self
            .client_location
            .iter()
            .filter_map(|(op, scoped)| scoped.select(scope).map(|v| (*op, *v)))
            .collect();
        client_location.sort_by_key(|(op, _)| *op);

        ResolvedOverrides {
            client_names: pick(&self.client_names, scope),
            usage: pick(&self.usage, scope),
            access: pick(&self.access, scope),
            initialization: pick(&self.initialization, scope),
            client_location,
            parameter_alias: pick(&self.parameter_alias, scope),
            clients,
            protocol_api: pick(&self.protocol_api, scope),
            convenient_api: pick(&self.convenient_api, scope),
        }
    }
}

/// Customizations with the scope already applied.
#[derive(Debug, Clone, Default)]
pub struct ResolvedOverrides {
    client_names: FxHashMap<DeclRef, SmolStr>,
    usage: FxHashMap<TypeDeclId, UsageFlags>,
    access: FxHashMap<DeclRef, Access>,
    initialization: FxHashMap<ContainerId, ClientInitializationDecl>,
    client_location: Vec<(OperationId, ContainerId)>,
    parameter_alias: FxHashMap<PropertyId, SmolStr>,
    clients: Vec<(ContainerId, ClientDecl)>,
    protocol_api: FxHashMap<OperationId, bool>,
    convenient_api: FxHashMap<OperationId, bool>,
}

impl ResolvedOverrides {
    pub fn client_name(&self, decl: impl Into<DeclRef>) -> Option<&SmolStr> {
        self.client_names.get(&decl.into())
    }

    pub fn usage(&self, decl: TypeDeclId) -> Option<UsageFlags> {
        self.usage.get(&decl).copied()
    }

    pub fn access(&self, decl: impl Into<DeclRef>) -> Option<Access> {
        self.access.get(&decl.into()).copied()
    }

    pub fn initialization(&self, container: ContainerId) -> Option<&ClientInitializationDecl> {
        self.initialization.get(&container)
    }

    pub fn client_location(&self, operation: OperationId) -> Option<ContainerId> {
        self.client_location
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, target)| *target)
    }

    /// Operations relocated into `container`, in declaration order.
    pub fn relocated_into(&self, container: ContainerId) -> impl Iterator<Item = OperationId> + '_ {
        self.client_location
            .iter()
            .filter(move |(_, target)| *target == container)
            .map(|(op, _)| *op)
    }

    pub fn parameter_alias(&self, property: PropertyId) -> Option<&SmolStr> {
        self.parameter_alias.get(&property)
    }

    pub fn protocol_api(&self, operation: OperationId) -> Option<bool> {
        self.protocol_api.get(&operation).copied()
    }

    pub fn convenient_api(&self, operation: OperationId) -> Option<bool> {
        self.convenient_api.get(&operation).copied()
    }

    /// Explicit root clients, ordered by container.
    pub fn clients(&self) -> &[(ContainerId, ClientDecl)] {
        &self.clients
    }
}
