//! Client tree construction.
//!
//! Children are built before their parent so the parent can pick up
//! client parameters (api-version, subscription) its descendants discovered.
//! Initialization parameters come in a fixed order:
//!
//! ```text
//! endpoint, credential?, api-version?, subscriptionId?, custom..., other elevated...
//! ```

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

use super::http::is_subscription_id_name;
use super::types::qualified;
use super::{ProjectionError, ProjectionKey, ProjectionSession};
use crate::base::text_utils::pascal_case;
use crate::base::{Access, ContainerId, DeclRef, InitializedBy, OperationId, TypeDeclId};
use crate::diagnostics::codes;
use crate::graph::{AuthScheme, HttpBinding, LiteralValue};
use crate::model::{
    BuiltinKind, ClientInitialization, MethodKind, PropertyKind, SdkClient, SdkCredential,
    SdkEndpoint, SdkMethod, SdkProperty, SdkType, SdkTypeKind, SdkUnion,
};

const DEFAULT_ENDPOINT: &str = "endpoint";

impl<'g> ProjectionSession<'g> {
    /// Explicitly declared clients, else every service root.
    pub(crate) fn root_clients(&self) -> Vec<(ContainerId, Option<SmolStr>)> {
        let explicit = self.overrides.clients();
        if !explicit.is_empty() {
            return explicit
                .iter()
                .map(|(container, decl)| (*container, decl.name.clone()))
                .collect();
        }
        self.graph
            .containers()
            .filter(|(_, c)| c.service.is_some())
            .map(|(id, _)| (id, None))
            .collect()
    }

    pub(crate) fn project_root_client(
        &mut self,
        container: ContainerId,
        name: Option<SmolStr>,
    ) -> Result<SdkClient, ProjectionError> {
        let name = name
            .or_else(|| self.overrides.client_name(container).cloned())
            .unwrap_or_else(|| {
                let declared = &self.graph.container(container).name;
                if declared.ends_with("Client") {
                    declared.clone()
                } else {
                    SmolStr::new(format!("{}Client", declared))
                }
            });
        self.project_client(container, None, name)
    }

    fn project_client(
        &mut self,
        container: ContainerId,
        parent: Option<ContainerId>,
        name: SmolStr,
    ) -> Result<SdkClient, ProjectionError> {
        let graph = self.graph;
        debug!("[CLIENT] {} ({})", name, graph.full_name(container));

        let initialized_by = self.initialized_by(container, parent.is_none());

        let mut custom = Vec::new();
        let custom_decls = self
            .overrides
            .initialization(container)
            .map(|init| init.parameters.clone())
            .unwrap_or_default();
        for pid in custom_decls {
            let ty = self.project_type(graph.property(pid).ty)?;
            let mut param = self.parameter_from_decl(pid, ty, PropertyKind::Method, &graph.full_name(container), container);
            param.on_client = true;
            param.serialized_name = param.name.clone();
            let param = Arc::new(param);
            self.client_params
                .entry(container)
                .or_default()
                .push(Arc::clone(&param));
            custom.push(param);
        }

        let mut children = Vec::new();
        for child in self.child_groups(container) {
            let child_name = self
                .overrides
                .client_name(child)
                .cloned()
                .unwrap_or_else(|| graph.container(child).name.clone());
            children.push(self.project_client(child, Some(container), child_name)?);
        }

        let mut methods = Vec::new();
        for op in self.client_operations(container) {
            match self.project_method(op, container) {
                Ok(method) => methods.push(method),
                Err(err) if err.is_invariant() => return Err(err),
                Err(err) => self.diagnostics.add(err.to_diagnostic()),
            }
        }

        let cross_language_id = SmolStr::new(graph.full_name(container));
        let api_versions = graph
            .service(container)
            .map(|s| s.api_versions.clone())
            .unwrap_or_default();
        for child in &children {
            if !child.initialization.initialized_by.by_parent() {
                continue;
            }
            let accessor = format!("get{}", pascal_case(&child.name));
            methods.push(SdkMethod {
                cross_language_id: SmolStr::new(format!("{}.{}", cross_language_id, accessor)),
                name: accessor.into(),
                origin: None,
                access: Access::Public,
                parameters: Vec::new(),
                api_versions: api_versions.clone(),
                deprecation: None,
                generate_convenient: false,
                generate_protocol: false,
                kind: MethodKind::ClientAccessor {
                    client: child.name.clone(),
                },
            });
        }

        let parameters = self.initialization_parameters(container, &children, custom)?;
        Ok(SdkClient {
            initialization: ClientInitialization {
                name: SmolStr::new(format!("{}Options", name)),
                initialized_by,
                parameters,
            },
            name,
            namespace: SmolStr::new(graph.namespace_of(container)),
            origin: container,
            cross_language_id,
            api_versions,
            methods,
            children,
        })
    }

    fn initialized_by(&mut self, container: ContainerId, is_root: bool) -> InitializedBy {
        let declared = self
            .overrides
            .initialization(container)
            .and_then(|init| init.initialized_by);
        match (declared, is_root) {
            (None, true) => InitializedBy::INDIVIDUALLY,
            (None, false) => InitializedBy::PARENT,
            (Some(flags), true) if !flags.individually() => {
                self.diagnostics.error(
                    DeclRef::Container(container),
                    codes::INVALID_INITIALIZED_BY,
                    "a root client must be initialized individually",
                );
                InitializedBy::INDIVIDUALLY
            }
            (Some(flags), false) if !flags.by_parent() => {
                self.diagnostics.error(
                    DeclRef::Container(container),
                    codes::INVALID_INITIALIZED_BY,
                    "a sub-client must be initializable by its parent",
                );
                InitializedBy::PARENT
            }
            (Some(flags), _) => flags,
        }
    }

    // ========================================================================
    // TREE SHAPE
    // ========================================================================

    /// Child containers that end up with at least one method.
    fn child_groups(&self, container: ContainerId) -> Vec<ContainerId> {
        self.graph
            .container(container)
            .children
            .iter()
            .copied()
            .filter(|child| !self.roots.contains(child) && self.has_methods(*child))
            .collect()
    }

    fn has_methods(&self, container: ContainerId) -> bool {
        !self.client_operations(container).is_empty()
            || self
                .graph
                .container(container)
                .children
                .iter()
                .any(|child| !self.roots.contains(child) && self.has_methods(*child))
    }

    /// Operations projected on `container`: its own minus relocated ones, then relocated in.
    fn client_operations(&self, container: ContainerId) -> Vec<OperationId> {
        let mut ops: Vec<OperationId> = self
            .graph
            .container(container)
            .operations
            .iter()
            .copied()
            .filter(|op| {
                self.overrides
                    .client_location(*op)
                    .is_none_or(|target| target == container)
            })
            .collect();
        for op in self.overrides.relocated_into(container) {
            if !ops.contains(&op) {
                ops.push(op);
            }
        }
        ops.retain(|op| self.is_operation_available(*op));
        ops
    }

    // ========================================================================
    // INITIALIZATION PARAMETERS
    // ========================================================================

    fn initialization_parameters(
        &mut self,
        container: ContainerId,
        children: &[SdkClient],
        custom: Vec<Arc<SdkProperty>>,
    ) -> Result<Vec<Arc<SdkProperty>>, ProjectionError> {
        let mut params: Vec<Arc<SdkProperty>> = Vec::new();
        let Some(root) = self.graph.service_root(container) else {
            return Ok(custom);
        };

        params.push(self.endpoint_parameter(root)?);
        if let Some(credential) = self.credential_parameter(root) {
            params.push(credential);
        }

        let own: Vec<Arc<SdkProperty>> = self
            .client_params
            .get(&container)
            .cloned()
            .unwrap_or_default();
        let from_children = |pred: &dyn Fn(&SdkProperty) -> bool| {
            children
                .iter()
                .flat_map(|c| c.initialization.parameters.iter())
                .find(|p| pred(&***p))
                .cloned()
        };

        let api_version = own
            .iter()
            .find(|p| p.is_api_version_param)
            .cloned()
            .or_else(|| from_children(&|p| p.is_api_version_param));
        params.extend(api_version);

        if self.is_arm(container) {
            let subscription = own
                .iter()
                .find(|p| is_subscription_id_name(&p.name))
                .cloned()
                .or_else(|| from_children(&|p| is_subscription_id_name(&p.name)));
            params.extend(subscription);
        }

        for param in custom.into_iter().chain(own) {
            if !params.iter().any(|p| p.name == param.name) {
                params.push(param);
            }
        }
        Ok(params)
    }

    /// The `endpoint` parameter of a service root, built once.
    fn endpoint_parameter(&mut self, root: ContainerId) -> Result<Arc<SdkProperty>, ProjectionError> {
        if let Some(existing) = self.endpoints.get(&root) {
            return Ok(Arc::clone(existing));
        }
        let graph = self.graph;
        let string = self.builtin(BuiltinKind::String, "string");
        let root_id = graph.full_name(root);
        let servers = graph
            .container(root)
            .service
            .as_ref()
            .map(|s| s.servers.clone())
            .unwrap_or_default();

        let mut endpoints: Vec<SdkEndpoint> = Vec::new();
        for server in &servers {
            let mut arguments = Vec::new();
            for pid in &server.parameters {
                let p = graph.property(*pid);
                if let Some(binding) = &p.binding {
                    if !matches!(binding, HttpBinding::Path(_)) {
                        self.diagnostics.error(
                            DeclRef::Property(*pid),
                            codes::SERVER_PARAM_NOT_PATH,
                            format!("server parameter '{}' must be a path parameter", p.name),
                        );
                        continue;
                    }
                }
                let ty = self.project_type(p.ty)?;
                let mut arg = self.parameter_from_decl(*pid, ty, PropertyKind::Path { url_encode: false }, &root_id, root);
                arg.serialized_name = p.name.clone();
                arg.on_client = true;
                arguments.push(Arc::new(arg));
            }

            if arguments.is_empty() {
                endpoints.push(self.default_endpoint(string, Some(server.url.clone()), &root_id));
                continue;
            }
            let endpoint = SdkEndpoint {
                server_url: server.url.clone(),
                template_arguments: arguments,
            };
            let overridable = endpoint.is_overridable();
            endpoints.push(endpoint);
            if !overridable {
                endpoints.push(self.default_endpoint(string, None, &root_id));
            }
        }
        if endpoints.is_empty() {
            endpoints.push(self.default_endpoint(string, None, &root_id));
        }

        let ids: Vec<_> = endpoints
            .into_iter()
            .map(|e| self.catalogue.push(SdkType::new(None, SdkTypeKind::Endpoint(e))))
            .collect();
        let ty = match ids.as_slice() {
            [only] => *only,
            _ => {
                let name = self.synthesized_name(&format!("{}Endpoint", pascal_case(&graph.container(root).name)));
                let namespace = SmolStr::new(graph.namespace_of(root));
                self.catalogue.push(SdkType::new(
                    None,
                    SdkTypeKind::Union(SdkUnion {
                        cross_language_id: qualified(&namespace, &name),
                        name: Some(name),
                        is_generated_name: true,
                        namespace,
                        variants: ids,
                        usage: Default::default(),
                        access: None,
                    }),
                ))
            }
        };

        let mut param = SdkProperty::new(DEFAULT_ENDPOINT, ty, PropertyKind::Endpoint);
        param.on_client = true;
        param.is_generated_name = true;
        param.cross_language_id = SmolStr::new(format!("{}.endpoint", root_id));
        let param = Arc::new(param);
        self.endpoints.insert(root, Arc::clone(&param));
        Ok(param)
    }

    /// `{endpoint}` with one string argument, optionally defaulting to `url`.
    fn default_endpoint(&self, string: crate::base::SdkTypeId, url: Option<SmolStr>, root_id: &str) -> SdkEndpoint {
        let mut arg = SdkProperty::new(DEFAULT_ENDPOINT, string, PropertyKind::Path { url_encode: false });
        arg.on_client = true;
        arg.is_generated_name = true;
        arg.client_default_value = url.map(LiteralValue::String);
        arg.cross_language_id = SmolStr::new(format!("{}.endpoint", root_id));
        SdkEndpoint {
            server_url: SmolStr::new(format!("{{{}}}", DEFAULT_ENDPOINT)),
            template_arguments: vec![Arc::new(arg)],
        }
    }

    /// The `credential` parameter of a service root, if it declares any auth scheme.
    fn credential_parameter(&mut self, root: ContainerId) -> Option<Arc<SdkProperty>> {
        if let Some(existing) = self.credentials.get(&root) {
            return existing.clone();
        }
        let graph = self.graph;
        let auth = graph
            .container(root)
            .service
            .as_ref()
            .map(|s| s.auth.clone())
            .unwrap_or_default();
        let schemes: Vec<AuthScheme> = auth
            .iter()
            .filter(|s| !matches!(s, AuthScheme::NoAuth))
            .cloned()
            .collect();

        let param = if schemes.is_empty() {
            None
        } else {
            let ty = match self.identity.get(&ProjectionKey::Credential(root)) {
                Some(id) => *id,
                None => {
                    let id = self
                        .catalogue
                        .push(SdkType::new(None, SdkTypeKind::Credential(SdkCredential { schemes })));
                    self.identity.insert(ProjectionKey::Credential(root), id);
                    id
                }
            };
            let mut param = SdkProperty::new("credential", ty, PropertyKind::Credential);
            param.on_client = true;
            param.is_generated_name = true;
            param.optional = auth.iter().any(|s| matches!(s, AuthScheme::NoAuth));
            param.cross_language_id = SmolStr::new(format!("{}.credential", graph.full_name(root)));
            Some(Arc::new(param))
        };
        self.credentials.insert(root, param.clone());
        param
    }

    // ========================================================================
    // ORPHANS
    // ========================================================================

    /// Bring in service-level types that carry an explicit usage or access.
    pub(crate) fn project_orphans(&mut self) -> Result<(), ProjectionError> {
        let graph = self.graph;
        let orphans: Vec<TypeDeclId> = graph
            .containers()
            .filter_map(|(_, c)| c.service.as_ref())
            .flat_map(|s| s.orphan_types.iter().copied())
            .collect();
        for ty in orphans {
            let customized =
                self.overrides.usage(ty).is_some() || self.overrides.access(DeclRef::Type(ty)).is_some();
            if customized {
                self.project_type(ty)?;
            }
        }
        Ok(())
    }
}
