//! Method projection: signature, response, paging and LRO metadata.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, trace, warn};

use super::{ProjectionError, ProjectionSession};
use crate::base::text_utils::pascal_case;
use crate::base::{Access, ContainerId, DeclRef, OperationId, SdkTypeId, UsageFlags};
use crate::diagnostics::codes;
use crate::graph::LroDecl;
use crate::model::{
    LroMetadata, MethodKind, PagingMetadata, PropertyKind, SdkHttpOperation, SdkMethod,
    SdkMethodResponse, SdkProperty, SdkType, SdkTypeKind, SdkUnion, ServiceMethod,
};

impl<'g> ProjectionSession<'g> {
    /// Project one operation as a method of the client built from `client`.
    ///
    /// Types reached only from operations without a convenient method get
    /// no usage from them.
    pub(crate) fn project_method(
        &mut self,
        op: OperationId,
        client: ContainerId,
    ) -> Result<SdkMethod, ProjectionError> {
        let generate_convenient = self
            .overrides
            .convenient_api(op)
            .unwrap_or(self.options.generate_convenience_methods);
        let generate_protocol = self
            .overrides
            .protocol_api(op)
            .unwrap_or(self.options.generate_protocol_methods);

        let mark = self.usage_mark();
        let method = self.build_method(op, client);
        if !generate_convenient {
            trace!("[METHOD] {} has no convenient method, dropping its usage", op);
            self.discard_usage_since(mark);
        }
        let mut method = method?;
        method.generate_convenient = generate_convenient;
        method.generate_protocol = generate_protocol;
        Ok(method)
    }

    fn build_method(&mut self, op: OperationId, client: ContainerId) -> Result<SdkMethod, ProjectionError> {
        let graph = self.graph;
        let decl = graph.operation(op);
        let access = self
            .overrides
            .access(DeclRef::Operation(op))
            .unwrap_or(Access::Public);
        let name = self
            .overrides
            .client_name(op)
            .cloned()
            .unwrap_or_else(|| decl.name.clone());
        let cross_id = self.operation_cross_id(op);
        let api_versions = self.operation_api_versions(op);
        debug!("[METHOD] {} ({:?})", cross_id, access);

        let mut parameters: Vec<Arc<SdkProperty>> = Vec::with_capacity(decl.parameters.len());
        for pid in &decl.parameters {
            let p = graph.property(*pid);
            if graph.is_void_like(p.ty) {
                continue;
            }
            let ty = self.project_type(p.ty)?;
            let mut param = self.parameter_from_decl(*pid, ty, PropertyKind::Method, &cross_id, client);
            param.serialized_name = p.name.clone();
            param.api_versions = api_versions.clone();
            if param.on_client {
                self.elevate_client_parameter(client, param);
                continue;
            }
            // Supplied by a custom client initialization parameter.
            if self
                .client_parameters_in_scope(client)
                .iter()
                .any(|c| c.name == param.name)
            {
                continue;
            }
            self.seed(ty, UsageFlags::INPUT, access);
            parameters.push(Arc::new(param));
        }

        let operation = self.project_http_operation(op, client, access, &mut parameters)?;
        let response = self.method_response(op, &operation, access);
        let paging = decl
            .paging
            .as_ref()
            .map(|paging| PagingMetadata {
                item_segments: paging.item_segments.clone(),
                next_link_segments: paging.next_link_segments.clone(),
                next_link_operation: paging.next_link_operation.map(|next| self.operation_ref(next)),
            });
        let response = match &paging {
            Some(paging) => self.paged_response(response, paging),
            None => response,
        };
        let lro = match &decl.lro {
            Some(lro) => self.lro_metadata(op, lro, access, &response)?,
            None => None,
        };

        let mut method = ServiceMethod { operation, response };
        if let Some(lro) = &lro {
            if let Some(success) = &lro.status_monitor.success_property {
                method.response = SdkMethodResponse {
                    ty: lro.final_result,
                    result_segments: Some(vec![success.serialized_name.clone()]),
                };
            }
        }

        let kind = match (paging, lro) {
            (Some(paging), Some(lro)) => MethodKind::LroPaging { method, paging, lro },
            (None, Some(lro)) => MethodKind::Lro { method, lro },
            (Some(paging), None) => MethodKind::Paging { method, paging },
            (None, None) => MethodKind::Basic { method },
        };

        Ok(SdkMethod {
            name,
            origin: Some(op),
            access,
            parameters,
            api_versions,
            cross_language_id: cross_id,
            deprecation: decl.deprecation.clone(),
            generate_convenient: true,
            generate_protocol: true,
            kind,
        })
    }

    // ========================================================================
    // RESPONSE
    // ========================================================================

    /// The value a caller gets back from the success responses.
    fn method_response(&mut self, op: OperationId, operation: &SdkHttpOperation, access: Access) -> SdkMethodResponse {
        let mut types: Vec<SdkTypeId> = Vec::new();
        let mut has_empty = false;
        for response in operation.responses.values() {
            match response.ty {
                Some(ty) if !types.contains(&ty) => types.push(ty),
                Some(_) => {}
                None => has_empty = true,
            }
        }

        let ty = match types.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => {
                let candidate = format!("{}Response", pascal_case(&self.graph.operation(op).name));
                let name = self.synthesized_name(&candidate);
                let namespace = self.namespace_of_operation(op);
                let cross_language_id = super::types::qualified(&namespace, &name);
                let id = self.catalogue.push(SdkType::new(
                    None,
                    SdkTypeKind::Union(SdkUnion {
                        name: Some(name),
                        is_generated_name: true,
                        namespace,
                        variants: types.clone(),
                        usage: Default::default(),
                        access: None,
                        cross_language_id,
                    }),
                ));
                self.seed(id, UsageFlags::OUTPUT, access);
                Some(id)
            }
        };

        let ty = match ty {
            Some(inner) if has_empty && !self.catalogue.get(inner).nullable => {
                let mut wrapper = SdkType::new(
                    None,
                    SdkTypeKind::Union(SdkUnion {
                        name: None,
                        is_generated_name: false,
                        namespace: SmolStr::default(),
                        variants: vec![inner],
                        usage: Default::default(),
                        access: None,
                        cross_language_id: SmolStr::default(),
                    }),
                );
                wrapper.nullable = true;
                Some(self.catalogue.push(wrapper))
            }
            other => other,
        };

        SdkMethodResponse {
            ty,
            result_segments: None,
        }
    }

    /// Point a paging method's response at the item collection.
    fn paged_response(&self, response: SdkMethodResponse, paging: &PagingMetadata) -> SdkMethodResponse {
        let Some(mut current) = response.ty else {
            return response;
        };
        for segment in &paging.item_segments {
            let Some(model) = self.catalogue.model(current) else {
                return response;
            };
            let Some(prop) = model
                .properties
                .iter()
                .find(|p| p.serialized_name == *segment || p.name == *segment)
            else {
                return response;
            };
            current = prop.ty;
        }
        SdkMethodResponse {
            ty: Some(current),
            result_segments: Some(paging.item_segments.clone()),
        }
    }

    // ========================================================================
    // LRO
    // ========================================================================

    fn lro_metadata(
        &mut self,
        op: OperationId,
        lro: &LroDecl,
        access: Access,
        response: &SdkMethodResponse,
    ) -> Result<Option<LroMetadata>, ProjectionError> {
        let Some(link) = self.link_lro(op, lro, access)? else {
            return Ok(None);
        };
        let Some(status_monitor) = link.status_monitor else {
            let graph = self.graph;
            warn!(
                "[LRO] {} has no status monitor; projecting as a plain method",
                graph.operation(op).name
            );
            self.diagnostics.warning(
                DeclRef::Operation(op),
                codes::LRO_STATUS_MISSING,
                format!(
                    "polling operation '{}' has no recognizable status property with terminal states",
                    graph.operation(lro.polling_operation).name
                ),
            );
            return Ok(None);
        };

        let final_result = status_monitor
            .success_property
            .as_ref()
            .map(|p| p.ty)
            .or(response.ty);
        Ok(Some(LroMetadata {
            initial_operation: self.operation_ref(op),
            polling_operation: link.polling_operation,
            parameter_map: link.parameter_map,
            polling_link: link.polling_link,
            status_monitor,
            final_result,
        }))
    }
}
