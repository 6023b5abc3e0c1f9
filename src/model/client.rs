//! Client tree.

use std::sync::Arc;

use smol_str::SmolStr;

use super::method::SdkMethod;
use super::property::{PropertyKind, SdkProperty};
use crate::base::{ContainerId, InitializedBy};

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClientInitialization {
    pub name: SmolStr,
    pub initialized_by: InitializedBy,
    /// Endpoint, credential, api-version and subscription first, then custom parameters.
    pub parameters: Vec<Arc<SdkProperty>>,
}

impl ClientInitialization {
    pub fn parameter(&self, name: &str) -> Option<&Arc<SdkProperty>> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn endpoint(&self) -> Option<&Arc<SdkProperty>> {
        self.parameters
            .iter()
            .find(|p| p.kind == PropertyKind::Endpoint)
    }

    pub fn credential(&self) -> Option<&Arc<SdkProperty>> {
        self.parameters
            .iter()
            .find(|p| p.kind == PropertyKind::Credential)
    }

    pub fn api_version(&self) -> Option<&Arc<SdkProperty>> {
        self.parameters.iter().find(|p| p.is_api_version_param)
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkClient {
    pub name: SmolStr,
    pub namespace: SmolStr,
    pub origin: ContainerId,
    pub cross_language_id: SmolStr,
    pub api_versions: Vec<SmolStr>,
    pub initialization: ClientInitialization,
    pub methods: Vec<SdkMethod>,
    pub children: Vec<SdkClient>,
}

impl SdkClient {
    pub fn method(&self, name: &str) -> Option<&SdkMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&SdkClient> {
        self.children.iter().find(|c| c.name == name)
    }

    /// This client and every descendant, depth first.
    pub fn walk(&self) -> Vec<&SdkClient> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}
