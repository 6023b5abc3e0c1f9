//! The projection result.

use smol_str::SmolStr;

use super::catalogue::TypeCatalogue;
use super::client::SdkClient;
use super::types::{SdkEnum, SdkModel, SdkUnion};
use crate::base::SdkTypeId;
use crate::diagnostics::Diagnostic;

/// Clients, reachable named types and the diagnostics of one projection run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SdkPackage {
    pub name: SmolStr,
    pub clients: Vec<SdkClient>,
    /// Every node, including ones with no usage.
    pub catalogue: TypeCatalogue,
    /// Composites with non-empty usage, in projection order.
    pub models: Vec<SdkTypeId>,
    /// Enums with non-empty usage.
    pub enums: Vec<SdkTypeId>,
    /// Named unions with non-empty usage.
    pub unions: Vec<SdkTypeId>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SdkPackage {
    pub fn client(&self, name: &str) -> Option<&SdkClient> {
        self.clients
            .iter()
            .flat_map(|c| c.walk())
            .find(|c| c.name == name)
    }

    pub fn models(&self) -> impl Iterator<Item = (SdkTypeId, &SdkModel)> {
        self.models
            .iter()
            .filter_map(|id| self.catalogue.model(*id).map(|m| (*id, m)))
    }

    pub fn enums(&self) -> impl Iterator<Item = (SdkTypeId, &SdkEnum)> {
        self.enums
            .iter()
            .filter_map(|id| self.catalogue.enum_type(*id).map(|e| (*id, e)))
    }

    pub fn unions(&self) -> impl Iterator<Item = (SdkTypeId, &SdkUnion)> {
        self.unions
            .iter()
            .filter_map(|id| self.catalogue.union(*id).map(|u| (*id, u)))
    }

    /// An exported model by client name.
    pub fn model(&self, name: &str) -> Option<(SdkTypeId, &SdkModel)> {
        self.models().find(|(_, m)| m.name == name)
    }

    pub fn enum_type(&self, name: &str) -> Option<(SdkTypeId, &SdkEnum)> {
        self.enums().find(|(_, e)| e.name == name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Serialize the package for out-of-process generators.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
