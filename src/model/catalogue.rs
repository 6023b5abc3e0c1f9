//! Arena of projected type nodes.

use crate::base::SdkTypeId;

use super::types::{SdkEnum, SdkModel, SdkType, SdkTypeKind, SdkUnion};

/// Every node the projection produced, addressed by [`SdkTypeId`].
///
/// Two references to the same declaration always resolve to the same id.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TypeCatalogue {
    types: Vec<SdkType>,
}

impl TypeCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SdkTypeId) -> &SdkType {
        &self.types[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: SdkTypeId) -> &mut SdkType {
        &mut self.types[id.index()]
    }

    pub(crate) fn push(&mut self, ty: SdkType) -> SdkTypeId {
        let id = SdkTypeId::new(self.types.len());
        self.types.push(ty);
        id
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SdkTypeId, &SdkType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, ty)| (SdkTypeId::new(i), ty))
    }

    pub fn model(&self, id: SdkTypeId) -> Option<&SdkModel> {
        self.get(id).as_model()
    }

    pub(crate) fn model_mut(&mut self, id: SdkTypeId) -> Option<&mut SdkModel> {
        match &mut self.get_mut(id).kind {
            SdkTypeKind::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn enum_type(&self, id: SdkTypeId) -> Option<&SdkEnum> {
        self.get(id).as_enum()
    }

    pub fn union(&self, id: SdkTypeId) -> Option<&SdkUnion> {
        self.get(id).as_union()
    }

    /// Find a model by client name.
    pub fn find_model(&self, name: &str) -> Option<(SdkTypeId, &SdkModel)> {
        self.iter()
            .find_map(|(id, ty)| ty.as_model().filter(|m| m.name == name).map(|m| (id, m)))
    }

    pub fn find_enum(&self, name: &str) -> Option<(SdkTypeId, &SdkEnum)> {
        self.iter()
            .find_map(|(id, ty)| ty.as_enum().filter(|e| e.name == name).map(|e| (id, e)))
    }

    pub fn find_union(&self, name: &str) -> Option<(SdkTypeId, &SdkUnion)> {
        self.iter().find_map(|(id, ty)| {
            ty.as_union()
                .filter(|u| u.name.as_deref() == Some(name))
                .map(|u| (id, u))
        })
    }
}
