//! Usage and access propagation over the type catalogue.
//!
//! Each seed is pushed through a worklist with its own visited set, so
//! cyclic graphs terminate and every seed reaches everything reachable from
//! it. Edges followed from a composite:
//!
//! - member property types
//! - additional-properties value type
//! - base composite (skipped when propagation to base is disabled)
//! - discriminated subtypes
//!
//! Arrays, dictionaries, unions and enum values forward to what they contain.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::base::{Access, DeclRef, SdkTypeId, UsageFlags};
use crate::graph::ResolvedOverrides;
use crate::model::{SdkTypeKind, TypeCatalogue};

/// A starting point for propagation: a type used by a method with some access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UsageSeed {
    pub(crate) ty: SdkTypeId,
    pub(crate) usage: UsageFlags,
    pub(crate) access: Access,
}

#[derive(Debug, Clone, Copy, Default)]
struct Reach {
    public: bool,
    internal: bool,
}

pub(crate) struct UsagePropagator<'a> {
    catalogue: &'a mut TypeCatalogue,
    overrides: &'a ResolvedOverrides,
    propagate_to_base: bool,
    reach: FxHashMap<SdkTypeId, Reach>,
}

impl<'a> UsagePropagator<'a> {
    pub(crate) fn new(
        catalogue: &'a mut TypeCatalogue,
        overrides: &'a ResolvedOverrides,
        propagate_to_base: bool,
    ) -> Self {
        Self {
            catalogue,
            overrides,
            propagate_to_base,
            reach: FxHashMap::default(),
        }
    }

    /// Explicit usage overrides, as seeds. They propagate like any other usage.
    pub(crate) fn override_seeds(&self) -> Vec<UsageSeed> {
        self.catalogue
            .iter()
            .filter(|(_, ty)| ty.usage().is_some())
            .filter_map(|(id, ty)| {
                let origin = ty.origin?;
                let usage = self.overrides.usage(origin)?;
                Some(UsageSeed {
                    ty: id,
                    usage,
                    access: self
                        .overrides
                        .access(DeclRef::Type(origin))
                        .unwrap_or(Access::Public),
                })
            })
            .collect()
    }

    pub(crate) fn apply(&mut self, seed: UsageSeed) {
        let mut visited: FxHashSet<SdkTypeId> = FxHashSet::default();
        let mut queue: VecDeque<(SdkTypeId, UsageFlags)> = VecDeque::from([(seed.ty, seed.usage)]);

        while let Some((id, usage)) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let mut reached = true;
            match &mut self.catalogue.get_mut(id).kind {
                SdkTypeKind::Array { value } => {
                    queue.push_back((*value, usage));
                    reached = false;
                }
                SdkTypeKind::Dict { value, .. } => {
                    queue.push_back((*value, usage));
                    reached = false;
                }
                SdkTypeKind::EnumValue(v) => {
                    queue.push_back((v.enum_type, usage));
                    reached = false;
                }
                SdkTypeKind::Enum(e) => e.usage |= usage,
                SdkTypeKind::Union(u) => {
                    u.usage |= usage;
                    let onward = usage.propagated();
                    for variant in &u.variants {
                        queue.push_back((*variant, onward));
                    }
                }
                SdkTypeKind::Model(m) => {
                    m.usage |= usage;
                    let onward = usage.propagated();
                    for prop in &m.properties {
                        queue.push_back((prop.ty, onward));
                    }
                    if let Some(ap) = m.additional_properties {
                        queue.push_back((ap, onward));
                    }
                    if self.propagate_to_base {
                        if let Some(base) = m.base {
                            queue.push_back((base, onward));
                        }
                    }
                    if let Some(subtypes) = &m.discriminated_subtypes {
                        for subtype in subtypes.values() {
                            queue.push_back((*subtype, onward));
                        }
                    }
                }
                SdkTypeKind::Builtin(_)
                | SdkTypeKind::Constant(_)
                | SdkTypeKind::Credential(_)
                | SdkTypeKind::Endpoint(_) => reached = false,
            }
            if reached {
                self.mark_reach(id, seed.access);
            }
        }
        trace!(
            "[USAGE] seed {} {:?} reached {} nodes",
            seed.ty,
            seed.usage,
            visited.len()
        );
    }

    fn mark_reach(&mut self, id: SdkTypeId, access: Access) {
        let reach = self.reach.entry(id).or_default();
        match access {
            Access::Public => reach.public = true,
            Access::Internal => reach.internal = true,
        }
    }

    /// Settle access and prune discriminator maps. Consumes the propagator.
    pub(crate) fn finish(self) {
        let Self {
            catalogue,
            overrides,
            reach,
            ..
        } = self;

        let ids: Vec<SdkTypeId> = catalogue.iter().map(|(id, _)| id).collect();
        for id in &ids {
            let node = catalogue.get(*id);
            if node.usage().is_none() {
                continue;
            }
            let explicit = node.origin.and_then(|o| overrides.access(DeclRef::Type(o)));
            let computed = reach.get(id).map(|r| {
                if r.public {
                    Access::Public
                } else {
                    Access::Internal
                }
            });
            let access = explicit.or(computed);
            match &mut catalogue.get_mut(*id).kind {
                SdkTypeKind::Model(m) => m.access = access,
                SdkTypeKind::Enum(e) => e.access = access,
                SdkTypeKind::Union(u) => u.access = access,
                _ => {}
            }
        }

        let usage_of: FxHashMap<SdkTypeId, UsageFlags> = ids
            .iter()
            .filter_map(|id| catalogue.get(*id).usage().map(|u| (*id, u)))
            .collect();
        for id in &ids {
            let Some(model) = catalogue.model_mut(*id) else {
                continue;
            };
            let Some(subtypes) = model.discriminated_subtypes.as_mut() else {
                continue;
            };
            subtypes.retain(|_, subtype| {
                usage_of
                    .get(subtype)
                    .is_some_and(|usage| !usage.is_empty())
            });
            if subtypes.len() <= 1 {
                debug!("[USAGE] dropping discriminator map on {}", model.name);
                model.discriminated_subtypes = None;
            }
        }
    }
}
