//! Identity-preserving projection of type declarations.
//!
//! Every declaration maps to exactly one catalogue node. Composite and enum
//! nodes are registered before their members are projected, so
//! self-referential and mutually recursive declarations terminate and point
//! back at the same node.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::trace;

use super::{ProjectionError, ProjectionKey, ProjectionSession};
use crate::base::{DeclRef, PropertyId, SdkTypeId, TypeDeclId};
use crate::diagnostics::codes;
use crate::graph::{
    EnumDecl, Intrinsic, LiteralValue, ModelDecl, ScalarDecl, TypeDeclKind, UnionDecl,
    UnionVariantDecl,
};
use crate::model::{
    BuiltinKind, PropertyKind, SdkBuiltin, SdkConstant, SdkEnum, SdkEnumValue, SdkModel,
    SdkProperty, SdkType, SdkTypeKind, SdkUnion,
};

impl<'g> ProjectionSession<'g> {
    /// Project a declaration, returning the existing node if it was seen before.
    pub(crate) fn project_type(&mut self, decl: TypeDeclId) -> Result<SdkTypeId, ProjectionError> {
        let decl = self.effective_payload_type(decl);
        if let Some(&id) = self.identity.get(&ProjectionKey::Decl(decl)) {
            return Ok(id);
        }

        let graph = self.graph;
        let type_decl = graph.type_decl(decl);
        let id = match &type_decl.kind {
            TypeDeclKind::Scalar(scalar) => self.project_scalar(decl, scalar)?,
            TypeDeclKind::Intrinsic(intrinsic) => self.project_intrinsic(decl, *intrinsic)?,
            TypeDeclKind::Literal(value) => {
                let id = self.constant(value.clone(), None);
                self.catalogue.get_mut(id).origin = Some(decl);
                self.remember(ProjectionKey::Decl(decl), id)?;
                id
            }
            TypeDeclKind::Enum(e) => self.project_enum(decl, e)?,
            TypeDeclKind::EnumMember(member) => {
                self.project_type(member.parent)?;
                self.identity
                    .get(&ProjectionKey::Decl(decl))
                    .copied()
                    .ok_or_else(|| {
                        ProjectionError::invariant(format!("enum member {} was not registered", decl))
                    })?
            }
            TypeDeclKind::Union(u) => self.project_union(decl, u)?,
            TypeDeclKind::Array(element) => {
                let value = self.project_type(*element)?;
                let id = self.catalogue.push(SdkType::new(Some(decl), SdkTypeKind::Array { value }));
                self.remember(ProjectionKey::Decl(decl), id)?;
                id
            }
            TypeDeclKind::Record(value) => {
                let key = self.builtin(BuiltinKind::String, "string");
                let value = self.project_type(*value)?;
                let id = self
                    .catalogue
                    .push(SdkType::new(Some(decl), SdkTypeKind::Dict { key, value }));
                self.remember(ProjectionKey::Decl(decl), id)?;
                id
            }
            TypeDeclKind::Model(m) => self.project_model(decl, m)?,
        };

        let node = self.catalogue.get_mut(id);
        if node.origin == Some(decl) {
            node.deprecation = type_decl.deprecation.clone();
            node.doc = type_decl.doc.clone();
        }
        Ok(id)
    }

    /// Register `key -> id`. Registering a different node for a key twice is a bug.
    pub(crate) fn remember(&mut self, key: ProjectionKey, id: SdkTypeId) -> Result<(), ProjectionError> {
        match self.identity.insert(key, id) {
            Some(previous) if previous != id => Err(ProjectionError::invariant(format!(
                "{:?} projected twice ({} and {})",
                key, previous, id
            ))),
            _ => Ok(()),
        }
    }

    /// Shared node for a primitive kind.
    pub(crate) fn builtin(&mut self, kind: BuiltinKind, name: &str) -> SdkTypeId {
        if let Some(&id) = self.identity.get(&ProjectionKey::Builtin(kind)) {
            return id;
        }
        let id = self.catalogue.push(SdkType::new(
            None,
            SdkTypeKind::Builtin(SdkBuiltin {
                builtin: kind,
                name: name.into(),
                encode: kind.default_encode().map(SmolStr::new),
                base: None,
            }),
        ));
        self.identity.insert(ProjectionKey::Builtin(kind), id);
        id
    }

    /// A fresh constant node. Constants are values, not identities.
    pub(crate) fn constant(&mut self, value: LiteralValue, name: Option<SmolStr>) -> SdkTypeId {
        let value_type = literal_kind(&value);
        let is_generated_name = name.is_some();
        self.catalogue.push(SdkType::new(
            None,
            SdkTypeKind::Constant(SdkConstant {
                value,
                value_type,
                name,
                is_generated_name,
            }),
        ))
    }

    pub(crate) fn namespace_name(&self, decl: TypeDeclId) -> SmolStr {
        self.graph
            .type_decl(decl)
            .namespace()
            .map(|ns| SmolStr::new(self.graph.full_name(ns)))
            .unwrap_or_default()
    }

    fn declared_or_client_name(&self, decl: TypeDeclId, declared: &str) -> SmolStr {
        self.overrides
            .client_name(decl)
            .cloned()
            .unwrap_or_else(|| SmolStr::new(declared))
    }

    // ========================================================================
    // SCALARS, INTRINSICS
    // ========================================================================

    fn project_scalar(&mut self, decl: TypeDeclId, scalar: &ScalarDecl) -> Result<SdkTypeId, ProjectionError> {
        let graph = self.graph;
        let builtin = BuiltinKind::from_scalar_name(graph.std_scalar_name(decl).unwrap_or_default());

        let base = match (scalar.namespace, scalar.base) {
            (Some(_), Some(base)) => Some(self.project_type(base)?),
            _ => None,
        };

        let mut encode = None;
        let mut current = Some(decl);
        while let Some(id) = current {
            let TypeDeclKind::Scalar(s) = &graph.type_decl(id).kind else {
                break;
            };
            if s.encode.is_some() {
                encode = s.encode.clone();
                break;
            }
            current = s.base.filter(|b| *b != id);
        }
        let encode = encode.or_else(|| builtin.default_encode().map(SmolStr::new));

        let id = self.catalogue.push(SdkType::new(
            Some(decl),
            SdkTypeKind::Builtin(SdkBuiltin {
                builtin,
                name: self.declared_or_client_name(decl, &scalar.name),
                encode,
                base,
            }),
        ));
        self.remember(ProjectionKey::Decl(decl), id)?;
        Ok(id)
    }

    fn project_intrinsic(&mut self, decl: TypeDeclId, intrinsic: Intrinsic) -> Result<SdkTypeId, ProjectionError> {
        let id = match intrinsic {
            Intrinsic::Unknown => self.builtin(BuiltinKind::Any, "unknown"),
            Intrinsic::Null | Intrinsic::Void | Intrinsic::Never => {
                let name = match intrinsic {
                    Intrinsic::Null => "null",
                    Intrinsic::Void => "void",
                    _ => "never",
                };
                let mut node = SdkType::new(
                    Some(decl),
                    SdkTypeKind::Builtin(SdkBuiltin {
                        builtin: BuiltinKind::Any,
                        name: name.into(),
                        encode: None,
                        base: None,
                    }),
                );
                node.nullable = intrinsic == Intrinsic::Null;
                self.catalogue.push(node)
            }
        };
        self.remember(ProjectionKey::Decl(decl), id)?;
        Ok(id)
    }

    // ========================================================================
    // ENUMS AND UNIONS
    // ========================================================================

    fn project_enum(&mut self, decl: TypeDeclId, e: &EnumDecl) -> Result<SdkTypeId, ProjectionError> {
        let graph = self.graph;
        let name = self.declared_or_client_name(decl, &e.name);
        let namespace = self.namespace_name(decl);

        let members: Vec<(TypeDeclId, SmolStr, LiteralValue)> = e
            .members
            .iter()
            .filter_map(|member| match &graph.type_decl(*member).kind {
                TypeDeclKind::EnumMember(m) => Some((
                    *member,
                    self.declared_or_client_name(*member, &m.name),
                    m.value
                        .clone()
                        .unwrap_or_else(|| LiteralValue::String(m.name.clone())),
                )),
                _ => None,
            })
            .collect();
        let value_type = enum_value_type(members.iter().map(|(_, _, v)| v));

        let id = self.catalogue.push(SdkType::new(
            Some(decl),
            SdkTypeKind::Enum(SdkEnum {
                cross_language_id: qualified(&namespace, &name),
                name,
                is_generated_name: false,
                namespace,
                value_type,
                values: Vec::new(),
                is_fixed: true,
                is_union_as_enum: false,
                usage: Default::default(),
                access: None,
            }),
        ));
        self.remember(ProjectionKey::Decl(decl), id)?;

        let mut values = Vec::with_capacity(members.len());
        for (member, name, value) in members {
            let value_id = self.catalogue.push(SdkType::new(
                Some(member),
                SdkTypeKind::EnumValue(SdkEnumValue {
                    name,
                    value,
                    enum_type: id,
                }),
            ));
            self.remember(ProjectionKey::Decl(member), value_id)?;
            values.push(value_id);
        }
        if let SdkTypeKind::Enum(node) = &mut self.catalogue.get_mut(id).kind {
            node.values = values;
        }
        Ok(id)
    }

    fn project_union(&mut self, decl: TypeDeclId, u: &UnionDecl) -> Result<SdkTypeId, ProjectionError> {
        let graph = self.graph;
        let variants: Vec<&UnionVariantDecl> =
            u.variants.iter().filter(|v| !graph.is_null(v.ty)).collect();
        let nullable = variants.len() != u.variants.len();

        if variants.is_empty() {
            let null = u.variants.first().map(|v| v.ty);
            return match null {
                Some(null) => {
                    let id = self.project_type(null)?;
                    self.remember(ProjectionKey::Decl(decl), id)?;
                    Ok(id)
                }
                None => {
                    let id = self.builtin(BuiltinKind::Any, "unknown");
                    self.remember(ProjectionKey::Decl(decl), id)?;
                    Ok(id)
                }
            };
        }

        if self.options.flatten_union_as_enum {
            if let Some(id) = self.union_as_enum(decl, u, &variants, nullable)? {
                return Ok(id);
            }
        }

        let namespace = self.namespace_name(decl);
        let (name, is_generated_name) = match &u.name {
            Some(name) => (Some(self.declared_or_client_name(decl, name)), false),
            // `T | null` is a nullability wrapper, not a named union.
            None if nullable && variants.len() == 1 => (None, false),
            None => (Some(self.generated_name(decl)), true),
        };

        let mut node = SdkType::new(
            Some(decl),
            SdkTypeKind::Union(SdkUnion {
                cross_language_id: name
                    .as_deref()
                    .map(|n| qualified(&namespace, n))
                    .unwrap_or_default(),
                name,
                is_generated_name,
                namespace,
                variants: Vec::new(),
                usage: Default::default(),
                access: None,
            }),
        );
        node.nullable = nullable;
        let id = self.catalogue.push(node);
        self.remember(ProjectionKey::Decl(decl), id)?;

        let mut projected = Vec::with_capacity(variants.len());
        for variant in variants {
            projected.push(self.project_type(variant.ty)?);
        }
        if let SdkTypeKind::Union(node) = &mut self.catalogue.get_mut(id).kind {
            node.variants = projected;
        }
        Ok(id)
    }

    /// A union of string literals, optionally with `string`, becomes an enum.
    fn union_as_enum(
        &mut self,
        decl: TypeDeclId,
        u: &UnionDecl,
        variants: &[&UnionVariantDecl],
        nullable: bool,
    ) -> Result<Option<SdkTypeId>, ProjectionError> {
        let graph = self.graph;
        let mut literals: Vec<(SmolStr, LiteralValue)> = Vec::new();
        let mut is_fixed = true;
        for variant in variants {
            match &graph.type_decl(variant.ty).kind {
                TypeDeclKind::Literal(LiteralValue::String(value)) => literals.push((
                    variant.name.clone().unwrap_or_else(|| value.clone()),
                    LiteralValue::String(value.clone()),
                )),
                TypeDeclKind::Scalar(_) if graph.std_scalar_name(variant.ty) == Some("string") => {
                    is_fixed = false;
                }
                _ => return Ok(None),
            }
        }
        if literals.is_empty() {
            return Ok(None);
        }

        let namespace = self.namespace_name(decl);
        let (name, is_generated_name) = match &u.name {
            Some(name) => (self.declared_or_client_name(decl, name), false),
            None => (self.generated_name(decl), true),
        };
        let mut node = SdkType::new(
            Some(decl),
            SdkTypeKind::Enum(SdkEnum {
                cross_language_id: qualified(&namespace, &name),
                name,
                is_generated_name,
                namespace,
                value_type: BuiltinKind::String,
                values: Vec::new(),
                is_fixed,
                is_union_as_enum: true,
                usage: Default::default(),
                access: None,
            }),
        );
        node.nullable = nullable;
        let id = self.catalogue.push(node);
        self.remember(ProjectionKey::Decl(decl), id)?;

        let values = literals
            .into_iter()
            .map(|(name, value)| {
                self.catalogue.push(SdkType::new(
                    None,
                    SdkTypeKind::EnumValue(SdkEnumValue {
                        name,
                        value,
                        enum_type: id,
                    }),
                ))
            })
            .collect();
        if let SdkTypeKind::Enum(node) = &mut self.catalogue.get_mut(id).kind {
            node.values = values;
        }
        trace!("[TYPES] union {} flattened to enum", decl);
        Ok(Some(id))
    }

    // ========================================================================
    // COMPOSITES
    // ========================================================================

    fn project_model(&mut self, decl: TypeDeclId, m: &ModelDecl) -> Result<SdkTypeId, ProjectionError> {
        let graph = self.graph;
        let (name, is_generated_name) = match &m.name {
            Some(name) => (self.declared_or_client_name(decl, name), false),
            None => (self.generated_name(decl), true),
        };
        let namespace = self.namespace_name(decl);
        let cross_language_id = qualified(&namespace, &name);

        let id = self.catalogue.push(SdkType::new(
            Some(decl),
            SdkTypeKind::Model(SdkModel {
                name,
                is_generated_name,
                namespace,
                properties: Vec::new(),
                base: None,
                additional_properties: None,
                discriminator_property: None,
                discriminator_value: None,
                discriminated_subtypes: None,
                is_error: m.is_error,
                usage: Default::default(),
                access: None,
                cross_language_id: cross_language_id.clone(),
            }),
        ));
        self.remember(ProjectionKey::Decl(decl), id)?;
        trace!("[TYPES] model {} -> {}", decl, id);

        // Properties land on the node before the base is projected: a
        // discriminated base reads its subtypes' discriminator values.
        let mut properties = Vec::with_capacity(m.properties.len());
        for pid in &m.properties {
            if graph.is_void_like(graph.property(*pid).ty) {
                continue;
            }
            properties.push(self.project_model_property(*pid, id, &cross_language_id)?);
        }
        if let Some(node) = self.catalogue.model_mut(id) {
            node.properties = properties;
        }

        // `model Foo is Record<T>` and `model Foo extends Record<T>` surface
        // as additional properties, not as a base.
        let mut base = None;
        let mut additional = None;
        if let Some(base_decl) = m.base {
            match &graph.type_decl(base_decl).kind {
                TypeDeclKind::Record(value) => additional = Some(self.project_type(*value)?),
                _ => base = Some(self.project_type(base_decl)?),
            }
        }
        if let Some(ap) = m.additional_properties {
            additional = Some(self.project_type(ap)?);
        }
        if let Some(node) = self.catalogue.model_mut(id) {
            node.base = base;
            node.additional_properties = additional;
        }

        if let Some(discriminator) = &m.discriminator {
            self.project_discriminator(decl, id, m, discriminator)?;
        }
        Ok(id)
    }

    pub(crate) fn project_model_property(
        &mut self,
        pid: PropertyId,
        owner: SdkTypeId,
        owner_id: &str,
    ) -> Result<SdkProperty, ProjectionError> {
        let p = self.graph.property(pid);
        let ty = self.project_type(p.ty)?;
        let mut prop = SdkProperty::new(p.name.clone(), ty, PropertyKind::Property { discriminator: false });
        prop.origin = Some(pid);
        prop.client_name = self
            .overrides
            .client_name(pid)
            .cloned()
            .unwrap_or_else(|| p.name.clone());
        prop.serialized_name = p.serialized_name().into();
        prop.owner = Some(owner);
        prop.optional = p.optional;
        prop.client_default_value = p.default_value.clone();
        prop.cross_language_id = format!("{}.{}", owner_id, p.name).into();
        prop.deprecation = p.deprecation.clone();
        prop.doc = p.doc.clone();
        Ok(prop)
    }

    /// Record discriminator metadata on a base and its subtypes.
    fn project_discriminator(
        &mut self,
        decl: TypeDeclId,
        id: SdkTypeId,
        m: &ModelDecl,
        discriminator: &SmolStr,
    ) -> Result<(), ProjectionError> {
        let mut subtypes = IndexMap::new();
        for derived in &m.derived {
            let child = self.project_type(*derived)?;
            let value = self.discriminator_value(child, discriminator);
            match value {
                Some(value) => {
                    if let Some(node) = self.catalogue.model_mut(child) {
                        node.discriminator_value = Some(value.clone());
                        mark_discriminator(&mut node.properties, discriminator);
                    }
                    subtypes.insert(value, child);
                }
                None => self.diagnostics.error(
                    DeclRef::Type(*derived),
                    codes::DISCRIMINATOR_NOT_CONSTANT,
                    format!(
                        "subtype does not set discriminator '{}' to a constant value",
                        discriminator
                    ),
                ),
            }
        }

        let string = self.builtin(BuiltinKind::String, "string");
        if let Some(node) = self.catalogue.model_mut(id) {
            node.discriminator_property = Some(discriminator.clone());
            if !mark_discriminator(&mut node.properties, discriminator) {
                let mut synthesized =
                    SdkProperty::new(discriminator.clone(), string, PropertyKind::Property { discriminator: true });
                synthesized.owner = Some(id);
                synthesized.is_generated_name = true;
                synthesized.cross_language_id =
                    format!("{}.{}", node.cross_language_id, discriminator).into();
                node.properties.insert(0, synthesized);
            }
            if !subtypes.is_empty() {
                node.discriminated_subtypes = Some(subtypes);
            }
        }
        trace!("[TYPES] discriminator '{}' on {}", discriminator, decl);
        Ok(())
    }

    fn discriminator_value(&self, child: SdkTypeId, discriminator: &str) -> Option<SmolStr> {
        let model = self.catalogue.model(child)?;
        let prop = model
            .properties
            .iter()
            .find(|p| p.serialized_name == discriminator)?;
        match &self.catalogue.get(prop.ty).kind {
            SdkTypeKind::Constant(c) => c.value.as_str().map(SmolStr::new),
            SdkTypeKind::EnumValue(v) => v.value.as_str().map(SmolStr::new),
            _ => None,
        }
    }

    // ========================================================================
    // EFFECTIVE PAYLOAD TYPE
    // ========================================================================

    /// Fold an anonymous composite onto the named composite it was spread from.
    ///
    /// Applies when every payload member (wire metadata excluded) traces back
    /// to the same named composite and covers all of that composite's
    /// payload members.
    pub(crate) fn effective_payload_type(&self, decl: TypeDeclId) -> TypeDeclId {
        let graph = self.graph;
        let Some(model) = graph.model(decl) else {
            return decl;
        };
        if model.name.is_some() {
            return decl;
        }

        let payload: Vec<PropertyId> = model
            .properties
            .iter()
            .copied()
            .filter(|p| !graph.property(*p).is_metadata())
            .collect();
        if payload.is_empty() {
            return decl;
        }

        let mut candidate: Option<TypeDeclId> = None;
        for pid in &payload {
            if graph.property(*pid).source_property.is_none() {
                return decl;
            }
            let root = graph.root_source_property(*pid);
            let Some(owner) = graph.property(root).model else {
                return decl;
            };
            if graph.model(owner).is_none_or(|m| m.name.is_none()) {
                return decl;
            }
            match candidate {
                Some(existing) if existing != owner => return decl,
                _ => candidate = Some(owner),
            }
        }

        let Some(named) = candidate else {
            return decl;
        };
        let named_payload = graph
            .all_properties(named)
            .into_iter()
            .filter(|p| !graph.property(*p).is_metadata())
            .count();
        if named_payload == payload.len() {
            trace!("[TYPES] anonymous {} folds to {}", decl, named);
            named
        } else {
            decl
        }
    }
}

fn mark_discriminator(properties: &mut [SdkProperty], discriminator: &str) -> bool {
    match properties
        .iter_mut()
        .find(|p| p.serialized_name == discriminator)
    {
        Some(prop) => {
            prop.kind = PropertyKind::Property { discriminator: true };
            true
        }
        None => false,
    }
}

pub(crate) fn qualified(namespace: &str, name: &str) -> SmolStr {
    if namespace.is_empty() {
        SmolStr::new(name)
    } else {
        SmolStr::new(format!("{}.{}", namespace, name))
    }
}

fn literal_kind(value: &LiteralValue) -> BuiltinKind {
    match value {
        LiteralValue::String(_) => BuiltinKind::String,
        LiteralValue::Boolean(_) => BuiltinKind::Boolean,
        LiteralValue::Number(n) if n.fract() == 0.0 => BuiltinKind::Int32,
        LiteralValue::Number(_) => BuiltinKind::Float32,
    }
}

fn enum_value_type<'a>(values: impl Iterator<Item = &'a LiteralValue>) -> BuiltinKind {
    let mut kind = None;
    for value in values {
        let next = match value {
            LiteralValue::Number(n) if n.fract() == 0.0 => BuiltinKind::Int32,
            LiteralValue::Number(_) => BuiltinKind::Float32,
            _ => return BuiltinKind::String,
        };
        kind = match (kind, next) {
            (Some(BuiltinKind::Float32), _) | (_, BuiltinKind::Float32) => Some(BuiltinKind::Float32),
            _ => Some(next),
        };
    }
    kind.unwrap_or(BuiltinKind::String)
}
