//! Generated names for anonymous declarations.
//!
//! An anonymous type is named after the path that leads to it from the
//! first operation (or orphan type) that references it. The name starts at
//! the innermost named context on that path:
//!
//! ```text
//! createWidget -> Request -> { props: { ... } }   => CreateWidgetRequestProps
//! createWidget -> Request -> Widget -> { ... }     => WidgetProps (via property "props")
//! listItems -> Response -> items[] -> { ... }      => ListItemsResponseItem
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::trace;

use super::ProjectionSession;
use crate::base::text_utils::{pascal_case, singular};
use crate::base::{OperationId, TypeDeclId};
use crate::graph::{Graph, ResolvedOverrides, TypeDeclKind};

// ============================================================================
// CONTEXT PATH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContextSegment {
    pub(crate) display_name: String,
    /// `None` for the operation segment at the root of a path.
    pub(crate) ty: Option<TypeDeclId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ContextPath {
    pub(crate) segments: Vec<ContextSegment>,
}

impl ContextPath {
    /// Concatenate segments from the last anchored one onward.
    pub(crate) fn candidate_name(&self, graph: &Graph, overrides: &ResolvedOverrides) -> String {
        let type_name = |ty: TypeDeclId| -> Option<String> {
            overrides
                .client_name(ty)
                .map(|n| n.to_string())
                .or_else(|| graph.type_decl(ty).name().map(str::to_string))
        };

        let start = self
            .segments
            .iter()
            .rposition(|s| s.ty.is_none_or(|ty| type_name(ty).is_some()))
            .unwrap_or(0);

        self.segments[start..]
            .iter()
            .map(|s| match s.ty.and_then(type_name) {
                Some(name) => pascal_case(&name),
                None => pascal_case(&s.display_name),
            })
            .collect()
    }
}

struct ContextFinder<'a> {
    graph: &'a Graph,
    target: TypeDeclId,
    visited: FxHashSet<TypeDeclId>,
    path: Vec<ContextSegment>,
}

impl<'a> ContextFinder<'a> {
    fn new(graph: &'a Graph, target: TypeDeclId) -> Self {
        Self {
            graph,
            target,
            visited: FxHashSet::default(),
            path: Vec::new(),
        }
    }

    fn reset(&mut self, root: Option<ContextSegment>) {
        self.visited.clear();
        self.path.clear();
        self.path.extend(root);
    }

    fn search_operation(&mut self, op: OperationId) -> bool {
        let graph = self.graph;
        let decl = graph.operation(op);
        self.reset(Some(ContextSegment {
            display_name: decl.name.to_string(),
            ty: None,
        }));

        for body in &decl.binding.bodies {
            if self.dfs(body.ty, "Request") {
                return true;
            }
        }
        for param in &decl.parameters {
            if self.dfs(graph.property(*param).ty, "Request") {
                return true;
            }
        }
        for response in &decl.binding.responses {
            if let Some(body) = &response.body {
                if self.dfs(body.ty, "Response") {
                    return true;
                }
            }
            for header in &response.headers {
                if self.dfs(graph.property(*header).ty, "Response") {
                    return true;
                }
            }
        }
        false
    }

    fn search_orphan(&mut self, root: TypeDeclId) -> bool {
        self.reset(None);
        let display = self.graph.type_decl(root).name().unwrap_or_default().to_string();
        self.dfs(root, &display)
    }

    fn dfs(&mut self, current: TypeDeclId, display_name: &str) -> bool {
        let graph = self.graph;
        match &graph.type_decl(current).kind {
            TypeDeclKind::Array(inner) | TypeDeclKind::Record(inner) => {
                if !self.visited.insert(current) {
                    return false;
                }
                self.dfs(*inner, &singular(display_name))
            }
            TypeDeclKind::Model(model) => {
                if current == self.target {
                    self.push(display_name, current);
                    return true;
                }
                if !self.visited.insert(current) {
                    return false;
                }
                self.push(display_name, current);
                for pid in &model.properties {
                    let prop = graph.property(*pid);
                    if self.dfs(prop.ty, &prop.name) {
                        return true;
                    }
                }
                if let Some(ap) = model.additional_properties {
                    if self.dfs(ap, "AdditionalProperty") {
                        return true;
                    }
                }
                self.path.pop();

                if let Some(base) = model.base {
                    let name = graph.type_decl(base).name().unwrap_or(display_name).to_string();
                    if self.dfs(base, &name) {
                        return true;
                    }
                }
                for derived in &model.derived {
                    let name = graph.type_decl(*derived).name().unwrap_or(display_name).to_string();
                    if self.dfs(*derived, &name) {
                        return true;
                    }
                }
                false
            }
            TypeDeclKind::Union(union) => {
                if current == self.target {
                    self.push(display_name, current);
                    return true;
                }
                if !self.visited.insert(current) {
                    return false;
                }
                union.variants.iter().any(|v| self.dfs(v.ty, display_name))
            }
            _ => false,
        }
    }

    fn push(&mut self, display_name: &str, ty: TypeDeclId) {
        self.path.push(ContextSegment {
            display_name: display_name.to_string(),
            ty: Some(ty),
        });
    }
}

/// Find the first path reaching `target`: operations in order, then orphans.
pub(crate) fn find_context_path(
    graph: &Graph,
    target: TypeDeclId,
    operations: impl IntoIterator<Item = OperationId>,
    orphans: &[TypeDeclId],
) -> Option<ContextPath> {
    let mut finder = ContextFinder::new(graph, target);
    for op in operations {
        if finder.search_operation(op) {
            return Some(ContextPath {
                segments: finder.path,
            });
        }
    }
    for orphan in orphans {
        if finder.search_orphan(*orphan) {
            return Some(ContextPath {
                segments: finder.path,
            });
        }
    }
    None
}

// ============================================================================
// NAME REGISTRY
// ============================================================================

/// Hands out unique generated names.
///
/// A declaration keeps the first name it was given. Colliding candidates get
/// a numeric suffix: `Name`, `Name1`, `Name2`, ...
#[derive(Debug, Default, Clone)]
pub(crate) struct NameRegistry {
    by_decl: FxHashMap<TypeDeclId, SmolStr>,
    taken: FxHashSet<SmolStr>,
}

impl NameRegistry {
    pub(crate) fn get(&self, decl: TypeDeclId) -> Option<&SmolStr> {
        self.by_decl.get(&decl)
    }

    /// Claim `candidate` or the first free suffixed variant of it.
    pub(crate) fn claim(&mut self, candidate: &str) -> SmolStr {
        let mut name = SmolStr::new(candidate);
        let mut suffix = 1usize;
        while self.taken.contains(&name) {
            name = SmolStr::new(format!("{}{}", candidate, suffix));
            suffix += 1;
        }
        self.taken.insert(name.clone());
        name
    }

    pub(crate) fn assign(&mut self, decl: TypeDeclId, candidate: &str) -> SmolStr {
        if let Some(existing) = self.by_decl.get(&decl) {
            return existing.clone();
        }
        let name = self.claim(candidate);
        self.by_decl.insert(decl, name.clone());
        name
    }
}

impl<'g> ProjectionSession<'g> {
    /// Generated name for an anonymous declaration, stable for the run.
    pub(crate) fn generated_name(&mut self, decl: TypeDeclId) -> SmolStr {
        if let Some(name) = self.names.get(decl) {
            return name.clone();
        }
        let graph = self.graph;
        let orphans: Vec<TypeDeclId> = graph
            .containers()
            .filter_map(|(_, c)| c.service.as_ref())
            .flat_map(|s| s.orphan_types.iter().copied())
            .collect();

        let candidate = find_context_path(graph, decl, graph.operations().map(|(id, _)| id), &orphans)
            .map(|path| path.candidate_name(graph, &self.overrides))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Anonymous".to_string());
        let name = self.names.assign(decl, &candidate);
        trace!("[NAMING] {} -> {}", decl, name);
        name
    }

    /// Unique name for a node that has no declaration at all.
    pub(crate) fn synthesized_name(&mut self, candidate: &str) -> SmolStr {
        self.names.claim(candidate)
    }
}
