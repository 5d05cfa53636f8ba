// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Name resolution.
//!
//! Two lookup modes:
//!
//! - **Unqualified** (`x`): the context namespace and its ancestors are
//!   searched first, then the [`RootIndex`] supplies the shallowest
//!   declaration anywhere in the tree.
//! - **Qualified** (`A::B::x`): the namespace path is walked from the context
//!   ancestry and from every namespace named `A` (shallowest first). On
//!   failure the error reports how many path segments matched.
//!
//! Class lookups additionally fall back to class handlers. Materialized
//! classes are cached per program in a concurrent map so readers holding
//! only shared access can populate it.

mod constant;
mod types;

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::ProgramConfig;
use crate::error::Error;
use crate::index::RootIndex;
use crate::name_scope::NameScope;
use crate::namespace::{NamespaceTree, View};
use crate::symbol::{Class, Symbol};
use crate::types::NamespaceId;

/// Materialized classes keyed by owning namespace and bare name.
pub(crate) type ClassCache = DashMap<(NamespaceId, String), Arc<Class>>;

/// A successfully resolved symbol.
///
/// The handle shares the payload with the symbol table; it stays valid (and
/// unchanged) after later commits.
#[derive(Debug)]
pub struct Resolved<T> {
    /// Namespace that owns the symbol.
    pub namespace: NamespaceId,
    /// The symbol payload.
    pub symbol: Arc<T>,
}

impl<T> Resolved<T> {
    /// Create a handle.
    #[must_use]
    pub const fn new(namespace: NamespaceId, symbol: Arc<T>) -> Self {
        Self { namespace, symbol }
    }
}

impl<T> Clone for Resolved<T> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace,
            symbol: Arc::clone(&self.symbol),
        }
    }
}

/// Namespaces reached by a path search, and the best partial progress.
struct PathSearch {
    found: Vec<NamespaceId>,
    matched: usize,
}

impl PathSearch {
    const fn new() -> Self {
        Self {
            found: Vec::new(),
            matched: 0,
        }
    }

    fn record(&mut self, result: Result<NamespaceId, usize>, offset: usize) {
        match result {
            Ok(id) => {
                if !self.found.contains(&id) {
                    self.found.push(id);
                }
            }
            Err(matched) => self.matched = self.matched.max(matched + offset),
        }
    }
}

/// Outcome of a lookup before class handler fallback.
enum Lookup<T> {
    Found(Resolved<T>),
    Missing {
        /// Namespaces whose path matched but lacked the identifier.
        namespaces: Vec<NamespaceId>,
        error: Error,
    },
}

/// Resolution over one view of a program's tree and index.
#[derive(Clone, Copy)]
pub(crate) struct Resolver<'a> {
    tree: &'a NamespaceTree,
    index: &'a RootIndex,
    config: &'a ProgramConfig,
    classes: &'a ClassCache,
    view: View,
    context: Option<NamespaceId>,
}

impl<'a> Resolver<'a> {
    pub(crate) const fn new(
        tree: &'a NamespaceTree,
        index: &'a RootIndex,
        config: &'a ProgramConfig,
        classes: &'a ClassCache,
        view: View,
    ) -> Self {
        Self {
            tree,
            index,
            config,
            classes,
            view,
            context: None,
        }
    }

    /// The same resolver with a different context namespace.
    pub(crate) const fn with_context(mut self, context: Option<NamespaceId>) -> Self {
        self.context = context;
        self
    }

    /// Look `name` up in `ns` only.
    pub(crate) fn local<T: Symbol>(&self, ns: NamespaceId, name: &str) -> Option<Resolved<T>> {
        let entry = self.tree.get(ns)?.find_local::<T>(name, self.view)?;
        Some(Resolved::new(ns, Arc::clone(&entry.symbol)))
    }

    fn unqualified<T: Symbol>(&self, name: &str) -> Option<Resolved<T>> {
        if let Some(context) = self.context {
            for ns in self.tree.ancestors(context) {
                if let Some(found) = self.local(ns, name) {
                    return Some(found);
                }
            }
        }
        let entry = T::index(self.index).lookup(name, self.view)?;
        self.local(entry.namespace, name)
    }

    fn search_path(&self, path: &[String], anchored: bool) -> PathSearch {
        let mut search = PathSearch::new();
        if anchored || path.is_empty() {
            let from = if anchored {
                self.tree.root()
            } else {
                self.context.unwrap_or_else(|| self.tree.root())
            };
            search.record(self.tree.walk_path(from, path, self.view), 0);
            return search;
        }

        if let Some(context) = self.context {
            for ns in self.tree.ancestors(context) {
                search.record(self.tree.walk_path(ns, path, self.view), 0);
            }
        }

        let Some((first, rest)) = path.split_first() else {
            return search;
        };
        let mut candidates: Vec<(u32, NamespaceId)> = self
            .index
            .namespaces()
            .lookup(first, self.view)
            .into_iter()
            .filter_map(|id| self.tree.get(id).map(|ns| (ns.depth(), id)))
            .collect();
        candidates.sort_unstable();
        for (_, candidate) in candidates {
            search.record(self.tree.walk_path(candidate, rest, self.view), 1);
        }
        search
    }

    fn segment_error(scope: &NameScope, path: &[String], matched: usize) -> Error {
        Error::NamespaceSegmentNotFound {
            name: scope.raw().to_owned(),
            segment: path.get(matched).cloned().unwrap_or_default(),
            matched,
        }
    }

    /// Resolve a name that denotes a namespace.
    pub(crate) fn namespace(&self, scope: &NameScope) -> Result<NamespaceId, Error> {
        let path = scope.segments();
        let search = self.search_path(path, scope.is_anchored());
        search
            .found
            .first()
            .copied()
            .ok_or_else(|| Self::segment_error(scope, path, search.matched))
    }

    fn lookup<T: Symbol>(&self, scope: &NameScope) -> Lookup<T> {
        if !scope.is_qualified() && !scope.is_anchored() {
            return match self.unqualified(scope.identifier()) {
                Some(found) => Lookup::Found(found),
                None => Lookup::Missing {
                    namespaces: Vec::new(),
                    error: Error::NotFound {
                        kind: T::KIND,
                        name: scope.raw().to_owned(),
                    },
                },
            };
        }

        let path = scope.namespace_path();
        let search = self.search_path(path, scope.is_anchored());
        let Some(&first) = search.found.first() else {
            return Lookup::Missing {
                namespaces: Vec::new(),
                error: Self::segment_error(scope, path, search.matched),
            };
        };
        for &ns in &search.found {
            if let Some(found) = self.local(ns, scope.identifier()) {
                return Lookup::Found(found);
            }
        }
        Lookup::Missing {
            error: Error::IdentifierNotFound {
                kind: T::KIND,
                name: scope.raw().to_owned(),
                namespace: self.tree.get_path(first, true),
                matched: path.len(),
            },
            namespaces: search.found,
        }
    }

    /// Resolve a symbol by (possibly qualified) name.
    pub(crate) fn resolve<T: Symbol>(&self, scope: &NameScope) -> Result<Resolved<T>, Error> {
        match self.lookup(scope) {
            Lookup::Found(found) => Ok(found),
            Lookup::Missing { error, .. } => Err(error),
        }
    }

    /// Resolve a class, falling back to class handlers.
    pub(crate) fn resolve_class(&self, scope: &NameScope) -> Result<Resolved<Class>, Error> {
        match self.lookup::<Class>(scope) {
            Lookup::Found(found) => Ok(found),
            Lookup::Missing { namespaces, error } => {
                if !self.config.class_handler_fallback {
                    return Err(error);
                }
                let name = scope.identifier();
                let materialized = if matches!(error, Error::NotFound { .. }) {
                    self.materialize_anywhere(name)
                } else {
                    namespaces.into_iter().find_map(|ns| self.materialize(ns, name))
                };
                materialized.ok_or(error)
            }
        }
    }

    /// Ask every namespace with a class handler, shallowest first.
    fn materialize_anywhere(&self, name: &str) -> Option<Resolved<Class>> {
        let mut handlers: Vec<(u32, NamespaceId)> = self
            .tree
            .walk(self.view)
            .into_iter()
            .filter_map(|id| {
                let ns = self.tree.get(id)?;
                ns.class_handler().map(|_| (ns.depth(), id))
            })
            .collect();
        handlers.sort_by_key(|&(depth, _)| depth);
        handlers
            .into_iter()
            .find_map(|(_, ns)| self.materialize(ns, name))
    }

    /// Ask the class handler of `ns` for `name`, going through the cache.
    fn materialize(&self, ns: NamespaceId, name: &str) -> Option<Resolved<Class>> {
        let key = (ns, name.to_owned());
        if let Some(cached) = self.classes.get(&key) {
            return Some(Resolved::new(ns, Arc::clone(cached.value())));
        }

        let handler = Arc::clone(self.tree.get(ns)?.class_handler()?);
        let path = self.tree.get_path(ns, false);
        let mut class = handler.materialize(&path, name)?;
        if class.name != name {
            class.name = name.to_owned();
        }
        tracing::debug!(namespace = %path, class = name, "materialized class from handler");

        // Another reader may have won the race; keep whichever landed first.
        let stored = Arc::clone(self.classes.entry(key).or_insert_with(|| Arc::new(class)).value());
        Some(Resolved::new(ns, stored))
    }

    /// Fully qualified name of a resolved symbol.
    pub(crate) fn qualified_name<T: Symbol>(&self, resolved: &Resolved<T>) -> String {
        self.tree.qualify(resolved.namespace, resolved.symbol.name())
    }

    pub(crate) const fn config(&self) -> &ProgramConfig {
        self.config
    }
}
