// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Filtered deep copies of a program.
//!
//! A child program (a sandboxed sub-interpreter, for instance) never shares
//! the parent's tree. It receives its own tree holding the namespaces and
//! symbols the copy mask admits. Namespace ids stay the same as in the
//! parent. Symbol payloads are shared `Arc`s and diverge copy-on-write when
//! either side changes them.

use super::Program;
use crate::index::RootIndex;
use crate::namespace::{Namespace, NamespaceTree, View};
use crate::resolve::ClassCache;
use crate::symbol::{Class, Constant, Function, GlobalVar, HashDecl, Symbol};
use crate::types::{NamespaceId, copy_mask, flags};

/// Which entries a copy mask admits.
#[derive(Clone, Copy, Debug)]
struct CopyFilter {
    public_only: bool,
    system_only: bool,
}

impl CopyFilter {
    const fn new(mask: u32) -> Self {
        Self {
            public_only: flags::has(mask, copy_mask::PUBLIC),
            system_only: flags::has(mask, copy_mask::SYSTEM),
        }
    }

    const fn keeps_namespace(self, ns: &Namespace) -> bool {
        !self.public_only || ns.is_public()
    }

    const fn keeps_symbol(self, symbol_flags: u32) -> bool {
        (!self.public_only || flags::has(symbol_flags, flags::PUBLIC))
            && (!self.system_only || flags::has(symbol_flags, flags::BUILTIN))
    }
}

impl Program {
    /// Copy the committed state admitted by `mask`.
    ///
    /// `copy_mask::ALL` copies everything; `copy_mask::PUBLIC` keeps only
    /// public namespaces and symbols; `copy_mask::SYSTEM` keeps only builtin
    /// symbols. The bits combine. The copy gets a fresh class cache.
    #[must_use]
    pub fn deep_copy(&self, mask: u32) -> Self {
        let filter = CopyFilter::new(mask);
        let mut tree = self.tree.filtered_shells(|ns| filter.keeps_namespace(ns));

        let mut symbols = 0;
        for id in tree.walk(View::Committed) {
            symbols += copy_kind::<Function>(&self.tree, &mut tree, id, filter);
            symbols += copy_kind::<Class>(&self.tree, &mut tree, id, filter);
            symbols += copy_kind::<HashDecl>(&self.tree, &mut tree, id, filter);
            symbols += copy_kind::<GlobalVar>(&self.tree, &mut tree, id, filter);
            symbols += copy_kind::<Constant>(&self.tree, &mut tree, id, filter);
        }

        let mut index = RootIndex::new();
        index.rebuild_all(&tree);
        tracing::debug!(mask, namespaces = tree.len(), symbols, "deep copied program");

        Self {
            tree,
            index,
            config: *self.config(),
            next_serial: self.next_serial,
            classes: ClassCache::new(),
        }
    }
}

fn copy_kind<T: Symbol>(
    source: &NamespaceTree,
    target: &mut NamespaceTree,
    id: NamespaceId,
    filter: CopyFilter,
) -> usize {
    let (Some(from), Some(to)) = (source.get(id), target.get_mut(id)) else {
        return 0;
    };
    let table = T::table_mut(to);
    let mut copied = 0;
    for (_, entry) in T::table(from).committed() {
        if filter.keeps_symbol(entry.symbol.flags()) && table.add_committed(entry.clone()).is_ok() {
            copied += 1;
        }
    }
    copied
}
