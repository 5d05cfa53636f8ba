// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Class handlers: per-namespace fallbacks that materialize classes on demand.

use crate::symbol::Class;

/// Materializes classes that were not declared up front.
///
/// A handler is registered on a namespace and is asked only for names that
/// normal lookup did not find. Returning `None` means the handler does not
/// know the class either. Handlers are called from runtime readers in
/// parallel, so they must be `Send + Sync`.
pub trait ClassHandler: Send + Sync {
    /// Produce the class `name` for the namespace at `namespace_path`.
    fn materialize(&self, namespace_path: &str, name: &str) -> Option<Class>;
}

impl<F> ClassHandler for F
where
    F: Fn(&str, &str) -> Option<Class> + Send + Sync,
{
    fn materialize(&self, namespace_path: &str, name: &str) -> Option<Class> {
        self(namespace_path, name)
    }
}
