// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Two-phase symbol tables.
//!
//! Every namespace owns one `SymbolTable` per symbol kind. Committed and
//! pending entries live in two physically separate maps: runtime lookups
//! only ever touch `committed`, and rollback only ever touches `pending`.

use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;
use std::sync::Arc;

use crate::symbol::Symbol;
use crate::types::ModuleId;

/// One stored symbol.
#[derive(Debug)]
pub struct Entry<T> {
    /// The payload, shared with any resolved handles.
    pub symbol: Arc<T>,
    /// Module this entry was merged from, `None` for local declarations.
    pub origin: Option<ModuleId>,
    /// Declaration sequence number, used to break depth ties in the index.
    pub serial: u64,
}

impl<T> Entry<T> {
    /// Create an entry.
    #[must_use]
    pub fn new(symbol: T, origin: Option<ModuleId>, serial: u64) -> Self {
        Self {
            symbol: Arc::new(symbol),
            origin,
            serial,
        }
    }
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            symbol: Arc::clone(&self.symbol),
            origin: self.origin,
            serial: self.serial,
        }
    }
}

/// Failure to commit one pending entry.
#[derive(Debug)]
pub struct CommitConflict {
    /// Name that was already committed and could not absorb the pending entry.
    pub name: String,
}

/// A committed map and a pending map for one symbol kind.
#[derive(Debug)]
pub struct SymbolTable<T> {
    committed: HashMap<String, Entry<T>>,
    pending: HashMap<String, Entry<T>>,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self {
            committed: HashMap::new(),
            pending: HashMap::new(),
        }
    }
}

impl<T> Clone for SymbolTable<T> {
    fn clone(&self) -> Self {
        Self {
            committed: self.committed.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<T: Symbol> SymbolTable<T> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending entry.
    ///
    /// Only this table's pending map is checked; callers check the committed
    /// map (and the other kinds) first. Returns the entry back if the name is
    /// already pending.
    pub fn add_pending(&mut self, entry: Entry<T>) -> Result<(), Entry<T>> {
        match self.pending.entry(entry.symbol.name().to_owned()) {
            MapEntry::Occupied(_) => Err(entry),
            MapEntry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    /// Insert a committed entry directly (merge, import, copy).
    ///
    /// Returns the entry back if the name is already committed.
    pub fn add_committed(&mut self, entry: Entry<T>) -> Result<(), Entry<T>> {
        match self.committed.entry(entry.symbol.name().to_owned()) {
            MapEntry::Occupied(_) => Err(entry),
            MapEntry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    /// Find a name, preferring the pending entry since it is newer.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Entry<T>> {
        self.pending.get(name).or_else(|| self.committed.get(name))
    }

    /// Find a committed entry.
    #[must_use]
    pub fn find_committed(&self, name: &str) -> Option<&Entry<T>> {
        self.committed.get(name)
    }

    /// Find a pending entry.
    #[must_use]
    pub fn find_pending(&self, name: &str) -> Option<&Entry<T>> {
        self.pending.get(name)
    }

    /// Mutable access to a pending entry.
    pub fn pending_mut(&mut self, name: &str) -> Option<&mut Entry<T>> {
        self.pending.get_mut(name)
    }

    /// True if the name exists in either phase.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pending.contains_key(name) || self.committed.contains_key(name)
    }

    /// Remove a committed entry.
    pub fn remove_committed(&mut self, name: &str) -> Option<Entry<T>> {
        self.committed.remove(name)
    }

    /// Keep only committed entries for which `keep` returns true.
    pub fn retain_committed(&mut self, mut keep: impl FnMut(&Entry<T>) -> bool) -> usize {
        let before = self.committed.len();
        self.committed.retain(|_, e| keep(e));
        before - self.committed.len()
    }

    /// Names of all pending entries.
    #[must_use]
    pub fn pending_names(&self) -> Vec<String> {
        self.pending.keys().cloned().collect()
    }

    /// Iterate over committed entries.
    pub fn committed(&self) -> impl Iterator<Item = (&str, &Entry<T>)> {
        self.committed.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over pending entries.
    pub fn pending(&self) -> impl Iterator<Item = (&str, &Entry<T>)> {
        self.pending.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of committed entries.
    #[must_use]
    pub fn committed_len(&self) -> usize {
        self.committed.len()
    }

    /// Number of pending entries.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Move every pending entry into the committed map.
    ///
    /// A pending entry whose name is already committed is folded into the
    /// committed symbol via [`Symbol::absorb`] (overload variants). Entries
    /// that cannot be folded are reported; declaration-time checks should
    /// make that impossible. Committed payloads are updated copy-on-write,
    /// so handles resolved before the commit keep their old view. A folded
    /// entry keeps the committed serial.
    pub fn parse_commit(&mut self) -> Result<usize, Vec<CommitConflict>> {
        let mut conflicts = Vec::new();
        let count = self.pending.len();

        for (name, entry) in self.pending.drain() {
            match self.committed.entry(name) {
                MapEntry::Vacant(slot) => {
                    slot.insert(entry);
                }
                MapEntry::Occupied(mut slot) => {
                    let pending = Arc::unwrap_or_clone(entry.symbol);
                    let committed = slot.get_mut();
                    if Arc::make_mut(&mut committed.symbol).absorb(pending).is_err() {
                        conflicts.push(CommitConflict {
                            name: slot.key().clone(),
                        });
                    }
                }
            }
        }

        if conflicts.is_empty() {
            Ok(count)
        } else {
            Err(conflicts)
        }
    }

    /// Discard every pending entry. Committed entries are untouched.
    ///
    /// Returns the number of discarded entries.
    pub fn parse_rollback(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Drop everything in both phases.
    pub fn purge(&mut self) {
        self.committed.clear();
        self.pending.clear();
    }

    /// True if both phases are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.pending.is_empty()
    }
}
