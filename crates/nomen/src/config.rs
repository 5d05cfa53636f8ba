// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Per-program configuration.

/// Default recursion ceiling for constant expansion.
pub const DEFAULT_MAX_CONSTANT_DEPTH: usize = 20;

/// Tunables of a [`Program`](crate::Program).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramConfig {
    /// How many constant references may be followed while expanding one
    /// constant before the expansion is treated as a cycle.
    pub max_constant_depth: usize,
    /// Whether unqualified class lookup falls back to class handlers.
    pub class_handler_fallback: bool,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            max_constant_depth: DEFAULT_MAX_CONSTANT_DEPTH,
            class_handler_fallback: true,
        }
    }
}

impl ProgramConfig {
    /// Set the constant expansion ceiling.
    #[must_use]
    pub const fn with_max_constant_depth(mut self, depth: usize) -> Self {
        self.max_constant_depth = depth;
        self
    }

    /// Enable or disable the class handler fallback.
    #[must_use]
    pub const fn with_class_handler_fallback(mut self, enabled: bool) -> Self {
        self.class_handler_fallback = enabled;
        self
    }
}
