// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Type-name resolution for the second parse stage.

use super::Resolver;
use crate::error::Error;
use crate::name_scope::NameScope;
use crate::symbol::{HashDecl, Primitive, ResolvedType};
use crate::types::SourceLocation;

impl Resolver<'_> {
    /// Resolve a type name: primitive names first, then classes, then hashdecls.
    pub(crate) fn resolve_type(&self, type_name: &NameScope) -> Option<ResolvedType> {
        if !type_name.is_qualified() && !type_name.is_anchored() {
            if let Some(primitive) = Primitive::from_name(type_name.identifier()) {
                return Some(ResolvedType::Primitive(primitive));
            }
        }
        if let Ok(class) = self.resolve_class(type_name) {
            return Some(ResolvedType::Class(self.qualified_name(&class)));
        }
        self.resolve::<HashDecl>(type_name)
            .ok()
            .map(|hashdecl| ResolvedType::HashDecl(self.qualified_name(&hashdecl)))
    }

    /// Resolve an optional declared type; a missing type means `any`.
    pub(crate) fn resolve_declared(
        &self,
        type_name: Option<&NameScope>,
        owner: &str,
        location: &SourceLocation,
    ) -> Result<ResolvedType, Error> {
        let Some(type_name) = type_name else {
            return Ok(ResolvedType::Primitive(Primitive::Any));
        };
        self.resolve_type(type_name)
            .ok_or_else(|| Error::UnknownType {
                type_name: type_name.raw().to_owned(),
                owner: owner.to_owned(),
                location: location.clone(),
            })
    }
}
