// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;

use super::ids::ElementId;

/// Maps every identifier form seen at run start (raw id, display name, canonical id) to the one
/// canonical id the rest of the core uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolver {
    table: HashMap<String, ElementId>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `alias -> canonical`. The first mapping for an alias wins.
    pub fn insert(&mut self, alias: &str, canonical: &ElementId) -> bool {
        if alias.is_empty() || self.table.contains_key(alias) {
            return false;
        }
        self.table.insert(alias.to_owned(), canonical.clone());
        true
    }

    pub fn resolve(&self, any_id: &str) -> Option<&ElementId> {
        self.table.get(any_id)
    }

    /// Resolves the first candidate that maps to a canonical id.
    pub fn resolve_first<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> Option<&ElementId> {
        candidates.into_iter().find_map(|candidate| self.resolve(candidate))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Resolver;
    use crate::model::ElementId;

    #[test]
    fn first_alias_mapping_wins() {
        let a = ElementId::new("A").expect("id");
        let b = ElementId::new("B").expect("id");
        let mut resolver = Resolver::new();

        assert!(resolver.insert("v1", &a));
        assert!(!resolver.insert("v1", &b));
        assert!(!resolver.insert("", &b));

        assert_eq!(resolver.resolve("v1"), Some(&a));
        assert_eq!(resolver.resolve("v2"), None);
    }

    #[test]
    fn resolve_first_skips_unknown_candidates() {
        let a = ElementId::new("A").expect("id");
        let mut resolver = Resolver::new();
        resolver.insert("A", &a);

        assert_eq!(resolver.resolve_first(["missing", "A"]), Some(&a));
        assert_eq!(resolver.resolve_first(["missing"]), None);
    }
}
