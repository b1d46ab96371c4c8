//! Relations and their canonical order.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::loc::FileLoc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Definition,
    Reference,
    Implementation,
    Interface,
}

impl RelationKind {
    pub const ALL: [RelationKind; 4] = [
        RelationKind::Definition,
        RelationKind::Reference,
        RelationKind::Implementation,
        RelationKind::Interface,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Definition => "definition",
            RelationKind::Reference => "reference",
            RelationKind::Implementation => "implementation",
            RelationKind::Interface => "interface",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "definition" | "def" => Ok(RelationKind::Definition),
            "reference" | "ref" => Ok(RelationKind::Reference),
            "implementation" | "impl" => Ok(RelationKind::Implementation),
            "interface" | "iface" => Ok(RelationKind::Interface),
            other => bail!(
                "unknown relation kind {:?} (expected one of definition, reference, implementation, interface)",
                other
            ),
        }
    }
}

/// A typed edge from the inspected symbol to a location.
///
/// Field order gives the canonical total order: package, name, path, line,
/// column, then kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Relation {
    pub pkg: String,
    pub name: String,
    #[serde(flatten)]
    pub loc: FileLoc,
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(kind: RelationKind, pkg: impl Into<String>, name: impl Into<String>, loc: FileLoc) -> Self {
        Self {
            pkg: pkg.into(),
            name: name.into(),
            loc,
            kind,
        }
    }
}

/// Deduplicated relations, iterated in canonical order
#[derive(Debug, Default)]
pub struct RelationSet {
    inner: BTreeSet<Relation>,
}

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relation: Relation) -> bool {
        self.inner.insert(relation)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn into_sorted_vec(self) -> Vec<Relation> {
        self.inner.into_iter().collect()
    }
}

impl Extend<Relation> for RelationSet {
    fn extend<I: IntoIterator<Item = Relation>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

impl FromIterator<Relation> for RelationSet {
    fn from_iter<I: IntoIterator<Item = Relation>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Sort and deduplicate a relation list in place
pub fn canonicalize(relations: &mut Vec<Relation>) {
    let set: RelationSet = relations.drain(..).collect();
    *relations = set.into_sorted_vec();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(kind: RelationKind, pkg: &str, name: &str, line: usize) -> Relation {
        Relation::new(kind, pkg, name, FileLoc::new("/m/a.go", line, 1))
    }

    #[test]
    fn test_canonicalize_sorts_by_package_then_name_then_location() {
        let mut relations = vec![
            rel(RelationKind::Reference, "b", "x", 1),
            rel(RelationKind::Reference, "a", "y", 9),
            rel(RelationKind::Reference, "a", "x", 7),
            rel(RelationKind::Reference, "a", "x", 3),
        ];
        canonicalize(&mut relations);
        let order: Vec<(&str, &str, usize)> = relations
            .iter()
            .map(|r| (r.pkg.as_str(), r.name.as_str(), r.loc.line))
            .collect();
        assert_eq!(order, vec![("a", "x", 3), ("a", "x", 7), ("a", "y", 9), ("b", "x", 1)]);
    }

    #[test]
    fn test_canonicalize_drops_exact_duplicates_only() {
        let mut relations = vec![
            rel(RelationKind::Reference, "a", "x", 3),
            rel(RelationKind::Reference, "a", "x", 3),
            rel(RelationKind::Definition, "a", "x", 3),
        ];
        canonicalize(&mut relations);
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[0].kind, RelationKind::Definition);
    }

    #[test]
    fn test_relation_kind_parse() {
        assert_eq!("Reference".parse::<RelationKind>().unwrap(), RelationKind::Reference);
        assert_eq!("impl".parse::<RelationKind>().unwrap(), RelationKind::Implementation);
        assert!("callers".parse::<RelationKind>().is_err());
    }

    #[test]
    fn test_relation_serializes_flat() {
        let json = serde_json::to_value(rel(RelationKind::Definition, "main", "x", 4)).unwrap();
        assert_eq!(json["Kind"], "definition");
        assert_eq!(json["Pkg"], "main");
        assert_eq!(json["Path"], "/m/a.go");
        assert_eq!(json["Line"], 4);
        assert_eq!(json["Column"], 1);
    }
}
