//! Query Engine: regex search over indexed definitions.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::extract::DefKind;
use super::store::{PackageRecord, Store};
use crate::workspace::{self, ImportResolver};

/// A validated find request
#[derive(Debug, Clone)]
pub struct FindQuery {
    pub pattern: Regex,
    pub patterns: Vec<String>,
    pub include_imports: bool,
}

impl FindQuery {
    /// Compile `pattern`; an invalid regex fails before any lookup happens
    pub fn new(pattern: &str, patterns: Vec<String>, include_imports: bool) -> Result<Self> {
        let pattern = Regex::new(pattern).with_context(|| format!("Invalid regex {:?}", pattern))?;
        let patterns = if patterns.is_empty() {
            vec![".".to_string()]
        } else {
            patterns
        };
        Ok(Self {
            pattern,
            patterns,
            include_imports,
        })
    }
}

/// One matching definition, shaped for templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Match {
    pub path: PathBuf,
    pub kind: DefKind,
    pub line_num: usize,
    pub name: String,
}

struct Matched {
    record: PackageRecord,
    from_import: bool,
}

/// Matches in package, then file, then definition order.
///
/// Definitions of imported packages are only reported when exported and
/// outside test files.
pub fn find(store: &Store, query: &FindQuery, cwd: &Path, resolver: &ImportResolver) -> Result<Vec<Match>> {
    let mut out = Vec::new();
    for matched in matching_records(store, query, cwd, resolver)? {
        let record = &matched.record;
        for file in &record.files {
            if matched.from_import && file.is_test() {
                continue;
            }
            for def in &file.defs {
                if matched.from_import && !def.exported {
                    continue;
                }
                if !query.pattern.is_match(&def.name) {
                    continue;
                }
                out.push(Match {
                    path: record.dir.join(&file.filename),
                    kind: def.kind,
                    line_num: def.line,
                    name: def.name.clone(),
                });
            }
        }
    }
    Ok(out)
}

fn matching_records(
    store: &Store,
    query: &FindQuery,
    cwd: &Path,
    resolver: &ImportResolver,
) -> Result<Vec<Matched>> {
    let dirs: Vec<PathBuf> = workspace::match_packages(&query.patterns, cwd, resolver)?
        .into_iter()
        .map(|meta| meta.dir)
        .collect();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut imports: BTreeMap<String, PathBuf> = BTreeMap::new();
    for dir in dirs {
        let Some(record) = store.read_package(&dir)? else {
            debug!(dir = %dir.display(), "not indexed");
            continue;
        };
        seen.insert(record.dir.clone());
        if query.include_imports {
            for import in &record.imports {
                imports
                    .entry(import.clone())
                    .or_insert_with(|| record.dir.clone());
            }
        }
        out.push(Matched {
            record,
            from_import: false,
        });
    }

    for (import, from) in imports {
        for meta in workspace::resolve_dirs(&[import], &from, resolver)? {
            if seen.contains(&meta.dir) {
                continue;
            }
            let Some(record) = store.read_package(&meta.dir)? else {
                debug!(dir = %meta.dir.display(), "import not indexed");
                continue;
            };
            seen.insert(record.dir.clone());
            out.push(Matched {
                record,
                from_import: true,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_regex_is_rejected() {
        assert!(FindQuery::new("(", Vec::new(), false).is_err());
    }

    #[test]
    fn test_patterns_default_to_current_package() -> Result<()> {
        let query = FindQuery::new("Foo", Vec::new(), false)?;
        assert_eq!(query.patterns, vec![".".to_string()]);
        Ok(())
    }

    #[test]
    fn test_match_serializes_for_templates() -> Result<()> {
        let m = Match {
            path: PathBuf::from("/w/p.go"),
            kind: DefKind::Func,
            line_num: 4,
            name: "Run".to_string(),
        };
        let value = serde_json::to_value(&m)?;
        assert_eq!(value["LineNum"], 4);
        assert_eq!(value["Kind"], "func");
        Ok(())
    }
}
