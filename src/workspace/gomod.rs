//! Minimal `go.mod` reader: module path, requirements and replacements.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const GO_MOD: &str = "go.mod";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// Relative targets are already joined onto the module root
    Dir(PathBuf),
    Module { path: String, version: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub path: String,
    pub version: Option<String>,
    pub target: ReplaceTarget,
}

/// A parsed module file
#[derive(Debug, Clone)]
pub struct GoMod {
    pub root: PathBuf,
    pub module: String,
    pub requires: Vec<Require>,
    pub replaces: Vec<Replace>,
}

impl GoMod {
    pub fn load(root: &Path) -> Result<Self> {
        let file = root.join(GO_MOD);
        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        Ok(Self::parse(root, &content))
    }

    pub fn parse(root: &Path, content: &str) -> Self {
        let mut module = String::new();
        let mut requires = Vec::new();
        let mut replaces = Vec::new();
        let mut block: Option<String> = None;

        for raw in content.lines() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            if block.is_some() && line == ")" {
                block = None;
                continue;
            }

            let (verb, rest) = match &block {
                Some(verb) => (verb.clone(), line.to_string()),
                None => {
                    let mut parts = line.splitn(2, char::is_whitespace);
                    let verb = parts.next().unwrap_or_default().to_string();
                    let rest = parts.next().unwrap_or_default().trim().to_string();
                    if rest == "(" {
                        block = Some(verb);
                        continue;
                    }
                    (verb, rest)
                }
            };

            let fields = tokens(&rest);
            match verb.as_str() {
                "module" => {
                    if let Some(path) = fields.first() {
                        module = path.clone();
                    }
                }
                "require" => {
                    if let [path, version, ..] = fields.as_slice() {
                        requires.push(Require {
                            path: path.clone(),
                            version: version.clone(),
                        });
                    }
                }
                "replace" => {
                    if let Some(replace) = parse_replace(root, &fields) {
                        replaces.push(replace);
                    }
                }
                _ => {}
            }
        }

        Self {
            root: root.to_path_buf(),
            module,
            requires,
            replaces,
        }
    }

    /// Path of `dir` relative to this module, as an import path
    pub fn import_path_of(&self, dir: &Path) -> Option<String> {
        let rel = dir.strip_prefix(&self.root).ok()?;
        let rel = slash_path(rel);
        Some(if rel.is_empty() {
            self.module.clone()
        } else {
            format!("{}/{}", self.module, rel)
        })
    }

    /// Whether `import_path` names a package of this module
    pub fn owns(&self, import_path: &str) -> bool {
        has_path_prefix(import_path, &self.module)
    }
}

/// `a/b/c` has path prefix `a/b` but not `a/bc`
pub fn has_path_prefix(path: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && (path == prefix
            || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/')))
}

/// Forward-slash form of a relative path
pub fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Module cache escaping: `Azure` becomes `!azure`
pub fn escape_module_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_replace(root: &Path, fields: &[String]) -> Option<Replace> {
    let arrow = fields.iter().position(|f| f == "=>")?;
    let (left, right) = (&fields[..arrow], &fields[arrow + 1..]);
    let path = left.first()?.clone();
    let version = left.get(1).cloned();
    let new_path = right.first()?;

    let target = if new_path.starts_with("./") || new_path.starts_with("../") || Path::new(new_path).is_absolute() {
        ReplaceTarget::Dir(root.join(new_path))
    } else {
        ReplaceTarget::Module {
            path: new_path.clone(),
            version: right.get(1)?.clone(),
        }
    };
    Some(Replace {
        path,
        version,
        target,
    })
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Whitespace-separated fields with `"…"` and `` `…` `` quoting removed
fn tokens(rest: &str) -> Vec<String> {
    rest.split_whitespace()
        .map(|t| t.trim_matches(|c| c == '"' || c == '`').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO_MOD_TEXT: &str = r#"module example.com/app // main module

go 1.22

require (
	github.com/BurntSushi/toml v1.3.2
	golang.org/x/text v0.14.0 // indirect
)

require example.com/lib v1.0.0

replace example.com/lib => ../lib

replace (
	golang.org/x/text v0.14.0 => golang.org/x/text v0.15.0
)
"#;

    #[test]
    fn test_parse_module_requires_and_replaces() {
        let m = GoMod::parse(Path::new("/w/app"), GO_MOD_TEXT);
        assert_eq!(m.module, "example.com/app");
        assert_eq!(m.requires.len(), 3);
        assert_eq!(m.requires[0].path, "github.com/BurntSushi/toml");
        assert_eq!(m.requires[2].version, "v1.0.0");
        assert_eq!(
            m.replaces[0].target,
            ReplaceTarget::Dir(PathBuf::from("/w/app/../lib"))
        );
        assert_eq!(
            m.replaces[1].target,
            ReplaceTarget::Module {
                path: "golang.org/x/text".to_string(),
                version: "v0.15.0".to_string()
            }
        );
    }

    #[test]
    fn test_import_path_of_subdirectory() {
        let m = GoMod::parse(Path::new("/w/app"), "module example.com/app\n");
        assert_eq!(
            m.import_path_of(Path::new("/w/app/internal/db")).as_deref(),
            Some("example.com/app/internal/db")
        );
        assert_eq!(m.import_path_of(Path::new("/w/app")).as_deref(), Some("example.com/app"));
        assert!(m.import_path_of(Path::new("/w/other")).is_none());
    }

    #[test]
    fn test_path_prefix_respects_segments() {
        assert!(has_path_prefix("example.com/app/x", "example.com/app"));
        assert!(has_path_prefix("example.com/app", "example.com/app"));
        assert!(!has_path_prefix("example.com/application", "example.com/app"));
    }

    #[test]
    fn test_escape_module_path() {
        assert_eq!(
            escape_module_path("github.com/BurntSushi/toml"),
            "github.com/!burnt!sushi/toml"
        );
    }
}
