//! Import path to directory resolution, shared by every loader.

use anyhow::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::gomod::{escape_module_path, has_path_prefix, slash_path, GoMod, ReplaceTarget, GO_MOD};
use crate::config::GoEnv;
use crate::loc::clean_path;

/// Resolves import paths the way the go command does in module mode,
/// caching parsed `go.mod` files by module root
#[derive(Debug, Default)]
pub struct ImportResolver {
    env: GoEnv,
    modules: Mutex<HashMap<PathBuf, Option<Arc<GoMod>>>>,
}

impl ImportResolver {
    pub fn new(env: GoEnv) -> Self {
        Self {
            env,
            modules: Mutex::new(HashMap::new()),
        }
    }

    pub fn env(&self) -> &GoEnv {
        &self.env
    }

    /// The module enclosing `dir`, found by walking up to the nearest `go.mod`
    pub fn module_for(&self, dir: &Path) -> Result<Option<Arc<GoMod>>> {
        if let Some(cached) = self.modules.lock().get(dir) {
            return Ok(cached.clone());
        }

        let found = match find_module_root(dir) {
            Some(root) => {
                let cached = self.modules.lock().get(&root).cloned();
                match cached {
                    Some(m) => m,
                    None => {
                        let m = Some(Arc::new(GoMod::load(&root)?));
                        self.modules.lock().insert(root, m.clone());
                        m
                    }
                }
            }
            None => None,
        };
        self.modules.lock().insert(dir.to_path_buf(), found.clone());
        Ok(found)
    }

    /// Import path of the package in `dir`
    pub fn import_path_of(&self, dir: &Path) -> Result<String> {
        if let Some(module) = self.module_for(dir)? {
            if let Some(path) = module.import_path_of(dir) {
                // Module cache and GOROOT modules are named by their go.mod too
                return Ok(path);
            }
        }
        if let Some(src) = self.env.goroot.as_ref().map(|g| g.join("src")) {
            if let Ok(rel) = dir.strip_prefix(&src) {
                return Ok(slash_path(rel));
            }
        }
        Ok(format!("_{}", dir.display()))
    }

    /// Directory holding the package `import_path` as seen from `from_dir`,
    /// or `None` when it cannot be found locally
    pub fn resolve(&self, from_dir: &Path, import_path: &str) -> Result<Option<PathBuf>> {
        let module = self.module_for(from_dir)?;

        if let Some(m) = &module {
            if m.owns(import_path) {
                let rest = &import_path[m.module.len()..];
                return Ok(existing(m.root.join(rest.trim_start_matches('/'))));
            }

            for replace in &m.replaces {
                if !has_path_prefix(import_path, &replace.path) {
                    continue;
                }
                let rest = import_path[replace.path.len()..].trim_start_matches('/');
                let dir = match &replace.target {
                    ReplaceTarget::Dir(dir) => existing(dir.join(rest)),
                    ReplaceTarget::Module { path, version } => self.in_modcache(path, version, rest),
                };
                if dir.is_some() {
                    return Ok(dir);
                }
            }

            if let Some(dir) = existing(m.root.join("vendor").join(import_path)) {
                return Ok(Some(dir));
            }

            // Longest required module that prefixes the path
            let required = m
                .requires
                .iter()
                .filter(|r| has_path_prefix(import_path, &r.path))
                .max_by_key(|r| r.path.len());
            if let Some(req) = required {
                let rest = import_path[req.path.len()..].trim_start_matches('/');
                if let Some(dir) = self.in_modcache(&req.path, &req.version, rest) {
                    return Ok(Some(dir));
                }
            }
        }

        if let Some(goroot) = &self.env.goroot {
            if let Some(dir) = existing(goroot.join("src").join(import_path)) {
                return Ok(Some(dir));
            }
            // Standard library vendored dependencies
            if let Some(dir) = existing(goroot.join("src").join("vendor").join(import_path)) {
                return Ok(Some(dir));
            }
        }

        Ok(None)
    }

    fn in_modcache(&self, module: &str, version: &str, rest: &str) -> Option<PathBuf> {
        let cache = self.env.modcache.as_ref()?;
        let root = cache.join(format!("{}@{}", escape_module_path(module), version));
        existing(root.join(rest))
    }
}

/// Nearest ancestor of `dir` (inclusive) holding a `go.mod`
pub fn find_module_root(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .find(|d| d.join(GO_MOD).is_file())
        .map(Path::to_path_buf)
}

/// Package name guessed from an import path that could not be resolved
pub fn guess_package_name(import_path: &str) -> String {
    let mut parts = import_path.rsplit('/');
    let last = parts.next().unwrap_or(import_path);
    let is_major = last.len() > 1
        && last.starts_with('v')
        && last[1..].chars().all(|c| c.is_ascii_digit());
    let name = match (is_major, parts.next()) {
        (true, Some(prev)) => prev,
        _ => last,
    };
    name.trim_start_matches("go-")
        .replace(['-', '.'], "_")
}

fn existing(dir: PathBuf) -> Option<PathBuf> {
    clean_path(&dir).ok().filter(|d| d.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_resolve_within_module_and_replace() -> Result<()> {
        let tmp = TempDir::new()?;
        let app = tmp.path().join("app");
        let lib = tmp.path().join("lib");
        write(
            &app.join("go.mod"),
            "module example.com/app\n\nrequire example.com/lib v0.0.0\n\nreplace example.com/lib => ../lib\n",
        );
        write(&app.join("util/util.go"), "package util\n");
        write(&lib.join("go.mod"), "module example.com/lib\n");
        write(&lib.join("sub/sub.go"), "package sub\n");

        let resolver = ImportResolver::new(GoEnv::default());
        assert_eq!(
            resolver.resolve(&app, "example.com/app/util")?,
            Some(app.join("util"))
        );
        let sub = resolver.resolve(&app.join("util"), "example.com/lib/sub")?;
        assert_eq!(sub, Some(clean_path(&lib.join("sub"))?));
        assert_eq!(resolver.resolve(&app, "fmt")?, None);
        Ok(())
    }

    #[test]
    fn test_resolve_from_module_cache() -> Result<()> {
        let tmp = TempDir::new()?;
        let app = tmp.path().join("app");
        let cache = tmp.path().join("modcache");
        write(
            &app.join("go.mod"),
            "module example.com/app\n\nrequire github.com/Some/dep v1.2.3\n",
        );
        write(&cache.join("github.com/!some/dep@v1.2.3/inner/inner.go"), "package inner\n");

        let resolver = ImportResolver::new(GoEnv {
            goroot: None,
            modcache: Some(cache.clone()),
        });
        assert_eq!(
            resolver.resolve(&app, "github.com/Some/dep/inner")?,
            Some(cache.join("github.com/!some/dep@v1.2.3/inner"))
        );
        Ok(())
    }

    #[test]
    fn test_import_path_of_directory() -> Result<()> {
        let tmp = TempDir::new()?;
        let app = tmp.path().join("app");
        write(&app.join("go.mod"), "module example.com/app\n");
        write(&app.join("a/b/b.go"), "package b\n");

        let resolver = ImportResolver::new(GoEnv::default());
        assert_eq!(resolver.import_path_of(&app.join("a/b"))?, "example.com/app/a/b");
        Ok(())
    }

    #[test]
    fn test_guess_package_name() {
        assert_eq!(guess_package_name("github.com/x/yaml/v3"), "yaml");
        assert_eq!(guess_package_name("fmt"), "fmt");
        assert_eq!(guess_package_name("github.com/x/go-isatty"), "isatty");
    }
}
