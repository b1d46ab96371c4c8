use anyhow::Result;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

/// Go environment needed to resolve imports outside the workspace
#[derive(Debug, Clone, Default)]
pub struct GoEnv {
    /// Standard library root; `<goroot>/src/<import path>`
    pub goroot: Option<PathBuf>,
    /// Module download cache
    pub modcache: Option<PathBuf>,
}

impl GoEnv {
    /// Resolve from the process environment, once per command
    pub fn load() -> Result<Self> {
        let env = Self {
            goroot: Self::find_goroot(),
            modcache: Self::find_modcache(),
        };
        debug!(goroot = ?env.goroot, modcache = ?env.modcache, "go environment");
        Ok(env)
    }

    fn find_goroot() -> Option<PathBuf> {
        for var in ["SPELUNK_GOROOT", "GOROOT"] {
            if let Some(dir) = env_dir(var) {
                return Some(dir);
            }
        }

        // Ask the toolchain when one happens to be installed
        let go = which::which("go").ok()?;
        let output = Command::new(go).args(["env", "GOROOT"]).output().ok()?;
        if !output.status.success() {
            return None;
        }
        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let root = PathBuf::from(root);
        root.is_dir().then_some(root)
    }

    fn find_modcache() -> Option<PathBuf> {
        if let Some(dir) = env_dir("GOMODCACHE") {
            return Some(dir);
        }
        if let Ok(gopath) = std::env::var("GOPATH") {
            // GOPATH is a list; the first entry owns the cache
            if let Some(first) = std::env::split_paths(&gopath).next() {
                let dir = first.join("pkg").join("mod");
                if dir.is_dir() {
                    return Some(dir);
                }
            }
        }
        let dir = dirs::home_dir()?.join("go").join("pkg").join("mod");
        dir.is_dir().then_some(dir)
    }
}

fn env_dir(var: &str) -> Option<PathBuf> {
    let value = std::env::var_os(var)?;
    if value.is_empty() {
        return None;
    }
    let dir = PathBuf::from(value);
    dir.is_dir().then_some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_env_resolves_nothing() {
        let env = GoEnv::default();
        assert!(env.goroot.is_none());
        assert!(env.modcache.is_none());
    }

    #[test]
    fn test_env_dir_rejects_missing_directory() {
        assert!(env_dir("SPELUNK_TEST_UNSET_VARIABLE_FOR_ENV_DIR").is_none());
    }
}
