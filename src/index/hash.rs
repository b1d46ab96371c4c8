//! Content hash over file metadata, used to skip unchanged packages.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::workspace::PackageMeta;

/// Files whose metadata fingerprints `meta`: `go.mod` when the package
/// belongs to a module, then its non-test and test sources in listing order
pub fn hashed_paths(meta: &PackageMeta) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(module) = &meta.module {
        paths.push(module.go_mod());
    }
    paths.extend(
        meta.go_files
            .iter()
            .chain(&meta.test_go_files)
            .chain(&meta.xtest_go_files)
            .map(|name| meta.dir.join(name)),
    );
    paths
}

/// Lower-case hex SHA-256 over name, size and modification time of each path
pub fn hash_files(paths: &[PathBuf]) -> Result<String> {
    let mut hasher = Sha256::new();
    for path in paths {
        let info = fs::metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
        let mtime = info
            .modified()
            .with_context(|| format!("No modification time for {}", path.display()))?;
        let millis = mtime
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();

        hasher.update(file_name(path).as_bytes());
        hasher.update((info.len() as i64).to_le_bytes());
        hasher.update(millis.to_le_bytes());
    }
    Ok(hex(&hasher.finalize()))
}

pub fn package_hash(meta: &PackageMeta) -> Result<String> {
    hash_files(&hashed_paths(meta))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, at: SystemTime) -> Result<()> {
        let file = fs::OpenOptions::new().write(true).open(path)?;
        file.set_modified(at)?;
        Ok(())
    }

    #[test]
    fn test_hash_is_stable_for_unchanged_files() -> Result<()> {
        let tmp = TempDir::new()?;
        let a = tmp.path().join("a.go");
        fs::write(&a, "package a\n")?;
        let first = hash_files(&[a.clone()])?;
        let second = hash_files(&[a])?;
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        Ok(())
    }

    #[test]
    fn test_hash_changes_with_mtime() -> Result<()> {
        let tmp = TempDir::new()?;
        let a = tmp.path().join("a.go");
        fs::write(&a, "package a\n")?;
        touch(&a, UNIX_EPOCH + Duration::from_secs(1_000_000))?;
        let before = hash_files(&[a.clone()])?;
        touch(&a, UNIX_EPOCH + Duration::from_secs(2_000_000))?;
        let after = hash_files(&[a])?;
        assert_ne!(before, after);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(hash_files(&[PathBuf::from("/nonexistent/spelunk/a.go")]).is_err());
    }

    #[test]
    fn test_hashed_paths_lead_with_go_mod() {
        let meta = PackageMeta {
            dir: PathBuf::from("/w/m/p"),
            module: Some(crate::workspace::ModuleRef {
                path: "example.com/m".to_string(),
                root: PathBuf::from("/w/m"),
            }),
            go_files: vec!["p.go".to_string()],
            test_go_files: vec!["p_test.go".to_string()],
            ..PackageMeta::default()
        };
        assert_eq!(
            hashed_paths(&meta),
            vec![
                PathBuf::from("/w/m/go.mod"),
                PathBuf::from("/w/m/p/p.go"),
                PathBuf::from("/w/m/p/p_test.go"),
            ]
        );
    }
}
