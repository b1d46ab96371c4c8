//! File locations shared by every query path.

use serde::{Deserialize, Serialize};
use spelunk_metal::Pos;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A 1-based position inside a file.
///
/// Ordering is path, then line, then column, which is the order relations
/// and definitions are presented in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileLoc {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl FileLoc {
    pub fn new(path: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            path: path.into(),
            line,
            column,
        }
    }

    pub fn at(path: &Path, pos: Pos) -> Self {
        Self::new(path, pos.line, pos.column)
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    /// Resolve a relative path against the current working directory
    pub fn absolute(&self) -> std::io::Result<Self> {
        Ok(Self {
            path: clean_path(&self.path)?,
            line: self.line,
            column: self.column,
        })
    }
}

/// Absolute form of `path` with `.` and `..` folded away lexically
pub fn clean_path(path: &Path) -> std::io::Result<PathBuf> {
    let abs = std::path::absolute(path)?;
    let mut out = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

impl fmt::Display for FileLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let loc = FileLoc::new("/src/main.go", 3, 7);
        assert_eq!(loc.to_string(), "/src/main.go:3:7");
    }

    #[test]
    fn test_clean_path_folds_parent_dirs() {
        let cleaned = clean_path(Path::new("/a/b/../c/./d.go")).unwrap();
        assert_eq!(cleaned, PathBuf::from("/a/c/d.go"));
    }

    #[test]
    fn test_ordering_is_path_line_column() {
        let a = FileLoc::new("/a.go", 9, 1);
        let b = FileLoc::new("/b.go", 1, 1);
        let c = FileLoc::new("/b.go", 1, 4);
        let mut locs = vec![c.clone(), b.clone(), a.clone()];
        locs.sort();
        assert_eq!(locs, vec![a, b, c]);
    }
}
