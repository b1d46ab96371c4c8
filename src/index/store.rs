//! Persistent Index: package records keyed by directory, in SQLite.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::extract::Def;

/// Definitions of one file, by name relative to the package directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    pub defs: Vec<Def>,
}

impl FileRecord {
    pub fn is_test(&self) -> bool {
        self.filename.ends_with("_test.go")
    }
}

/// Everything the index keeps about a package directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub dir: PathBuf,
    pub import_path: String,
    pub imports: Vec<String>,
    /// Content hash at the time of indexing; empty forces a reindex
    pub hash: String,
    pub files: Vec<FileRecord>,
}

/// The index database
pub struct Store {
    conn: Option<Connection>,
    path: PathBuf,
}

impl Store {
    /// Open for writing, creating the file and schema if needed
    pub fn open_read_write(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create index directory: {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open index database: {:?}", path))?;

        let store = Self {
            conn: Some(conn),
            path: path.to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an existing index without write access
    pub fn open_read_only(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!(
                "index database {:?} does not exist; run `spelunk index` first",
                path
            );
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open index database: {:?}", path))?;
        Ok(Self {
            conn: Some(conn),
            path: path.to_path_buf(),
        })
    }

    fn init_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r#"
            -- One row per package directory
            CREATE TABLE IF NOT EXISTS packages (
                dir TEXT PRIMARY KEY,
                record TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<&Connection> {
        match &self.conn {
            Some(conn) => Ok(conn),
            None => bail!("index database {:?} is closed", self.path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store `record` under its directory, replacing any previous record
    pub fn write_package(&self, record: &PackageRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO packages (dir, record) VALUES (?1, ?2)",
                params![record.dir.to_string_lossy(), json],
            )
            .with_context(|| format!("Failed to write package {}", record.dir.display()))?;
        Ok(())
    }

    /// The record for `dir`, or `None` when it was never indexed
    pub fn read_package(&self, dir: &Path) -> Result<Option<PackageRecord>> {
        let mut stmt = self
            .conn()?
            .prepare("SELECT record FROM packages WHERE dir = ?1")?;
        let result = stmt.query_row(params![dir.to_string_lossy()], |row| row.get::<_, String>(0));

        match result {
            Ok(json) => {
                let record = serde_json::from_str(&json)
                    .with_context(|| format!("Corrupt index record for {}", dir.display()))?;
                Ok(Some(record))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Release the database handle now instead of at drop
    pub fn close(mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .map_err(|(_, e)| e)
                .with_context(|| format!("Failed to close index database: {:?}", self.path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::extract::DefKind;
    use tempfile::tempdir;

    fn record(dir: &str) -> PackageRecord {
        PackageRecord {
            name: "p".to_string(),
            dir: PathBuf::from(dir),
            import_path: "example.com/p".to_string(),
            imports: vec!["fmt".to_string()],
            hash: "abc".to_string(),
            files: vec![FileRecord {
                filename: "p.go".to_string(),
                defs: vec![Def {
                    name: "MyFunc".to_string(),
                    kind: DefKind::Func,
                    line: 3,
                    column: 1,
                    exported: true,
                }],
            }],
        }
    }

    #[test]
    fn test_write_and_read_package() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::open_read_write(&dir.path().join("nested/index.db"))?;
        let rec = record("/w/p");
        store.write_package(&rec)?;
        assert_eq!(store.read_package(Path::new("/w/p"))?, Some(rec));
        assert_eq!(store.count()?, 1);
        Ok(())
    }

    #[test]
    fn test_unindexed_directory_is_none() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::open_read_write(&dir.path().join("index.db"))?;
        assert_eq!(store.read_package(Path::new("/w/missing"))?, None);
        Ok(())
    }

    #[test]
    fn test_write_replaces_previous_record() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::open_read_write(&dir.path().join("index.db"))?;
        store.write_package(&record("/w/p"))?;
        let mut updated = record("/w/p");
        updated.files.clear();
        updated.hash = "def".to_string();
        store.write_package(&updated)?;
        assert_eq!(store.read_package(Path::new("/w/p"))?, Some(updated));
        assert_eq!(store.count()?, 1);
        Ok(())
    }

    #[test]
    fn test_read_only_requires_existing_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("index.db");
        assert!(Store::open_read_only(&path).is_err());

        Store::open_read_write(&path)?.close()?;
        let store = Store::open_read_only(&path)?;
        assert!(store.write_package(&record("/w/p")).is_err());
        assert_eq!(store.read_package(Path::new("/w/p"))?, None);
        Ok(())
    }
}
