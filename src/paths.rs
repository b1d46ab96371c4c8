//! Single source of truth for spelunk's filesystem layout.
//!
//! ```text
//! <data dir>/spelunk/
//! └── index.db        # package definition records (SQLite)
//! ```
//!
//! `<data dir>` is the platform data directory (`~/.local/share` on Linux,
//! `~/Library/Application Support` on macOS).

use std::path::PathBuf;

/// Environment variable overriding the index location
pub const INDEX_ENV: &str = "SPELUNK_INDEX";

/// Spelunk's data directory: `<data dir>/spelunk/`
pub fn spelunk_home() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spelunk")
}

/// Default index database: `<data dir>/spelunk/index.db`
pub fn default_index_path() -> PathBuf {
    spelunk_home().join("index.db")
}

/// Index database, honoring `--index` first and `SPELUNK_INDEX` second
pub fn index_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(INDEX_ENV).map(PathBuf::from))
        .unwrap_or_else(default_index_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_flag_wins() {
        let flag = PathBuf::from("/tmp/custom.db");
        assert_eq!(index_path(Some(flag.clone())), flag);
    }

    #[test]
    fn test_default_index_is_under_home() {
        let path = default_index_path();
        assert!(path.ends_with("spelunk/index.db"));
    }
}
