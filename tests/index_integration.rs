//! Index and find round trips over copies of the fixture modules.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use walkdir::WalkDir;

use spelunk::config::GoEnv;
use spelunk::index::{self, DefKind, FindQuery, IndexOptions, IndexSummary, Store};
use spelunk::workspace::ImportResolver;

fn fixture(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(rel)
}

/// Copy fixture module `name` into a fresh temp dir, returning the dir
/// and the module root inside it
fn copy_module(name: &str) -> Result<(TempDir, PathBuf)> {
    let tmp = TempDir::new()?;
    let src = fixture(name);
    let dst = tmp.path().join(name);
    for entry in WalkDir::new(&src) {
        let entry = entry?;
        let target = dst.join(entry.path().strip_prefix(&src)?);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok((tmp, dst))
}

fn quiet() -> IndexOptions {
    IndexOptions {
        quiet: true,
        ..Default::default()
    }
}

fn run_index(store: &Store, root: &Path, options: IndexOptions) -> Result<IndexSummary> {
    let resolver = ImportResolver::new(GoEnv::default());
    index::index_packages(store, &[".".to_string()], root, &resolver, options)
}

fn find_names(store: &Store, root: &Path, pattern: &str, include_imports: bool) -> Result<Vec<String>> {
    let resolver = ImportResolver::new(GoEnv::default());
    let query = FindQuery::new(pattern, vec![], include_imports)?;
    Ok(index::find(store, &query, root, &resolver)?
        .into_iter()
        .map(|m| m.name)
        .collect())
}

#[test]
fn test_index_then_find() -> Result<()> {
    let (tmp, root) = copy_module("defs")?;
    let store = Store::open_read_write(&tmp.path().join("index.db"))?;

    let summary = run_index(&store, &root, quiet())?;
    assert_eq!(summary, IndexSummary { indexed: 1, skipped: 0 });
    assert_eq!(store.count()?, 1);

    let resolver = ImportResolver::new(GoEnv::default());
    let query = FindQuery::new("^My", vec![], false)?;
    let matches = index::find(&store, &query, &root, &resolver)?;
    let names: Vec<&str> = matches.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "MyVar",
            "MyConst",
            "MyStruct",
            "MyStruct.MyField",
            "MyStruct.privateField",
            "MyInterface",
            "MyInterface.String",
            "MyFunc",
        ]
    );
    assert_eq!(matches[0].path, root.join("defs.go"));
    assert_eq!(matches[0].line_num, 3);
    assert_eq!(matches[3].kind, DefKind::StructField);
    assert_eq!(matches[4].kind, DefKind::StructField);
    assert_eq!(matches[7].kind, DefKind::Func);
    Ok(())
}

#[test]
fn test_find_includes_test_files_of_matched_packages() -> Result<()> {
    let (tmp, root) = copy_module("defs")?;
    let store = Store::open_read_write(&tmp.path().join("index.db"))?;
    run_index(&store, &root, quiet())?;

    assert_eq!(find_names(&store, &root, "^Test", false)?, vec!["TestStruct"]);
    Ok(())
}

#[test]
fn test_unchanged_packages_are_skipped() -> Result<()> {
    let (tmp, root) = copy_module("defs")?;
    let store = Store::open_read_write(&tmp.path().join("index.db"))?;

    run_index(&store, &root, quiet())?;
    let second = run_index(&store, &root, quiet())?;
    assert_eq!(second, IndexSummary { indexed: 0, skipped: 1 });

    let file = fs::File::options().write(true).open(root.join("defs.go"))?;
    file.set_modified(SystemTime::now() + Duration::from_secs(60))?;
    drop(file);

    let third = run_index(&store, &root, quiet())?;
    assert_eq!(third, IndexSummary { indexed: 1, skipped: 0 });
    Ok(())
}

#[test]
fn test_force_reindexes() -> Result<()> {
    let (tmp, root) = copy_module("defs")?;
    let store = Store::open_read_write(&tmp.path().join("index.db"))?;

    run_index(&store, &root, quiet())?;
    let forced = run_index(
        &store,
        &root,
        IndexOptions {
            force: true,
            ..quiet()
        },
    )?;
    assert_eq!(forced, IndexSummary { indexed: 1, skipped: 0 });
    Ok(())
}

#[test]
fn test_new_definitions_show_up_after_reindex() -> Result<()> {
    let (tmp, root) = copy_module("defs")?;
    let store = Store::open_read_write(&tmp.path().join("index.db"))?;
    run_index(&store, &root, quiet())?;
    assert!(find_names(&store, &root, "^Added$", false)?.is_empty());

    fs::write(root.join("added.go"), "package defs\n\nfunc Added() {}\n")?;
    let summary = run_index(&store, &root, quiet())?;
    assert_eq!(summary.indexed, 1);
    assert_eq!(find_names(&store, &root, "^Added$", false)?, vec!["Added"]);
    Ok(())
}

#[test]
fn test_imports_are_indexed_and_filtered() -> Result<()> {
    let (tmp, root) = copy_module("structs")?;
    let store = Store::open_read_write(&tmp.path().join("index.db"))?;

    let summary = run_index(
        &store,
        &root,
        IndexOptions {
            include_imports: true,
            ..quiet()
        },
    )?;
    assert_eq!(summary.indexed, 2);

    let without = find_names(&store, &root, "^Embedded|helper", false)?;
    assert!(without.is_empty());

    let with = find_names(&store, &root, "^Embedded|helper", true)?;
    assert_eq!(with, vec!["Embedded", "Embedded.Depth", "Embedded.Sub"]);
    Ok(())
}

#[test]
fn test_unindexed_packages_are_skipped() -> Result<()> {
    let (tmp, root) = copy_module("defs")?;
    let store = Store::open_read_write(&tmp.path().join("index.db"))?;

    assert!(find_names(&store, &root, ".", false)?.is_empty());
    assert!(store.read_package(&root.join("missing"))?.is_none());
    Ok(())
}

#[test]
fn test_read_only_store_needs_an_index() -> Result<()> {
    let tmp = TempDir::new()?;
    let err = Store::open_read_only(&tmp.path().join("absent.db"))
        .err()
        .expect("missing index should fail");
    assert!(err.to_string().contains("spelunk index"));
    Ok(())
}

#[test]
fn test_read_only_store_sees_written_records() -> Result<()> {
    let (tmp, root) = copy_module("defs")?;
    let path = tmp.path().join("index.db");
    let store = Store::open_read_write(&path)?;
    run_index(&store, &root, quiet())?;
    store.close()?;

    let store = Store::open_read_only(&path)?;
    let record = store.read_package(&root)?.expect("record");
    assert_eq!(record.import_path, "example.com/defs");
    assert_eq!(record.name, "defs");
    assert_eq!(record.hash.len(), 64);
    let filenames: Vec<&str> = record.files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(filenames, vec!["defs.go", "defs_test.go"]);
    Ok(())
}

#[test]
fn test_invalid_regex_is_rejected() {
    assert!(FindQuery::new("(", vec![], false).is_err());
}
