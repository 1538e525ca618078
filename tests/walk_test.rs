use std::fs;
use std::path::{Path, PathBuf};

use stencil::error::Error;
use stencil::position::Position;
use stencil::walk::{safe_relative, slash_path, walk_and_modify};
use tempfile::TempDir;

fn pos() -> Position {
    Position::new("spec.yaml", 1, 1)
}

#[test]
fn test_safe_relative_accepts_nested() {
    assert_eq!(safe_relative("a/b/c.txt", &pos()).unwrap(), PathBuf::from("a/b/c.txt"));
    assert_eq!(safe_relative("a.txt", &pos()).unwrap(), PathBuf::from("a.txt"));
}

#[test]
fn test_safe_relative_rejects_absolute() {
    match safe_relative("/etc/passwd", &pos()) {
        Err(Error::PathUnsafe { path, .. }) => assert_eq!(path, "/etc/passwd"),
        other => panic!("expected PathUnsafe, got {:?}", other),
    }
}

#[test]
fn test_safe_relative_rejects_parent_segments() {
    assert!(matches!(safe_relative("../secrets", &pos()), Err(Error::PathUnsafe { .. })));
    assert!(matches!(safe_relative("a/../b", &pos()), Err(Error::PathUnsafe { .. })));
}

#[test]
fn test_safe_relative_rejects_empty_components() {
    assert!(matches!(safe_relative("", &pos()), Err(Error::PathUnsafe { .. })));
    assert!(matches!(safe_relative("a//b", &pos()), Err(Error::PathUnsafe { .. })));
    assert!(matches!(safe_relative("a/", &pos()), Err(Error::PathUnsafe { .. })));
}

#[test]
fn test_slash_path() {
    assert_eq!(slash_path(Path::new("a/b/c.txt")), "a/b/c.txt");
}

#[test]
fn test_walk_and_modify_single_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "before").unwrap();

    walk_and_modify(temp.path(), Path::new("a.txt"), &pos(), &mut |_, _| {
        Ok(b"after".to_vec())
    })
    .unwrap();

    assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "after");
}

#[test]
fn test_walk_and_modify_directory_sorted() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("dir/sub")).unwrap();
    fs::write(temp.path().join("dir/b.txt"), "x").unwrap();
    fs::write(temp.path().join("dir/a.txt"), "x").unwrap();
    fs::write(temp.path().join("dir/sub/c.txt"), "x").unwrap();

    let mut seen = Vec::new();
    walk_and_modify(temp.path(), Path::new("dir"), &pos(), &mut |rel, bytes| {
        seen.push(slash_path(rel));
        Ok(bytes)
    })
    .unwrap();

    assert_eq!(seen, vec!["dir/a.txt", "dir/b.txt", "dir/sub/c.txt"]);
}

#[test]
fn test_walk_and_modify_missing_path() {
    let temp = TempDir::new().unwrap();
    let result = walk_and_modify(temp.path(), Path::new("nope.txt"), &pos(), &mut |_, bytes| {
        Ok(bytes)
    });
    match result {
        Err(Error::NotFound { path, .. }) => assert_eq!(path, "nope.txt"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}
