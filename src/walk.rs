//! Path resolution and the file-walk helper shared by all action
//! executors. Every user-supplied path is checked for safety before the
//! filesystem is touched, and directory traversal is sorted so that
//! step effects are deterministic.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::position::Position;

/// Resolves a user-supplied path string into a relative path that
/// cannot escape its root: absolute paths, `..` segments, and empty
/// components are all rejected with `Error::PathUnsafe` before any
/// filesystem access.
pub fn safe_relative(raw: &str, pos: &Position) -> Result<PathBuf> {
    let unsafe_err = |reason: &str| Error::PathUnsafe {
        pos: pos.clone(),
        path: raw.to_string(),
        reason: reason.to_string(),
    };

    if raw.is_empty() {
        return Err(unsafe_err("path is empty"));
    }
    if raw.split('/').any(str::is_empty) {
        return Err(unsafe_err("path has an empty component"));
    }

    let path = Path::new(raw);
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            Component::CurDir => {}
            Component::ParentDir => return Err(unsafe_err("path contains \"..\"")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_err("path is absolute"))
            }
        }
    }

    Ok(path.components().collect())
}

/// Converts a relative path to its forward-slash form for manifests
/// and bookkeeping keys.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Applies `transform` to every file under `root.join(rel)`. A file
/// path is transformed directly; a directory is traversed in sorted
/// order. The transformed bytes are written back only when they differ
/// from the original.
pub fn walk_and_modify(
    root: &Path,
    rel: &Path,
    pos: &Position,
    transform: &mut dyn FnMut(&Path, Vec<u8>) -> Result<Vec<u8>>,
) -> Result<()> {
    let start = root.join(rel);
    if !start.exists() {
        return Err(Error::NotFound { pos: pos.clone(), path: slash_path(rel) });
    }

    if start.is_file() {
        return modify_file(&start, rel, transform);
    }

    for entry in WalkDir::new(&start).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let suffix = entry
            .path()
            .strip_prefix(&start)
            .expect("walkdir yields paths under its root");
        modify_file(entry.path(), &rel.join(suffix), transform)?;
    }
    Ok(())
}

fn modify_file(
    abs: &Path,
    rel: &Path,
    transform: &mut dyn FnMut(&Path, Vec<u8>) -> Result<Vec<u8>>,
) -> Result<()> {
    let before = fs::read(abs)?;
    let after = transform(rel, before.clone())?;
    if after != before {
        debug!("rewriting {}", rel.display());
        fs::write(abs, after)?;
    }
    Ok(())
}

/// Decodes file bytes as UTF-8 for text transforms.
pub fn text_contents(rel: &Path, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| {
        Error::io_msg(
            std::io::ErrorKind::InvalidData,
            format!("{} is not valid UTF-8", rel.display()),
        )
    })
}
