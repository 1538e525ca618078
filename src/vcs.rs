//! Git-backed workspace probe for the CLI.
//! The engine core only consumes the `VcsProbe` answers; this module is
//! the one place that shells out to git.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::Result;
use crate::source::VcsProbe;

pub struct GitProbe;

impl GitProbe {
    fn git(&self, dir: &Path, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .ok()?;
        if !output.status.success() {
            debug!("git {:?} failed in {}", args, dir.display());
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VcsProbe for GitProbe {
    fn workspace_root(&self, path: &Path) -> Result<Option<PathBuf>> {
        let dir = if path.is_dir() { path } else { path.parent().unwrap_or(path) };
        let probe_dir = if dir.exists() {
            dir.to_path_buf()
        } else {
            // The destination may not exist yet; probe its nearest
            // existing ancestor.
            match dir.ancestors().find(|a| a.exists()) {
                Some(a) => a.to_path_buf(),
                None => return Ok(None),
            }
        };
        Ok(self
            .git(&probe_dir, &["rev-parse", "--show-toplevel"])
            .map(PathBuf::from))
    }

    fn head_sha(&self, workspace: &Path) -> Result<String> {
        Ok(self
            .git(workspace, &["rev-parse", "HEAD"])
            .unwrap_or_default())
    }

    fn head_tag(&self, workspace: &Path) -> Result<Option<String>> {
        Ok(self.git(workspace, &["describe", "--tags", "--exact-match", "HEAD"]))
    }
}
