//! The scratch/commit layer.
//!
//! Every render owns a private scratch directory. Actions only ever
//! mutate files inside it; after the last step succeeds the scratch is
//! committed to the destination under the backup/overwrite policy. If
//! any step fails the scratch is discarded and the destination is left
//! untouched.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::clock::Clock;
use crate::constants::RESERVED_DIR;
use crate::error::{Error, Result};
use crate::position::Position;
use crate::walk::slash_path;

#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOpts {
    pub dry_run: bool,
    pub force_overwrite: bool,
    pub backups: bool,
}

pub struct CommitOutcome {
    /// SHA-256 of each committed file, keyed by forward-slash relative
    /// path. Backups and reserved paths are never listed.
    pub output_hashes: BTreeMap<String, [u8; 32]>,
    /// The render-unique backup subdirectory, when any backup was taken.
    pub backups_taken: Option<PathBuf>,
}

/// A private scratch directory plus the bookkeeping set of relative
/// paths that have been included into it.
pub struct Scratch {
    temp: Option<TempDir>,
    dir: PathBuf,
    included: BTreeSet<PathBuf>,
}

impl Scratch {
    pub fn new() -> Result<Self> {
        let temp = TempDir::with_prefix("stencil-scratch-")?;
        let dir = temp.path().to_path_buf();
        debug!("created scratch directory {}", dir.display());
        Ok(Self { temp: Some(temp), dir, included: BTreeSet::new() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Disables automatic removal and returns the scratch path, for
    /// the keep-scratch debug flag.
    pub fn keep(&mut self) -> Option<PathBuf> {
        self.temp.take().map(TempDir::keep)
    }

    /// Removes the scratch directory, reporting removal failures
    /// instead of swallowing them.
    pub fn cleanup(mut self) -> Result<()> {
        if let Some(temp) = self.temp.take() {
            temp.close()?;
        }
        Ok(())
    }

    /// Records an include of `dst_rel`. A path may land in scratch at
    /// most once unless explicitly remapped through `include.as`; the
    /// check runs before any copying so a failed include leaves the
    /// scratch unchanged.
    pub fn track_include(&mut self, dst_rel: &Path, remapped: bool, pos: &Position) -> Result<()> {
        if self.included.contains(dst_rel) && !remapped {
            return Err(Error::AlreadyIncluded {
                pos: pos.clone(),
                path: slash_path(dst_rel),
            });
        }
        self.included.insert(dst_rel.to_path_buf());
        Ok(())
    }

    /// Copies a file or directory tree rooted at `src_abs` into the
    /// scratch as `dst_rel`. `src_rel` is the source path relative to
    /// the include root, used for skip-prefix matching. Symbolic links
    /// are followed and materialized as regular files.
    pub fn copy_in(
        &self,
        src_abs: &Path,
        src_rel: &Path,
        dst_rel: &Path,
        skips: &[PathBuf],
    ) -> Result<()> {
        let skipped = |candidate: &Path| skips.iter().any(|s| candidate.starts_with(s));

        if src_abs.is_file() {
            if skipped(src_rel) {
                debug!("skipping {}", src_rel.display());
                return Ok(());
            }
            return copy_file(src_abs, &self.dir.join(dst_rel));
        }

        for entry in WalkDir::new(src_abs).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let suffix = entry
                .path()
                .strip_prefix(src_abs)
                .expect("walkdir yields paths under its root");
            if skipped(&src_rel.join(suffix)) {
                debug!("skipping {}", src_rel.join(suffix).display());
                continue;
            }
            copy_file(entry.path(), &self.dir.join(dst_rel).join(suffix))?;
        }
        Ok(())
    }

    /// Sorted relative paths of every scratch file that would be
    /// committed; reserved top-level paths are filtered out.
    pub fn output_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.dir)
                .expect("walkdir yields paths under its root")
                .to_path_buf();
            if rel.starts_with(RESERVED_DIR) {
                continue;
            }
            files.push(rel);
        }
        files.sort();
        Ok(files)
    }

    /// Commits the scratch to the destination.
    ///
    /// The plan pass runs fully before the write pass: every
    /// destination file that would be overwritten is first preserved in
    /// a render-unique backup subdirectory (or, with backups disabled,
    /// the commit fails unless `force_overwrite` is set) so a partway
    /// commit failure never loses pre-existing destination bytes.
    ///
    /// In dry-run mode the plan pass still runs in full, taking backups
    /// and applying the overwrite policy, and the would-be output
    /// hashes are returned; only the destination write is skipped.
    pub fn commit(
        &self,
        dest: &Path,
        backup_root: &Path,
        clock: &dyn Clock,
        opts: &CommitOpts,
    ) -> Result<CommitOutcome> {
        let files = self.output_files()?;

        let conflicts: Vec<&PathBuf> =
            files.iter().filter(|rel| dest.join(rel).is_file()).collect();

        let mut backups_taken = None;
        if !conflicts.is_empty() {
            if opts.backups {
                let sub = backup_root.join(clock.now_utc().timestamp().to_string());
                for rel in &conflicts {
                    debug!("backing up {}", rel.display());
                    copy_file(&dest.join(rel), &sub.join(rel))?;
                }
                backups_taken = Some(sub);
            } else if !opts.force_overwrite {
                return Err(Error::io_msg(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "destination file {:?} already exists and backups are disabled; enable force_overwrite to clobber it",
                        slash_path(conflicts[0])
                    ),
                ));
            }
        }

        let mut output_hashes = BTreeMap::new();
        for rel in &files {
            output_hashes.insert(slash_path(rel), hash_file(&self.dir.join(rel))?);
        }

        if !opts.dry_run {
            for rel in &files {
                copy_file(&self.dir.join(rel), &dest.join(rel))?;
            }
        }

        Ok(CommitOutcome { output_hashes, backups_taken })
    }
}

/// Copies one file, creating parent directories and preserving mode.
fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

/// SHA-256 of a file's content.
pub fn hash_file(path: &Path) -> Result<[u8; 32]> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().into())
}
