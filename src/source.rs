//! Template sources: the downloader contract and the local-directory
//! downloader with canonical-location detection.
//!
//! A "canonical" location is one that is the same for everybody. A
//! template fetched from a globally addressable remote is canonical; a
//! directory on someone's machine is not, except when the template
//! directory and the destination directory live in the same
//! version-control workspace. The relative path between them is then
//! identical across clones, so it counts as a canonical source and
//! makes later upgrades possible.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationType {
    LocalGit,
    RemoteGit,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::LocalGit => "local_git",
            LocationType::RemoteGit => "remote_git",
        }
    }
}

/// Values for template variables like `_git_tag` and `_git_sha`.
#[derive(Debug, Clone, Default)]
pub struct DownloaderVars {
    pub git_tag: String,
    pub git_sha: String,
    pub git_short_sha: String,
}

/// Provenance of a downloaded template.
///
/// `is_canonical` holds if and only if `canonical_source` and
/// `location_type` are both set; `has_version` holds if and only if
/// `version` is non-empty.
#[derive(Debug, Clone, Default)]
pub struct DownloadMetadata {
    pub is_canonical: bool,
    pub canonical_source: String,
    pub location_type: Option<LocationType>,
    pub has_version: bool,
    pub version: String,
    pub vars: DownloaderVars,
}

/// Fetches a template into a local view directory and reports its
/// provenance. Network-backed implementations live outside the engine.
pub trait Downloader {
    /// Copies the template into `view_dir` and canonicalizes against
    /// the render destination `dest_dir`.
    fn download(&self, cwd: &Path, view_dir: &Path, dest_dir: &Path)
        -> Result<DownloadMetadata>;
}

/// Workspace-identity probe. Version-control subprocess invocation is
/// an external collaborator; the engine only consumes these answers.
pub trait VcsProbe {
    /// The workspace root containing `path`, if any.
    fn workspace_root(&self, path: &Path) -> Result<Option<PathBuf>>;
    /// The SHA of the workspace's current head.
    fn head_sha(&self, workspace: &Path) -> Result<String>;
    /// The tag pointing at the workspace's current head, if any.
    fn head_tag(&self, workspace: &Path) -> Result<Option<String>>;
}

/// Downloader for a template directory already on local disk.
pub struct LocalDownloader<'a> {
    pub src_path: PathBuf,
    pub probe: &'a dyn VcsProbe,
}

impl Downloader for LocalDownloader<'_> {
    fn download(
        &self,
        cwd: &Path,
        view_dir: &Path,
        dest_dir: &Path,
    ) -> Result<DownloadMetadata> {
        let src_abs = absolutize(cwd, &self.src_path);
        let dest_abs = absolutize(cwd, dest_dir);

        debug!(
            "copying local template source {} into {}",
            src_abs.display(),
            view_dir.display()
        );
        copy_tree(&src_abs, view_dir)?;

        let vars = match self.probe.workspace_root(&src_abs)? {
            Some(root) => {
                let sha = self.probe.head_sha(&root)?;
                let short = sha.chars().take(7).collect();
                let tag = self.probe.head_tag(&root)?.unwrap_or_default();
                DownloaderVars { git_tag: tag, git_sha: sha, git_short_sha: short }
            }
            None => DownloaderVars::default(),
        };

        let (canonical_source, version, location_type) =
            self.canonicalize(&src_abs, &dest_abs)?;

        Ok(DownloadMetadata {
            is_canonical: !canonical_source.is_empty(),
            canonical_source,
            location_type,
            has_version: !version.is_empty(),
            version,
            vars,
        })
    }
}

impl LocalDownloader<'_> {
    /// A local directory is a canonical source only when the template
    /// and the destination share one workspace; the canonical name is
    /// then the relative path from destination to template.
    fn canonicalize(
        &self,
        src_abs: &Path,
        dest_abs: &Path,
    ) -> Result<(String, String, Option<LocationType>)> {
        let template_root = self.probe.workspace_root(src_abs)?;
        let dest_root = self.probe.workspace_root(dest_abs)?;
        match (template_root, dest_root) {
            (Some(t), Some(d)) if t == d => {
                let rel = relative_path(dest_abs, src_abs);
                let version = self.probe.head_sha(&t)?;
                Ok((rel, version, Some(LocationType::LocalGit)))
            }
            _ => {
                debug!("template location is not canonical");
                Ok((String::new(), String::new(), None))
            }
        }
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Slash-joined relative path from directory `from` to `to`.
fn relative_path(from: &Path, to: &Path) -> String {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Copies a directory tree, following symlinks.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| crate::error::Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let suffix = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under its root");
        let target = dst.join(suffix);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), target)?;
    }
    Ok(())
}
