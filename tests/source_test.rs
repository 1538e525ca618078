use std::fs;
use std::path::{Path, PathBuf};

use stencil::error::Result;
use stencil::source::{Downloader, LocalDownloader, LocationType, VcsProbe};
use tempfile::TempDir;

/// Probe that pretends one directory is a workspace root.
struct FakeProbe {
    root: Option<PathBuf>,
    sha: String,
    tag: Option<String>,
}

impl VcsProbe for FakeProbe {
    fn workspace_root(&self, path: &Path) -> Result<Option<PathBuf>> {
        match &self.root {
            Some(root) if path.starts_with(root) => Ok(Some(root.clone())),
            _ => Ok(None),
        }
    }

    fn head_sha(&self, _workspace: &Path) -> Result<String> {
        Ok(self.sha.clone())
    }

    fn head_tag(&self, _workspace: &Path) -> Result<Option<String>> {
        Ok(self.tag.clone())
    }
}

#[test]
fn test_canonical_when_template_and_dest_share_workspace() {
    let repo = TempDir::new().unwrap();
    fs::create_dir_all(repo.path().join("t/foo")).unwrap();
    fs::write(repo.path().join("t/foo/spec.yaml"), "stuff").unwrap();
    let view = TempDir::new().unwrap();

    let probe = FakeProbe {
        root: Some(repo.path().to_path_buf()),
        sha: "abc123def4567890".to_string(),
        tag: Some("v1.2.3".to_string()),
    };
    let downloader = LocalDownloader { src_path: repo.path().join("t/foo"), probe: &probe };

    let meta = downloader
        .download(repo.path(), view.path(), &repo.path().join("out"))
        .unwrap();

    assert!(meta.is_canonical);
    assert_eq!(meta.canonical_source, "../t/foo");
    assert_eq!(meta.location_type, Some(LocationType::LocalGit));
    assert!(meta.has_version);
    assert_eq!(meta.version, "abc123def4567890");

    assert_eq!(meta.vars.git_sha, "abc123def4567890");
    assert_eq!(meta.vars.git_short_sha, "abc123d");
    assert_eq!(meta.vars.git_tag, "v1.2.3");

    // The downloader left a complete view of the template.
    assert_eq!(fs::read_to_string(view.path().join("spec.yaml")).unwrap(), "stuff");
}

#[test]
fn test_not_canonical_outside_workspace() {
    let template = TempDir::new().unwrap();
    fs::write(template.path().join("spec.yaml"), "stuff").unwrap();
    let dest = TempDir::new().unwrap();
    let view = TempDir::new().unwrap();

    let probe = FakeProbe { root: None, sha: String::new(), tag: None };
    let downloader = LocalDownloader { src_path: template.path().to_path_buf(), probe: &probe };

    let meta = downloader
        .download(template.path(), view.path(), dest.path())
        .unwrap();

    assert!(!meta.is_canonical);
    assert_eq!(meta.canonical_source, "");
    assert_eq!(meta.location_type, None);
    assert!(!meta.has_version);
    assert_eq!(meta.vars.git_sha, "");
}

#[test]
fn test_not_canonical_when_only_template_in_workspace() {
    let repo = TempDir::new().unwrap();
    fs::create_dir_all(repo.path().join("t")).unwrap();
    fs::write(repo.path().join("t/spec.yaml"), "stuff").unwrap();
    let dest = TempDir::new().unwrap();
    let view = TempDir::new().unwrap();

    let probe = FakeProbe {
        root: Some(repo.path().to_path_buf()),
        sha: "abc123def4567890".to_string(),
        tag: None,
    };
    let downloader = LocalDownloader { src_path: repo.path().join("t"), probe: &probe };

    let meta = downloader.download(repo.path(), view.path(), dest.path()).unwrap();

    // Template vars still resolve, but the location is not canonical.
    assert!(!meta.is_canonical);
    assert_eq!(meta.vars.git_short_sha, "abc123d");
    assert_eq!(meta.vars.git_tag, "");
}
