//! Stencil's main application entry point.
//! Parses command-line arguments, downloads the template into a local
//! view, and hands everything to the render orchestrator.

use std::io::Write;
use std::path::PathBuf;

use stencil::{
    cli::{get_args, parse_inputs, Args},
    clock::SystemClock,
    error::{default_error_handler, Result},
    render::{render, RenderParams, RenderResult},
    source::{Downloader, LocalDownloader},
    vcs::GitProbe,
};

fn main() {
    let args = get_args();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    match run(args) {
        Ok(result) => {
            if let Some(path) = &result.manifest_path {
                println!("Wrote manifest {}", path.display());
            }
            if let Some(dir) = &result.scratch_dir {
                println!("Kept scratch directory {}", dir.display());
            }
            println!("Rendered {} file(s) successfully!", result.output_hashes.len());
        }
        Err(err) => default_error_handler(err),
    }
}

fn run(args: Args) -> Result<RenderResult> {
    let cwd = std::env::current_dir()?;
    let clock = SystemClock;
    let probe = GitProbe;

    // The downloader leaves a complete read-only view of the template
    // in a temporary directory of its own.
    let view = tempfile::TempDir::with_prefix("stencil-template-")?;
    let downloader = LocalDownloader { src_path: args.template.clone(), probe: &probe };
    let meta = downloader.download(&cwd, view.path(), &args.dest)?;

    // The commit layer adds a render-unique subpath under this root.
    let backup_dir = backup_root();

    let stdout = std::io::stdout();
    let mut sink = stdout.lock();

    let mut params = RenderParams {
        meta: &meta,
        template_dir: view.path(),
        dest_dir: &args.dest,
        inputs: parse_inputs(&args.input)?,
        backup_dir: &backup_dir,
        clock: &clock,
        stdout: &mut sink,
        cancel: None,
        dry_run: args.dry_run,
        force_overwrite: args.force_overwrite,
        backups: !args.no_backups,
        keep_scratch: args.keep_scratch,
        skip_input_validation: args.skip_input_validation,
        manifest: !args.no_manifest,
    };

    let result = render(&mut params)?;
    sink.flush()?;
    Ok(result)
}

/// Backups live in a user-writable area and are retained.
fn backup_root() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".abc").join("backups"),
        None => std::env::temp_dir().join("stencil-backups"),
    }
}
