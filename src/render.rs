//! The render orchestrator.
//!
//! Wires downloader output, user inputs, the parsed specification, and
//! the action executors together: parse and upgrade the spec, resolve
//! inputs against declared defaults, execute steps against a fresh
//! scratch directory, commit to the destination, and emit the
//! manifest. The scratch directory is destroyed on every exit path
//! unless the keep-scratch debug flag is set.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::actions::{execute_steps, StepContext};
use crate::clock::Clock;
use crate::constants::SPEC_FILE;
use crate::error::{Error, Result, Violation};
use crate::expand::Expander;
use crate::manifest;
use crate::position::Position;
use crate::scope::Scope;
use crate::scratch::{CommitOpts, CommitOutcome, Scratch};
use crate::source::DownloadMetadata;
use crate::spec::{self, Template};

pub struct RenderParams<'a> {
    /// Provenance of the template, from the downloader.
    pub meta: &'a DownloadMetadata,
    /// Local read-only view of the template.
    pub template_dir: &'a Path,
    pub dest_dir: &'a Path,
    /// User-supplied input values, keyed by input name.
    pub inputs: IndexMap<String, String>,
    /// Root under which render-unique backup subdirectories are made.
    pub backup_dir: &'a Path,
    pub clock: &'a dyn Clock,
    /// Sink for the `print` action.
    pub stdout: &'a mut dyn Write,
    /// Cooperative cancellation, observed between actions.
    pub cancel: Option<&'a AtomicBool>,

    pub dry_run: bool,
    pub force_overwrite: bool,
    pub backups: bool,
    pub keep_scratch: bool,
    pub skip_input_validation: bool,
    pub manifest: bool,
}

#[derive(Debug)]
pub struct RenderResult {
    /// SHA-256 of each committed (or, for dry runs, would-be) output
    /// file, keyed by forward-slash relative path.
    pub output_hashes: BTreeMap<String, [u8; 32]>,
    pub manifest_path: Option<PathBuf>,
    /// The scratch directory, when retained by `keep_scratch`.
    pub scratch_dir: Option<PathBuf>,
    /// The render-unique backup subdirectory, when backups were taken.
    pub backups_taken: Option<PathBuf>,
}

pub fn render(params: &mut RenderParams<'_>) -> Result<RenderResult> {
    if params.dest_dir.exists() && !params.dest_dir.is_dir() {
        return Err(Error::io_msg(
            std::io::ErrorKind::AlreadyExists,
            format!(
                "the destination {:?} exists but is not a directory",
                params.dest_dir.display().to_string()
            ),
        ));
    }

    let spec_path = params.template_dir.join(SPEC_FILE);
    let src = fs::read_to_string(&spec_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                pos: Position::unknown(SPEC_FILE),
                path: spec_path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;
    let template = spec::parse_template(&src, SPEC_FILE)?;

    let expander = Expander::new();
    let resolved = resolve_inputs(&template, &params.inputs, &expander)?;

    let mut base = resolved.clone();
    base.insert("_git_tag".to_string(), params.meta.vars.git_tag.clone());
    base.insert("_git_sha".to_string(), params.meta.vars.git_sha.clone());
    base.insert(
        "_git_short_sha".to_string(),
        params.meta.vars.git_short_sha.clone(),
    );
    let mut scope = Scope::new(base);

    if params.skip_input_validation {
        debug!("skipping input validation rules");
    } else {
        evaluate_rules(&template, &scope, &expander)?;
    }

    let mut scratch = Scratch::new()?;
    let commit_result = run_steps_and_commit(params, &template, &mut scope, &mut scratch, &expander);

    let scratch_dir = if params.keep_scratch {
        let dir = scratch.keep();
        if let Some(d) = &dir {
            debug!("keeping scratch directory {}", d.display());
        }
        dir
    } else {
        None
    };
    let cleanup_result = scratch.cleanup();

    let outcome = match commit_result {
        Ok(outcome) => {
            cleanup_result?;
            outcome
        }
        Err(err) => {
            if let Err(cleanup_err) = cleanup_result {
                warn!("failed to remove scratch directory: {}", cleanup_err);
            }
            return Err(err);
        }
    };

    let manifest_path = if params.dry_run || !params.manifest {
        None
    } else {
        let sorted: BTreeMap<String, String> = resolved.into_iter().collect();
        Some(manifest::write_manifest(
            params.dest_dir,
            params.template_dir,
            params.meta,
            &sorted,
            &outcome.output_hashes,
            params.clock,
        )?)
    };

    Ok(RenderResult {
        output_hashes: outcome.output_hashes,
        manifest_path,
        scratch_dir,
        backups_taken: outcome.backups_taken,
    })
}

fn run_steps_and_commit(
    params: &mut RenderParams<'_>,
    template: &Template,
    scope: &mut Scope,
    scratch: &mut Scratch,
    expander: &Expander,
) -> Result<CommitOutcome> {
    {
        let mut ctx = StepContext {
            scope: &mut *scope,
            scratch: &mut *scratch,
            template_dir: params.template_dir,
            dest_dir: params.dest_dir,
            expander,
            stdout: &mut *params.stdout,
            cancel: params.cancel,
        };
        execute_steps(&mut ctx, &template.steps)?;
    }
    scratch.commit(
        params.dest_dir,
        params.backup_dir,
        params.clock,
        &CommitOpts {
            dry_run: params.dry_run,
            force_overwrite: params.force_overwrite,
            backups: params.backups,
        },
    )
}

/// Merges user inputs with declared defaults. Unknown and missing
/// inputs are collected so the user sees every problem at once;
/// defaults may reference inputs declared before them.
fn resolve_inputs(
    template: &Template,
    user: &IndexMap<String, String>,
    expander: &Expander,
) -> Result<IndexMap<String, String>> {
    let mut violations = Vec::new();

    let declared: HashSet<&str> = template.inputs.iter().map(|i| i.name.as_str()).collect();
    for key in user.keys() {
        if !declared.contains(key.as_str()) {
            violations.push(Violation {
                pos: Position::unknown(SPEC_FILE),
                message: format!("unknown input {:?}", key),
            });
        }
    }

    let mut resolved = IndexMap::new();
    for input in &template.inputs {
        if let Some(value) = user.get(input.name.as_str()) {
            resolved.insert(input.name.value.clone(), value.clone());
        } else if let Some(default) = &input.default {
            let partial = Scope::new(resolved.clone());
            match expander.expand(default.as_str(), &partial, &default.pos) {
                Ok(value) => {
                    resolved.insert(input.name.value.clone(), value);
                }
                Err(err) => {
                    violations.push(Violation {
                        pos: default.pos.clone(),
                        message: err.to_string(),
                    });
                }
            }
        } else {
            violations.push(Violation {
                pos: input.name.pos.clone(),
                message: format!("missing input {:?}", input.name.value),
            });
        }
    }

    if violations.is_empty() {
        Ok(resolved)
    } else {
        Err(Error::Validation { violations })
    }
}

/// Evaluates every input's rules against the full base scope,
/// collecting all failures.
fn evaluate_rules(template: &Template, scope: &Scope, expander: &Expander) -> Result<()> {
    let mut violations = Vec::new();
    for input in &template.inputs {
        for rule in &input.rules {
            match expander.eval_predicate(rule.rule.as_str(), scope, &rule.rule.pos) {
                Ok(true) => {}
                Ok(false) => violations.push(Violation {
                    pos: rule.rule.pos.clone(),
                    message: if rule.message.is_empty() {
                        format!(
                            "input {:?} failed rule {:?}",
                            input.name.value, rule.rule.value
                        )
                    } else {
                        format!("input {:?}: {}", input.name.value, rule.message)
                    },
                }),
                Err(err) => violations.push(Violation {
                    pos: rule.rule.pos.clone(),
                    message: err.to_string(),
                }),
            }
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::RuleFailed { violations })
    }
}
