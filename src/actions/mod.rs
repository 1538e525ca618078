//! Step executors: one module per action variant, dispatched through a
//! single match over the closed action set. Each executor mutates the
//! scratch directory through the shared walk helper and never writes
//! outside it.

mod append;
mod cond;
mod foreach;
mod include;
mod print;
mod regex;
mod replace;
mod template;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::error::{Error, Result};
use crate::expand::Expander;
use crate::position::{Position, Spanned};
use crate::scope::Scope;
use crate::scratch::Scratch;
use crate::spec::{Action, Step};
use crate::walk;

/// State threaded through every executor for one render.
pub struct StepContext<'a> {
    pub scope: &'a mut Scope,
    pub scratch: &'a mut Scratch,
    pub template_dir: &'a Path,
    pub dest_dir: &'a Path,
    pub expander: &'a Expander,
    pub stdout: &'a mut dyn Write,
    pub cancel: Option<&'a AtomicBool>,
}

/// Executes steps in declaration order. A cancellation signal observed
/// between actions aborts the remaining actions.
pub fn execute_steps(ctx: &mut StepContext<'_>, steps: &[Step]) -> Result<()> {
    for step in steps {
        if let Some(cancel) = ctx.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
        }
        debug!("executing step: {}", step.desc);
        match &step.action {
            Action::Include(a) => include::run(ctx, a)?,
            Action::Print(a) => print::run(ctx, a)?,
            Action::StringReplace(a) => replace::run(ctx, a)?,
            Action::RegexReplace(a) => regex::replace(ctx, a)?,
            Action::RegexNameLookup(a) => regex::name_lookup(ctx, a)?,
            Action::Append(a) => append::run(ctx, a)?,
            Action::GoTemplate(a) => template::run(ctx, a)?,
            Action::ForEach(a) => foreach::run(ctx, a)?,
            Action::If(a) => cond::run(ctx, a)?,
        }
    }
    Ok(())
}

/// Expands and safety-checks a list of action paths.
fn resolve_paths(
    ctx: &StepContext<'_>,
    paths: &[Spanned<String>],
) -> Result<Vec<(PathBuf, Position)>> {
    paths
        .iter()
        .map(|p| {
            let expanded = ctx.expander.expand(p.as_str(), ctx.scope, &p.pos)?;
            Ok((walk::safe_relative(&expanded, &p.pos)?, p.pos.clone()))
        })
        .collect()
}
