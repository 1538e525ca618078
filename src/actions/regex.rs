//! The `regex_replace` and `regex_name_lookup` actions.

use regex::Regex;

use crate::error::{Error, Result};
use crate::spec::{RegexNameLookupAction, RegexReplaceAction, RegexReplacement};
use crate::walk;

use super::{resolve_paths, StepContext};

pub(super) fn replace(ctx: &mut StepContext<'_>, action: &RegexReplaceAction) -> Result<()> {
    let compiled = compile_replacements(ctx, &action.replacements)?;

    for (rel, pos) in resolve_paths(ctx, &action.paths)? {
        walk::walk_and_modify(ctx.scratch.dir(), &rel, &pos, &mut |file, bytes| {
            let mut text = walk::text_contents(file, bytes)?;
            for (re, with) in &compiled {
                // Greedy, non-overlapping, left to right. `with` may
                // reference named captures as ${name}.
                text = re.replace_all(&text, with.as_str()).into_owned();
            }
            Ok(text.into_bytes())
        })?;
    }
    Ok(())
}

/// Like `regex_replace`, but `with` names a scope key: capture
/// references in it are expanded first and the whole match is replaced
/// by the bound value. A key that is not in scope fails the step.
pub(super) fn name_lookup(ctx: &mut StepContext<'_>, action: &RegexNameLookupAction) -> Result<()> {
    let compiled: Vec<_> = compile_replacements(ctx, &action.replacements)?
        .into_iter()
        .zip(action.replacements.iter())
        .map(|((re, with), spec)| (re, with, spec.with.pos.clone()))
        .collect();

    for (rel, pos) in resolve_paths(ctx, &action.paths)? {
        let scope = &*ctx.scope;
        walk::walk_and_modify(ctx.scratch.dir(), &rel, &pos, &mut |file, bytes| {
            let mut text = walk::text_contents(file, bytes)?;
            for (re, with, with_pos) in &compiled {
                let mut lookup_err = None;
                let replaced = re.replace_all(&text, |caps: &regex::Captures<'_>| {
                    let mut key = String::new();
                    caps.expand(with, &mut key);
                    match scope.lookup(&key) {
                        Some(value) => value.to_string(),
                        None => {
                            if lookup_err.is_none() {
                                lookup_err = Some(Error::Expansion {
                                    pos: with_pos.clone(),
                                    message: format!("no variable {:?} in scope", key),
                                });
                            }
                            String::new()
                        }
                    }
                });
                if let Some(err) = lookup_err {
                    return Err(err);
                }
                text = replaced.into_owned();
            }
            Ok(text.into_bytes())
        })?;
    }
    Ok(())
}

/// Expands and compiles each (regex, with) pair. Regexes are compiled
/// with Unicode support; a compile failure carries the regex's
/// position.
fn compile_replacements(
    ctx: &StepContext<'_>,
    replacements: &[RegexReplacement],
) -> Result<Vec<(Regex, String)>> {
    replacements
        .iter()
        .map(|r| {
            let pattern = ctx.expander.expand(r.regex.as_str(), ctx.scope, &r.regex.pos)?;
            let re = Regex::new(&pattern).map_err(|e| Error::RegexCompile {
                pos: r.regex.pos.clone(),
                message: e.to_string(),
            })?;
            let with = ctx.expander.expand(r.with.as_str(), ctx.scope, &r.with.pos)?;
            Ok((re, with))
        })
        .collect()
}
