//! The `append` action: appends expanded text to each resolved file,
//! creating the file if absent.

use std::fs;

use crate::error::Result;
use crate::spec::AppendAction;
use crate::walk;

use super::{resolve_paths, StepContext};

pub(super) fn run(ctx: &mut StepContext<'_>, action: &AppendAction) -> Result<()> {
    let with = ctx.expander.expand(action.with.as_str(), ctx.scope, &action.with.pos)?;

    for (rel, pos) in resolve_paths(ctx, &action.paths)? {
        let abs = ctx.scratch.dir().join(&rel);
        if abs.is_dir() {
            walk::walk_and_modify(ctx.scratch.dir(), &rel, &pos, &mut |file, bytes| {
                let text = walk::text_contents(file, bytes)?;
                Ok(appended(text, &with, action.skip_ensure_newline).into_bytes())
            })?;
        } else {
            let existing = if abs.is_file() {
                walk::text_contents(&rel, fs::read(&abs)?)?
            } else {
                String::new()
            };
            if let Some(parent) = abs.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&abs, appended(existing, &with, action.skip_ensure_newline))?;
        }
    }
    Ok(())
}

/// Ensures the content ends with a newline before appending, unless
/// told not to. A freshly created file gets no leading newline.
fn appended(mut content: String, with: &str, skip_ensure_newline: bool) -> String {
    if !skip_ensure_newline && !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(with);
    content
}
