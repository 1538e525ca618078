//! The `go_template` action: runs the expansion language over whole
//! file contents in place.

use crate::error::Result;
use crate::spec::GoTemplateAction;
use crate::walk;

use super::{resolve_paths, StepContext};

pub(super) fn run(ctx: &mut StepContext<'_>, action: &GoTemplateAction) -> Result<()> {
    for (rel, pos) in resolve_paths(ctx, &action.paths)? {
        let expander = ctx.expander;
        let scope = &*ctx.scope;
        walk::walk_and_modify(ctx.scratch.dir(), &rel, &pos, &mut |file, bytes| {
            let text = walk::text_contents(file, bytes)?;
            let expanded = expander.expand(&text, scope, &pos)?;
            Ok(expanded.into_bytes())
        })?;
    }
    Ok(())
}
