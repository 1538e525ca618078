//! The `include` action: copies paths from a source root into the
//! scratch directory.

use crate::error::{Error, Result};
use crate::spec::{IncludeAction, IncludeFrom};
use crate::walk;

use super::StepContext;

pub(super) fn run(ctx: &mut StepContext<'_>, action: &IncludeAction) -> Result<()> {
    let skips = action
        .skip
        .iter()
        .map(|s| {
            let expanded = ctx.expander.expand(s.as_str(), ctx.scope, &s.pos)?;
            walk::safe_relative(&expanded, &s.pos)
        })
        .collect::<Result<Vec<_>>>()?;

    let root = match action.from {
        IncludeFrom::Template => ctx.template_dir,
        IncludeFrom::Destination => ctx.dest_dir,
    };

    for (i, path) in action.paths.iter().enumerate() {
        let expanded = ctx.expander.expand(path.as_str(), ctx.scope, &path.pos)?;
        let src_rel = walk::safe_relative(&expanded, &path.pos)?;

        // The "as" list remaps destination names pairwise.
        let (dst_rel, remapped) = match action.as_.get(i) {
            Some(alias) => {
                let expanded = ctx.expander.expand(alias.as_str(), ctx.scope, &alias.pos)?;
                (walk::safe_relative(&expanded, &alias.pos)?, true)
            }
            None => (src_rel.clone(), false),
        };

        let src_abs = root.join(&src_rel);
        if !src_abs.exists() {
            return Err(Error::NotFound { pos: path.pos.clone(), path: expanded });
        }

        ctx.scratch.track_include(&dst_rel, remapped, &path.pos)?;
        ctx.scratch.copy_in(&src_abs, &src_rel, &dst_rel, &skips)?;
    }
    Ok(())
}
