//! The `string_replace` action: a single multi-pattern pass over each
//! file's contents.

use crate::error::Result;
use crate::spec::StringReplaceAction;
use crate::walk;

use super::{resolve_paths, StepContext};

pub(super) fn run(ctx: &mut StepContext<'_>, action: &StringReplaceAction) -> Result<()> {
    let mut pairs = Vec::with_capacity(action.replacements.len());
    for r in &action.replacements {
        let to_replace = ctx
            .expander
            .expand(r.to_replace.as_str(), ctx.scope, &r.to_replace.pos)?;
        let with = ctx.expander.expand(r.with.as_str(), ctx.scope, &r.with.pos)?;
        pairs.push((to_replace, with));
    }

    for (rel, pos) in resolve_paths(ctx, &action.paths)? {
        walk::walk_and_modify(ctx.scratch.dir(), &rel, &pos, &mut |file, bytes| {
            let text = walk::text_contents(file, bytes)?;
            Ok(multi_replace(&text, &pairs).into_bytes())
        })?;
    }
    Ok(())
}

/// Replaces all patterns in one pass. The leftmost match wins; when two
/// patterns could start at the same position, the one listed first
/// takes priority. Matches never overlap.
fn multi_replace(input: &str, pairs: &[(String, String)]) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    'scan: while i < input.len() {
        for (from, to) in pairs {
            if !from.is_empty() && input[i..].starts_with(from.as_str()) {
                out.push_str(to);
                i += from.len();
                continue 'scan;
            }
        }
        let ch = input[i..].chars().next().expect("i is on a char boundary");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}
