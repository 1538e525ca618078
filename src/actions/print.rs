//! The `print` action: expands a message and emits it to the
//! orchestrator-provided sink. No filesystem effect.

use std::io::Write;

use crate::error::Result;
use crate::spec::PrintAction;

use super::StepContext;

pub(super) fn run(ctx: &mut StepContext<'_>, action: &PrintAction) -> Result<()> {
    let message = ctx
        .expander
        .expand(action.message.as_str(), ctx.scope, &action.message.pos)?;
    writeln!(ctx.stdout, "{}", message)?;
    Ok(())
}
