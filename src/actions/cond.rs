//! The `if` action: branches on an expanded condition.

use crate::error::{Error, Result};
use crate::spec::IfAction;

use super::{execute_steps, StepContext};

pub(super) fn run(ctx: &mut StepContext<'_>, action: &IfAction) -> Result<()> {
    let rendered = ctx
        .expander
        .expand(action.cond.as_str(), ctx.scope, &action.cond.pos)?;
    match rendered.trim() {
        "true" => execute_steps(ctx, &action.then_steps),
        "false" => execute_steps(ctx, &action.else_steps),
        other => Err(Error::Expansion {
            pos: action.cond.pos.clone(),
            message: format!(
                "if condition must expand to \"true\" or \"false\", got {:?}",
                other
            ),
        }),
    }
}
