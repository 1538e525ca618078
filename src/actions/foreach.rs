//! The `for_each` action: iterates nested steps with a scope frame
//! binding one identifier per iteration.

use crate::error::Result;
use crate::spec::{ForEachAction, ForEachValues};

use super::{execute_steps, StepContext};

pub(super) fn run(ctx: &mut StepContext<'_>, action: &ForEachAction) -> Result<()> {
    let values = match &action.values {
        ForEachValues::Static(values) => values
            .iter()
            .map(|v| ctx.expander.expand(v.as_str(), ctx.scope, &v.pos))
            .collect::<Result<Vec<_>>>()?,
        ForEachValues::From(expr) => {
            ctx.expander.eval_list(expr.as_str(), ctx.scope, &expr.pos)?
        }
    };

    for value in values {
        ctx.scope.push_frame(action.key.as_str(), value);
        let result = execute_steps(ctx, &action.steps);
        // The frame is popped on success and on failure alike, so the
        // stack at exit always equals the stack at entry.
        ctx.scope.pop_frame();
        result?;
    }
    Ok(())
}
