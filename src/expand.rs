//! Template expansion for spec strings and file contents.
//! Wraps MiniJinja with strict undefined behavior: referencing a
//! variable that is not in scope fails unless the template defaults it
//! explicitly. Expansion is pure; the only accessible state is the
//! scope.

use minijinja::{Environment, UndefinedBehavior};

use crate::error::{Error, Result};
use crate::position::Position;
use crate::scope::Scope;

/// Expands spec strings and evaluates spec expressions against a scope.
pub struct Expander {
    env: Environment<'static>,
}

impl Expander {
    /// Builds the environment once. The extra filters are a closed set,
    /// registered explicitly so the supported surface does not drift
    /// with the engine version.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // File contents pass through the expander whole; a template's
        // final newline is content, not formatting.
        env.set_keep_trailing_newline(true);
        env.add_filter("contains", |value: String, needle: String| value.contains(&needle));
        env.add_filter("trim_prefix", |value: String, prefix: String| {
            value.strip_prefix(&prefix).map(str::to_string).unwrap_or(value)
        });
        env.add_filter("trim_suffix", |value: String, suffix: String| {
            value.strip_suffix(&suffix).map(str::to_string).unwrap_or(value)
        });
        env.add_filter("split", |value: String, sep: String| -> Vec<String> {
            value.split(&sep).map(str::to_string).collect()
        });
        env.add_filter("replace", |value: String, from: String, to: String| {
            value.replace(&from, &to)
        });
        Self { env }
    }

    /// Renders `text` against the scope. `pos` is the position of the
    /// spec field the text came from; expansion errors carry the field
    /// position advanced by the expander's own line offset.
    pub fn expand(&self, text: &str, scope: &Scope, pos: &Position) -> Result<String> {
        self.env
            .render_str(text, scope.to_context())
            .map_err(|e| expansion_error(&e, pos))
    }

    /// Evaluates `expr` as a boolean predicate (input rules). Any value
    /// with a truthy MiniJinja interpretation passes.
    pub fn eval_predicate(&self, expr: &str, scope: &Scope, pos: &Position) -> Result<bool> {
        // The clone narrows the environment's source lifetime so the
        // compiled expression may borrow from the caller.
        let env = self.env.clone();
        let compiled = env
            .compile_expression(expr)
            .map_err(|e| expansion_error(&e, pos))?;
        let value = compiled
            .eval(scope.to_context())
            .map_err(|e| expansion_error(&e, pos))?;
        Ok(value.is_true())
    }

    /// Evaluates `expr` as an expression producing a list of strings
    /// (`for_each.values_from`).
    pub fn eval_list(&self, expr: &str, scope: &Scope, pos: &Position) -> Result<Vec<String>> {
        let env = self.env.clone();
        let compiled = env
            .compile_expression(expr)
            .map_err(|e| expansion_error(&e, pos))?;
        let value = compiled
            .eval(scope.to_context())
            .map_err(|e| expansion_error(&e, pos))?;
        let iter = value.try_iter().map_err(|_| Error::Expansion {
            pos: pos.clone(),
            message: format!("expression {:?} did not produce a list", expr),
        })?;
        Ok(iter
            .map(|item| match item.as_str() {
                Some(s) => s.to_string(),
                None => item.to_string(),
            })
            .collect())
    }
}

impl Default for Expander {
    fn default() -> Self {
        Expander::new()
    }
}

fn expansion_error(err: &minijinja::Error, pos: &Position) -> Error {
    let line_offset = err.line().unwrap_or(1).saturating_sub(1);
    Error::Expansion {
        pos: pos.offset_line(line_offset),
        message: err.to_string(),
    }
}
