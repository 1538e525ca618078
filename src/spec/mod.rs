//! Specification document model, parsing, and version upgrade.
//!
//! Each release carries a closed set of concrete schema versions
//! ([`v1`], [`v2`]). The parser dispatches on `api_version` to the
//! matching loader, applies the upgrade chain until the newest version
//! is reached, annotates every user-supplied string with its source
//! position, and validates the result. Executors only ever see the
//! annotated current form defined here.

pub mod v1;
pub mod v2;

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::{Error, Result, Violation};
use crate::position::{Position, PositionIndexer, Spanned};
use crate::walk;

/// The `kind` value every spec document must carry.
pub const KIND_TEMPLATE: &str = "Template";

fn known_versions() -> String {
    format!("{}, {}", v1::API_VERSION, v2::API_VERSION)
}

/// The annotated, current-version specification document.
#[derive(Debug)]
pub struct Template {
    pub api_version: String,
    pub desc: String,
    pub inputs: Vec<Input>,
    pub steps: Vec<Step>,
}

#[derive(Debug)]
pub struct Input {
    pub name: Spanned<String>,
    pub desc: String,
    pub default: Option<Spanned<String>>,
    pub rules: Vec<Rule>,
}

#[derive(Debug)]
pub struct Rule {
    pub rule: Spanned<String>,
    pub message: String,
}

#[derive(Debug)]
pub struct Step {
    pub desc: String,
    pub pos: Position,
    pub action: Action,
}

/// The closed set of step operations. One variant per action tag; the
/// dispatcher in the executor layer is a single match over this enum.
#[derive(Debug)]
pub enum Action {
    Include(IncludeAction),
    Print(PrintAction),
    StringReplace(StringReplaceAction),
    RegexReplace(RegexReplaceAction),
    RegexNameLookup(RegexNameLookupAction),
    Append(AppendAction),
    GoTemplate(GoTemplateAction),
    ForEach(ForEachAction),
    If(IfAction),
}

/// Where `include` reads from: the template directory (default) or the
/// destination directory, so a previous render's output can be
/// modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeFrom {
    Template,
    Destination,
}

#[derive(Debug)]
pub struct IncludeAction {
    pub paths: Vec<Spanned<String>>,
    pub as_: Vec<Spanned<String>>,
    pub skip: Vec<Spanned<String>>,
    pub from: IncludeFrom,
}

#[derive(Debug)]
pub struct PrintAction {
    pub message: Spanned<String>,
}

#[derive(Debug)]
pub struct StringReplacement {
    pub to_replace: Spanned<String>,
    pub with: Spanned<String>,
}

#[derive(Debug)]
pub struct StringReplaceAction {
    pub paths: Vec<Spanned<String>>,
    pub replacements: Vec<StringReplacement>,
}

#[derive(Debug)]
pub struct RegexReplacement {
    pub regex: Spanned<String>,
    pub with: Spanned<String>,
}

#[derive(Debug)]
pub struct RegexReplaceAction {
    pub paths: Vec<Spanned<String>>,
    pub replacements: Vec<RegexReplacement>,
}

#[derive(Debug)]
pub struct RegexNameLookupAction {
    pub paths: Vec<Spanned<String>>,
    pub replacements: Vec<RegexReplacement>,
}

#[derive(Debug)]
pub struct AppendAction {
    pub paths: Vec<Spanned<String>>,
    pub with: Spanned<String>,
    pub skip_ensure_newline: bool,
}

#[derive(Debug)]
pub struct GoTemplateAction {
    pub paths: Vec<Spanned<String>>,
}

#[derive(Debug)]
pub enum ForEachValues {
    Static(Vec<Spanned<String>>),
    From(Spanned<String>),
}

#[derive(Debug)]
pub struct ForEachAction {
    pub key: Spanned<String>,
    pub values: ForEachValues,
    pub steps: Vec<Step>,
}

#[derive(Debug)]
pub struct IfAction {
    pub cond: Spanned<String>,
    pub then_steps: Vec<Step>,
    pub else_steps: Vec<Step>,
}

/// Parses a spec document: version sniff, version-specific load,
/// upgrade chain to the newest schema, position annotation, and
/// validation.
pub fn parse_template(src: &str, file: &str) -> Result<Template> {
    #[derive(Deserialize)]
    struct Probe {
        #[serde(default)]
        api_version: String,
        #[serde(default)]
        kind: String,
    }

    let probe: Probe = serde_yaml::from_str(src).map_err(|e| classify_yaml_error(&e, file))?;
    if probe.kind != KIND_TEMPLATE {
        return Err(Error::Parse {
            pos: Position::unknown(file),
            message: format!("unsupported kind {:?}, expected {:?}", probe.kind, KIND_TEMPLATE),
        });
    }

    let current: v2::Template = match probe.api_version.as_str() {
        v1::API_VERSION => {
            let doc: v1::Template =
                serde_yaml::from_str(src).map_err(|e| classify_yaml_error(&e, file))?;
            doc.check(file)?;
            doc.upgrade()
        }
        v2::API_VERSION => {
            serde_yaml::from_str(src).map_err(|e| classify_yaml_error(&e, file))?
        }
        other => {
            return Err(Error::UnknownSchema {
                pos: Position::unknown(file),
                version: other.to_string(),
                known: known_versions(),
            })
        }
    };

    let template = annotate(current, src, file)?;
    template.validate()?;
    Ok(template)
}

fn classify_yaml_error(err: &serde_yaml::Error, file: &str) -> Error {
    let pos = match err.location() {
        Some(loc) => Position::new(file, loc.line(), loc.column()),
        None => Position::unknown(file),
    };
    let message = err.to_string();
    if message.contains("unknown field") {
        Error::UnknownField { pos, message }
    } else {
        Error::Parse { pos, message }
    }
}

/// Walks the upgraded document in declaration order, re-locating each
/// user string in the raw source to attach positions.
fn annotate(doc: v2::Template, src: &str, file: &str) -> Result<Template> {
    let mut idx = PositionIndexer::new(src, file);

    let inputs = doc
        .inputs
        .into_iter()
        .map(|input| {
            let name = locate(&mut idx, input.name);
            let default = input.default.map(|d| locate(&mut idx, d));
            let rules = input
                .rules
                .into_iter()
                .map(|r| Rule { rule: locate(&mut idx, r.rule), message: r.message })
                .collect();
            Input { name, desc: input.desc, default, rules }
        })
        .collect();

    let steps = annotate_steps(doc.steps, &mut idx, file)?;

    Ok(Template { api_version: doc.api_version, desc: doc.desc, inputs, steps })
}

fn locate(idx: &mut PositionIndexer<'_>, value: String) -> Spanned<String> {
    let pos = idx.locate(&value);
    Spanned::new(value, pos)
}

fn locate_all(idx: &mut PositionIndexer<'_>, values: Vec<String>) -> Vec<Spanned<String>> {
    values.into_iter().map(|v| locate(idx, v)).collect()
}

fn annotate_steps(
    steps: Vec<v2::Step>,
    idx: &mut PositionIndexer<'_>,
    file: &str,
) -> Result<Vec<Step>> {
    steps
        .into_iter()
        .map(|step| {
            let pos = idx.locate(&step.desc);
            let action = annotate_action(&step, idx, file, &pos)?;
            Ok(Step { desc: step.desc, pos, action })
        })
        .collect()
}

fn annotate_action(
    step: &v2::Step,
    idx: &mut PositionIndexer<'_>,
    file: &str,
    step_pos: &Position,
) -> Result<Action> {
    let params = step.params.clone();
    match step.action.as_str() {
        "include" => {
            let p: v2::IncludeParams = typed_params(params, step_pos)?;
            let from = match p.from.as_deref() {
                None | Some("template") => IncludeFrom::Template,
                Some("destination") => IncludeFrom::Destination,
                Some(other) => {
                    return Err(Error::Parse {
                        pos: step_pos.clone(),
                        message: format!(
                            "include.from must be \"template\" or \"destination\", got {:?}",
                            other
                        ),
                    })
                }
            };
            Ok(Action::Include(IncludeAction {
                paths: locate_all(idx, p.paths),
                as_: locate_all(idx, p.as_),
                skip: locate_all(idx, p.skip),
                from,
            }))
        }
        "print" => {
            let p: v2::PrintParams = typed_params(params, step_pos)?;
            Ok(Action::Print(PrintAction { message: locate(idx, p.message) }))
        }
        "string_replace" => {
            let p: v2::StringReplaceParams = typed_params(params, step_pos)?;
            Ok(Action::StringReplace(StringReplaceAction {
                paths: locate_all(idx, p.paths),
                replacements: p
                    .replacements
                    .into_iter()
                    .map(|r| StringReplacement {
                        to_replace: locate(idx, r.to_replace),
                        with: locate(idx, r.with),
                    })
                    .collect(),
            }))
        }
        "regex_replace" => {
            let p: v2::RegexReplaceParams = typed_params(params, step_pos)?;
            Ok(Action::RegexReplace(RegexReplaceAction {
                paths: locate_all(idx, p.paths),
                replacements: annotate_regex_replacements(p.replacements, idx),
            }))
        }
        "regex_name_lookup" => {
            let p: v2::RegexReplaceParams = typed_params(params, step_pos)?;
            Ok(Action::RegexNameLookup(RegexNameLookupAction {
                paths: locate_all(idx, p.paths),
                replacements: annotate_regex_replacements(p.replacements, idx),
            }))
        }
        "append" => {
            let p: v2::AppendParams = typed_params(params, step_pos)?;
            Ok(Action::Append(AppendAction {
                paths: locate_all(idx, p.paths),
                with: locate(idx, p.with),
                skip_ensure_newline: p.skip_ensure_newline,
            }))
        }
        "go_template" => {
            let p: v2::GoTemplateParams = typed_params(params, step_pos)?;
            Ok(Action::GoTemplate(GoTemplateAction { paths: locate_all(idx, p.paths) }))
        }
        "for_each" => {
            let p: v2::ForEachParams = typed_params(params, step_pos)?;
            let key = locate(idx, p.iterator.key);
            let values = match (p.iterator.values, p.iterator.values_from) {
                (Some(values), None) => ForEachValues::Static(locate_all(idx, values)),
                (None, Some(from)) => ForEachValues::From(locate(idx, from)),
                _ => {
                    return Err(Error::Parse {
                        pos: step_pos.clone(),
                        message:
                            "for_each iterator needs exactly one of values and values_from"
                                .to_string(),
                    })
                }
            };
            let steps = annotate_steps(p.steps, idx, file)?;
            Ok(Action::ForEach(ForEachAction { key, values, steps }))
        }
        "if" => {
            let p: v2::IfParams = typed_params(params, step_pos)?;
            let cond = locate(idx, p.if_);
            let then_steps = annotate_steps(p.then, idx, file)?;
            let else_steps = annotate_steps(p.else_, idx, file)?;
            Ok(Action::If(IfAction { cond, then_steps, else_steps }))
        }
        other => Err(Error::Parse {
            pos: step_pos.clone(),
            message: format!("unknown action {:?}", other),
        }),
    }
}

fn annotate_regex_replacements(
    replacements: Vec<v2::RegexReplacement>,
    idx: &mut PositionIndexer<'_>,
) -> Vec<RegexReplacement> {
    replacements
        .into_iter()
        .map(|r| RegexReplacement { regex: locate(idx, r.regex), with: locate(idx, r.with) })
        .collect()
}

fn typed_params<T: serde::de::DeserializeOwned>(
    params: serde_yaml::Value,
    step_pos: &Position,
) -> Result<T> {
    serde_yaml::from_value(params).map_err(|e| {
        let message = e.to_string();
        if message.contains("unknown field") {
            Error::UnknownField { pos: step_pos.clone(), message }
        } else {
            Error::Parse { pos: step_pos.clone(), message }
        }
    })
}

/// Input names match the identifier shape `[a-zA-Z_][a-zA-Z0-9_]*`.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Template {
    /// Validates the fully upgraded document. Violations are collected
    /// across all fields before being reported.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        let mut seen = HashSet::new();
        for input in &self.inputs {
            if !is_identifier(input.name.as_str()) {
                violations.push(Violation {
                    pos: input.name.pos.clone(),
                    message: format!(
                        "input name {:?} is not a valid identifier",
                        input.name.value
                    ),
                });
            }
            if !seen.insert(input.name.value.clone()) {
                violations.push(Violation {
                    pos: input.name.pos.clone(),
                    message: format!("duplicate input name {:?}", input.name.value),
                });
            }
            for rule in &input.rules {
                if rule.rule.value.is_empty() {
                    violations.push(Violation {
                        pos: rule.rule.pos.clone(),
                        message: format!(
                            "input {:?} has an empty rule",
                            input.name.value
                        ),
                    });
                }
            }
        }

        validate_steps(&self.steps, &mut violations);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { violations })
        }
    }
}

fn validate_steps(steps: &[Step], violations: &mut Vec<Violation>) {
    for step in steps {
        if step.desc.is_empty() {
            violations.push(Violation {
                pos: step.pos.clone(),
                message: "step desc must not be empty".to_string(),
            });
        }
        match &step.action {
            Action::Include(a) => {
                if !a.as_.is_empty() && a.as_.len() != a.paths.len() {
                    violations.push(Violation {
                        pos: step.pos.clone(),
                        message: format!(
                            "include has {} path(s) but {} \"as\" name(s); they pair up one-to-one",
                            a.paths.len(),
                            a.as_.len()
                        ),
                    });
                }
                validate_literal_paths(a.paths.iter().chain(&a.as_).chain(&a.skip), violations);
            }
            Action::Print(_) => {}
            Action::StringReplace(a) => validate_literal_paths(a.paths.iter(), violations),
            Action::RegexReplace(a) => validate_literal_paths(a.paths.iter(), violations),
            Action::RegexNameLookup(a) => validate_literal_paths(a.paths.iter(), violations),
            Action::Append(a) => validate_literal_paths(a.paths.iter(), violations),
            Action::GoTemplate(a) => validate_literal_paths(a.paths.iter(), violations),
            Action::ForEach(a) => {
                if !is_identifier(a.key.as_str()) {
                    violations.push(Violation {
                        pos: a.key.pos.clone(),
                        message: format!(
                            "for_each key {:?} is not a valid identifier",
                            a.key.value
                        ),
                    });
                }
                validate_steps(&a.steps, violations);
            }
            Action::If(a) => {
                if a.cond.value.is_empty() {
                    violations.push(Violation {
                        pos: a.cond.pos.clone(),
                        message: "if condition must not be empty".to_string(),
                    });
                }
                validate_steps(&a.then_steps, violations);
                validate_steps(&a.else_steps, violations);
            }
        }
    }
}

/// Paths that contain no expansion placeholders can be checked for
/// safety statically; expanded paths are re-checked at execution time.
fn validate_literal_paths<'a>(
    paths: impl Iterator<Item = &'a Spanned<String>>,
    violations: &mut Vec<Violation>,
) {
    for path in paths {
        if path.value.contains("{{") {
            continue;
        }
        if let Err(err) = walk::safe_relative(path.as_str(), &path.pos) {
            violations.push(Violation { pos: path.pos.clone(), message: err.to_string() });
        }
    }
}
