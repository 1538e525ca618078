//! Wire schema for api_version `cli.abcxyz.dev/v2`, the newest released
//! spec document version. Older versions upgrade into this form before
//! annotation; executors never see anything older.

use serde::Deserialize;

pub const API_VERSION: &str = "cli.abcxyz.dev/v2";

/// Action tags understood by this schema version.
pub const ACTIONS: &[&str] = &[
    "include",
    "print",
    "string_replace",
    "regex_replace",
    "regex_name_lookup",
    "append",
    "go_template",
    "for_each",
    "if",
];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Template {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Input {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// An expansion-language predicate evaluated against the input value.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub rule: String,
    #[serde(default)]
    pub message: String,
}

/// A single step: a description, an action tag, and action-tagged
/// parameters. The params are deserialized into the matching
/// `*Params` struct once the tag is known.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub desc: String,
    pub action: String,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeParams {
    pub paths: Vec<String>,
    #[serde(default, rename = "as")]
    pub as_: Vec<String>,
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub from: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrintParams {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringReplaceParams {
    pub paths: Vec<String>,
    pub replacements: Vec<StringReplacement>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringReplacement {
    pub to_replace: String,
    pub with: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegexReplaceParams {
    pub paths: Vec<String>,
    pub replacements: Vec<RegexReplacement>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegexReplacement {
    pub regex: String,
    pub with: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendParams {
    pub paths: Vec<String>,
    pub with: String,
    #[serde(default)]
    pub skip_ensure_newline: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoTemplateParams {
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForEachParams {
    pub iterator: ForEachIterator,
    pub steps: Vec<Step>,
}

/// Exactly one of `values` and `values_from` must be set; enforced
/// during annotation so the violation carries a position.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForEachIterator {
    pub key: String,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub values_from: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IfParams {
    #[serde(rename = "if")]
    pub if_: String,
    pub then: Vec<Step>,
    #[serde(default, rename = "else")]
    pub else_: Vec<Step>,
}
