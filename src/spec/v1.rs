//! Wire schema for api_version `cli.abcxyz.dev/v1`.
//!
//! v1 predates input rules, `regex_name_lookup`, `if`, and
//! `for_each.values_from`. Its `upgrade()` is a total, pure transform
//! into the v2 representation; upgrading an already-current document is
//! the identity.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::position::Position;
use crate::spec::v2;

pub const API_VERSION: &str = "cli.abcxyz.dev/v1";

/// Action tags understood by this schema version.
pub const ACTIONS: &[&str] = &[
    "include",
    "print",
    "string_replace",
    "regex_replace",
    "append",
    "go_template",
    "for_each",
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
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub desc: String,
    pub action: String,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

/// v1's `for_each` iterator only supports a static value list.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForEachIterator {
    pub key: String,
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForEachParams {
    pub iterator: ForEachIterator,
    pub steps: Vec<Step>,
}

impl Template {
    /// Rejects action tags and parameter shapes that this version does
    /// not define. Parameter contents are typed later, after upgrade;
    /// this pass only enforces the v1 action surface.
    pub fn check(&self, file: &str) -> Result<()> {
        for step in &self.steps {
            check_step(step, file)?;
        }
        Ok(())
    }

    /// Total upgrade to the next released schema version. Inputs gain
    /// an empty rules list; everything else maps across unchanged.
    pub fn upgrade(self) -> v2::Template {
        v2::Template {
            api_version: v2::API_VERSION.to_string(),
            kind: self.kind,
            desc: self.desc,
            inputs: self.inputs.into_iter().map(Input::upgrade).collect(),
            steps: self.steps.into_iter().map(Step::upgrade).collect(),
        }
    }
}

impl Input {
    fn upgrade(self) -> v2::Input {
        v2::Input {
            name: self.name,
            desc: self.desc,
            default: self.default,
            rules: Vec::new(),
        }
    }
}

impl Step {
    fn upgrade(self) -> v2::Step {
        v2::Step {
            desc: self.desc,
            action: self.action,
            params: self.params,
        }
    }
}

fn check_step(step: &Step, file: &str) -> Result<()> {
    if !ACTIONS.contains(&step.action.as_str()) {
        return Err(Error::Parse {
            pos: Position::unknown(file),
            message: format!(
                "step {:?}: action {:?} is not available in schema {}",
                step.desc, step.action, API_VERSION
            ),
        });
    }
    if step.action == "for_each" {
        let params: ForEachParams =
            serde_yaml::from_value(step.params.clone()).map_err(|e| Error::Parse {
                pos: Position::unknown(file),
                message: format!("step {:?}: {}", step.desc, e),
            })?;
        for nested in &params.steps {
            check_step(nested, file)?;
        }
    }
    Ok(())
}
