//! Command-line interface for the Stencil render engine.

use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser};
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::position::Position;

#[derive(Parser, Debug)]
#[command(author, version, about = "Stencil: scratch-space template scaffolding engine", long_about = None)]
#[command(after_help = r#"Usage Examples:
    # Render a template into a new directory:
    $ stencil ./path/to/template ./output --input name=demo

    # Preview without writing anything:
    $ stencil --dry-run ./template ./output --input name=demo

    # Overwrite existing files without taking backups:
    $ stencil --force-overwrite --no-backups ./template ./output

Template Structure:
    template/
    ├── spec.yaml           # Template specification
    └── ... template files ..."#)]
pub struct Args {
    /// Template directory
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Destination directory path
    #[arg(value_name = "DEST_DIR")]
    pub dest: PathBuf,

    /// Input value, as key=value; repeatable
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub input: Vec<String>,

    /// Overwrite destination files even when backups are disabled
    #[arg(long)]
    pub force_overwrite: bool,

    /// Do not preserve overwritten destination files
    #[arg(long)]
    pub no_backups: bool,

    /// Execute every step but write nothing to the destination
    #[arg(long)]
    pub dry_run: bool,

    /// Keep the scratch directory for debugging
    #[arg(long)]
    pub keep_scratch: bool,

    /// Skip input validation rules
    #[arg(long)]
    pub skip_input_validation: bool,

    /// Do not write a manifest
    #[arg(long)]
    pub no_manifest: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help()
                    .unwrap();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}

/// Parses repeated `--input key=value` flags into an ordered map.
pub fn parse_inputs(raw: &[String]) -> Result<IndexMap<String, String>> {
    let mut inputs = IndexMap::new();
    for entry in raw {
        let (key, value) = entry.split_once('=').ok_or_else(|| Error::Parse {
            pos: Position::unknown("<command line>"),
            message: format!("input {:?} is not of the form key=value", entry),
        })?;
        inputs.insert(key.to_string(), value.to_string());
    }
    Ok(inputs)
}
