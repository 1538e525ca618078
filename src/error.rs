//! Error handling for the Stencil render engine.
//! Defines the error kinds used throughout the engine. Errors that
//! originate in specification data carry the position of the offending
//! field.

use std::io;

use thiserror::Error;

use crate::position::Position;

/// A single field-level problem found during validation or input
/// resolution. Violations are collected so that users see every problem
/// at once instead of one per run.
#[derive(Debug)]
pub struct Violation {
    pub pos: Position,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations.iter().map(|v| format!("\n  {}", v)).collect()
}

/// Error kinds for Stencil operations.
///
/// The engine never recovers locally from a step error; the step fails,
/// the scratch directory is discarded, and the error propagates to the
/// caller unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// The spec document could not be parsed into a known shape
    #[error("{pos}: parse error: {message}")]
    Parse { pos: Position, message: String },

    /// The spec names an api_version this release does not know
    #[error("{pos}: unknown api_version {version:?} (known versions: {known})")]
    UnknownSchema { pos: Position, version: String, known: String },

    /// A known schema version contained a field it does not define
    #[error("{pos}: {message}")]
    UnknownField { pos: Position, message: String },

    /// Spec validation problems, collected across all fields
    #[error("template validation failed:{}", format_violations(.violations))]
    Validation { violations: Vec<Violation> },

    /// Input validation rule failures, collected across all inputs
    #[error("input rule(s) failed:{}", format_violations(.violations))]
    RuleFailed { violations: Vec<Violation> },

    /// Template expansion failed; the position is the spec field
    /// combined with the expander's internal offset
    #[error("{pos}: template expansion error: {message}")]
    Expansion { pos: Position, message: String },

    /// A user-supplied path escapes the root or uses a reserved shape
    #[error("{pos}: unsafe path {path:?}: {reason}")]
    PathUnsafe { pos: Position, path: String, reason: String },

    /// A path was included into the scratch directory twice without an
    /// `as` remapping
    #[error("{pos}: path {path:?} was already included")]
    AlreadyIncluded { pos: Position, path: String },

    /// An action referenced a path that does not exist under its root
    #[error("{pos}: path {path:?} not found")]
    NotFound { pos: Position, path: String },

    /// Represents errors that occur during file system operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A regex action contained an expression that failed to compile
    #[error("{pos}: invalid regular expression: {message}")]
    RegexCompile { pos: Position, message: String },

    /// The render was cancelled between actions
    #[error("render cancelled")]
    Cancelled,
}

impl Error {
    /// An `Io` error with a contextual message and no underlying OS
    /// error, used for policy failures in the commit layer.
    pub fn io_msg(kind: io::ErrorKind, message: impl Into<String>) -> Self {
        Error::Io(io::Error::new(kind, message.into()))
    }
}

/// Convenience alias for Results with Stencil's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
pub fn default_error_handler(err: Error) -> ! {
    eprintln!("{}", err);
    std::process::exit(1);
}
