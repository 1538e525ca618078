//! Stencil is a template scaffolding engine.
//! It interprets a typed, versioned specification document shipped
//! inside a template directory, applies a sequence of
//! file-transformation actions against a private scratch directory,
//! commits the result to a destination with backup and overwrite
//! policy, and emits a content-hash-anchored manifest describing what
//! was rendered.

/// Step executors: one per action variant, dispatched over the closed
/// action set.
pub mod actions;

/// Command-line interface module.
/// Handles argument parsing and input flag decoding.
pub mod cli;

/// Injected clock for manifest timestamps and backup naming.
pub mod clock;

/// Common constants used throughout the engine.
pub mod constants;

/// Error types and handling for the engine.
pub mod error;

/// Template expansion over variable scopes, with strict undefined
/// behavior and a closed filter set.
pub mod expand;

/// Manifest generation: deterministic lock-file output anchored to
/// SHA-256 content hashes.
pub mod manifest;

/// Source positions attached to specification fields.
pub mod position;

/// The render orchestrator: parse, resolve inputs, execute steps,
/// commit, emit manifest.
pub mod render;

/// Variable scope: a stack of frames with innermost-first lookup.
pub mod scope;

/// The scratch/commit layer: private working directory, include
/// bookkeeping, backups, and content hashing.
pub mod scratch;

/// Template sources: downloader contract and canonical-location
/// detection for local directories.
pub mod source;

/// Specification document model, version-dispatched parsing, and the
/// upgrade chain.
pub mod spec;

/// Git-backed workspace probe used by the CLI.
pub mod vcs;

/// Path resolution and the safe, sorted file-walk helper.
pub mod walk;
