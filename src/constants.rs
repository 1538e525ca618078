//! Common constants used throughout the Stencil engine.

/// Name of the specification document inside a template directory
pub const SPEC_FILE: &str = "spec.yaml";

/// Top-level destination directory reserved for engine bookkeeping
/// (manifests, recorded output). Hidden from committed outputs.
pub const RESERVED_DIR: &str = ".abc";
