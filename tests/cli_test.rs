use clap::Parser;
use std::path::PathBuf;
use stencil::cli::{parse_inputs, Args};

#[test]
fn test_args_parsing() {
    let args = Args::try_parse_from([
        "stencil",
        "./template",
        "./output",
        "--input",
        "name=demo",
        "-i",
        "env=prod",
        "--dry-run",
        "--keep-scratch",
    ])
    .unwrap();

    assert_eq!(args.template, PathBuf::from("./template"));
    assert_eq!(args.dest, PathBuf::from("./output"));
    assert_eq!(args.input, vec!["name=demo".to_string(), "env=prod".to_string()]);
    assert!(args.dry_run);
    assert!(args.keep_scratch);
    assert!(!args.force_overwrite);
    assert!(!args.no_backups);
    assert!(!args.verbose);
}

#[test]
fn test_args_require_template_and_dest() {
    assert!(Args::try_parse_from(["stencil"]).is_err());
    assert!(Args::try_parse_from(["stencil", "./template"]).is_err());
}

#[test]
fn test_parse_inputs() {
    let inputs = parse_inputs(&[
        "name=demo".to_string(),
        "greeting=hello=world".to_string(),
    ])
    .unwrap();

    assert_eq!(inputs["name"], "demo");
    // Only the first '=' separates key and value.
    assert_eq!(inputs["greeting"], "hello=world");
}

#[test]
fn test_parse_inputs_rejects_bare_words() {
    assert!(parse_inputs(&["nodelimiter".to_string()]).is_err());
}
