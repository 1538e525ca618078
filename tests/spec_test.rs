use stencil::error::Error;
use stencil::spec::{parse_template, Action, ForEachValues, IncludeFrom};

const SIMPLE_V2: &str = r#"api_version: cli.abcxyz.dev/v2
kind: Template
desc: test template
inputs:
  - name: fruit
    desc: a fruit
    default: apple
    rules:
      - rule: fruit | contains('a')
        message: must contain an a
steps:
  - desc: include the file
    action: include
    params:
      paths: [a.txt]
  - desc: replace the placeholder
    action: string_replace
    params:
      paths: [a.txt]
      replacements:
        - to_replace: "[fruit]"
          with: "{{ fruit }}"
"#;

#[test]
fn test_parse_v2() {
    let template = parse_template(SIMPLE_V2, "spec.yaml").unwrap();
    assert_eq!(template.api_version, "cli.abcxyz.dev/v2");
    assert_eq!(template.desc, "test template");

    assert_eq!(template.inputs.len(), 1);
    let input = &template.inputs[0];
    assert_eq!(input.name.value, "fruit");
    assert_eq!(input.default.as_ref().unwrap().value, "apple");
    assert_eq!(input.rules.len(), 1);
    assert_eq!(input.rules[0].message, "must contain an a");

    assert_eq!(template.steps.len(), 2);
    match &template.steps[0].action {
        Action::Include(a) => {
            assert_eq!(a.paths.len(), 1);
            assert_eq!(a.paths[0].value, "a.txt");
            assert_eq!(a.from, IncludeFrom::Template);
        }
        other => panic!("expected include, got {:?}", other),
    }
    match &template.steps[1].action {
        Action::StringReplace(a) => {
            assert_eq!(a.replacements[0].to_replace.value, "[fruit]");
            assert_eq!(a.replacements[0].with.value, "{{ fruit }}");
        }
        other => panic!("expected string_replace, got {:?}", other),
    }
}

#[test]
fn test_parse_positions() {
    let template = parse_template(SIMPLE_V2, "spec.yaml").unwrap();
    // The input name sits on line 5 of the document.
    let name = &template.inputs[0].name;
    assert_eq!(name.pos.file, "spec.yaml");
    assert_eq!(name.pos.line, 5);
}

#[test]
fn test_unknown_api_version() {
    let src = "api_version: cli.abcxyz.dev/v99\nkind: Template\n";
    match parse_template(src, "spec.yaml") {
        Err(Error::UnknownSchema { version, .. }) => {
            assert_eq!(version, "cli.abcxyz.dev/v99");
        }
        other => panic!("expected UnknownSchema, got {:?}", other),
    }
}

#[test]
fn test_wrong_kind() {
    let src = "api_version: cli.abcxyz.dev/v2\nkind: GoldenTest\n";
    assert!(matches!(parse_template(src, "spec.yaml"), Err(Error::Parse { .. })));
}

#[test]
fn test_unknown_field() {
    let src = "api_version: cli.abcxyz.dev/v2\nkind: Template\nbogus: 1\n";
    match parse_template(src, "spec.yaml") {
        Err(Error::UnknownField { message, .. }) => {
            assert!(message.contains("bogus"), "message was: {}", message);
        }
        other => panic!("expected UnknownField, got {:?}", other),
    }
}

#[test]
fn test_unknown_field_in_params() {
    let src = r#"api_version: cli.abcxyz.dev/v2
kind: Template
steps:
  - desc: include
    action: include
    params:
      paths: [a.txt]
      surprise: [b.txt]
"#;
    assert!(matches!(parse_template(src, "spec.yaml"), Err(Error::UnknownField { .. })));
}

#[test]
fn test_v1_upgrades_to_current() {
    let src = r#"api_version: cli.abcxyz.dev/v1
kind: Template
desc: old template
inputs:
  - name: fruit
steps:
  - desc: loop
    action: for_each
    params:
      iterator:
        key: env
        values: [dev, prod]
      steps:
        - desc: say it
          action: print
          params:
            message: "{{ env }}"
"#;
    let template = parse_template(src, "spec.yaml").unwrap();
    assert_eq!(template.api_version, "cli.abcxyz.dev/v2");
    assert!(template.inputs[0].rules.is_empty());
    match &template.steps[0].action {
        Action::ForEach(a) => {
            assert_eq!(a.key.value, "env");
            match &a.values {
                ForEachValues::Static(values) => {
                    let got: Vec<&str> = values.iter().map(|v| v.as_str()).collect();
                    assert_eq!(got, vec!["dev", "prod"]);
                }
                other => panic!("expected static values, got {:?}", other),
            }
            assert_eq!(a.steps.len(), 1);
        }
        other => panic!("expected for_each, got {:?}", other),
    }
}

#[test]
fn test_v1_rejects_v2_actions() {
    let src = r#"api_version: cli.abcxyz.dev/v1
kind: Template
steps:
  - desc: branch
    action: if
    params:
      if: "true"
      then: []
"#;
    assert!(matches!(parse_template(src, "spec.yaml"), Err(Error::Parse { .. })));
}

#[test]
fn test_v1_rejects_input_rules() {
    let src = r#"api_version: cli.abcxyz.dev/v1
kind: Template
inputs:
  - name: fruit
    rules:
      - rule: "true"
"#;
    assert!(matches!(parse_template(src, "spec.yaml"), Err(Error::UnknownField { .. })));
}

#[test]
fn test_duplicate_and_invalid_input_names_collected() {
    let src = r#"api_version: cli.abcxyz.dev/v2
kind: Template
inputs:
  - name: fruit
  - name: fruit
  - name: 9lives
"#;
    match parse_template(src, "spec.yaml") {
        Err(Error::Validation { violations }) => {
            assert_eq!(violations.len(), 2, "violations: {:?}", violations);
        }
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[test]
fn test_include_as_pairing_validated() {
    let src = r#"api_version: cli.abcxyz.dev/v2
kind: Template
steps:
  - desc: include
    action: include
    params:
      paths: [a.txt, b.txt]
      as: [c.txt]
"#;
    assert!(matches!(parse_template(src, "spec.yaml"), Err(Error::Validation { .. })));
}

#[test]
fn test_unsafe_literal_path_validated() {
    let src = r#"api_version: cli.abcxyz.dev/v2
kind: Template
steps:
  - desc: include
    action: include
    params:
      paths: ["../evil"]
"#;
    assert!(matches!(parse_template(src, "spec.yaml"), Err(Error::Validation { .. })));
}

#[test]
fn test_for_each_requires_one_value_source() {
    let src = r#"api_version: cli.abcxyz.dev/v2
kind: Template
steps:
  - desc: loop
    action: for_each
    params:
      iterator:
        key: env
      steps: []
"#;
    assert!(matches!(parse_template(src, "spec.yaml"), Err(Error::Parse { .. })));
}

#[test]
fn test_upgrade_equals_identity_on_current_form() {
    // The same document expressed in v1 and v2 parses to the same
    // model once the upgrade chain has run.
    let v1 = r#"api_version: cli.abcxyz.dev/v1
kind: Template
desc: same
inputs:
  - name: fruit
    default: apple
steps:
  - desc: say it
    action: print
    params:
      message: "{{ fruit }}"
"#;
    let v2 = v1.replace("cli.abcxyz.dev/v1", "cli.abcxyz.dev/v2");

    let from_v1 = parse_template(v1, "spec.yaml").unwrap();
    let from_v2 = parse_template(&v2, "spec.yaml").unwrap();

    assert_eq!(from_v1.api_version, from_v2.api_version);
    assert_eq!(format!("{:?}", from_v1.steps), format!("{:?}", from_v2.steps));
}
