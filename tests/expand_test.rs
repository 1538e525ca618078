use indexmap::IndexMap;
use stencil::error::Error;
use stencil::expand::Expander;
use stencil::position::Position;
use stencil::scope::Scope;

fn scope_with(pairs: &[(&str, &str)]) -> Scope {
    let mut base = IndexMap::new();
    for (k, v) in pairs {
        base.insert(k.to_string(), v.to_string());
    }
    Scope::new(base)
}

#[test]
fn test_expand_variable() {
    let expander = Expander::new();
    let scope = scope_with(&[("name", "world")]);
    let pos = Position::new("spec.yaml", 3, 1);

    let result = expander.expand("hello {{ name }}!", &scope, &pos).unwrap();
    assert_eq!(result, "hello world!");
}

#[test]
fn test_expand_plain_text_unchanged() {
    let expander = Expander::new();
    let scope = scope_with(&[]);
    let pos = Position::unknown("spec.yaml");

    let result = expander.expand("no placeholders here", &scope, &pos).unwrap();
    assert_eq!(result, "no placeholders here");
}

#[test]
fn test_expand_filters() {
    let expander = Expander::new();
    let scope = scope_with(&[("service", "svc-frontend")]);
    let pos = Position::unknown("spec.yaml");

    let result = expander
        .expand("{{ service | trim_prefix('svc-') }}", &scope, &pos)
        .unwrap();
    assert_eq!(result, "frontend");

    let result = expander
        .expand("{{ service | replace('-', '_') }}", &scope, &pos)
        .unwrap();
    assert_eq!(result, "svc_frontend");

    let result = expander
        .expand("{{ service | trim_suffix('end') }}", &scope, &pos)
        .unwrap();
    assert_eq!(result, "svc-front");
}

#[test]
fn test_expand_undefined_variable_fails() {
    let expander = Expander::new();
    let scope = scope_with(&[]);
    let pos = Position::new("spec.yaml", 9, 5);

    let result = expander.expand("{{ missing }}", &scope, &pos);
    match result {
        Err(Error::Expansion { pos, .. }) => assert_eq!(pos.file, "spec.yaml"),
        other => panic!("expected expansion error, got {:?}", other),
    }
}

#[test]
fn test_expand_innermost_frame_shadows() {
    let expander = Expander::new();
    let mut scope = scope_with(&[("x", "outer")]);
    scope.push_frame("x", "inner");
    let pos = Position::unknown("spec.yaml");

    let result = expander.expand("{{ x }}", &scope, &pos).unwrap();
    assert_eq!(result, "inner");

    scope.pop_frame();
    let result = expander.expand("{{ x }}", &scope, &pos).unwrap();
    assert_eq!(result, "outer");
}

#[test]
fn test_eval_predicate() {
    let expander = Expander::new();
    let scope = scope_with(&[("name", "world")]);
    let pos = Position::unknown("spec.yaml");

    assert!(expander
        .eval_predicate("name | contains('orl')", &scope, &pos)
        .unwrap());
    assert!(!expander
        .eval_predicate("name | contains('xyz')", &scope, &pos)
        .unwrap());
}

#[test]
fn test_eval_list() {
    let expander = Expander::new();
    let scope = scope_with(&[("envs", "dev,prod")]);
    let pos = Position::unknown("spec.yaml");

    let values = expander
        .eval_list("envs | split(',')", &scope, &pos)
        .unwrap();
    assert_eq!(values, vec!["dev".to_string(), "prod".to_string()]);
}

#[test]
fn test_eval_list_rejects_scalar() {
    let expander = Expander::new();
    let scope = scope_with(&[("n", "5")]);
    let pos = Position::unknown("spec.yaml");

    // A plain number iterates nowhere; the expander reports the
    // expression rather than silently yielding nothing.
    let result = expander.eval_list("42", &scope, &pos);
    assert!(matches!(result, Err(Error::Expansion { .. })));
}
