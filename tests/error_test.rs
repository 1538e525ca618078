use stencil::error::{Error, Violation};
use stencil::position::Position;

#[test]
fn test_position_appears_in_message() {
    let err = Error::PathUnsafe {
        pos: Position::new("spec.yaml", 12, 7),
        path: "../escape".to_string(),
        reason: "path contains \"..\"".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("spec.yaml:12:7"), "message was: {}", message);
    assert!(message.contains("../escape"));
}

#[test]
fn test_unknown_position_shows_file_only() {
    let err = Error::NotFound {
        pos: Position::unknown("spec.yaml"),
        path: "a.txt".to_string(),
    };
    let message = err.to_string();
    assert!(message.starts_with("spec.yaml:"), "message was: {}", message);
    assert!(!message.contains("spec.yaml:0"));
}

#[test]
fn test_validation_lists_every_violation() {
    let err = Error::Validation {
        violations: vec![
            Violation {
                pos: Position::new("spec.yaml", 3, 5),
                message: "first problem".to_string(),
            },
            Violation {
                pos: Position::new("spec.yaml", 8, 5),
                message: "second problem".to_string(),
            },
        ],
    };
    let message = err.to_string();
    assert!(message.contains("first problem"));
    assert!(message.contains("second problem"));
    assert!(message.contains("spec.yaml:3:5"));
    assert!(message.contains("spec.yaml:8:5"));
}
