//! Tests for `error` module

use super::config::ConfigError;
use super::error::*;

#[test]
fn test_error_codes_are_unique() {
    // Arrange
    let errors: Vec<Error> = vec![
        Error::Config("test".into()),
        Error::DimensionMismatch {
            expected: 128,
            actual: 64,
        },
        Error::GraphSizeMismatch { graph: 3, base: 4 },
        Error::NodeOutOfRange { id: 9, len: 4 },
        Error::InvalidVector("test".into()),
        Error::GraphInvariant("test".into()),
    ];

    // Act
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(codes.len(), unique_codes.len(), "error codes must be unique");
    assert!(codes.iter().all(|c| c.starts_with("VGRAPH-")));
}

#[test]
fn test_error_display_contains_code() {
    let err = Error::DimensionMismatch {
        expected: 128,
        actual: 64,
    };

    let msg = err.to_string();
    assert!(msg.contains("[VGRAPH-002]"));
    assert!(msg.contains("expected 128"));
    assert!(msg.contains("got 64"));
}

#[test]
fn test_graph_invariant_is_not_recoverable() {
    assert!(!Error::GraphInvariant("self loop".into()).is_recoverable());
    assert!(Error::Config("R".into()).is_recoverable());
    assert!(Error::NodeOutOfRange { id: 1, len: 1 }.is_recoverable());
}

#[test]
fn test_config_error_converts_to_config_variant() {
    let err: Error = ConfigError::MissingKey("R".into()).into();

    assert_eq!(err.code(), "VGRAPH-001");
    assert!(err.to_string().contains("'R'"));
}
