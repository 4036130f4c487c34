//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::{OrderId, PortError};

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Order not found");

    match error {
        CoreError::NotFound(msg) => assert_eq!(msg, "Order not found"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_core_error_from_parse_error() {
    let parse_error = "ORD-x".parse::<OrderId>().unwrap_err();
    let core_error: CoreError = parse_error.into();

    assert!(matches!(core_error, CoreError::InvalidIdentifier(_)));
}

#[test]
fn test_core_error_configuration() {
    let error = CoreError::Configuration("Missing config".to_string());
    assert!(error.to_string().contains("Configuration error"));
}

#[test]
fn test_port_error_validation_field() {
    let error = PortError::validation_field("must be positive", "count");

    match error {
        PortError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("count")),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_port_error_conflict_display() {
    let error = PortError::conflict("stock exhausted");
    assert!(error.to_string().contains("stock exhausted"));
}
