use depot_util::errors::DepotError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = DepotError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_not_found_display() {
    let err = DepotError::not_found("org.example:lib:1.0.0");
    assert_eq!(err.to_string(), "Dependency not found: org.example:lib:1.0.0");
}

#[test]
fn test_excluded_display_carries_reason() {
    let err = DepotError::Excluded {
        coordinate: "org.example:lib:1.0.0".to_string(),
        reason: "broken pom".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Coordinate org.example:lib:1.0.0 is excluded: broken pom"
    );
}

#[test]
fn test_transient_display() {
    let err = DepotError::TransientUnavailable {
        coordinate: "org.example:lib:1.0.0".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Coordinate org.example:lib:1.0.0 is temporarily unavailable"
    );
}

#[test]
fn test_invalid_closure_display() {
    let err = DepotError::InvalidClosure {
        coordinate: "org.example:lib:1.0.0".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Transitive dependency report for org.example:lib:1.0.0 is invalid"
    );
}

#[test]
fn test_generic_error_display() {
    let err = DepotError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_retryable_classification() {
    assert!(DepotError::not_found("a:b:1").is_retryable());
    assert!(DepotError::TransientUnavailable {
        coordinate: "a:b:1".to_string()
    }
    .is_retryable());
    assert!(!DepotError::InvalidClosure {
        coordinate: "a:b:1".to_string()
    }
    .is_retryable());
    assert!(!DepotError::Excluded {
        coordinate: "a:b:1".to_string(),
        reason: "r".to_string()
    }
    .is_retryable());
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let depot_err: DepotError = io_err.into();
    assert!(matches!(depot_err, DepotError::Io(_)));
}
