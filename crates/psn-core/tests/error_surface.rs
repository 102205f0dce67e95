use psn_core::errors::{ErrorInfo, PsnError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("executable", "modest")
        .with_context("reason", "example")
}

#[test]
fn tool_missing_surface() {
    let err = PsnError::ExternalToolMissing(sample_info("checker-missing", "not on PATH"));
    assert_eq!(err.info().code, "checker-missing");
    assert!(err.info().context.contains_key("executable"));
}

#[test]
fn invalid_request_surface() {
    let err = PsnError::invalid("stride", "stride must be at least 1");
    assert_eq!(err.info().code, "stride");
    assert!(err.info().context.is_empty());
}

#[test]
fn process_invocation_surface() {
    let err = PsnError::ProcessInvocation(sample_info("checker-spawn", "permission denied"));
    assert!(err.to_string().starts_with("process invocation failed"));
    assert!(err.to_string().contains("executable=modest"));
}

#[test]
fn display_includes_hint() {
    let err =
        PsnError::Config(ErrorInfo::new("plan-parse", "bad yaml").with_hint("check indentation"));
    assert!(err.to_string().ends_with("| hint: check indentation"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = PsnError::Render(ErrorInfo::new("generator-exit", "exit status 2"));
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "Render");
    assert_eq!(json["detail"]["code"], "generator-exit");
    let decoded: PsnError = serde_json::from_value(json).expect("deserialize");
    assert_eq!(decoded, err);
}
