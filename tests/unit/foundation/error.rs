use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ZoomError::invalid("x")
            .to_string()
            .contains("invalid parameter:")
    );
    assert!(ZoomError::config("x").to_string().contains("config error:"));
    assert!(ZoomError::encode("x").to_string().contains("encode error:"));
}

#[test]
fn frames_failed_lists_indices() {
    let err = ZoomError::FramesFailed {
        failed: vec![3, 17],
    };
    let msg = err.to_string();
    assert!(msg.starts_with("2 frame(s) failed"));
    assert!(msg.contains("[3, 17]"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ZoomError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
