use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        DotfxError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        DotfxError::animation("x")
            .to_string()
            .contains("animation error:")
    );
    assert!(DotfxError::media("x").to_string().contains("media error:"));
    assert!(
        DotfxError::surface("x")
            .to_string()
            .contains("surface error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("disk gone");
    let err = DotfxError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("disk gone"));
}
