//! The smallest possible GLB: a header plus an empty JSON chunk.

use rapid_gltf::{Error, Extensions, GltfType, Options, Parser};
use std::path::Path;

/// Header `{magic, version 2, length 24}`, then an empty JSON chunk `{}`
/// padded with two spaces.
fn minimal_glb() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&[0x67, 0x6C, 0x54, 0x46]);
    data.extend_from_slice(&[0x02, 0x00, 0x00, 0x00]);
    data.extend_from_slice(&[0x18, 0x00, 0x00, 0x00]);
    data.extend_from_slice(&[0x02, 0x00, 0x00, 0x00]);
    data.extend_from_slice(&[0x4A, 0x53, 0x4F, 0x4E]);
    data.extend_from_slice(b"{}  ");
    data
}

#[test]
fn type_is_detected_without_consuming() {
    assert_eq!(rapid_gltf::determine_type(&minimal_glb()), GltfType::Glb);
}

#[test]
fn missing_asset_member_fails_by_default() {
    let mut parser = Parser::new(Extensions::empty());
    let err = parser
        .parse_glb(&minimal_glb(), Path::new("minimal.glb"), Options::empty())
        .unwrap_err();
    assert_eq!(err, Error::InvalidOrMissingAssetField);
}

#[test]
fn lenient_parse_yields_empty_asset() {
    let mut parser = Parser::new(Extensions::empty());
    let asset = parser
        .parse_glb(
            &minimal_glb(),
            Path::new("minimal.glb"),
            Options::DONT_REQUIRE_VALID_ASSET_MEMBER,
        )
        .unwrap();
    assert!(asset.info.is_none());
    assert!(asset.buffers.is_empty());
    assert!(asset.scenes.is_empty());
    rapid_gltf::validate(&asset).unwrap();
}

#[test]
fn sniffing_dispatches_gltf_and_glb() {
    let mut parser = Parser::new(Extensions::empty());
    let from_glb = parser
        .parse_bytes(
            &minimal_glb(),
            Path::new("minimal.glb"),
            Options::DONT_REQUIRE_VALID_ASSET_MEMBER,
        )
        .unwrap();
    assert!(from_glb.info.is_none());

    let from_json = parser
        .parse_bytes(
            br#"{"asset":{"version":"2.0"}}"#,
            Path::new("."),
            Options::empty(),
        )
        .unwrap();
    assert_eq!(from_json.info.unwrap().version, "2.0");

    assert_eq!(
        parser
            .parse_bytes(b"not gltf at all", Path::new("."), Options::empty())
            .unwrap_err(),
        Error::InvalidJson
    );
}
