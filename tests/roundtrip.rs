//! Round-trip tests: decode, re-encode, decode again, and require the two
//! decoded assets to be structurally equal.

use rapid_gltf::{export_glb, export_json, ExportOptions, Extensions, Options, Parser};
use std::path::Path;

/// A fixture exercising most sections: cameras, lights, skins, animations,
/// materials with extension sub-structs, samplers, textures with extension
/// image sources, morph targets and variant mappings. Buffers stay external
/// so that re-decoding reproduces the same data sources.
const KITCHEN_SINK: &str = r#"{
  "asset": {"version": "2.0", "generator": "fixture", "copyright": "CC0"},
  "extensionsUsed": ["KHR_lights_punctual", "KHR_materials_clearcoat",
                     "KHR_materials_ior", "KHR_texture_transform",
                     "KHR_texture_basisu", "KHR_materials_variants",
                     "EXT_mesh_gpu_instancing"],
  "buffers": [
    {"byteLength": 400, "uri": "geometry.bin"},
    {"byteLength": 256, "uri": "external.bin"}],
  "bufferViews": [
    {"buffer": 0, "byteLength": 144, "target": 34962},
    {"buffer": 0, "byteOffset": 144, "byteLength": 144},
    {"buffer": 0, "byteOffset": 288, "byteLength": 16},
    {"buffer": 1, "byteLength": 256, "byteStride": 16},
    {"buffer": 0, "byteOffset": 304, "byteLength": 48},
    {"buffer": 1, "byteLength": 192}],
  "accessors": [
    {"bufferView": 0, "count": 12, "componentType": 5126, "type": "VEC3",
     "min": [-1.0, -1.0, -1.0], "max": [1.0, 1.0, 1.0]},
    {"bufferView": 1, "count": 12, "componentType": 5126, "type": "VEC3"},
    {"bufferView": 2, "count": 4, "componentType": 5126, "type": "SCALAR"},
    {"bufferView": 3, "count": 12, "componentType": 5126, "type": "VEC3"},
    {"bufferView": 2, "count": 2, "componentType": 5123, "type": "SCALAR"},
    {"bufferView": 4, "count": 12, "componentType": 5121, "type": "VEC4"},
    {"bufferView": 5, "count": 12, "componentType": 5126, "type": "VEC4"}],
  "images": [
    {"bufferView": 2, "mimeType": "image/png"},
    {"uri": "textures/wood.ktx2", "mimeType": "image/ktx2"}],
  "samplers": [{"magFilter": 9729, "minFilter": 9987, "wrapS": 33071}],
  "textures": [
    {"sampler": 0, "source": 0},
    {"source": 0, "extensions": {"KHR_texture_basisu": {"source": 1}}}],
  "materials": [
    {"name": "painted",
     "pbrMetallicRoughness": {
       "baseColorFactor": [0.5, 0.25, 0.125, 1.0],
       "baseColorTexture": {"index": 0,
         "extensions": {"KHR_texture_transform": {
           "offset": [0.25, 0.25], "rotation": 0.5}}},
       "metallicFactor": 0.0},
     "emissiveFactor": [0.1, 0.2, 0.3],
     "alphaMode": "MASK", "alphaCutoff": 0.25, "doubleSided": true,
     "extensions": {
       "KHR_materials_clearcoat": {"clearcoatFactor": 1.0,
                                   "clearcoatRoughnessFactor": 0.5},
       "KHR_materials_ior": {"ior": 1.33}}}],
  "meshes": [{"primitives": [{
      "attributes": {"POSITION": 0, "NORMAL": 1, "JOINTS_0": 5, "WEIGHTS_0": 6},
      "indices": 4, "material": 0, "mode": 4,
      "targets": [{"POSITION": 3}],
      "extensions": {"KHR_materials_variants": {
        "mappings": [{"material": 0, "variants": [0, 1]}]}}}],
    "weights": [0.5], "name": "prop"}],
  "cameras": [
    {"type": "perspective",
     "perspective": {"aspectRatio": 1.5, "yfov": 0.66, "zfar": 100.0,
                     "znear": 0.01}},
    {"type": "orthographic",
     "orthographic": {"xmag": 2.0, "ymag": 2.0, "zfar": 50.0,
                      "znear": 0.5}}],
  "nodes": [
    {"mesh": 0, "skin": 0, "name": "root", "children": [1, 2],
     "translation": [1.0, 2.0, 3.0],
     "rotation": [0.0, 0.7071067811865476, 0.0, 0.7071067811865476]},
    {"camera": 0,
     "matrix": [1.0,0.0,0.0,0.0, 0.0,1.0,0.0,0.0, 0.0,0.0,1.0,0.0,
                4.0,5.0,6.0,1.0]},
    {"extensions": {
       "KHR_lights_punctual": {"light": 0},
       "EXT_mesh_gpu_instancing": {"attributes": {"TRANSLATION": 3}}}}],
  "skins": [{"joints": [2], "skeleton": 2}],
  "scenes": [{"nodes": [0], "name": "main"}],
  "scene": 0,
  "animations": [{
    "channels": [
      {"sampler": 0, "target": {"node": 0, "path": "translation"}},
      {"sampler": 1, "target": {"node": 0, "path": "weights"}}],
    "samplers": [
      {"input": 2, "output": 0, "interpolation": "CUBICSPLINE"},
      {"input": 2, "output": 1, "interpolation": "STEP"}],
    "name": "bounce"}],
  "extensions": {
    "KHR_lights_punctual": {"lights": [
      {"type": "spot", "color": [1.0, 0.5, 0.5], "intensity": 20.0,
       "range": 12.0,
       "spot": {"innerConeAngle": 0.2, "outerConeAngle": 0.6}},
      {"type": "point"}]},
    "KHR_materials_variants": {"variants": [{"name": "A"}, {"name": "B"}]}}
}"#;

#[test]
fn json_roundtrip_is_structurally_equal() {
    let mut parser = Parser::new(Extensions::all());
    let original = parser
        .parse_json_bytes(KITCHEN_SINK.as_bytes(), Path::new("."), Options::empty())
        .expect("fixture parses");

    let exported = export_json(&original, ExportOptions::empty()).expect("fixture exports");
    let reparsed = parser
        .parse_json_bytes(&exported.bytes, Path::new("."), Options::empty())
        .expect("exported JSON parses");

    assert_eq!(original, reparsed);
}

#[test]
fn pretty_printed_output_parses_identically() {
    let mut parser = Parser::new(Extensions::all());
    let original = parser
        .parse_json_bytes(KITCHEN_SINK.as_bytes(), Path::new("."), Options::empty())
        .unwrap();

    let pretty = export_json(&original, ExportOptions::PRETTY_PRINT_JSON).unwrap();
    let reparsed = parser
        .parse_json_bytes(&pretty.bytes, Path::new("."), Options::empty())
        .unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn glb_roundtrip_is_structurally_equal() {
    // Embed the first buffer so the BIN chunk carries real bytes.
    let json = format!(
        r#"{{"asset":{{"version":"2.0"}},
            "buffers":[{{"byteLength":8,
              "uri":"data:application/gltf-buffer;base64,{}"}}],
            "bufferViews":[{{"buffer":0,"byteLength":8}}],
            "accessors":[{{"bufferView":0,"count":4,
                           "componentType":5123,"type":"SCALAR"}}]}}"#,
        base64::encode([1u8, 2, 3, 4, 5, 6, 7, 8])
    );
    let mut parser = Parser::new(Extensions::empty());
    let original = parser
        .parse_json_bytes(json.as_bytes(), Path::new("."), Options::empty())
        .unwrap();

    let exported = export_glb(&original, ExportOptions::empty()).unwrap();
    let reparsed = parser
        .parse_glb(
            &exported.bytes,
            Path::new("roundtrip.glb"),
            Options::LOAD_GLB_BUFFERS,
        )
        .unwrap();

    assert_eq!(original, reparsed);

    // A second encode of the reparsed asset is byte-identical.
    let again = export_glb(&reparsed, ExportOptions::empty()).unwrap();
    assert_eq!(exported.bytes, again.bytes);
}

#[test]
fn validated_export_accepts_the_fixture() {
    let mut parser = Parser::new(Extensions::all());
    let asset = parser
        .parse_json_bytes(KITCHEN_SINK.as_bytes(), Path::new("."), Options::empty())
        .unwrap();
    export_json(&asset, ExportOptions::VALIDATE_ASSET).unwrap();
}
