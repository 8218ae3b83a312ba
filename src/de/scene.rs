//! Camera, node, scene and skin array parsing.

use serde_json::{Map, Value};

use super::{
    as_array, as_object, get_f32, get_f32_array, get_f32_vec, get_index, get_index_array,
    get_name, get_object, req_f32, req_index, req_str, Ctx,
};
use crate::asset::Category;
use crate::camera::{Camera, Orthographic, Perspective, Projection};
use crate::crc32::{self, crc32c};
use crate::math;
use crate::scene::{Node, Scene, Transform};
use crate::skin::Skin;
use crate::{Error, Extensions, Options};

const EXT_LIGHTS: u32 = crc32c(b"KHR_lights_punctual");
const EXT_INSTANCING: u32 = crc32c(b"EXT_mesh_gpu_instancing");

pub(super) fn parse_cameras(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.cameras.reserve(entries.len());
    for entry in entries {
        let object = as_object(entry)?;
        let projection = match req_str(object, "type")? {
            "perspective" => {
                let p = get_object(object, "perspective")?.ok_or(Error::MissingField)?;
                Projection::Perspective(Perspective {
                    aspect_ratio: get_f32(p, "aspectRatio")?,
                    yfov: req_f32(p, "yfov")?,
                    zfar: get_f32(p, "zfar")?,
                    znear: req_f32(p, "znear")?,
                })
            }
            "orthographic" => {
                let o = get_object(object, "orthographic")?.ok_or(Error::MissingField)?;
                Projection::Orthographic(Orthographic {
                    xmag: req_f32(o, "xmag")?,
                    ymag: req_f32(o, "ymag")?,
                    zfar: req_f32(o, "zfar")?,
                    znear: req_f32(o, "znear")?,
                })
            }
            _ => return Err(Error::InvalidGltf),
        };
        ctx.asset.cameras.push(Camera {
            projection,
            name: get_name(object)?,
        });
    }
    ctx.asset.available_categories |= Category::CAMERAS;
    Ok(())
}

pub(super) fn parse_nodes(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.nodes.reserve(entries.len());
    for entry in entries {
        let node = parse_node(ctx, as_object(entry)?)?;
        ctx.asset.nodes.push(node);
    }
    ctx.asset.available_categories |= Category::NODES;
    Ok(())
}

fn parse_node(ctx: &Ctx<'_>, object: &Map<String, Value>) -> Result<Node, Error> {
    let transform = parse_transform(ctx, object)?;

    let mut light = None;
    let mut instancing_attributes = Vec::new();
    if let Some(ext) = get_object(object, "extensions")? {
        for (key, value) in ext {
            match crc32::hash_str(key) {
                EXT_LIGHTS if ctx.enabled.contains(Extensions::KHR_LIGHTS_PUNCTUAL) => {
                    light = Some(req_index(as_object(value)?, "light")?);
                }
                EXT_INSTANCING if ctx.enabled.contains(Extensions::EXT_MESH_GPU_INSTANCING) => {
                    let ext = as_object(value)?;
                    let attributes = get_object(ext, "attributes")?.ok_or(Error::MissingField)?;
                    for (name, accessor) in attributes {
                        let accessor = accessor.as_u64().ok_or(Error::InvalidGltf)? as usize;
                        instancing_attributes.push((name.clone(), accessor));
                    }
                }
                _ => {}
            }
        }
    }

    Ok(Node {
        camera: get_index(object, "camera")?,
        children: get_index_array(object, "children")?,
        skin: get_index(object, "skin")?,
        mesh: get_index(object, "mesh")?,
        light,
        transform,
        weights: get_f32_vec(object, "weights")?,
        instancing_attributes,
        name: get_name(object)?,
    })
}

/// A node transform is either a matrix or TRS properties, never both.
fn parse_transform(ctx: &Ctx<'_>, object: &Map<String, Value>) -> Result<Transform, Error> {
    if let Some(value) = object.get("matrix") {
        let array = value.as_array().ok_or(Error::InvalidGltf)?;
        if array.len() != 16 {
            return Err(Error::InvalidGltf);
        }
        let mut matrix = [[0.0f32; 4]; 4];
        for (i, entry) in array.iter().enumerate() {
            matrix[i / 4][i % 4] = entry.as_f64().ok_or(Error::InvalidGltf)? as f32;
        }
        if ctx.options.contains(Options::DECOMPOSE_NODE_MATRICES) {
            let (translation, rotation, scale) = math::decompose(matrix);
            return Ok(Transform::Trs {
                translation,
                rotation,
                scale,
            });
        }
        return Ok(Transform::Matrix { matrix });
    }

    Ok(Transform::Trs {
        translation: get_f32_array(object, "translation")?.unwrap_or([0.0; 3]),
        rotation: get_f32_array(object, "rotation")?.unwrap_or([0.0, 0.0, 0.0, 1.0]),
        scale: get_f32_array(object, "scale")?.unwrap_or([1.0; 3]),
    })
}

pub(super) fn parse_scenes(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.scenes.reserve(entries.len());
    for entry in entries {
        let object = as_object(entry)?;
        ctx.asset.scenes.push(Scene {
            nodes: get_index_array(object, "nodes")?,
            name: get_name(object)?,
        });
    }
    ctx.asset.available_categories |= Category::SCENES;
    Ok(())
}

pub(super) fn parse_skins(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.skins.reserve(entries.len());
    for entry in entries {
        let object = as_object(entry)?;
        let joints = get_index_array(object, "joints")?;
        if joints.is_empty() {
            return Err(Error::MissingField);
        }
        ctx.asset.skins.push(Skin {
            inverse_bind_matrices: get_index(object, "inverseBindMatrices")?,
            skeleton: get_index(object, "skeleton")?,
            joints,
            name: get_name(object)?,
        });
    }
    ctx.asset.available_categories |= Category::SKINS;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, Parser};
    use approx::assert_relative_eq;
    use std::path::Path;

    fn parse(json: &str, options: Options) -> Result<crate::Asset, Error> {
        Parser::new(Extensions::KHR_LIGHTS_PUNCTUAL | Extensions::EXT_MESH_GPU_INSTANCING)
            .parse_json_bytes(json.as_bytes(), Path::new("."), options)
    }

    #[test]
    fn trs_defaults_to_identity() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},"nodes":[{}]}"#,
            Options::empty(),
        )
        .unwrap();
        assert_eq!(asset.nodes[0].transform, Transform::IDENTITY);
    }

    #[test]
    fn matrix_transform_is_kept_column_major() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "nodes":[{"matrix":[1,0,0,0, 0,1,0,0, 0,0,1,0, 5,6,7,1]}]}"#,
            Options::empty(),
        )
        .unwrap();
        match &asset.nodes[0].transform {
            Transform::Matrix { matrix } => assert_eq!(matrix[3], [5.0, 6.0, 7.0, 1.0]),
            other => panic!("unexpected transform {other:?}"),
        }
    }

    #[test]
    fn decompose_option_turns_matrices_into_trs() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "nodes":[{"matrix":[2,0,0,0, 0,2,0,0, 0,0,2,0, -90.59,-24.38,-40.06,1]}]}"#,
            Options::DECOMPOSE_NODE_MATRICES,
        )
        .unwrap();
        match &asset.nodes[0].transform {
            Transform::Trs {
                translation, scale, ..
            } => {
                // Translation comes out of column 3 exactly.
                assert_eq!(*translation, [-90.59, -24.38, -40.06]);
                for component in scale {
                    assert_relative_eq!(*component, 2.0, epsilon = 10.0 * f32::EPSILON);
                }
            }
            other => panic!("unexpected transform {other:?}"),
        }
    }

    #[test]
    fn camera_variants() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "cameras":[
                  {"type":"perspective","perspective":{"yfov":0.66,"znear":0.1}},
                  {"type":"orthographic",
                   "orthographic":{"xmag":1.0,"ymag":1.0,"zfar":100.0,"znear":0.01}}]}"#,
            Options::empty(),
        )
        .unwrap();
        assert!(matches!(
            asset.cameras[0].projection,
            Projection::Perspective(_)
        ));
        assert!(matches!(
            asset.cameras[1].projection,
            Projection::Orthographic(_)
        ));
    }

    #[test]
    fn node_light_and_instancing_extensions() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "extensionsUsed":["KHR_lights_punctual","EXT_mesh_gpu_instancing"],
                "nodes":[{"extensions":{
                    "KHR_lights_punctual":{"light":0},
                    "EXT_mesh_gpu_instancing":{"attributes":{"TRANSLATION":7}}}}]}"#,
            Options::empty(),
        )
        .unwrap();
        assert_eq!(asset.nodes[0].light, Some(0));
        assert_eq!(
            asset.nodes[0].instancing_attributes,
            vec![("TRANSLATION".to_string(), 7)]
        );
    }
}
