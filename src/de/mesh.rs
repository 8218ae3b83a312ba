//! Mesh and primitive parsing, plus the generated-indices post-pass.

use serde_json::{Map, Value};

use super::{
    as_array, as_object, get_f32_vec, get_index, get_name, get_object, get_u64, req_index, Ctx,
};
use crate::accessor::{Accessor, ComponentType, Type};
use crate::asset::{Asset, Category};
use crate::buffer::{Buffer, DataSource, MimeType, View};
use crate::crc32::{self, crc32c};
use crate::mesh::{Attribute, DracoPrimitive, Mesh, Primitive, Semantic, Topology};
use crate::{Error, Extensions};

const EXT_DRACO: u32 = crc32c(b"KHR_draco_mesh_compression");
const EXT_VARIANTS: u32 = crc32c(b"KHR_materials_variants");

pub(super) fn parse_meshes(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.meshes.reserve(entries.len());
    for entry in entries {
        let object = as_object(entry)?;
        let primitives = match object.get("primitives") {
            Some(value) => {
                let mut primitives = Vec::new();
                for entry in as_array(value)? {
                    primitives.push(parse_primitive(ctx, as_object(entry)?)?);
                }
                primitives
            }
            None => return Err(Error::MissingField),
        };
        ctx.asset.meshes.push(Mesh {
            primitives,
            weights: get_f32_vec(object, "weights")?,
            name: get_name(object)?,
        });
    }
    ctx.asset.available_categories |= Category::MESHES;
    Ok(())
}

/// Parses a JSON attribute object into a flat list, preserving insertion
/// order. Unknown names must carry the `_` application prefix.
pub(super) fn parse_attribute_map(object: &Map<String, Value>) -> Result<Vec<Attribute>, Error> {
    let mut attributes = Vec::with_capacity(object.len());
    for (name, value) in object {
        let semantic = Semantic::from_str(name).ok_or(Error::InvalidGltf)?;
        let accessor = value.as_u64().ok_or(Error::InvalidGltf)? as usize;
        attributes.push(Attribute { semantic, accessor });
    }
    Ok(attributes)
}

fn parse_primitive(ctx: &Ctx<'_>, object: &Map<String, Value>) -> Result<Primitive, Error> {
    let attributes = match get_object(object, "attributes")? {
        Some(attributes) => parse_attribute_map(attributes)?,
        None => return Err(Error::MissingField),
    };

    let topology = match get_u64(object, "mode")? {
        Some(mode) => Topology::from_gl_enum(mode).ok_or(Error::InvalidGltf)?,
        None => Topology::Triangles,
    };

    let mut targets = Vec::new();
    if let Some(value) = object.get("targets") {
        for entry in as_array(value)? {
            targets.push(parse_attribute_map(as_object(entry)?)?);
        }
    }

    let mut draco = None;
    let mut mapped_materials = Vec::new();
    if let Some(ext) = get_object(object, "extensions")? {
        for (key, value) in ext {
            match crc32::hash_str(key) {
                EXT_DRACO if ctx.enabled.contains(Extensions::KHR_DRACO_MESH_COMPRESSION) => {
                    let ext = as_object(value)?;
                    let attributes = get_object(ext, "attributes")?.ok_or(Error::MissingField)?;
                    draco = Some(DracoPrimitive {
                        buffer_view: req_index(ext, "bufferView")?,
                        attributes: parse_attribute_map(attributes)?,
                    });
                }
                EXT_VARIANTS if ctx.enabled.contains(Extensions::KHR_MATERIALS_VARIANTS) => {
                    let ext = as_object(value)?;
                    let mappings = ext.get("mappings").ok_or(Error::MissingField)?;
                    mapped_materials = parse_variant_mappings(as_array(mappings)?)?;
                }
                _ => {}
            }
        }
    }

    Ok(Primitive {
        attributes,
        topology,
        indices: get_index(object, "indices")?,
        material: get_index(object, "material")?,
        targets,
        mapped_materials,
        draco,
    })
}

/// Flattens `KHR_materials_variants` mappings into a variant-indexed table.
fn parse_variant_mappings(mappings: &[Value]) -> Result<Vec<Option<usize>>, Error> {
    let mut table = Vec::new();
    for mapping in mappings {
        let mapping = as_object(mapping)?;
        let material = req_index(mapping, "material")?;
        for variant in as_array(mapping.get("variants").ok_or(Error::MissingField)?)? {
            let variant = variant.as_u64().ok_or(Error::InvalidGltf)? as usize;
            if table.len() <= variant {
                table.resize(variant + 1, None);
            }
            table[variant] = Some(material);
        }
    }
    Ok(table)
}

/// Synthesizes index accessors for primitives that lack them, writing
/// `[0, count)` into a fresh buffer + view + accessor triple per primitive.
/// Index width follows the vertex count: byte below 255, short below 65535,
/// int otherwise.
pub(super) fn generate_mesh_indices(asset: &mut Asset) {
    for mesh_index in 0..asset.meshes.len() {
        for primitive_index in 0..asset.meshes[mesh_index].primitives.len() {
            let primitive = &asset.meshes[mesh_index].primitives[primitive_index];
            if primitive.indices.is_some() {
                continue;
            }
            let position = primitive.find_attribute(&Semantic::Positions);
            let count = match position.and_then(|index| asset.accessors.get(index)) {
                Some(accessor) => accessor.count,
                None => continue,
            };

            let (component_type, bytes) = encode_trivial_indices(count);
            let byte_length = bytes.len();

            let buffer_index = asset.buffers.len();
            asset.buffers.push(Buffer {
                byte_length,
                data: DataSource::Bytes {
                    bytes,
                    mime_type: MimeType::GltfBuffer,
                },
                name: None,
            });
            let view_index = asset.buffer_views.len();
            asset.buffer_views.push(View {
                buffer: buffer_index,
                byte_offset: 0,
                byte_length,
                byte_stride: None,
                target: None,
                meshopt_compression: None,
                name: None,
            });
            let accessor_index = asset.accessors.len();
            asset.accessors.push(Accessor {
                buffer_view: Some(view_index),
                byte_offset: 0,
                count,
                type_: Type::Scalar,
                component_type,
                normalized: false,
                min: None,
                max: None,
                sparse: None,
                name: None,
            });
            asset.meshes[mesh_index].primitives[primitive_index].indices = Some(accessor_index);
        }
    }
}

fn encode_trivial_indices(count: usize) -> (ComponentType, Vec<u8>) {
    if count < u8::MAX as usize {
        (
            ComponentType::UnsignedByte,
            (0..count).map(|i| i as u8).collect(),
        )
    } else if count < u16::MAX as usize {
        let mut bytes = Vec::with_capacity(count * 2);
        for i in 0..count {
            bytes.extend_from_slice(&(i as u16).to_le_bytes());
        }
        (ComponentType::UnsignedShort, bytes)
    } else {
        let mut bytes = Vec::with_capacity(count * 4);
        for i in 0..count {
            bytes.extend_from_slice(&(i as u32).to_le_bytes());
        }
        (ComponentType::UnsignedInt, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, Parser};
    use std::path::Path;

    fn parse(json: &str, extensions: Extensions, options: Options) -> Result<crate::Asset, Error> {
        Parser::new(extensions).parse_json_bytes(json.as_bytes(), Path::new("."), options)
    }

    #[test]
    fn attribute_order_is_preserved() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "meshes":[{"primitives":[{"attributes":
                  {"TEXCOORD_0":2,"POSITION":0,"NORMAL":1}}]}]}"#,
            Extensions::empty(),
            Options::empty(),
        )
        .unwrap();
        let attributes = &asset.meshes[0].primitives[0].attributes;
        assert_eq!(attributes[0].semantic, Semantic::TexCoords(0));
        assert_eq!(attributes[1].semantic, Semantic::Positions);
        assert_eq!(attributes[2].semantic, Semantic::Normals);
    }

    #[test]
    fn unknown_attribute_without_underscore_is_rejected() {
        let err = parse(
            r#"{"asset":{"version":"2.0"},
                "meshes":[{"primitives":[{"attributes":{"BITANGENT":0}}]}]}"#,
            Extensions::empty(),
            Options::empty(),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn generate_mesh_indices_synthesizes_a_triple() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "accessors":[{"bufferView":0,"count":300,"componentType":5126,
                              "type":"VEC3","min":[0,0,0],"max":[1,1,1]}],
                "meshes":[{"primitives":[{"attributes":{"POSITION":0},"mode":4}]}]}"#,
            Extensions::empty(),
            Options::GENERATE_MESH_INDICES,
        )
        .unwrap();

        let primitive = &asset.meshes[0].primitives[0];
        let indices = primitive.indices.expect("indices were generated");
        let accessor = &asset.accessors[indices];
        assert_eq!(accessor.count, 300);
        assert_eq!(accessor.component_type, ComponentType::UnsignedShort);
        assert_eq!(accessor.type_, Type::Scalar);

        let view = &asset.buffer_views[accessor.buffer_view.unwrap()];
        let buffer = &asset.buffers[view.buffer];
        let bytes = buffer.bytes().unwrap();
        assert_eq!(bytes.len(), 600);
        for i in 0..300usize {
            let value = u16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
            assert_eq!(value as usize, i);
        }
    }

    #[test]
    fn small_primitives_get_byte_indices() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "accessors":[{"bufferView":0,"count":3,"componentType":5126,
                              "type":"VEC3","min":[0,0,0],"max":[1,1,1]}],
                "meshes":[{"primitives":[{"attributes":{"POSITION":0}}]}]}"#,
            Extensions::empty(),
            Options::GENERATE_MESH_INDICES,
        )
        .unwrap();
        let indices = asset.meshes[0].primitives[0].indices.unwrap();
        assert_eq!(
            asset.accessors[indices].component_type,
            ComponentType::UnsignedByte
        );
    }

    #[test]
    fn variant_mappings_flatten_by_variant_index() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "extensionsUsed":["KHR_materials_variants"],
                "meshes":[{"primitives":[{"attributes":{"POSITION":0},
                  "extensions":{"KHR_materials_variants":{
                    "mappings":[{"material":5,"variants":[0,2]},
                                {"material":9,"variants":[1]}]}}}]}]}"#,
            Extensions::KHR_MATERIALS_VARIANTS,
            Options::empty(),
        )
        .unwrap();
        assert_eq!(
            asset.meshes[0].primitives[0].mapped_materials,
            vec![Some(5), Some(9), Some(5)]
        );
    }

    #[test]
    fn draco_descriptor_is_captured() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "extensionsUsed":["KHR_draco_mesh_compression"],
                "meshes":[{"primitives":[{"attributes":{"POSITION":0},
                  "extensions":{"KHR_draco_mesh_compression":{
                    "bufferView":4,"attributes":{"POSITION":0,"NORMAL":1}}}}]}]}"#,
            Extensions::KHR_DRACO_MESH_COMPRESSION,
            Options::empty(),
        )
        .unwrap();
        let draco = asset.meshes[0].primitives[0].draco.as_ref().unwrap();
        assert_eq!(draco.buffer_view, 4);
        assert_eq!(draco.attributes.len(), 2);
    }
}
