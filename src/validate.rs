//! Cross-reference and semantic validation.
//!
//! [`validate`] runs the closed set of checks over a parsed asset and
//! reports the first violation as [`Error::InvalidGltf`]. It runs
//! independently of parsing, so hand-built assets can be checked before
//! export as well.

use crate::accessor::{Accessor, Bounds, ComponentType, Type};
use crate::animation::Path;
use crate::asset::Asset;
use crate::camera::Projection;
use crate::extensions;
use crate::light::Kind;
use crate::material::{Material, TextureInfo};
use crate::mesh::{Primitive, Semantic};
use crate::scene::Transform;
use crate::Error;

const GODOT_EPSILON: f32 = 1e-6;

/// Validates an asset, stopping at the first violation.
pub fn validate(asset: &Asset) -> Result<(), Error> {
    validate_extension_sets(asset)?;
    validate_buffer_views(asset)?;
    validate_accessors(asset)?;
    validate_meshes(asset)?;
    validate_nodes(asset)?;
    validate_scenes(asset)?;
    validate_skins(asset)?;
    validate_textures(asset)?;
    validate_materials(asset)?;
    validate_cameras(asset)?;
    validate_lights(asset)?;
    validate_animations(asset)?;
    if asset.uses_extension(extensions::GODOT_SINGLE_ROOT) {
        validate_single_root(asset)?;
    }
    Ok(())
}

fn check(condition: bool) -> Result<(), Error> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidGltf)
    }
}

fn check_index<T>(index: usize, array: &[T]) -> Result<(), Error> {
    check(index < array.len())
}

fn check_opt_index<T>(index: Option<usize>, array: &[T]) -> Result<(), Error> {
    match index {
        Some(index) => check_index(index, array),
        None => Ok(()),
    }
}

fn validate_extension_sets(asset: &Asset) -> Result<(), Error> {
    for required in &asset.extensions_required {
        check(asset.uses_extension(required))?;
    }
    Ok(())
}

fn validate_buffer_views(asset: &Asset) -> Result<(), Error> {
    for view in &asset.buffer_views {
        check_index(view.buffer, &asset.buffers)?;
        let buffer = &asset.buffers[view.buffer];
        check(view.byte_offset + view.byte_length <= buffer.byte_length)?;
        if let Some(stride) = view.byte_stride {
            check((4..=252).contains(&stride) && stride % 4 == 0)?;
        }
        if let Some(meshopt) = &view.meshopt_compression {
            check_index(meshopt.buffer, &asset.buffers)?;
        }
    }
    Ok(())
}

fn bounds_ok(bounds: &Bounds, accessor: &Accessor) -> bool {
    if bounds.len() != accessor.type_.multiplicity() {
        return false;
    }
    // Storage kind tracks the component type.
    match bounds {
        Bounds::F64(_) => accessor.component_type.is_float(),
        Bounds::I64(_) => !accessor.component_type.is_float(),
    }
}

fn validate_accessors(asset: &Asset) -> Result<(), Error> {
    for accessor in &asset.accessors {
        check(accessor.count >= 1)?;
        if accessor.normalized {
            check(
                accessor.component_type != ComponentType::UnsignedInt
                    && !accessor.component_type.is_float(),
            )?;
        }

        if let Some(view_index) = accessor.buffer_view {
            check_index(view_index, &asset.buffer_views)?;
            let view = &asset.buffer_views[view_index];
            let component_size = accessor.component_type.size();
            check((accessor.byte_offset + view.byte_offset) % component_size == 0)?;
            let stride = view.byte_stride.unwrap_or_else(|| accessor.element_size());
            if view.byte_stride.is_some() {
                check(stride % component_size == 0)?;
            }
            // The last element must fit in the view, unless the payload is
            // compressed and the view length covers the compressed form.
            if view.meshopt_compression.is_none() {
                check(
                    accessor.byte_offset + stride * (accessor.count - 1) + accessor.element_size()
                        <= view.byte_length,
                )?;
            }
        }

        if let Some(min) = &accessor.min {
            check(bounds_ok(min, accessor))?;
        }
        if let Some(max) = &accessor.max {
            check(bounds_ok(max, accessor))?;
        }
        if let (Some(min), Some(max)) = (&accessor.min, &accessor.max) {
            check(min.len() == max.len())?;
        }

        if let Some(sparse) = &accessor.sparse {
            check(sparse.count <= accessor.count)?;
            check_index(sparse.indices.buffer_view, &asset.buffer_views)?;
            check_index(sparse.values.buffer_view, &asset.buffer_views)?;
            check(matches!(
                sparse.indices.component_type,
                ComponentType::UnsignedByte
                    | ComponentType::UnsignedShort
                    | ComponentType::UnsignedInt
            ))?;
        }
    }
    Ok(())
}

/// The component types an attribute may legally use.
fn attribute_shape_ok(asset: &Asset, semantic: &Semantic, accessor: &Accessor) -> bool {
    use ComponentType::*;
    let quantized = asset.uses_extension(extensions::KHR_MESH_QUANTIZATION);
    let c = accessor.component_type;
    match semantic {
        Semantic::Positions => {
            accessor.type_ == Type::Vec3
                && (c == Float
                    || (quantized && matches!(c, Byte | UnsignedByte | Short | UnsignedShort)))
        }
        Semantic::Normals | Semantic::Tangents => {
            let expected = if *semantic == Semantic::Normals {
                Type::Vec3
            } else {
                Type::Vec4
            };
            accessor.type_ == expected
                && (c == Float || (quantized && matches!(c, Byte | Short) && accessor.normalized))
        }
        Semantic::TexCoords(_) => {
            accessor.type_ == Type::Vec2
                && (matches!(c, Float | UnsignedByte | UnsignedShort)
                    || (quantized && matches!(c, Byte | Short)))
        }
        Semantic::Colors(_) => {
            matches!(accessor.type_, Type::Vec3 | Type::Vec4)
                && matches!(c, Float | UnsignedByte | UnsignedShort)
        }
        Semantic::Joints(_) => {
            accessor.type_ == Type::Vec4 && matches!(c, UnsignedByte | UnsignedShort)
        }
        Semantic::Weights(_) => {
            accessor.type_ == Type::Vec4 && matches!(c, Float | UnsignedByte | UnsignedShort)
        }
        Semantic::Custom(_) => true,
    }
}

fn validate_primitive(asset: &Asset, primitive: &Primitive) -> Result<(), Error> {
    for attribute in &primitive.attributes {
        check_index(attribute.accessor, &asset.accessors)?;
        let accessor = &asset.accessors[attribute.accessor];
        check(attribute_shape_ok(asset, &attribute.semantic, accessor))?;
        if attribute.semantic == Semantic::Positions {
            check(accessor.min.is_some() && accessor.max.is_some())?;
        }
    }
    if let Some(indices) = primitive.indices {
        check_index(indices, &asset.accessors)?;
        let accessor = &asset.accessors[indices];
        check(accessor.type_ == Type::Scalar)?;
        check(matches!(
            accessor.component_type,
            ComponentType::UnsignedByte | ComponentType::UnsignedShort | ComponentType::UnsignedInt
        ))?;
    }
    check_opt_index(primitive.material, &asset.materials)?;
    for target in &primitive.targets {
        for attribute in target {
            check_index(attribute.accessor, &asset.accessors)?;
        }
    }
    for mapped in primitive.mapped_materials.iter().flatten() {
        check_index(*mapped, &asset.materials)?;
    }
    if let Some(draco) = &primitive.draco {
        check_index(draco.buffer_view, &asset.buffer_views)?;
    }
    Ok(())
}

fn validate_meshes(asset: &Asset) -> Result<(), Error> {
    for mesh in &asset.meshes {
        for primitive in &mesh.primitives {
            validate_primitive(asset, primitive)?;
        }
    }
    Ok(())
}

fn validate_nodes(asset: &Asset) -> Result<(), Error> {
    for node in &asset.nodes {
        check_opt_index(node.camera, &asset.cameras)?;
        check_opt_index(node.mesh, &asset.meshes)?;
        check_opt_index(node.skin, &asset.skins)?;
        check_opt_index(node.light, &asset.lights)?;
        for &child in &node.children {
            check_index(child, &asset.nodes)?;
        }
        for &(_, accessor) in &node.instancing_attributes {
            check_index(accessor, &asset.accessors)?;
        }

        if let Transform::Trs { rotation, .. } = &node.transform {
            for component in rotation {
                check((-1.0..=1.0).contains(component))?;
            }
        }

        // A skinned node carries a mesh whose primitives are all skinned.
        if node.skin.is_some() {
            let mesh = node.mesh.ok_or(Error::InvalidGltf)?;
            check_index(mesh, &asset.meshes)?;
            for primitive in &asset.meshes[mesh].primitives {
                check(primitive.find_attribute(&Semantic::Joints(0)).is_some())?;
                check(primitive.find_attribute(&Semantic::Weights(0)).is_some())?;
            }
        }
    }
    Ok(())
}

fn validate_scenes(asset: &Asset) -> Result<(), Error> {
    check_opt_index(asset.default_scene, &asset.scenes)?;
    for scene in &asset.scenes {
        for &node in &scene.nodes {
            check_index(node, &asset.nodes)?;
        }
    }
    Ok(())
}

fn validate_skins(asset: &Asset) -> Result<(), Error> {
    for skin in &asset.skins {
        check(!skin.joints.is_empty())?;
        for &joint in &skin.joints {
            check_index(joint, &asset.nodes)?;
        }
        check_opt_index(skin.skeleton, &asset.nodes)?;
        if let Some(ibm) = skin.inverse_bind_matrices {
            check_index(ibm, &asset.accessors)?;
            let accessor = &asset.accessors[ibm];
            check(accessor.type_ == Type::Mat4)?;
            check(accessor.component_type == ComponentType::Float)?;
            check(accessor.count >= skin.joints.len())?;
        }
    }
    Ok(())
}

fn validate_textures(asset: &Asset) -> Result<(), Error> {
    for texture in &asset.textures {
        check_opt_index(texture.sampler, &asset.samplers)?;
        check(
            texture.image.is_some()
                || texture.basisu_image.is_some()
                || texture.dds_image.is_some()
                || texture.webp_image.is_some(),
        )?;
        check_opt_index(texture.image, &asset.images)?;
        check_opt_index(texture.basisu_image, &asset.images)?;
        check_opt_index(texture.dds_image, &asset.images)?;
        check_opt_index(texture.webp_image, &asset.images)?;
    }
    Ok(())
}

fn check_texture_info(asset: &Asset, info: Option<&TextureInfo>) -> Result<(), Error> {
    if let Some(info) = info {
        check_index(info.texture, &asset.textures)?;
        if info.transform.is_some() {
            check(asset.uses_extension(extensions::KHR_TEXTURE_TRANSFORM))?;
        }
    }
    Ok(())
}

/// A sub-struct may only be present when its extension is declared used.
fn material_provenance(asset: &Asset, material: &Material) -> Result<(), Error> {
    let gated: [(bool, &str); 14] = [
        (material.anisotropy.is_some(), extensions::KHR_MATERIALS_ANISOTROPY),
        (material.clearcoat.is_some(), extensions::KHR_MATERIALS_CLEARCOAT),
        (material.sheen.is_some(), extensions::KHR_MATERIALS_SHEEN),
        (material.specular.is_some(), extensions::KHR_MATERIALS_SPECULAR),
        (material.transmission.is_some(), extensions::KHR_MATERIALS_TRANSMISSION),
        (material.volume.is_some(), extensions::KHR_MATERIALS_VOLUME),
        (material.iridescence.is_some(), extensions::KHR_MATERIALS_IRIDESCENCE),
        (
            material.diffuse_transmission.is_some(),
            extensions::KHR_MATERIALS_DIFFUSE_TRANSMISSION,
        ),
        (material.ior.is_some(), extensions::KHR_MATERIALS_IOR),
        (material.dispersion.is_some(), extensions::KHR_MATERIALS_DISPERSION),
        (
            material.emissive_strength.is_some(),
            extensions::KHR_MATERIALS_EMISSIVE_STRENGTH,
        ),
        (material.unlit, extensions::KHR_MATERIALS_UNLIT),
        (
            material.packed_normal_roughness_metallic.is_some(),
            extensions::MSFT_PACKING_NORMAL_ROUGHNESS_METALLIC,
        ),
        (
            material.packed_occlusion_roughness_metallic.is_some(),
            extensions::MSFT_PACKING_OCCLUSION_ROUGHNESS_METALLIC,
        ),
    ];
    for (present, name) in gated {
        if present {
            check(asset.uses_extension(name))?;
        }
    }
    Ok(())
}

fn validate_materials(asset: &Asset) -> Result<(), Error> {
    for material in &asset.materials {
        check_texture_info(asset, material.pbr.base_color_texture.as_ref())?;
        check_texture_info(asset, material.pbr.metallic_roughness_texture.as_ref())?;
        check_texture_info(asset, material.emissive_texture.as_ref())?;
        if let Some(normal) = &material.normal_texture {
            check_texture_info(asset, Some(&normal.texture))?;
        }
        if let Some(occlusion) = &material.occlusion_texture {
            check_texture_info(asset, Some(&occlusion.texture))?;
        }
        material_provenance(asset, material)?;
    }
    Ok(())
}

fn validate_cameras(asset: &Asset) -> Result<(), Error> {
    for camera in &asset.cameras {
        match &camera.projection {
            Projection::Perspective(perspective) => {
                check(perspective.yfov > 0.0)?;
                check(perspective.znear > 0.0)?;
                if let Some(zfar) = perspective.zfar {
                    check(zfar > 0.0)?;
                }
                if let Some(aspect) = perspective.aspect_ratio {
                    check(aspect != 0.0)?;
                }
            }
            Projection::Orthographic(orthographic) => {
                check(orthographic.xmag != 0.0)?;
                check(orthographic.ymag != 0.0)?;
                check(orthographic.zfar > 0.0)?;
            }
        }
    }
    Ok(())
}

fn validate_lights(asset: &Asset) -> Result<(), Error> {
    for light in &asset.lights {
        for component in light.color {
            check((0.0..=1.0).contains(&component))?;
        }
        match light.kind {
            Kind::Directional => {
                check(light.range.is_none())?;
                check(light.inner_cone_angle.is_none() && light.outer_cone_angle.is_none())?;
            }
            Kind::Point => {
                check(light.inner_cone_angle.is_none() && light.outer_cone_angle.is_none())?;
            }
            Kind::Spot => {
                let inner = light.inner_cone_angle.ok_or(Error::InvalidGltf)?;
                let outer = light.outer_cone_angle.ok_or(Error::InvalidGltf)?;
                check(inner >= 0.0)?;
                check(inner <= outer)?;
                check(outer <= std::f32::consts::FRAC_PI_2)?;
            }
        }
    }
    Ok(())
}

fn validate_animations(asset: &Asset) -> Result<(), Error> {
    for animation in &asset.animations {
        for channel in &animation.channels {
            check_index(channel.sampler, &animation.samplers)?;
            check_opt_index(channel.node, &asset.nodes)?;

            let sampler = &animation.samplers[channel.sampler];
            check_index(sampler.input, &asset.accessors)?;
            check_index(sampler.output, &asset.accessors)?;
            let input = &asset.accessors[sampler.input];
            let output = &asset.accessors[sampler.output];

            check(input.type_ == Type::Scalar)?;
            check(input.component_type.is_float())?;

            // Count relations are deferred for morph weights and compressed
            // views; the decompressed sizes are not visible here.
            if channel.path == Path::Weights
                || view_is_compressed(asset, input)
                || view_is_compressed(asset, output)
            {
                continue;
            }
            match sampler.interpolation {
                crate::animation::Interpolation::CubicSpline => {
                    check(input.count >= 2)?;
                    check(output.count == 3 * input.count)?;
                }
                _ => check(input.count == output.count)?,
            }
        }
    }
    Ok(())
}

fn view_is_compressed(asset: &Asset, accessor: &Accessor) -> bool {
    accessor
        .buffer_view
        .and_then(|index| asset.buffer_views.get(index))
        .is_some_and(|view| view.meshopt_compression.is_some())
}

/// `GODOT_single_root`: one scene holding exactly node 0, which sits at the
/// identity transform. The comparison is epsilon-based so that a
/// numerically-identity matrix passes.
fn validate_single_root(asset: &Asset) -> Result<(), Error> {
    check(asset.scenes.len() == 1)?;
    check(asset.default_scene.unwrap_or(0) == 0)?;
    check(asset.scenes[0].nodes == [0])?;
    check(!asset.nodes.is_empty())?;

    let (translation, rotation, scale) = asset.nodes[0].transform.decomposed();
    let near = |a: f32, b: f32| (a - b).abs() <= GODOT_EPSILON;
    check(translation.iter().all(|&t| near(t, 0.0)))?;
    check(scale.iter().all(|&s| near(s, 1.0)))?;
    check(near(rotation[0], 0.0) && near(rotation[1], 0.0) && near(rotation[2], 0.0))?;
    check(near(rotation[3].abs(), 1.0))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Extensions, Options, Parser};
    use std::path::Path as FsPath;

    fn parse_and_validate(json: &str, extensions: Extensions) -> Result<(), Error> {
        let asset = Parser::new(extensions).parse_json_bytes(
            json.as_bytes(),
            FsPath::new("."),
            Options::empty(),
        )?;
        validate(&asset)
    }

    #[test]
    fn out_of_range_buffer_index_fails() {
        let err = parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "buffers":[{"byteLength":4,"uri":"a.bin"}],
                "bufferViews":[{"buffer":3,"byteLength":4}]}"#,
            Extensions::empty(),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn misaligned_accessor_fails() {
        let err = parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "buffers":[{"byteLength":64,"uri":"a.bin"}],
                "bufferViews":[{"buffer":0,"byteOffset":0,"byteLength":64}],
                "accessors":[{"bufferView":0,"byteOffset":2,"count":3,
                              "componentType":5126,"type":"SCALAR"}]}"#,
            Extensions::empty(),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn position_requires_bounds() {
        let err = parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "buffers":[{"byteLength":36,"uri":"a.bin"}],
                "bufferViews":[{"buffer":0,"byteLength":36}],
                "accessors":[{"bufferView":0,"count":3,
                              "componentType":5126,"type":"VEC3"}],
                "meshes":[{"primitives":[{"attributes":{"POSITION":0}}]}]}"#,
            Extensions::empty(),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn quantized_positions_need_the_extension() {
        let json = |used: &str| {
            format!(
                r#"{{"asset":{{"version":"2.0"}},{used}
                    "buffers":[{{"byteLength":24,"uri":"a.bin"}}],
                    "bufferViews":[{{"buffer":0,"byteLength":24}}],
                    "accessors":[{{"bufferView":0,"count":3,"componentType":5122,
                                 "type":"VEC3","min":[0,0,0],"max":[1,1,1]}}],
                    "meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}}}}]}}]}}"#
            )
        };
        assert_eq!(
            parse_and_validate(&json(""), Extensions::empty()).unwrap_err(),
            Error::InvalidGltf
        );
        parse_and_validate(
            &json(r#""extensionsUsed":["KHR_mesh_quantization"],"#),
            Extensions::KHR_MESH_QUANTIZATION,
        )
        .unwrap();
    }

    #[test]
    fn skinned_node_needs_joints_and_weights() {
        let err = parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "buffers":[{"byteLength":144,"uri":"a.bin"}],
                "bufferViews":[{"buffer":0,"byteLength":144}],
                "accessors":[{"bufferView":0,"count":3,"componentType":5126,
                              "type":"VEC3","min":[0,0,0],"max":[1,1,1]}],
                "meshes":[{"primitives":[{"attributes":{"POSITION":0}}]}],
                "skins":[{"joints":[0]}],
                "nodes":[{"mesh":0,"skin":0}]}"#,
            Extensions::empty(),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn rotation_components_are_clamped() {
        let err = parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "nodes":[{"rotation":[0.0,0.0,0.0,1.5]}]}"#,
            Extensions::empty(),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn cubic_spline_output_count() {
        let json = |output_count: u32| {
            format!(
                r#"{{"asset":{{"version":"2.0"}},
                    "buffers":[{{"byteLength":1024,"uri":"a.bin"}}],
                    "bufferViews":[{{"buffer":0,"byteLength":1024}}],
                    "accessors":[
                      {{"bufferView":0,"count":4,"componentType":5126,"type":"SCALAR"}},
                      {{"bufferView":0,"count":{output_count},"componentType":5126,"type":"VEC3"}}],
                    "nodes":[{{}}],
                    "animations":[{{
                      "channels":[{{"sampler":0,"target":{{"node":0,"path":"translation"}}}}],
                      "samplers":[{{"input":0,"output":1,"interpolation":"CUBICSPLINE"}}]}}]}}"#
            )
        };
        assert_eq!(
            parse_and_validate(&json(4), Extensions::empty()).unwrap_err(),
            Error::InvalidGltf
        );
        parse_and_validate(&json(12), Extensions::empty()).unwrap();
    }

    #[test]
    fn directional_light_cannot_have_range() {
        let err = parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "extensionsUsed":["KHR_lights_punctual"],
                "extensions":{"KHR_lights_punctual":{"lights":[
                  {"type":"directional","range":10.0}]}}}"#,
            Extensions::KHR_LIGHTS_PUNCTUAL,
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn spot_cone_ordering() {
        let err = parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "extensionsUsed":["KHR_lights_punctual"],
                "extensions":{"KHR_lights_punctual":{"lights":[
                  {"type":"spot","spot":{"innerConeAngle":0.8,"outerConeAngle":0.5}}]}}}"#,
            Extensions::KHR_LIGHTS_PUNCTUAL,
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn camera_positivity() {
        let err = parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "cameras":[{"type":"perspective",
                            "perspective":{"yfov":0.0,"znear":0.1}}]}"#,
            Extensions::empty(),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn single_root_accepts_identity() {
        parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "extensionsUsed":["GODOT_single_root"],
                "scene":0,
                "scenes":[{"nodes":[0]}],
                "nodes":[{"matrix":[1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]}]}"#,
            Extensions::GODOT_SINGLE_ROOT,
        )
        .unwrap();
    }

    #[test]
    fn single_root_rejects_offset_roots() {
        let err = parse_and_validate(
            r#"{"asset":{"version":"2.0"},
                "extensionsUsed":["GODOT_single_root"],
                "scene":0,
                "scenes":[{"nodes":[0]}],
                "nodes":[{"translation":[1.0,0.0,0.0]}]}"#,
            Extensions::GODOT_SINGLE_ROOT,
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn required_must_be_used() {
        let asset = Parser::new(Extensions::KHR_LIGHTS_PUNCTUAL)
            .parse_json_bytes(
                br#"{"asset":{"version":"2.0"},
                     "extensionsRequired":["KHR_lights_punctual"]}"#,
                FsPath::new("."),
                Options::empty(),
            )
            .unwrap();
        assert_eq!(validate(&asset).unwrap_err(), Error::InvalidGltf);
    }
}
