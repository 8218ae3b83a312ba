//! Material array parsing, including the material-extension family.

use serde_json::{Map, Value};

use super::{
    as_array, as_object, get_bool, get_f32, get_f32_array, get_index, get_name, get_object,
    req_f32, req_index, Ctx,
};
use crate::asset::Category;
use crate::crc32::{self, crc32c};
use crate::material::{
    AlphaMode, Anisotropy, Clearcoat, DiffuseTransmission, Iridescence, Material,
    NormalTextureInfo, OcclusionTextureInfo, PackedNormalRoughnessMetallic,
    PackedOcclusionRoughnessMetallic, PbrMetallicRoughness, Sheen, Specular, TextureInfo,
    TextureTransform, Transmission, Volume,
};
use crate::{Error, Extensions};

const EXT_ANISOTROPY: u32 = crc32c(b"KHR_materials_anisotropy");
const EXT_CLEARCOAT: u32 = crc32c(b"KHR_materials_clearcoat");
const EXT_DIFFUSE_TRANSMISSION: u32 = crc32c(b"KHR_materials_diffuse_transmission");
const EXT_DISPERSION: u32 = crc32c(b"KHR_materials_dispersion");
const EXT_EMISSIVE_STRENGTH: u32 = crc32c(b"KHR_materials_emissive_strength");
const EXT_IOR: u32 = crc32c(b"KHR_materials_ior");
const EXT_IRIDESCENCE: u32 = crc32c(b"KHR_materials_iridescence");
const EXT_SHEEN: u32 = crc32c(b"KHR_materials_sheen");
const EXT_SPECULAR: u32 = crc32c(b"KHR_materials_specular");
const EXT_TRANSMISSION: u32 = crc32c(b"KHR_materials_transmission");
const EXT_UNLIT: u32 = crc32c(b"KHR_materials_unlit");
const EXT_VOLUME: u32 = crc32c(b"KHR_materials_volume");
const EXT_PACKING_NRM: u32 = crc32c(b"MSFT_packing_normalRoughnessMetallic");
const EXT_PACKING_ORM: u32 = crc32c(b"MSFT_packing_occlusionRoughnessMetallic");
const EXT_TEXTURE_TRANSFORM: u32 = crc32c(b"KHR_texture_transform");

pub(super) fn parse_materials(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.materials.reserve(entries.len());
    for entry in entries {
        let material = parse_material(ctx, as_object(entry)?)?;
        ctx.asset.materials.push(material);
    }
    ctx.asset.available_categories |= Category::MATERIALS;
    Ok(())
}

/// Parses a texture reference, resolving a `KHR_texture_transform` extension
/// when the host opted in.
pub(super) fn parse_texture_info(
    ctx: &Ctx<'_>,
    object: &Map<String, Value>,
) -> Result<TextureInfo, Error> {
    let mut info = TextureInfo {
        texture: req_index(object, "index")?,
        tex_coord: get_index(object, "texCoord")?.unwrap_or(0),
        transform: None,
    };
    if let Some(ext) = get_object(object, "extensions")? {
        for (key, value) in ext {
            if crc32::hash_str(key) == EXT_TEXTURE_TRANSFORM
                && ctx.enabled.contains(Extensions::KHR_TEXTURE_TRANSFORM)
            {
                let ext = as_object(value)?;
                info.transform = Some(TextureTransform {
                    uv_offset: get_f32_array(ext, "offset")?.unwrap_or([0.0, 0.0]),
                    rotation: get_f32(ext, "rotation")?.unwrap_or(0.0),
                    uv_scale: get_f32_array(ext, "scale")?.unwrap_or([1.0, 1.0]),
                    tex_coord: get_index(ext, "texCoord")?,
                });
            }
        }
    }
    Ok(info)
}

fn get_texture_info(
    ctx: &Ctx<'_>,
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<TextureInfo>, Error> {
    match get_object(object, key)? {
        Some(info) => Ok(Some(parse_texture_info(ctx, info)?)),
        None => Ok(None),
    }
}

fn get_normal_texture(
    ctx: &Ctx<'_>,
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<NormalTextureInfo>, Error> {
    match get_object(object, key)? {
        Some(info) => Ok(Some(NormalTextureInfo {
            texture: parse_texture_info(ctx, info)?,
            scale: get_f32(info, "scale")?.unwrap_or(1.0),
        })),
        None => Ok(None),
    }
}

fn parse_material(ctx: &Ctx<'_>, object: &Map<String, Value>) -> Result<Material, Error> {
    let mut material = Material::default();

    if let Some(pbr) = get_object(object, "pbrMetallicRoughness")? {
        material.pbr = PbrMetallicRoughness {
            base_color_factor: get_f32_array(pbr, "baseColorFactor")?
                .unwrap_or([1.0, 1.0, 1.0, 1.0]),
            base_color_texture: get_texture_info(ctx, pbr, "baseColorTexture")?,
            metallic_factor: get_f32(pbr, "metallicFactor")?.unwrap_or(1.0),
            roughness_factor: get_f32(pbr, "roughnessFactor")?.unwrap_or(1.0),
            metallic_roughness_texture: get_texture_info(ctx, pbr, "metallicRoughnessTexture")?,
        };
    }

    material.normal_texture = get_normal_texture(ctx, object, "normalTexture")?;
    if let Some(info) = get_object(object, "occlusionTexture")? {
        material.occlusion_texture = Some(OcclusionTextureInfo {
            texture: parse_texture_info(ctx, info)?,
            strength: get_f32(info, "strength")?.unwrap_or(1.0),
        });
    }
    material.emissive_texture = get_texture_info(ctx, object, "emissiveTexture")?;
    material.emissive_factor = get_f32_array(object, "emissiveFactor")?.unwrap_or([0.0; 3]);
    material.alpha_mode = match super::get_str(object, "alphaMode")? {
        Some(text) => AlphaMode::from_str(text).ok_or(Error::InvalidGltf)?,
        None => AlphaMode::Opaque,
    };
    material.alpha_cutoff = get_f32(object, "alphaCutoff")?.unwrap_or(0.5);
    material.double_sided = get_bool(object, "doubleSided")?.unwrap_or(false);
    material.name = get_name(object)?;

    if let Some(ext) = get_object(object, "extensions")? {
        for (key, value) in ext {
            parse_material_extension(ctx, &mut material, crc32::hash_str(key), value)?;
        }
    }

    Ok(material)
}

fn parse_material_extension(
    ctx: &Ctx<'_>,
    material: &mut Material,
    key: u32,
    value: &Value,
) -> Result<(), Error> {
    let enabled = ctx.enabled;
    match key {
        EXT_ANISOTROPY if enabled.contains(Extensions::KHR_MATERIALS_ANISOTROPY) => {
            let ext = as_object(value)?;
            material.anisotropy = Some(Box::new(Anisotropy {
                anisotropy_strength: get_f32(ext, "anisotropyStrength")?.unwrap_or(0.0),
                anisotropy_rotation: get_f32(ext, "anisotropyRotation")?.unwrap_or(0.0),
                anisotropy_texture: get_texture_info(ctx, ext, "anisotropyTexture")?,
            }));
        }
        EXT_CLEARCOAT if enabled.contains(Extensions::KHR_MATERIALS_CLEARCOAT) => {
            let ext = as_object(value)?;
            material.clearcoat = Some(Box::new(Clearcoat {
                clearcoat_factor: get_f32(ext, "clearcoatFactor")?.unwrap_or(0.0),
                clearcoat_texture: get_texture_info(ctx, ext, "clearcoatTexture")?,
                clearcoat_roughness_factor: get_f32(ext, "clearcoatRoughnessFactor")?
                    .unwrap_or(0.0),
                clearcoat_roughness_texture: get_texture_info(
                    ctx,
                    ext,
                    "clearcoatRoughnessTexture",
                )?,
                clearcoat_normal_texture: get_normal_texture(ctx, ext, "clearcoatNormalTexture")?,
            }));
        }
        EXT_DIFFUSE_TRANSMISSION if enabled.contains(Extensions::KHR_MATERIALS_DIFFUSE_TRANSMISSION) => {
            let ext = as_object(value)?;
            material.diffuse_transmission = Some(Box::new(DiffuseTransmission {
                diffuse_transmission_factor: get_f32(ext, "diffuseTransmissionFactor")?
                    .unwrap_or(0.0),
                diffuse_transmission_texture: get_texture_info(
                    ctx,
                    ext,
                    "diffuseTransmissionTexture",
                )?,
                diffuse_transmission_color_factor: get_f32_array(
                    ext,
                    "diffuseTransmissionColorFactor",
                )?
                .unwrap_or([1.0; 3]),
                diffuse_transmission_color_texture: get_texture_info(
                    ctx,
                    ext,
                    "diffuseTransmissionColorTexture",
                )?,
            }));
        }
        EXT_DISPERSION if enabled.contains(Extensions::KHR_MATERIALS_DISPERSION) => {
            material.dispersion = Some(req_f32(as_object(value)?, "dispersion")?);
        }
        EXT_EMISSIVE_STRENGTH if enabled.contains(Extensions::KHR_MATERIALS_EMISSIVE_STRENGTH) => {
            material.emissive_strength =
                Some(get_f32(as_object(value)?, "emissiveStrength")?.unwrap_or(1.0));
        }
        EXT_IOR if enabled.contains(Extensions::KHR_MATERIALS_IOR) => {
            material.ior = Some(get_f32(as_object(value)?, "ior")?.unwrap_or(1.5));
        }
        EXT_IRIDESCENCE if enabled.contains(Extensions::KHR_MATERIALS_IRIDESCENCE) => {
            let ext = as_object(value)?;
            material.iridescence = Some(Box::new(Iridescence {
                iridescence_factor: get_f32(ext, "iridescenceFactor")?.unwrap_or(0.0),
                iridescence_texture: get_texture_info(ctx, ext, "iridescenceTexture")?,
                iridescence_ior: get_f32(ext, "iridescenceIor")?.unwrap_or(1.3),
                iridescence_thickness_minimum: get_f32(ext, "iridescenceThicknessMinimum")?
                    .unwrap_or(100.0),
                iridescence_thickness_maximum: get_f32(ext, "iridescenceThicknessMaximum")?
                    .unwrap_or(400.0),
                iridescence_thickness_texture: get_texture_info(
                    ctx,
                    ext,
                    "iridescenceThicknessTexture",
                )?,
            }));
        }
        EXT_SHEEN if enabled.contains(Extensions::KHR_MATERIALS_SHEEN) => {
            let ext = as_object(value)?;
            material.sheen = Some(Box::new(Sheen {
                sheen_color_factor: get_f32_array(ext, "sheenColorFactor")?.unwrap_or([0.0; 3]),
                sheen_color_texture: get_texture_info(ctx, ext, "sheenColorTexture")?,
                sheen_roughness_factor: get_f32(ext, "sheenRoughnessFactor")?.unwrap_or(0.0),
                sheen_roughness_texture: get_texture_info(ctx, ext, "sheenRoughnessTexture")?,
            }));
        }
        EXT_SPECULAR if enabled.contains(Extensions::KHR_MATERIALS_SPECULAR) => {
            let ext = as_object(value)?;
            material.specular = Some(Box::new(Specular {
                specular_factor: get_f32(ext, "specularFactor")?.unwrap_or(1.0),
                specular_texture: get_texture_info(ctx, ext, "specularTexture")?,
                specular_color_factor: get_f32_array(ext, "specularColorFactor")?
                    .unwrap_or([1.0; 3]),
                specular_color_texture: get_texture_info(ctx, ext, "specularColorTexture")?,
            }));
        }
        EXT_TRANSMISSION if enabled.contains(Extensions::KHR_MATERIALS_TRANSMISSION) => {
            let ext = as_object(value)?;
            material.transmission = Some(Box::new(Transmission {
                transmission_factor: get_f32(ext, "transmissionFactor")?.unwrap_or(0.0),
                transmission_texture: get_texture_info(ctx, ext, "transmissionTexture")?,
            }));
        }
        EXT_UNLIT if enabled.contains(Extensions::KHR_MATERIALS_UNLIT) => {
            material.unlit = true;
        }
        EXT_VOLUME if enabled.contains(Extensions::KHR_MATERIALS_VOLUME) => {
            let ext = as_object(value)?;
            material.volume = Some(Box::new(Volume {
                thickness_factor: get_f32(ext, "thicknessFactor")?.unwrap_or(0.0),
                thickness_texture: get_texture_info(ctx, ext, "thicknessTexture")?,
                attenuation_distance: get_f32(ext, "attenuationDistance")?
                    .unwrap_or(f32::INFINITY),
                attenuation_color: get_f32_array(ext, "attenuationColor")?.unwrap_or([1.0; 3]),
            }));
        }
        EXT_PACKING_NRM if enabled.contains(Extensions::MSFT_PACKING_NORMAL_ROUGHNESS_METALLIC) => {
            let ext = as_object(value)?;
            material.packed_normal_roughness_metallic =
                Some(Box::new(PackedNormalRoughnessMetallic {
                    normal_roughness_metallic_texture: get_texture_info(
                        ctx,
                        ext,
                        "normalRoughnessMetallicTexture",
                    )?,
                }));
        }
        EXT_PACKING_ORM
            if enabled.contains(Extensions::MSFT_PACKING_OCCLUSION_ROUGHNESS_METALLIC) =>
        {
            let ext = as_object(value)?;
            material.packed_occlusion_roughness_metallic =
                Some(Box::new(PackedOcclusionRoughnessMetallic {
                    occlusion_roughness_metallic_texture: get_texture_info(
                        ctx,
                        ext,
                        "occlusionRoughnessMetallicTexture",
                    )?,
                    roughness_metallic_occlusion_texture: get_texture_info(
                        ctx,
                        ext,
                        "roughnessMetallicOcclusionTexture",
                    )?,
                    normal_texture: get_normal_texture(ctx, ext, "normalTexture")?,
                }));
        }
        // Unknown or disabled material extensions are skipped.
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, Parser};
    use std::path::Path;

    fn parse(json: &str, extensions: Extensions) -> Result<crate::Asset, Error> {
        Parser::new(extensions).parse_json_bytes(json.as_bytes(), Path::new("."), Options::empty())
    }

    #[test]
    fn defaults_match_the_specification() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},"materials":[{}]}"#,
            Extensions::empty(),
        )
        .unwrap();
        let material = &asset.materials[0];
        assert_eq!(material.pbr.base_color_factor, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(material.pbr.metallic_factor, 1.0);
        assert_eq!(material.alpha_mode, AlphaMode::Opaque);
        assert_eq!(material.alpha_cutoff, 0.5);
        assert!(!material.double_sided);
    }

    #[test]
    fn texture_transform_applies_when_enabled() {
        let json = r#"{"asset":{"version":"2.0"},
            "extensionsUsed":["KHR_texture_transform"],
            "materials":[{"pbrMetallicRoughness":{"baseColorTexture":{
              "index":0,
              "extensions":{"KHR_texture_transform":{
                "offset":[0.5,0.5],"rotation":1.5,"scale":[2.0,2.0]}}}}}]}"#;
        let asset = parse(json, Extensions::KHR_TEXTURE_TRANSFORM).unwrap();
        let info = asset.materials[0]
            .pbr
            .base_color_texture
            .as_ref()
            .unwrap();
        let transform = info.transform.as_ref().unwrap();
        assert_eq!(transform.uv_offset, [0.5, 0.5]);
        assert_eq!(transform.rotation, 1.5);
        assert_eq!(transform.uv_scale, [2.0, 2.0]);

        let asset = parse(json, Extensions::empty()).unwrap();
        let info = asset.materials[0]
            .pbr
            .base_color_texture
            .as_ref()
            .unwrap();
        assert!(info.transform.is_none());
    }

    #[test]
    fn clearcoat_and_friends() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "extensionsUsed":["KHR_materials_clearcoat","KHR_materials_ior",
                                  "KHR_materials_unlit","KHR_materials_emissive_strength"],
                "materials":[{"extensions":{
                  "KHR_materials_clearcoat":{"clearcoatFactor":1.0,
                                             "clearcoatRoughnessFactor":0.25},
                  "KHR_materials_ior":{"ior":1.33},
                  "KHR_materials_emissive_strength":{"emissiveStrength":4.0},
                  "KHR_materials_unlit":{}}}]}"#,
            Extensions::KHR_MATERIALS_CLEARCOAT
                | Extensions::KHR_MATERIALS_IOR
                | Extensions::KHR_MATERIALS_UNLIT
                | Extensions::KHR_MATERIALS_EMISSIVE_STRENGTH,
        )
        .unwrap();
        let material = &asset.materials[0];
        let clearcoat = material.clearcoat.as_ref().unwrap();
        assert_eq!(clearcoat.clearcoat_factor, 1.0);
        assert_eq!(clearcoat.clearcoat_roughness_factor, 0.25);
        assert_eq!(material.ior, Some(1.33));
        assert_eq!(material.emissive_strength, Some(4.0));
        assert!(material.unlit);
    }

    #[test]
    fn disabled_extensions_leave_no_substruct() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "materials":[{"extensions":{
                  "KHR_materials_clearcoat":{"clearcoatFactor":1.0}}}]}"#,
            Extensions::empty(),
        )
        .unwrap();
        assert!(asset.materials[0].clearcoat.is_none());
    }
}
