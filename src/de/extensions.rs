//! Root-level `extensions` object parsing.

use serde_json::Value;

use super::{as_array, as_object, get_f32, get_f32_array, get_name, req_str, Ctx};
use crate::crc32::{self, crc32c};
use crate::light::{Kind, Light};
use crate::{Error, Extensions};

const EXT_LIGHTS: u32 = crc32c(b"KHR_lights_punctual");
const EXT_VARIANTS: u32 = crc32c(b"KHR_materials_variants");

pub(super) fn parse_root_extensions(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    for (key, value) in as_object(value)? {
        match crc32::hash_str(key) {
            EXT_LIGHTS if ctx.enabled.contains(Extensions::KHR_LIGHTS_PUNCTUAL) => {
                let object = as_object(value)?;
                let lights = object.get("lights").ok_or(Error::MissingField)?;
                for light in as_array(lights)? {
                    let light = parse_light(as_object(light)?)?;
                    ctx.asset.lights.push(light);
                }
            }
            EXT_VARIANTS if ctx.enabled.contains(Extensions::KHR_MATERIALS_VARIANTS) => {
                let object = as_object(value)?;
                let variants = object.get("variants").ok_or(Error::MissingField)?;
                for variant in as_array(variants)? {
                    let name = req_str(as_object(variant)?, "name")?;
                    ctx.asset.material_variants.push(name.to_string());
                }
            }
            // Unknown root extensions are skipped; required ones were
            // checked against the enabled set up front.
            _ => {}
        }
    }
    Ok(())
}

fn parse_light(object: &serde_json::Map<String, Value>) -> Result<Light, Error> {
    let kind = Kind::from_str(req_str(object, "type")?).ok_or(Error::InvalidGltf)?;

    let mut light = Light {
        kind,
        color: get_f32_array(object, "color")?.unwrap_or([1.0; 3]),
        intensity: get_f32(object, "intensity")?.unwrap_or(1.0),
        range: get_f32(object, "range")?,
        inner_cone_angle: None,
        outer_cone_angle: None,
        name: get_name(object)?,
    };

    if kind == Kind::Spot {
        let spot = super::get_object(object, "spot")?.ok_or(Error::MissingField)?;
        light.inner_cone_angle =
            Some(get_f32(spot, "innerConeAngle")?.unwrap_or(Light::DEFAULT_INNER_CONE_ANGLE));
        light.outer_cone_angle =
            Some(get_f32(spot, "outerConeAngle")?.unwrap_or(Light::DEFAULT_OUTER_CONE_ANGLE));
    }

    Ok(light)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, Parser};
    use std::path::Path;

    #[test]
    fn lights_parse_under_the_extension() {
        let json = br#"{"asset":{"version":"2.0"},
            "extensionsUsed":["KHR_lights_punctual"],
            "extensions":{"KHR_lights_punctual":{"lights":[
              {"type":"directional","intensity":3.0},
              {"type":"spot","spot":{"outerConeAngle":0.9}}]}}}"#;
        let asset = Parser::new(Extensions::KHR_LIGHTS_PUNCTUAL)
            .parse_json_bytes(json, Path::new("."), Options::empty())
            .unwrap();
        assert_eq!(asset.lights.len(), 2);
        assert_eq!(asset.lights[0].kind, Kind::Directional);
        assert_eq!(asset.lights[0].intensity, 3.0);
        assert_eq!(asset.lights[1].inner_cone_angle, Some(0.0));
        assert_eq!(asset.lights[1].outer_cone_angle, Some(0.9));

        // Disabled: the lights array stays empty.
        let asset = Parser::new(Extensions::empty())
            .parse_json_bytes(json, Path::new("."), Options::empty())
            .unwrap();
        assert!(asset.lights.is_empty());
    }

    #[test]
    fn variant_names_are_collected() {
        let asset = Parser::new(Extensions::KHR_MATERIALS_VARIANTS)
            .parse_json_bytes(
                br#"{"asset":{"version":"2.0"},
                     "extensionsUsed":["KHR_materials_variants"],
                     "extensions":{"KHR_materials_variants":{
                        "variants":[{"name":"Wet"},{"name":"Dry"}]}}}"#,
                Path::new("."),
                Options::empty(),
            )
            .unwrap();
        assert_eq!(asset.material_variants, vec!["Wet", "Dry"]);
    }
}
