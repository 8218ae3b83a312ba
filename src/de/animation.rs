//! Animation array parsing.

use serde_json::Value;

use super::{as_array, as_object, get_index, get_name, req_index, req_str, Ctx};
use crate::animation::{Animation, Channel, Interpolation, Path, Sampler};
use crate::asset::Category;
use crate::Error;

pub(super) fn parse_animations(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.animations.reserve(entries.len());
    for entry in entries {
        let object = as_object(entry)?;

        let mut channels = Vec::new();
        for channel in as_array(object.get("channels").ok_or(Error::MissingField)?)? {
            let channel = as_object(channel)?;
            let target = super::get_object(channel, "target")?.ok_or(Error::MissingField)?;
            channels.push(Channel {
                sampler: req_index(channel, "sampler")?,
                node: get_index(target, "node")?,
                path: Path::from_str(req_str(target, "path")?).ok_or(Error::InvalidGltf)?,
            });
        }

        let mut samplers = Vec::new();
        for sampler in as_array(object.get("samplers").ok_or(Error::MissingField)?)? {
            let sampler = as_object(sampler)?;
            let interpolation = match super::get_str(sampler, "interpolation")? {
                Some(text) => Interpolation::from_str(text).ok_or(Error::InvalidGltf)?,
                None => Interpolation::Linear,
            };
            samplers.push(Sampler {
                input: req_index(sampler, "input")?,
                output: req_index(sampler, "output")?,
                interpolation,
            });
        }

        ctx.asset.animations.push(Animation {
            channels,
            samplers,
            name: get_name(object)?,
        });
    }
    ctx.asset.available_categories |= Category::ANIMATIONS;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Extensions, Options, Parser};

    #[test]
    fn parses_channels_and_samplers() {
        let asset = Parser::new(Extensions::empty())
            .parse_json_bytes(
                br#"{"asset":{"version":"2.0"},
                     "animations":[{"name":"Wave",
                       "channels":[{"sampler":0,"target":{"node":2,"path":"rotation"}}],
                       "samplers":[{"input":0,"output":1,"interpolation":"CUBICSPLINE"}]}]}"#,
                std::path::Path::new("."),
                Options::empty(),
            )
            .unwrap();
        let animation = &asset.animations[0];
        assert_eq!(animation.name.as_deref(), Some("Wave"));
        assert_eq!(animation.channels[0].path, Path::Rotation);
        assert_eq!(animation.channels[0].node, Some(2));
        assert_eq!(
            animation.samplers[0].interpolation,
            Interpolation::CubicSpline
        );
    }

    #[test]
    fn bad_path_is_rejected() {
        let err = Parser::new(Extensions::empty())
            .parse_json_bytes(
                br#"{"asset":{"version":"2.0"},
                     "animations":[{"channels":[{"sampler":0,
                        "target":{"node":0,"path":"translationx"}}],
                       "samplers":[{"input":0,"output":1}]}]}"#,
                std::path::Path::new("."),
                Options::empty(),
            )
            .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }
}
