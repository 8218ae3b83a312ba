//! Image, sampler and texture array parsing.

use serde_json::{Map, Value};

use super::{as_array, as_object, get_index, get_name, get_object, get_u64, req_index, Ctx};
use crate::asset::Category;
use crate::buffer::{DataSource, MimeType};
use crate::crc32::{self, crc32c};
use crate::image::Image;
use crate::texture::{MagFilter, MinFilter, Sampler, Texture, WrappingMode};
use crate::{Error, Extensions, Options};

const EXT_BASISU: u32 = crc32c(b"KHR_texture_basisu");
const EXT_DDS: u32 = crc32c(b"MSFT_texture_dds");
const EXT_WEBP: u32 = crc32c(b"EXT_texture_webp");

pub(super) fn parse_images(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.images.reserve(entries.len());
    for entry in entries {
        let image = parse_image(ctx, as_object(entry)?)?;
        ctx.asset.images.push(image);
    }
    ctx.asset.available_categories |= Category::IMAGES;
    Ok(())
}

fn parse_image(ctx: &Ctx<'_>, object: &Map<String, Value>) -> Result<Image, Error> {
    let mime_type = super::get_str(object, "mimeType")?
        .map(MimeType::from_str)
        .unwrap_or(MimeType::None);

    let data = match (super::get_str(object, "uri")?, get_index(object, "bufferView")?) {
        (Some(_), Some(_)) | (None, None) => return Err(Error::InvalidGltf),
        (Some(text), None) => {
            let load = ctx.options.contains(Options::LOAD_EXTERNAL_IMAGES);
            super::buffer::resolve_uri(ctx, text, mime_type, 0, load)?
        }
        (None, Some(buffer_view)) => DataSource::BufferView {
            buffer_view,
            mime_type,
        },
    };

    Ok(Image {
        data,
        name: get_name(object)?,
    })
}

pub(super) fn parse_samplers(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.samplers.reserve(entries.len());
    for entry in entries {
        let object = as_object(entry)?;
        let mag_filter = match get_u64(object, "magFilter")? {
            Some(value) => Some(MagFilter::from_gl_enum(value).ok_or(Error::InvalidGltf)?),
            None => None,
        };
        let min_filter = match get_u64(object, "minFilter")? {
            Some(value) => Some(MinFilter::from_gl_enum(value).ok_or(Error::InvalidGltf)?),
            None => None,
        };
        let wrap_s = match get_u64(object, "wrapS")? {
            Some(value) => WrappingMode::from_gl_enum(value).ok_or(Error::InvalidGltf)?,
            None => WrappingMode::Repeat,
        };
        let wrap_t = match get_u64(object, "wrapT")? {
            Some(value) => WrappingMode::from_gl_enum(value).ok_or(Error::InvalidGltf)?,
            None => WrappingMode::Repeat,
        };
        ctx.asset.samplers.push(Sampler {
            mag_filter,
            min_filter,
            wrap_s,
            wrap_t,
            name: get_name(object)?,
        });
    }
    ctx.asset.available_categories |= Category::SAMPLERS;
    Ok(())
}

pub(super) fn parse_textures(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.textures.reserve(entries.len());
    for entry in entries {
        let texture = parse_texture(ctx, as_object(entry)?)?;
        ctx.asset.textures.push(texture);
    }
    ctx.asset.available_categories |= Category::TEXTURES;
    Ok(())
}

fn extension_image_index(value: &Value) -> Result<usize, Error> {
    req_index(as_object(value)?, "source")
}

fn parse_texture(ctx: &Ctx<'_>, object: &Map<String, Value>) -> Result<Texture, Error> {
    let mut texture = Texture {
        sampler: get_index(object, "sampler")?,
        image: get_index(object, "source")?,
        basisu_image: None,
        dds_image: None,
        webp_image: None,
        name: get_name(object)?,
    };

    if let Some(ext) = get_object(object, "extensions")? {
        for (key, value) in ext {
            match crc32::hash_str(key) {
                EXT_BASISU if ctx.enabled.contains(Extensions::KHR_TEXTURE_BASISU) => {
                    texture.basisu_image = Some(extension_image_index(value)?);
                }
                EXT_DDS if ctx.enabled.contains(Extensions::MSFT_TEXTURE_DDS) => {
                    texture.dds_image = Some(extension_image_index(value)?);
                }
                EXT_WEBP if ctx.enabled.contains(Extensions::EXT_TEXTURE_WEBP) => {
                    texture.webp_image = Some(extension_image_index(value)?);
                }
                _ => {}
            }
        }
    }

    // At least one image reference must survive extension filtering.
    if texture.image.is_none()
        && texture.basisu_image.is_none()
        && texture.dds_image.is_none()
        && texture.webp_image.is_none()
    {
        return Err(Error::InvalidGltf);
    }

    Ok(texture)
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
    fn image_requires_exactly_one_source() {
        assert_eq!(
            parse(
                r#"{"asset":{"version":"2.0"},"images":[{}]}"#,
                Extensions::empty()
            )
            .unwrap_err(),
            Error::InvalidGltf
        );
        assert_eq!(
            parse(
                r#"{"asset":{"version":"2.0"},
                    "images":[{"uri":"a.png","bufferView":0}]}"#,
                Extensions::empty()
            )
            .unwrap_err(),
            Error::InvalidGltf
        );
    }

    #[test]
    fn image_buffer_view_records_mime() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},
                "images":[{"bufferView":3,"mimeType":"image/png"}]}"#,
            Extensions::empty(),
        )
        .unwrap();
        assert_eq!(
            asset.images[0].data,
            DataSource::BufferView {
                buffer_view: 3,
                mime_type: MimeType::Png,
            }
        );
    }

    #[test]
    fn sampler_defaults_to_repeat() {
        let asset = parse(
            r#"{"asset":{"version":"2.0"},"samplers":[{"magFilter":9729}]}"#,
            Extensions::empty(),
        )
        .unwrap();
        let sampler = &asset.samplers[0];
        assert_eq!(sampler.mag_filter, Some(MagFilter::Linear));
        assert_eq!(sampler.wrap_s, WrappingMode::Repeat);
        assert_eq!(sampler.wrap_t, WrappingMode::Repeat);
    }

    #[test]
    fn texture_without_any_image_is_rejected() {
        let err = parse(
            r#"{"asset":{"version":"2.0"},"textures":[{"sampler":0}]}"#,
            Extensions::empty(),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidGltf);
    }

    #[test]
    fn webp_source_counts_when_enabled() {
        let json = r#"{"asset":{"version":"2.0"},
            "extensionsUsed":["EXT_texture_webp"],
            "textures":[{"extensions":{"EXT_texture_webp":{"source":2}}}]}"#;
        let asset = parse(json, Extensions::EXT_TEXTURE_WEBP).unwrap();
        assert_eq!(asset.textures[0].webp_image, Some(2));
        // With the extension disabled the texture has no image left.
        assert_eq!(parse(json, Extensions::empty()).unwrap_err(), Error::InvalidGltf);
    }
}
