//! Buffer and buffer-view array parsing, including data-URI payloads and
//! external buffer loading.

use serde_json::{Map, Value};
use std::fs;

use super::{
    as_array, as_object, get_index, get_name, get_object, get_u64, req_index, req_str, req_u64,
    Ctx,
};
use crate::asset::Category;
use crate::base64;
use crate::buffer::{
    Buffer, CompressedView, CompressionFilter, CompressionMode, DataSource, MimeType, Target, View,
};
use crate::crc32::{self, crc32c};
use crate::uri::UriBuf;
use crate::{Error, Extensions, Options};

const EXT_MESHOPT: u32 = crc32c(b"EXT_meshopt_compression");

pub(super) fn parse_buffers(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.buffers.reserve(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let buffer = parse_buffer(ctx, as_object(entry)?, index)?;
        ctx.asset.buffers.push(buffer);
    }
    ctx.asset.available_categories |= Category::BUFFERS;
    Ok(())
}

fn meshopt_fallback(object: &Map<String, Value>) -> Result<bool, Error> {
    if let Some(ext) = get_object(object, "extensions")? {
        for (key, value) in ext {
            if crc32::hash_str(key) == EXT_MESHOPT {
                let ext = as_object(value)?;
                return Ok(super::get_bool(ext, "fallback")?.unwrap_or(false));
            }
        }
    }
    Ok(false)
}

fn parse_buffer(
    ctx: &Ctx<'_>,
    object: &Map<String, Value>,
    index: usize,
) -> Result<Buffer, Error> {
    let byte_length = req_u64(object, "byteLength")? as usize;

    let data = match super::get_str(object, "uri")? {
        Some(text) => {
            let load = ctx.options.contains(Options::LOAD_EXTERNAL_BUFFERS);
            resolve_uri(ctx, text, MimeType::GltfBuffer, byte_length, load)?
        }
        None if index == 0 && ctx.bin.is_some() => {
            // The GLB BIN chunk belongs to the first buffer.
            let bin = ctx.bin.as_ref().ok_or(Error::InvalidGltf)?;
            if ctx.options.contains(Options::LOAD_GLB_BUFFERS) {
                match ctx.buffer_map_callback {
                    Some(map) => DataSource::CustomBuffer {
                        id: map(&bin.data, MimeType::GltfBuffer),
                        mime_type: MimeType::GltfBuffer,
                    },
                    None => DataSource::Bytes {
                        bytes: bin.data.clone(),
                        mime_type: MimeType::GltfBuffer,
                    },
                }
            } else if let Some(path) = ctx.file_path {
                DataSource::Uri {
                    file_byte_offset: bin.file_offset,
                    uri: UriBuf::parse(&path.to_string_lossy()),
                    mime_type: MimeType::GltfBuffer,
                }
            } else {
                // No path to defer to; hand the payload over directly.
                DataSource::Bytes {
                    bytes: bin.data.clone(),
                    mime_type: MimeType::GltfBuffer,
                }
            }
        }
        None if meshopt_fallback(object)? => DataSource::Fallback,
        None => return Err(Error::MissingField),
    };

    Ok(Buffer {
        byte_length,
        data,
        name: get_name(object)?,
    })
}

/// Resolves a buffer or image URI into a data source: base64 payloads are
/// decoded, local paths are read when the matching load option is set, and
/// everything else stays a placeholder for the host to resolve.
pub(super) fn resolve_uri(
    ctx: &Ctx<'_>,
    text: &str,
    default_mime: MimeType,
    expected_length: usize,
    load_local: bool,
) -> Result<DataSource, Error> {
    let uri = UriBuf::parse(text);
    if !uri.valid() {
        return Err(Error::InvalidURI);
    }

    if uri.is_data_uri() {
        let (mime_type, payload) = split_data_uri(uri.path())?;
        let mime_type = if mime_type == MimeType::None {
            default_mime
        } else {
            mime_type
        };
        if payload.len() % 4 != 0 {
            return Err(Error::InvalidURI);
        }
        let mut bytes = vec![0u8; base64::decoded_size(payload)];
        match ctx.base64_callback {
            Some(callback) => callback(payload, &mut bytes, base64::padding_of(payload)),
            None => base64::decode_inplace(payload, &mut bytes),
        }
        if let Some(map) = ctx.buffer_map_callback {
            let id = map(&bytes, mime_type);
            return Ok(DataSource::CustomBuffer { id, mime_type });
        }
        return Ok(DataSource::Bytes { bytes, mime_type });
    }

    if uri.is_local_path() && load_local {
        let path = ctx.base_dir.join(uri.path());
        let bytes = fs::read(path).map_err(|_| Error::MissingExternalBuffer)?;
        if bytes.len() < expected_length {
            return Err(Error::MissingExternalBuffer);
        }
        return Ok(DataSource::Bytes {
            bytes,
            mime_type: default_mime,
        });
    }

    Ok(DataSource::Uri {
        file_byte_offset: 0,
        uri,
        mime_type: default_mime,
    })
}

/// Splits `<mime>;base64,<payload>` after the `data:` scheme.
fn split_data_uri(path: &str) -> Result<(MimeType, &str), Error> {
    let comma = path.find(',').ok_or(Error::InvalidURI)?;
    let (header, payload) = path.split_at(comma);
    let payload = &payload[1..];
    if !header.ends_with(";base64") {
        return Err(Error::InvalidURI);
    }
    let mime = header.trim_end_matches(";base64");
    Ok((MimeType::from_str(mime), payload))
}

pub(super) fn parse_buffer_views(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.buffer_views.reserve(entries.len());
    for entry in entries {
        let view = parse_buffer_view(ctx, as_object(entry)?)?;
        ctx.asset.buffer_views.push(view);
    }
    ctx.asset.available_categories |= Category::BUFFER_VIEWS;
    Ok(())
}

fn parse_buffer_view(ctx: &Ctx<'_>, object: &Map<String, Value>) -> Result<View, Error> {
    let byte_stride = match get_u64(object, "byteStride")? {
        Some(stride) => {
            let stride = stride as usize;
            if !(4..=252).contains(&stride) || stride % 4 != 0 {
                return Err(Error::InvalidGltf);
            }
            Some(stride)
        }
        None => None,
    };

    let target = match get_u64(object, "target")? {
        Some(value) => Some(Target::from_gl_enum(value).ok_or(Error::InvalidGltf)?),
        None => None,
    };

    let mut meshopt_compression = None;
    if let Some(ext) = get_object(object, "extensions")? {
        for (key, value) in ext {
            if crc32::hash_str(key) == EXT_MESHOPT
                && ctx.enabled.contains(Extensions::EXT_MESHOPT_COMPRESSION)
            {
                meshopt_compression = Some(parse_meshopt(as_object(value)?)?);
            }
        }
    }

    Ok(View {
        buffer: req_index(object, "buffer")?,
        byte_offset: get_index(object, "byteOffset")?.unwrap_or(0),
        byte_length: req_u64(object, "byteLength")? as usize,
        byte_stride,
        target,
        meshopt_compression,
        name: get_name(object)?,
    })
}

fn parse_meshopt(object: &Map<String, Value>) -> Result<CompressedView, Error> {
    let mode = CompressionMode::from_str(req_str(object, "mode")?).ok_or(Error::InvalidGltf)?;
    let filter = match super::get_str(object, "filter")? {
        Some(text) => CompressionFilter::from_str(text).ok_or(Error::InvalidGltf)?,
        None => CompressionFilter::None,
    };
    Ok(CompressedView {
        buffer: req_index(object, "buffer")?,
        byte_offset: get_index(object, "byteOffset")?.unwrap_or(0),
        byte_length: req_u64(object, "byteLength")? as usize,
        count: req_u64(object, "count")? as usize,
        mode,
        filter,
        byte_stride: req_u64(object, "byteStride")? as usize,
    })
}
