//! Asset → JSON / GLB encoding.

use std::fs;
use std::path::{Path, PathBuf};

use crate::asset::Asset;
use crate::binary::{BinChunk, Glb, Header};
use crate::buffer::{DataSource, MimeType};
use crate::{validate, Error, ExportOptions};

mod json;

pub(crate) use json::write_json;

/// The result of encoding an asset.
///
/// `buffer_paths[i]` / `image_paths[i]` name the relative file a resource
/// will be written to, for resources whose bytes the asset owns but the
/// encoding does not embed. Resources that are embedded, live in buffer
/// views, or already point at external URIs have no path. The caller (or
/// [`write_files`]) writes the named files next to the document.
#[derive(Clone, Debug)]
pub struct Exported {
    /// The encoded document.
    pub bytes: Vec<u8>,
    pub buffer_paths: Vec<Option<PathBuf>>,
    pub image_paths: Vec<Option<PathBuf>>,
}

fn image_extension(mime_type: MimeType) -> &'static str {
    match mime_type {
        MimeType::Png => "png",
        MimeType::Jpeg => "jpg",
        MimeType::Ktx2 => "ktx2",
        MimeType::Dds => "dds",
        MimeType::Webp => "webp",
        _ => "bin",
    }
}

/// Assigns external file names for owned resources. `embedded_buffer` is
/// the buffer the GLB encoding inlines, if any.
fn assign_resource_paths(
    asset: &Asset,
    embedded_buffer: Option<usize>,
) -> (Vec<Option<PathBuf>>, Vec<Option<PathBuf>>) {
    let buffer_paths = asset
        .buffers
        .iter()
        .enumerate()
        .map(|(index, buffer)| match &buffer.data {
            DataSource::Bytes { .. } if Some(index) != embedded_buffer => {
                Some(PathBuf::from(format!("buffer{index}.bin")))
            }
            _ => None,
        })
        .collect();
    let image_paths = asset
        .images
        .iter()
        .enumerate()
        .map(|(index, image)| match &image.data {
            DataSource::Bytes { mime_type, .. } => Some(PathBuf::from(format!(
                "image{index}.{}",
                image_extension(*mime_type)
            ))),
            _ => None,
        })
        .collect();
    (buffer_paths, image_paths)
}

fn path_strings(paths: &[Option<PathBuf>]) -> Vec<Option<String>> {
    paths
        .iter()
        .map(|path| {
            path.as_ref()
                .map(|path| path.to_string_lossy().into_owned())
        })
        .collect()
}

/// Rejects data sources the encoders cannot represent. Host-mapped
/// (`CustomBuffer`) payloads live outside the asset and empty sources have
/// nothing to reference, so writing them would produce a buffer without a
/// `uri` or an image without either `uri` or `bufferView`.
fn check_exportable(asset: &Asset) -> Result<(), Error> {
    for buffer in &asset.buffers {
        match &buffer.data {
            DataSource::Uri { .. } | DataSource::Bytes { .. } | DataSource::Fallback => {}
            DataSource::BufferView { .. }
            | DataSource::CustomBuffer { .. }
            | DataSource::None => return Err(Error::InvalidGltf),
        }
    }
    for image in &asset.images {
        match &image.data {
            DataSource::Uri { .. } | DataSource::Bytes { .. } | DataSource::BufferView { .. } => {}
            DataSource::CustomBuffer { .. } | DataSource::Fallback | DataSource::None => {
                return Err(Error::InvalidGltf)
            }
        }
    }
    Ok(())
}

fn compose(asset: &Asset, options: ExportOptions, embedded_buffer: Option<usize>) -> Result<(String, Vec<Option<PathBuf>>, Vec<Option<PathBuf>>), Error> {
    check_exportable(asset)?;
    if options.contains(ExportOptions::VALIDATE_ASSET) {
        validate(asset)?;
    }
    let (buffer_paths, image_paths) = assign_resource_paths(asset, embedded_buffer);
    let mut text = write_json(
        asset,
        &path_strings(&buffer_paths),
        &path_strings(&image_paths),
    )?;
    if options.contains(ExportOptions::PRETTY_PRINT_JSON) {
        text = json::pretty_print(&text);
    }
    Ok((text, buffer_paths, image_paths))
}

/// Encodes an asset as glTF JSON text.
pub fn export_json(asset: &Asset, options: ExportOptions) -> Result<Exported, Error> {
    let (text, buffer_paths, image_paths) = compose(asset, options, None)?;
    Ok(Exported {
        bytes: text.into_bytes(),
        buffer_paths,
        image_paths,
    })
}

/// Picks the buffer a GLB encoding embeds: the first buffer, when the asset
/// owns its bytes and the length fits the chunk header.
fn embeddable_buffer(asset: &Asset) -> Option<usize> {
    let buffer = asset.buffers.first()?;
    match &buffer.data {
        DataSource::Bytes { .. } if u32::try_from(buffer.byte_length).is_ok() => Some(0),
        _ => None,
    }
}

/// Encodes an asset as a GLB container, embedding the first buffer as the
/// BIN chunk when possible.
pub fn export_glb(asset: &Asset, options: ExportOptions) -> Result<Exported, Error> {
    let embedded = embeddable_buffer(asset);
    let (text, buffer_paths, image_paths) = compose(asset, options, embedded)?;

    let json = text.into_bytes();
    let bin = embedded.and_then(|index| asset.buffers[index].bytes());

    let mut length = Header::SIZE + 8 + ((json.len() + 3) & !3);
    if let Some(bin) = bin {
        length += 8 + ((bin.len() + 3) & !3);
    }
    let header = Header {
        magic: crate::binary::MAGIC,
        version: 2,
        length: u32::try_from(length).map_err(|_| Error::InvalidGLB)?,
    };

    let glb = Glb {
        header,
        json: &json,
        bin: bin.map(|data| BinChunk {
            file_offset: 0,
            data,
        }),
    };
    Ok(Exported {
        bytes: glb.to_vec()?,
        buffer_paths,
        image_paths,
    })
}

/// Writes the document plus any externally-referenced resource files under
/// `dir`. The document lands at `dir/file_name`.
pub fn write_files(
    asset: &Asset,
    exported: &Exported,
    dir: &Path,
    file_name: &str,
) -> Result<(), Error> {
    let write = |path: &Path, bytes: &[u8]| {
        fs::write(path, bytes).map_err(|_| Error::FailedWritingFiles)
    };

    write(&dir.join(file_name), &exported.bytes)?;
    for (buffer, path) in asset.buffers.iter().zip(&exported.buffer_paths) {
        if let (Some(bytes), Some(path)) = (buffer.bytes(), path) {
            write(&dir.join(path), bytes)?;
        }
    }
    for (image, path) in asset.images.iter().zip(&exported.image_paths) {
        if let (DataSource::Bytes { bytes, .. }, Some(path)) = (&image.data, path) {
            write(&dir.join(path), bytes)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Extensions, Options, Parser};

    #[test]
    fn json_export_assigns_paths_for_owned_buffers() {
        let mut parser = Parser::new(Extensions::empty());
        let asset = parser
            .parse_json_bytes(
                br#"{"asset":{"version":"2.0"},
                     "buffers":[{"byteLength":4,
                       "uri":"data:application/octet-stream;base64,AAAAAA=="}]}"#,
                Path::new("."),
                Options::empty(),
            )
            .unwrap();
        let exported = export_json(&asset, ExportOptions::empty()).unwrap();
        assert_eq!(
            exported.buffer_paths,
            vec![Some(PathBuf::from("buffer0.bin"))]
        );
        let text = String::from_utf8(exported.bytes).unwrap();
        assert!(text.contains("\"uri\":\"buffer0.bin\""));
    }

    #[test]
    fn glb_export_embeds_the_first_buffer() {
        let mut parser = Parser::new(Extensions::empty());
        let asset = parser
            .parse_json_bytes(
                br#"{"asset":{"version":"2.0"},
                     "buffers":[{"byteLength":4,
                       "uri":"data:application/octet-stream;base64,AQIDBA=="}]}"#,
                Path::new("."),
                Options::empty(),
            )
            .unwrap();
        let exported = export_glb(&asset, ExportOptions::empty()).unwrap();
        assert_eq!(exported.buffer_paths, vec![None]);

        let glb = Glb::from_slice(&exported.bytes).unwrap();
        assert_eq!(glb.bin.unwrap().data, &[1, 2, 3, 4]);
        assert_eq!(glb.header.length as usize, exported.bytes.len());
    }

    #[test]
    fn host_mapped_buffers_cannot_be_exported() {
        let mut parser = Parser::new(Extensions::empty());
        parser.set_buffer_map_callback(Box::new(|_, _| 7));
        let asset = parser
            .parse_json_bytes(
                br#"{"asset":{"version":"2.0"},
                     "buffers":[{"byteLength":4,
                       "uri":"data:application/octet-stream;base64,AAAAAA=="}]}"#,
                Path::new("."),
                Options::empty(),
            )
            .unwrap();
        assert!(matches!(
            asset.buffers[0].data,
            DataSource::CustomBuffer { id: 7, .. }
        ));
        assert_eq!(
            export_json(&asset, ExportOptions::empty()).unwrap_err(),
            Error::InvalidGltf
        );
        assert_eq!(
            export_glb(&asset, ExportOptions::empty()).unwrap_err(),
            Error::InvalidGltf
        );
    }

    #[test]
    fn sourceless_images_cannot_be_exported() {
        let mut asset = Asset::default();
        asset.images.push(crate::image::Image {
            data: DataSource::CustomBuffer {
                id: 0,
                mime_type: MimeType::Png,
            },
            name: None,
        });
        assert_eq!(
            export_json(&asset, ExportOptions::empty()).unwrap_err(),
            Error::InvalidGltf
        );

        asset.images[0].data = DataSource::None;
        assert_eq!(
            export_json(&asset, ExportOptions::empty()).unwrap_err(),
            Error::InvalidGltf
        );
    }

    #[test]
    fn validation_option_rejects_bad_assets() {
        let mut asset = Asset::default();
        asset.default_scene = Some(3);
        assert_eq!(
            export_json(&asset, ExportOptions::VALIDATE_ASSET).unwrap_err(),
            Error::InvalidGltf
        );
        export_json(&asset, ExportOptions::empty()).unwrap();
    }
}
