//! The JSON → asset decoder.
//!
//! The decoder walks a parsed JSON DOM and populates an [`Asset`]. Keys are
//! dispatched on their CRC-32C: every `match` arm compares against a hash
//! computed at compile time by the `const fn` kernel in [`crate::crc32`].
//!
//! Sub-parsers live in one submodule per section family; each iterates its
//! array, validates per-entity field ranges, and appends to the asset.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::asset::{Asset, AssetInfo, Category};
use crate::base64::DecodeCallback;
use crate::buffer::MimeType;
use crate::binary::{determine_type, Glb, GltfType};
use crate::crc32::{self, crc32c};
use crate::source::{ByteSource, VecSource};
use crate::{Error, Extensions, Options};

mod accessor;
mod animation;
mod buffer;
mod extensions;
mod material;
mod mesh;
mod scene;
mod texture;

/// Padding requested from byte sources so SIMD consumers may over-read.
pub(crate) const SOURCE_PAD: usize = 64;

const KEY_ACCESSORS: u32 = crc32c(b"accessors");
const KEY_ANIMATIONS: u32 = crc32c(b"animations");
const KEY_ASSET: u32 = crc32c(b"asset");
const KEY_BUFFERS: u32 = crc32c(b"buffers");
const KEY_BUFFER_VIEWS: u32 = crc32c(b"bufferViews");
const KEY_CAMERAS: u32 = crc32c(b"cameras");
const KEY_EXTENSIONS: u32 = crc32c(b"extensions");
const KEY_EXTENSIONS_USED: u32 = crc32c(b"extensionsUsed");
const KEY_EXTENSIONS_REQUIRED: u32 = crc32c(b"extensionsRequired");
const KEY_EXTRAS: u32 = crc32c(b"extras");
const KEY_IMAGES: u32 = crc32c(b"images");
const KEY_MATERIALS: u32 = crc32c(b"materials");
const KEY_MESHES: u32 = crc32c(b"meshes");
const KEY_NODES: u32 = crc32c(b"nodes");
const KEY_SAMPLERS: u32 = crc32c(b"samplers");
const KEY_SCENE: u32 = crc32c(b"scene");
const KEY_SCENES: u32 = crc32c(b"scenes");
const KEY_SKINS: u32 = crc32c(b"skins");
const KEY_TEXTURES: u32 = crc32c(b"textures");

/// Host hook mapping decoded payload bytes into host-managed memory (e.g.
/// a pinned or GPU-visible region). The host copies the bytes and returns
/// the id the [`DataSource::CustomBuffer`](crate::buffer::DataSource)
/// variant will carry.
pub type BufferMapCallback = dyn Fn(&[u8], MimeType) -> u64 + Send + Sync;

/// The BIN chunk of the container being parsed.
pub(crate) struct BinPayload {
    pub file_offset: u64,
    pub data: Vec<u8>,
}

/// Mutable parsing state threaded through the sub-parsers.
pub(crate) struct Ctx<'a> {
    pub asset: Asset,
    /// Extensions the host opted into.
    pub enabled: Extensions,
    pub options: Options,
    /// Directory external resources resolve against.
    pub base_dir: &'a Path,
    /// Path of the containing GLB file, when parsing one.
    pub file_path: Option<&'a Path>,
    pub bin: Option<BinPayload>,
    pub base64_callback: Option<&'a DecodeCallback>,
    pub buffer_map_callback: Option<&'a BufferMapCallback>,
}

/// Parses glTF JSON or GLB bytes into [`Asset`] graphs.
///
/// A parser carries the set of extensions the host understands plus optional
/// host callbacks, and may be reused across documents.
pub struct Parser {
    enabled: Extensions,
    wanted: Category,
    base64_callback: Option<Box<DecodeCallback>>,
    buffer_map_callback: Option<Box<BufferMapCallback>>,
}

impl Parser {
    /// Constructs a parser that understands the given extensions.
    pub fn new(enabled: Extensions) -> Self {
        Self {
            enabled,
            wanted: Category::ALL,
            base64_callback: None,
            buffer_map_callback: None,
        }
    }

    /// Restricts parsing to the given categories (and their dependencies).
    /// Sections outside the set are skipped entirely.
    pub fn set_categories(&mut self, wanted: Category) {
        self.wanted = wanted;
    }

    /// Overrides the base64 decoder, e.g. to decode large payloads on a
    /// thread pool. The callback must fill the whole output buffer before
    /// returning.
    pub fn set_base64_callback(&mut self, callback: Box<DecodeCallback>) {
        self.base64_callback = Some(callback);
    }

    /// Routes decoded buffer and image payloads into host-managed memory;
    /// see [`BufferMapCallback`].
    pub fn set_buffer_map_callback(&mut self, callback: Box<BufferMapCallback>) {
        self.buffer_map_callback = Some(callback);
    }

    /// Parses either JSON text or a GLB container, sniffing the type from
    /// the first bytes. `path` is the asset's own location (or a directory)
    /// used to resolve external resources.
    pub fn parse_bytes(&mut self, bytes: &[u8], path: &Path, options: Options) -> Result<Asset, Error> {
        match determine_type(bytes) {
            GltfType::Gltf => self.parse_json_bytes(bytes, &dir_of(path), options),
            GltfType::Glb => self.parse_glb(bytes, path, options),
            GltfType::Invalid => Err(Error::InvalidJson),
        }
    }

    /// Reads a `.gltf` or `.glb` file and parses it.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P, options: Options) -> Result<Asset, Error> {
        let path = path.as_ref();
        let mut source = VecSource::from_file(path, SOURCE_PAD)?;
        self.parse_source(&mut source, path, options)
    }

    /// Drains a byte source and parses its content.
    pub fn parse_source(
        &mut self,
        source: &mut dyn ByteSource,
        path: &Path,
        options: Options,
    ) -> Result<Asset, Error> {
        let bytes = source.read_view(source.remaining(), SOURCE_PAD)?;
        // Borrowed for the whole parse; the clone keeps the borrow checker
        // out of the GLB split below.
        let bytes = bytes.to_vec();
        self.parse_bytes(&bytes, path, options)
    }

    /// Parses glTF JSON text. External resources resolve against `base_dir`.
    pub fn parse_json_bytes(
        &mut self,
        bytes: &[u8],
        base_dir: &Path,
        options: Options,
    ) -> Result<Asset, Error> {
        let dom = parse_document(bytes, options)?;
        self.parse_dom(&dom, base_dir, None, None, options)
    }

    /// Parses a GLB container. `path` is the container's own location; the
    /// BIN chunk attaches to the first buffer per the framing rules.
    pub fn parse_glb(&mut self, bytes: &[u8], path: &Path, options: Options) -> Result<Asset, Error> {
        let glb = Glb::from_slice(bytes)?;
        let bin = glb.bin.map(|chunk| BinPayload {
            file_offset: chunk.file_offset,
            data: chunk.data.to_vec(),
        });
        let dom = parse_document(glb.json, options)?;
        let base_dir = dir_of(path);
        self.parse_dom(&dom, &base_dir, Some(path), bin, options)
    }

    fn parse_dom(
        &mut self,
        dom: &Value,
        base_dir: &Path,
        file_path: Option<&Path>,
        bin: Option<BinPayload>,
        options: Options,
    ) -> Result<Asset, Error> {
        let root = dom.as_object().ok_or(Error::InvalidJson)?;
        let mut ctx = Ctx {
            asset: Asset::default(),
            enabled: self.enabled,
            options,
            base_dir,
            file_path,
            bin,
            base64_callback: self.base64_callback.as_deref(),
            buffer_map_callback: self.buffer_map_callback.as_deref(),
        };

        // The extension sets gate everything else, so handle them before
        // walking the remaining keys.
        if let Some(value) = root.get("extensionsUsed") {
            parse_string_set(value, &mut ctx.asset.extensions_used)?;
        }
        if let Some(value) = root.get("extensionsRequired") {
            parse_string_set(value, &mut ctx.asset.extensions_required)?;
            for name in &ctx.asset.extensions_required {
                let flag = Extensions::from_extension_name(name).ok_or(Error::UnknownRequiredExtension)?;
                if !ctx.enabled.contains(flag) {
                    return Err(Error::MissingExtensions);
                }
            }
        }

        let wanted = |category: Category| self.wanted.contains(category);
        for (key, value) in root {
            match crc32::hash_str(key) {
                KEY_ACCESSORS if wanted(Category::ACCESSORS) => {
                    accessor::parse_accessors(&mut ctx, value)?
                }
                KEY_ANIMATIONS if wanted(Category::ANIMATIONS) => {
                    animation::parse_animations(&mut ctx, value)?
                }
                KEY_ASSET if wanted(Category::ASSET) => parse_asset_info(&mut ctx, value)?,
                KEY_BUFFERS if wanted(Category::BUFFERS) => {
                    buffer::parse_buffers(&mut ctx, value)?
                }
                KEY_BUFFER_VIEWS if wanted(Category::BUFFER_VIEWS) => {
                    buffer::parse_buffer_views(&mut ctx, value)?
                }
                KEY_CAMERAS if wanted(Category::CAMERAS) => scene::parse_cameras(&mut ctx, value)?,
                KEY_EXTENSIONS => extensions::parse_root_extensions(&mut ctx, value)?,
                KEY_IMAGES if wanted(Category::IMAGES) => texture::parse_images(&mut ctx, value)?,
                KEY_MATERIALS if wanted(Category::MATERIALS) => {
                    material::parse_materials(&mut ctx, value)?
                }
                KEY_MESHES if wanted(Category::MESHES) => mesh::parse_meshes(&mut ctx, value)?,
                KEY_NODES if wanted(Category::NODES) => scene::parse_nodes(&mut ctx, value)?,
                KEY_SAMPLERS if wanted(Category::SAMPLERS) => {
                    texture::parse_samplers(&mut ctx, value)?
                }
                KEY_SCENE => {
                    ctx.asset.default_scene =
                        Some(value.as_u64().ok_or(Error::InvalidGltf)? as usize);
                }
                KEY_SCENES if wanted(Category::SCENES) => scene::parse_scenes(&mut ctx, value)?,
                KEY_SKINS if wanted(Category::SKINS) => scene::parse_skins(&mut ctx, value)?,
                KEY_TEXTURES if wanted(Category::TEXTURES) => {
                    texture::parse_textures(&mut ctx, value)?
                }
                KEY_EXTENSIONS_USED | KEY_EXTENSIONS_REQUIRED | KEY_EXTRAS => {}
                // Unknown root keys, and sections outside the wanted
                // categories, are ignored.
                _ => {}
            }
        }

        if ctx.asset.info.is_none()
            && self.wanted.contains(Category::ASSET)
            && !options.contains(Options::DONT_REQUIRE_VALID_ASSET_MEMBER)
        {
            return Err(Error::InvalidOrMissingAssetField);
        }

        if options.contains(Options::GENERATE_MESH_INDICES) {
            mesh::generate_mesh_indices(&mut ctx.asset);
        }

        Ok(ctx.asset)
    }
}

fn dir_of(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    }
}

fn parse_document(bytes: &[u8], options: Options) -> Result<Value, Error> {
    if options.contains(Options::MINIMISE_JSON_BEFORE_PARSING) {
        // Minified into a private buffer; the caller's bytes stay intact.
        let minified = minimise_json(bytes);
        serde_json::from_slice(&minified).map_err(|_| Error::InvalidJson)
    } else {
        serde_json::from_slice(bytes).map_err(|_| Error::InvalidJson)
    }
}

/// Strips insignificant whitespace, skipping string literals.
fn minimise_json(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_string = false;
    let mut escaped = false;
    for &byte in bytes {
        if in_string {
            out.push(byte);
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
        } else {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => {}
                b'"' => {
                    in_string = true;
                    out.push(byte);
                }
                _ => out.push(byte),
            }
        }
    }
    out
}

fn parse_asset_info(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let lenient = ctx
        .options
        .contains(Options::DONT_REQUIRE_VALID_ASSET_MEMBER);
    let object = match value.as_object() {
        Some(object) => object,
        None if lenient => return Ok(()),
        None => return Err(Error::InvalidOrMissingAssetField),
    };
    let version = match get_str(object, "version")? {
        Some(version) => version.to_string(),
        None if lenient => return Ok(()),
        None => return Err(Error::InvalidOrMissingAssetField),
    };
    if !version.starts_with("2.") {
        return Err(Error::UnsupportedVersion);
    }
    ctx.asset.info = Some(AssetInfo {
        version,
        min_version: get_str(object, "minVersion")?.map(str::to_string),
        generator: get_str(object, "generator")?.map(str::to_string),
        copyright: get_str(object, "copyright")?.map(str::to_string),
    });
    ctx.asset.available_categories |= Category::ASSET;
    Ok(())
}

/// Parses an array of strings into `out`, deduplicating.
fn parse_string_set(value: &Value, out: &mut Vec<String>) -> Result<(), Error> {
    for entry in value.as_array().ok_or(Error::InvalidGltf)? {
        let name = entry.as_str().ok_or(Error::InvalidGltf)?;
        if !out.iter().any(|existing| existing == name) {
            out.push(name.to_string());
        }
    }
    Ok(())
}

// Typed field accessors over the DOM. Absent fields are `Ok(None)`; fields
// of the wrong type are `Err(InvalidGltf)`.

pub(crate) fn get_u64(object: &Map<String, Value>, key: &str) -> Result<Option<u64>, Error> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or(Error::InvalidGltf),
    }
}

pub(crate) fn get_index(object: &Map<String, Value>, key: &str) -> Result<Option<usize>, Error> {
    Ok(get_u64(object, key)?.map(|v| v as usize))
}

pub(crate) fn get_f64(object: &Map<String, Value>, key: &str) -> Result<Option<f64>, Error> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or(Error::InvalidGltf),
    }
}

pub(crate) fn get_f32(object: &Map<String, Value>, key: &str) -> Result<Option<f32>, Error> {
    Ok(get_f64(object, key)?.map(|v| v as f32))
}

pub(crate) fn get_bool(object: &Map<String, Value>, key: &str) -> Result<Option<bool>, Error> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value.as_bool().map(Some).ok_or(Error::InvalidGltf),
    }
}

pub(crate) fn get_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, Error> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value.as_str().map(Some).ok_or(Error::InvalidGltf),
    }
}

pub(crate) fn req_u64(object: &Map<String, Value>, key: &str) -> Result<u64, Error> {
    get_u64(object, key)?.ok_or(Error::MissingField)
}

pub(crate) fn req_index(object: &Map<String, Value>, key: &str) -> Result<usize, Error> {
    Ok(req_u64(object, key)? as usize)
}

pub(crate) fn req_f32(object: &Map<String, Value>, key: &str) -> Result<f32, Error> {
    get_f32(object, key)?.ok_or(Error::MissingField)
}

pub(crate) fn req_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, Error> {
    get_str(object, key)?.ok_or(Error::MissingField)
}

pub(crate) fn get_object<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, Error> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value.as_object().map(Some).ok_or(Error::InvalidGltf),
    }
}

pub(crate) fn as_object(value: &Value) -> Result<&Map<String, Value>, Error> {
    value.as_object().ok_or(Error::InvalidGltf)
}

pub(crate) fn as_array(value: &Value) -> Result<&Vec<Value>, Error> {
    value.as_array().ok_or(Error::InvalidGltf)
}

/// Parses a fixed-length float array field.
pub(crate) fn get_f32_array<const N: usize>(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<[f32; N]>, Error> {
    let value = match object.get(key) {
        None => return Ok(None),
        Some(value) => value,
    };
    let array = value.as_array().ok_or(Error::InvalidGltf)?;
    if array.len() != N {
        return Err(Error::InvalidGltf);
    }
    let mut out = [0.0f32; N];
    for (slot, entry) in out.iter_mut().zip(array) {
        *slot = entry.as_f64().ok_or(Error::InvalidGltf)? as f32;
    }
    Ok(Some(out))
}

/// Parses an array of indices.
pub(crate) fn get_index_array(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Vec<usize>, Error> {
    let mut out = Vec::new();
    if let Some(value) = object.get(key) {
        for entry in value.as_array().ok_or(Error::InvalidGltf)? {
            out.push(entry.as_u64().ok_or(Error::InvalidGltf)? as usize);
        }
    }
    Ok(out)
}

/// Parses an array of floats of any length.
pub(crate) fn get_f32_vec(object: &Map<String, Value>, key: &str) -> Result<Vec<f32>, Error> {
    let mut out = Vec::new();
    if let Some(value) = object.get(key) {
        for entry in value.as_array().ok_or(Error::InvalidGltf)? {
            out.push(entry.as_f64().ok_or(Error::InvalidGltf)? as f32);
        }
    }
    Ok(out)
}

pub(crate) fn get_name(object: &Map<String, Value>) -> Result<Option<String>, Error> {
    Ok(get_str(object, "name")?.map(str::to_string))
}
