//! rapid-gltf: a fast glTF 2.0 loader, validator and serializer.
//!
//! This crate reads [glTF 2.0] assets from JSON text or the binary GLB
//! container, builds an in-memory [`Asset`] graph that mirrors the
//! specification, validates cross-references and semantic constraints, and
//! serializes assets back to JSON or GLB.
//!
//! [glTF 2.0]: https://www.khronos.org/gltf
//!
//! ## Examples
//!
//! ### Loading an asset
//!
//! ```
//! # fn run() -> Result<(), rapid_gltf::Error> {
//! use rapid_gltf::{Extensions, Options, Parser};
//!
//! let json = br#"{"asset":{"version":"2.0"}}"#;
//! let mut parser = Parser::new(Extensions::empty());
//! let asset = parser.parse_bytes(json, std::path::Path::new("."), Options::empty())?;
//! assert_eq!(asset.info.as_ref().unwrap().version, "2.0");
//! # Ok(())
//! # }
//! # run().expect("runtime error");
//! ```
//!
//! Field names are matched by their CRC-32C rather than by string
//! comparison; see [`crc32`]. Embedded base64 payloads decode through the
//! SIMD-dispatched codec in [`base64`].

/// Accessors: typed views into buffer views.
pub mod accessor;

/// Animations, their channels, targets, and samplers.
pub mod animation;

/// The asset root and its metadata.
pub mod asset;

/// Base64 decoding with SIMD fast paths.
pub mod base64;

/// Data structures for working with binary glTF.
pub mod binary;

/// Buffers, buffer views and data sources.
pub mod buffer;

/// Cameras and their projections.
pub mod camera;

/// CRC-32C hashing used for field-name dispatch.
pub mod crc32;

/// The JSON decoder.
mod de;

/// Images that may be used by textures.
pub mod image;

/// Punctual lights.
pub mod light;

/// Material properties of primitives.
pub mod material;

/// The linear-algebra kernel backing node transforms.
pub mod math;

/// Meshes and their primitives.
pub mod mesh;

/// The glTF node hierarchy.
pub mod scene;

/// The JSON and GLB encoders.
mod ser;

/// Mesh skinning primitives.
pub mod skin;

/// Byte sources feeding the parser.
pub mod source;

/// Textures and their samplers.
pub mod texture;

/// Typed element access over accessors.
pub mod tools;

/// URI handling.
pub mod uri;

/// The asset validator.
pub mod validate;

#[doc(inline)]
pub use self::asset::{Asset, AssetInfo, Category};

#[doc(inline)]
pub use self::binary::{determine_type, Glb, GltfType};

#[doc(inline)]
pub use self::de::{BufferMapCallback, Parser};

#[doc(inline)]
pub use self::ser::{export_glb, export_json, write_files, Exported};

#[doc(inline)]
pub use self::validate::validate;

/// Represents a runtime error.
///
/// This is a closed set; every fallible operation in the crate maps into it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The given path could not be opened or resolved.
    InvalidPath,
    /// The asset requires extensions the parser was not configured with.
    MissingExtensions,
    /// The asset requires an extension this crate does not know.
    UnknownRequiredExtension,
    /// The document is not well-formed JSON.
    InvalidJson,
    /// The document violates the glTF specification.
    InvalidGltf,
    /// The root `asset` object is missing or malformed.
    InvalidOrMissingAssetField,
    /// The GLB container framing is malformed.
    InvalidGLB,
    /// A required field is absent.
    MissingField,
    /// An external buffer could not be loaded.
    MissingExternalBuffer,
    /// The asset is not glTF 2.0.
    UnsupportedVersion,
    /// A URI is syntactically invalid or uses an unsupported form.
    InvalidURI,
    /// A byte source failed to produce the requested bytes.
    InvalidFileData,
    /// Emitting files during export failed.
    FailedWritingFiles,
}

impl Error {
    /// A short human-readable description.
    pub fn message(self) -> &'static str {
        match self {
            Error::InvalidPath => "invalid or unresolvable path",
            Error::MissingExtensions => "required extension is not enabled",
            Error::UnknownRequiredExtension => "required extension is not supported",
            Error::InvalidJson => "malformed JSON",
            Error::InvalidGltf => "malformed glTF",
            Error::InvalidOrMissingAssetField => "missing or invalid asset field",
            Error::InvalidGLB => "malformed GLB container",
            Error::MissingField => "missing required field",
            Error::MissingExternalBuffer => "external buffer could not be loaded",
            Error::UnsupportedVersion => "unsupported glTF version",
            Error::InvalidURI => "invalid URI",
            Error::InvalidFileData => "invalid file data",
            Error::FailedWritingFiles => "failed writing files",
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {}

/// Canonical glTF 2.0 extension identifiers this crate is aware of.
pub mod extensions {
    pub const EXT_MESH_GPU_INSTANCING: &str = "EXT_mesh_gpu_instancing";
    pub const EXT_MESHOPT_COMPRESSION: &str = "EXT_meshopt_compression";
    pub const EXT_TEXTURE_WEBP: &str = "EXT_texture_webp";
    pub const GODOT_SINGLE_ROOT: &str = "GODOT_single_root";
    pub const KHR_ACCESSOR_FLOAT64: &str = "KHR_accessor_float64";
    pub const KHR_DRACO_MESH_COMPRESSION: &str = "KHR_draco_mesh_compression";
    pub const KHR_LIGHTS_PUNCTUAL: &str = "KHR_lights_punctual";
    pub const KHR_MATERIALS_ANISOTROPY: &str = "KHR_materials_anisotropy";
    pub const KHR_MATERIALS_CLEARCOAT: &str = "KHR_materials_clearcoat";
    pub const KHR_MATERIALS_DIFFUSE_TRANSMISSION: &str = "KHR_materials_diffuse_transmission";
    pub const KHR_MATERIALS_DISPERSION: &str = "KHR_materials_dispersion";
    pub const KHR_MATERIALS_EMISSIVE_STRENGTH: &str = "KHR_materials_emissive_strength";
    pub const KHR_MATERIALS_IOR: &str = "KHR_materials_ior";
    pub const KHR_MATERIALS_IRIDESCENCE: &str = "KHR_materials_iridescence";
    pub const KHR_MATERIALS_SHEEN: &str = "KHR_materials_sheen";
    pub const KHR_MATERIALS_SPECULAR: &str = "KHR_materials_specular";
    pub const KHR_MATERIALS_TRANSMISSION: &str = "KHR_materials_transmission";
    pub const KHR_MATERIALS_UNLIT: &str = "KHR_materials_unlit";
    pub const KHR_MATERIALS_VARIANTS: &str = "KHR_materials_variants";
    pub const KHR_MATERIALS_VOLUME: &str = "KHR_materials_volume";
    pub const KHR_MESH_QUANTIZATION: &str = "KHR_mesh_quantization";
    pub const KHR_TEXTURE_BASISU: &str = "KHR_texture_basisu";
    pub const KHR_TEXTURE_TRANSFORM: &str = "KHR_texture_transform";
    pub const MSFT_PACKING_NORMAL_ROUGHNESS_METALLIC: &str = "MSFT_packing_normalRoughnessMetallic";
    pub const MSFT_PACKING_OCCLUSION_ROUGHNESS_METALLIC: &str =
        "MSFT_packing_occlusionRoughnessMetallic";
    pub const MSFT_TEXTURE_DDS: &str = "MSFT_texture_dds";
}

bitflags::bitflags! {
    /// Extensions the host opted into. Entries present in a document but
    /// absent from this set are skipped during parsing.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Extensions: u32 {
        /// `KHR_texture_transform`.
        const KHR_TEXTURE_TRANSFORM = 1 << 0;
        /// `KHR_texture_basisu`.
        const KHR_TEXTURE_BASISU = 1 << 1;
        /// `MSFT_texture_dds`.
        const MSFT_TEXTURE_DDS = 1 << 2;
        /// `KHR_mesh_quantization`.
        const KHR_MESH_QUANTIZATION = 1 << 3;
        /// `EXT_meshopt_compression`.
        const EXT_MESHOPT_COMPRESSION = 1 << 4;
        /// `KHR_lights_punctual`.
        const KHR_LIGHTS_PUNCTUAL = 1 << 5;
        /// `EXT_mesh_gpu_instancing`.
        const EXT_MESH_GPU_INSTANCING = 1 << 6;
        /// `EXT_texture_webp`.
        const EXT_TEXTURE_WEBP = 1 << 7;
        /// `KHR_accessor_float64`.
        const KHR_ACCESSOR_FLOAT64 = 1 << 8;
        /// `KHR_materials_variants`.
        const KHR_MATERIALS_VARIANTS = 1 << 9;
        /// `KHR_draco_mesh_compression`.
        const KHR_DRACO_MESH_COMPRESSION = 1 << 10;
        /// `KHR_materials_anisotropy`.
        const KHR_MATERIALS_ANISOTROPY = 1 << 11;
        /// `KHR_materials_clearcoat`.
        const KHR_MATERIALS_CLEARCOAT = 1 << 12;
        /// `KHR_materials_dispersion`.
        const KHR_MATERIALS_DISPERSION = 1 << 13;
        /// `KHR_materials_emissive_strength`.
        const KHR_MATERIALS_EMISSIVE_STRENGTH = 1 << 14;
        /// `KHR_materials_ior`.
        const KHR_MATERIALS_IOR = 1 << 15;
        /// `KHR_materials_iridescence`.
        const KHR_MATERIALS_IRIDESCENCE = 1 << 16;
        /// `KHR_materials_sheen`.
        const KHR_MATERIALS_SHEEN = 1 << 17;
        /// `KHR_materials_specular`.
        const KHR_MATERIALS_SPECULAR = 1 << 18;
        /// `KHR_materials_transmission`.
        const KHR_MATERIALS_TRANSMISSION = 1 << 19;
        /// `KHR_materials_unlit`.
        const KHR_MATERIALS_UNLIT = 1 << 20;
        /// `KHR_materials_volume`.
        const KHR_MATERIALS_VOLUME = 1 << 21;
        /// `KHR_materials_diffuse_transmission`.
        const KHR_MATERIALS_DIFFUSE_TRANSMISSION = 1 << 22;
        /// `MSFT_packing_normalRoughnessMetallic`.
        const MSFT_PACKING_NORMAL_ROUGHNESS_METALLIC = 1 << 23;
        /// `MSFT_packing_occlusionRoughnessMetallic`.
        const MSFT_PACKING_OCCLUSION_ROUGHNESS_METALLIC = 1 << 24;
        /// `GODOT_single_root`.
        const GODOT_SINGLE_ROOT = 1 << 25;
    }
}

impl Extensions {
    /// Maps a canonical extension identifier to its flag. Returns `None`
    /// for identifiers this crate does not know.
    pub fn from_extension_name(name: &str) -> Option<Self> {
        use self::extensions::*;
        Some(match name {
            KHR_TEXTURE_TRANSFORM => Extensions::KHR_TEXTURE_TRANSFORM,
            KHR_TEXTURE_BASISU => Extensions::KHR_TEXTURE_BASISU,
            MSFT_TEXTURE_DDS => Extensions::MSFT_TEXTURE_DDS,
            KHR_MESH_QUANTIZATION => Extensions::KHR_MESH_QUANTIZATION,
            EXT_MESHOPT_COMPRESSION => Extensions::EXT_MESHOPT_COMPRESSION,
            KHR_LIGHTS_PUNCTUAL => Extensions::KHR_LIGHTS_PUNCTUAL,
            EXT_MESH_GPU_INSTANCING => Extensions::EXT_MESH_GPU_INSTANCING,
            EXT_TEXTURE_WEBP => Extensions::EXT_TEXTURE_WEBP,
            KHR_ACCESSOR_FLOAT64 => Extensions::KHR_ACCESSOR_FLOAT64,
            KHR_MATERIALS_VARIANTS => Extensions::KHR_MATERIALS_VARIANTS,
            KHR_DRACO_MESH_COMPRESSION => Extensions::KHR_DRACO_MESH_COMPRESSION,
            KHR_MATERIALS_ANISOTROPY => Extensions::KHR_MATERIALS_ANISOTROPY,
            KHR_MATERIALS_CLEARCOAT => Extensions::KHR_MATERIALS_CLEARCOAT,
            KHR_MATERIALS_DISPERSION => Extensions::KHR_MATERIALS_DISPERSION,
            KHR_MATERIALS_EMISSIVE_STRENGTH => Extensions::KHR_MATERIALS_EMISSIVE_STRENGTH,
            KHR_MATERIALS_IOR => Extensions::KHR_MATERIALS_IOR,
            KHR_MATERIALS_IRIDESCENCE => Extensions::KHR_MATERIALS_IRIDESCENCE,
            KHR_MATERIALS_SHEEN => Extensions::KHR_MATERIALS_SHEEN,
            KHR_MATERIALS_SPECULAR => Extensions::KHR_MATERIALS_SPECULAR,
            KHR_MATERIALS_TRANSMISSION => Extensions::KHR_MATERIALS_TRANSMISSION,
            KHR_MATERIALS_UNLIT => Extensions::KHR_MATERIALS_UNLIT,
            KHR_MATERIALS_VOLUME => Extensions::KHR_MATERIALS_VOLUME,
            KHR_MATERIALS_DIFFUSE_TRANSMISSION => Extensions::KHR_MATERIALS_DIFFUSE_TRANSMISSION,
            MSFT_PACKING_NORMAL_ROUGHNESS_METALLIC => {
                Extensions::MSFT_PACKING_NORMAL_ROUGHNESS_METALLIC
            }
            MSFT_PACKING_OCCLUSION_ROUGHNESS_METALLIC => {
                Extensions::MSFT_PACKING_OCCLUSION_ROUGHNESS_METALLIC
            }
            GODOT_SINGLE_ROOT => Extensions::GODOT_SINGLE_ROOT,
            _ => return None,
        })
    }
}

bitflags::bitflags! {
    /// Parser behaviour switches, all off by default.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Options: u32 {
        /// Accept `componentType` 5130 (`GL_DOUBLE`).
        const ALLOW_DOUBLE = 1 << 0;
        /// Do not fail when the root `asset` object is missing.
        const DONT_REQUIRE_VALID_ASSET_MEMBER = 1 << 1;
        /// Resolve the GLB BIN chunk into the first buffer.
        const LOAD_GLB_BUFFERS = 1 << 2;
        /// Follow buffer `uri` references that are local paths.
        const LOAD_EXTERNAL_BUFFERS = 1 << 3;
        /// Follow image `uri` references that are local paths.
        const LOAD_EXTERNAL_IMAGES = 1 << 4;
        /// Replace matrix node transforms with their TRS decomposition.
        const DECOMPOSE_NODE_MATRICES = 1 << 5;
        /// Synthesize index accessors for primitives lacking them.
        const GENERATE_MESH_INDICES = 1 << 6;
        /// Minify the JSON into a private buffer before parsing.
        const MINIMISE_JSON_BEFORE_PARSING = 1 << 7;
    }
}

bitflags::bitflags! {
    /// Exporter behaviour switches, all off by default.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ExportOptions: u32 {
        /// Insert newlines and indentation into emitted JSON.
        const PRETTY_PRINT_JSON = 1 << 0;
        /// Run the validator before encoding.
        const VALIDATE_ASSET = 1 << 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_names_round_trip() {
        assert_eq!(
            Extensions::from_extension_name("KHR_texture_transform"),
            Some(Extensions::KHR_TEXTURE_TRANSFORM)
        );
        assert_eq!(
            Extensions::from_extension_name("GODOT_single_root"),
            Some(Extensions::GODOT_SINGLE_ROOT)
        );
        assert_eq!(Extensions::from_extension_name("KHR_not_a_thing"), None);
    }

    #[test]
    fn error_messages_are_static() {
        assert_eq!(Error::InvalidJson.message(), "malformed JSON");
        assert_eq!(Error::InvalidGltf.to_string(), "malformed glTF");
    }
}
