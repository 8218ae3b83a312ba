//! Textures and their samplers.

/// `GL_NEAREST`.
pub const NEAREST: u32 = 9728;
/// `GL_LINEAR`.
pub const LINEAR: u32 = 9729;
/// `GL_NEAREST_MIPMAP_NEAREST`.
pub const NEAREST_MIPMAP_NEAREST: u32 = 9984;
/// `GL_LINEAR_MIPMAP_NEAREST`.
pub const LINEAR_MIPMAP_NEAREST: u32 = 9985;
/// `GL_NEAREST_MIPMAP_LINEAR`.
pub const NEAREST_MIPMAP_LINEAR: u32 = 9986;
/// `GL_LINEAR_MIPMAP_LINEAR`.
pub const LINEAR_MIPMAP_LINEAR: u32 = 9987;

/// `GL_CLAMP_TO_EDGE`.
pub const CLAMP_TO_EDGE: u32 = 33_071;
/// `GL_MIRRORED_REPEAT`.
pub const MIRRORED_REPEAT: u32 = 33_648;
/// `GL_REPEAT`.
pub const REPEAT: u32 = 10_497;

/// Magnification filter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MagFilter {
    Nearest,
    Linear,
}

impl MagFilter {
    pub fn from_gl_enum(value: u64) -> Option<Self> {
        match value as u32 {
            NEAREST => Some(MagFilter::Nearest),
            LINEAR => Some(MagFilter::Linear),
            _ => None,
        }
    }

    pub fn as_gl_enum(self) -> u32 {
        match self {
            MagFilter::Nearest => NEAREST,
            MagFilter::Linear => LINEAR,
        }
    }
}

/// Minification filter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl MinFilter {
    pub fn from_gl_enum(value: u64) -> Option<Self> {
        match value as u32 {
            NEAREST => Some(MinFilter::Nearest),
            LINEAR => Some(MinFilter::Linear),
            NEAREST_MIPMAP_NEAREST => Some(MinFilter::NearestMipmapNearest),
            LINEAR_MIPMAP_NEAREST => Some(MinFilter::LinearMipmapNearest),
            NEAREST_MIPMAP_LINEAR => Some(MinFilter::NearestMipmapLinear),
            LINEAR_MIPMAP_LINEAR => Some(MinFilter::LinearMipmapLinear),
            _ => None,
        }
    }

    pub fn as_gl_enum(self) -> u32 {
        match self {
            MinFilter::Nearest => NEAREST,
            MinFilter::Linear => LINEAR,
            MinFilter::NearestMipmapNearest => NEAREST_MIPMAP_NEAREST,
            MinFilter::LinearMipmapNearest => LINEAR_MIPMAP_NEAREST,
            MinFilter::NearestMipmapLinear => NEAREST_MIPMAP_LINEAR,
            MinFilter::LinearMipmapLinear => LINEAR_MIPMAP_LINEAR,
        }
    }
}

/// Texture coordinate wrapping mode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WrappingMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

impl WrappingMode {
    pub fn from_gl_enum(value: u64) -> Option<Self> {
        match value as u32 {
            CLAMP_TO_EDGE => Some(WrappingMode::ClampToEdge),
            MIRRORED_REPEAT => Some(WrappingMode::MirroredRepeat),
            REPEAT => Some(WrappingMode::Repeat),
            _ => None,
        }
    }

    pub fn as_gl_enum(self) -> u32 {
        match self {
            WrappingMode::ClampToEdge => CLAMP_TO_EDGE,
            WrappingMode::MirroredRepeat => MIRRORED_REPEAT,
            WrappingMode::Repeat => REPEAT,
        }
    }
}

/// Texture sampler properties for filtering and wrapping modes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sampler {
    pub mag_filter: Option<MagFilter>,
    pub min_filter: Option<MinFilter>,
    pub wrap_s: WrappingMode,
    pub wrap_t: WrappingMode,
    pub name: Option<String>,
}

/// A texture: a sampler plus at least one image reference.
///
/// Extension image references (`KHR_texture_basisu`, `MSFT_texture_dds`,
/// `EXT_texture_webp`) coexist with the core `source`; at least one of the
/// four is always present after parsing.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub sampler: Option<usize>,
    /// Core glTF image index.
    pub image: Option<usize>,
    /// KTX2/BasisU image index.
    pub basisu_image: Option<usize>,
    /// DDS image index.
    pub dds_image: Option<usize>,
    /// WebP image index.
    pub webp_image: Option<usize>,
    pub name: Option<String>,
}
