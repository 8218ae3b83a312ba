//! Material properties of primitives.

/// The alpha rendering mode of a material.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AlphaMode {
    /// The alpha value is ignored and the rendered output is fully opaque.
    #[default]
    Opaque,
    /// The rendered output is either fully opaque or fully transparent
    /// depending on the alpha value and the alpha cutoff.
    Mask,
    /// The rendered output is combined with the background using the normal
    /// painting operation (i.e. the Porter and Duff over operator).
    Blend,
}

impl AlphaMode {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "OPAQUE" => Some(AlphaMode::Opaque),
            "MASK" => Some(AlphaMode::Mask),
            "BLEND" => Some(AlphaMode::Blend),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlphaMode::Opaque => "OPAQUE",
            AlphaMode::Mask => "MASK",
            AlphaMode::Blend => "BLEND",
        }
    }
}

/// `KHR_texture_transform` offset/rotation/scale applied to UV coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureTransform {
    /// Offset of the UV coordinate origin.
    pub uv_offset: [f32; 2],
    /// Rotation around the origin in radians, counter-clockwise.
    pub rotation: f32,
    /// Scale factors applied to the UV coordinates.
    pub uv_scale: [f32; 2],
    /// Overrides the texture info `tex_coord` when present.
    pub tex_coord: Option<usize>,
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            uv_offset: [0.0, 0.0],
            rotation: 0.0,
            uv_scale: [1.0, 1.0],
            tex_coord: None,
        }
    }
}

/// A reference to a texture plus the UV set it samples.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureInfo {
    pub texture: usize,
    /// Index of the `TEXCOORD_n` attribute set.
    pub tex_coord: usize,
    pub transform: Option<TextureTransform>,
}

impl TextureInfo {
    pub fn new(texture: usize) -> Self {
        Self {
            texture,
            tex_coord: 0,
            transform: None,
        }
    }
}

/// Tangent-space normal map reference.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalTextureInfo {
    pub texture: TextureInfo,
    /// Scalar multiplier applied to the sampled normal vector.
    pub scale: f32,
}

/// Occlusion map reference.
#[derive(Clone, Debug, PartialEq)]
pub struct OcclusionTextureInfo {
    pub texture: TextureInfo,
    /// How much the occlusion value affects the final result.
    pub strength: f32,
}

/// Metallic-roughness parameters of the core PBR model.
#[derive(Clone, Debug, PartialEq)]
pub struct PbrMetallicRoughness {
    /// Linear RGBA base color factor.
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    /// Metalness in the blue channel, roughness in the green channel.
    pub metallic_roughness_texture: Option<TextureInfo>,
}

impl Default for PbrMetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
        }
    }
}

/// `KHR_materials_anisotropy`.
#[derive(Clone, Debug, PartialEq)]
pub struct Anisotropy {
    pub anisotropy_strength: f32,
    pub anisotropy_rotation: f32,
    pub anisotropy_texture: Option<TextureInfo>,
}

impl Default for Anisotropy {
    fn default() -> Self {
        Self {
            anisotropy_strength: 0.0,
            anisotropy_rotation: 0.0,
            anisotropy_texture: None,
        }
    }
}

/// `KHR_materials_clearcoat`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clearcoat {
    pub clearcoat_factor: f32,
    pub clearcoat_texture: Option<TextureInfo>,
    pub clearcoat_roughness_factor: f32,
    pub clearcoat_roughness_texture: Option<TextureInfo>,
    pub clearcoat_normal_texture: Option<NormalTextureInfo>,
}

/// `KHR_materials_sheen`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheen {
    pub sheen_color_factor: [f32; 3],
    pub sheen_color_texture: Option<TextureInfo>,
    pub sheen_roughness_factor: f32,
    pub sheen_roughness_texture: Option<TextureInfo>,
}

/// `KHR_materials_specular`.
#[derive(Clone, Debug, PartialEq)]
pub struct Specular {
    pub specular_factor: f32,
    pub specular_texture: Option<TextureInfo>,
    pub specular_color_factor: [f32; 3],
    pub specular_color_texture: Option<TextureInfo>,
}

impl Default for Specular {
    fn default() -> Self {
        Self {
            specular_factor: 1.0,
            specular_texture: None,
            specular_color_factor: [1.0, 1.0, 1.0],
            specular_color_texture: None,
        }
    }
}

/// `KHR_materials_transmission`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transmission {
    pub transmission_factor: f32,
    pub transmission_texture: Option<TextureInfo>,
}

/// `KHR_materials_volume`.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    pub thickness_factor: f32,
    pub thickness_texture: Option<TextureInfo>,
    /// Attenuation distance; infinite when absent.
    pub attenuation_distance: f32,
    pub attenuation_color: [f32; 3],
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            thickness_factor: 0.0,
            thickness_texture: None,
            attenuation_distance: f32::INFINITY,
            attenuation_color: [1.0, 1.0, 1.0],
        }
    }
}

/// `KHR_materials_iridescence`.
#[derive(Clone, Debug, PartialEq)]
pub struct Iridescence {
    pub iridescence_factor: f32,
    pub iridescence_texture: Option<TextureInfo>,
    pub iridescence_ior: f32,
    pub iridescence_thickness_minimum: f32,
    pub iridescence_thickness_maximum: f32,
    pub iridescence_thickness_texture: Option<TextureInfo>,
}

impl Default for Iridescence {
    fn default() -> Self {
        Self {
            iridescence_factor: 0.0,
            iridescence_texture: None,
            iridescence_ior: 1.3,
            iridescence_thickness_minimum: 100.0,
            iridescence_thickness_maximum: 400.0,
            iridescence_thickness_texture: None,
        }
    }
}

/// `KHR_materials_diffuse_transmission`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffuseTransmission {
    pub diffuse_transmission_factor: f32,
    pub diffuse_transmission_texture: Option<TextureInfo>,
    pub diffuse_transmission_color_factor: [f32; 3],
    pub diffuse_transmission_color_texture: Option<TextureInfo>,
}

/// `MSFT_packing_normalRoughnessMetallic`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackedNormalRoughnessMetallic {
    /// Normal in RG, roughness in B, metallic in A.
    pub normal_roughness_metallic_texture: Option<TextureInfo>,
}

/// `MSFT_packing_occlusionRoughnessMetallic`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackedOcclusionRoughnessMetallic {
    /// Occlusion in R, roughness in G, metallic in B.
    pub occlusion_roughness_metallic_texture: Option<TextureInfo>,
    /// Roughness in R, metallic in G, occlusion in B.
    pub roughness_metallic_occlusion_texture: Option<TextureInfo>,
    /// Two-channel (RG) normal map.
    pub normal_texture: Option<NormalTextureInfo>,
}

/// The material appearance of a primitive.
///
/// Extension sub-structs are only ever present when the corresponding
/// extension string appears in the asset's `extensionsUsed` set.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub pbr: PbrMetallicRoughness,
    pub normal_texture: Option<NormalTextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: AlphaMode,
    /// Alpha threshold for [`AlphaMode::Mask`].
    pub alpha_cutoff: f32,
    pub double_sided: bool,

    pub anisotropy: Option<Box<Anisotropy>>,
    pub clearcoat: Option<Box<Clearcoat>>,
    pub sheen: Option<Box<Sheen>>,
    pub specular: Option<Box<Specular>>,
    pub transmission: Option<Box<Transmission>>,
    pub volume: Option<Box<Volume>>,
    pub iridescence: Option<Box<Iridescence>>,
    pub diffuse_transmission: Option<Box<DiffuseTransmission>>,
    /// `KHR_materials_ior`.
    pub ior: Option<f32>,
    /// `KHR_materials_dispersion`.
    pub dispersion: Option<f32>,
    /// `KHR_materials_emissive_strength`.
    pub emissive_strength: Option<f32>,
    /// `KHR_materials_unlit`.
    pub unlit: bool,
    pub packed_normal_roughness_metallic: Option<Box<PackedNormalRoughnessMetallic>>,
    pub packed_occlusion_roughness_metallic: Option<Box<PackedOcclusionRoughnessMetallic>>,

    pub name: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            pbr: PbrMetallicRoughness::default(),
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            emissive_factor: [0.0, 0.0, 0.0],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
            anisotropy: None,
            clearcoat: None,
            sheen: None,
            specular: None,
            transmission: None,
            volume: None,
            iridescence: None,
            diffuse_transmission: None,
            ior: None,
            dispersion: None,
            emissive_strength: None,
            unlit: false,
            packed_normal_roughness_metallic: None,
            packed_occlusion_roughness_metallic: None,
            name: None,
        }
    }
}
