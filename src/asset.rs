//! The asset root and its metadata.

use crate::accessor::Accessor;
use crate::animation::Animation;
use crate::buffer::{Buffer, View};
use crate::camera::Camera;
use crate::image::Image;
use crate::light::Light;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::scene::{Node, Scene};
use crate::skin::Skin;
use crate::texture::{Sampler, Texture};

bitflags::bitflags! {
    /// Which top-level sections of a document were populated. Each flag
    /// implies the sections it depends on.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Category: u32 {
        const BUFFERS      = 1 << 0;
        const BUFFER_VIEWS = 1 << 1 | Self::BUFFERS.bits();
        const ACCESSORS    = 1 << 2 | Self::BUFFER_VIEWS.bits();
        const IMAGES       = 1 << 3 | Self::BUFFER_VIEWS.bits();
        const SAMPLERS     = 1 << 4;
        const TEXTURES     = 1 << 5 | Self::IMAGES.bits() | Self::SAMPLERS.bits();
        const ANIMATIONS   = 1 << 6 | Self::ACCESSORS.bits();
        const CAMERAS      = 1 << 7;
        const MATERIALS    = 1 << 8 | Self::TEXTURES.bits();
        const MESHES       = 1 << 9 | Self::ACCESSORS.bits() | Self::MATERIALS.bits();
        const SKINS        = 1 << 10 | Self::ACCESSORS.bits() | (1 << 11);
        const NODES        = 1 << 11 | Self::CAMERAS.bits() | Self::MESHES.bits() | Self::SKINS.bits();
        const SCENES       = 1 << 12 | Self::NODES.bits();
        const ASSET        = 1 << 13;

        const ALL = Self::ASSET.bits() | Self::SCENES.bits() | Self::ANIMATIONS.bits();
    }
}

/// Metadata from the root `asset` object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetInfo {
    /// The glTF version this asset targets.
    pub version: String,
    /// The minimum version a loader must support.
    pub min_version: Option<String>,
    /// Tool that generated the asset.
    pub generator: Option<String>,
    pub copyright: Option<String>,
}

/// A complete glTF document.
///
/// Constructed by the decoder; read-only afterwards. Every index stored in
/// any field refers into the sibling arrays of this struct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Asset {
    /// `None` only when parsed with
    /// [`Options::DONT_REQUIRE_VALID_ASSET_MEMBER`](crate::Options::DONT_REQUIRE_VALID_ASSET_MEMBER).
    pub info: Option<AssetInfo>,

    pub accessors: Vec<Accessor>,
    pub animations: Vec<Animation>,
    pub buffers: Vec<Buffer>,
    pub buffer_views: Vec<View>,
    pub cameras: Vec<Camera>,
    pub images: Vec<Image>,
    pub lights: Vec<Light>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<Node>,
    pub samplers: Vec<Sampler>,
    pub scenes: Vec<Scene>,
    pub skins: Vec<Skin>,
    pub textures: Vec<Texture>,
    /// `KHR_materials_variants` variant names.
    pub material_variants: Vec<String>,

    /// The scene shown at load time.
    pub default_scene: Option<usize>,
    pub extensions_used: Vec<String>,
    pub extensions_required: Vec<String>,

    /// Which sections were actually populated during parsing.
    pub available_categories: Category,
}

impl Asset {
    /// Whether `name` appears in `extensionsUsed`.
    pub fn uses_extension(&self, name: &str) -> bool {
        self.extensions_used.iter().any(|used| used == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_closure() {
        assert!(Category::ACCESSORS.contains(Category::BUFFERS));
        assert!(Category::SCENES.contains(Category::NODES));
        assert!(Category::NODES.contains(Category::MESHES));
        assert!(Category::ALL.contains(Category::ANIMATIONS));
        assert!(!Category::SAMPLERS.contains(Category::BUFFERS));
    }
}
