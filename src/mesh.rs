//! Meshes and their primitives.

/// `GL_POINTS`.
pub const POINTS: u32 = 0;
/// `GL_LINES`.
pub const LINES: u32 = 1;
/// `GL_LINE_LOOP`.
pub const LINE_LOOP: u32 = 2;
/// `GL_LINE_STRIP`.
pub const LINE_STRIP: u32 = 3;
/// `GL_TRIANGLES`.
pub const TRIANGLES: u32 = 4;
/// `GL_TRIANGLE_STRIP`.
pub const TRIANGLE_STRIP: u32 = 5;
/// `GL_TRIANGLE_FAN`.
pub const TRIANGLE_FAN: u32 = 6;

/// The topology primitives are assembled with.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Topology {
    pub fn from_gl_enum(value: u64) -> Option<Self> {
        match value as u32 {
            POINTS => Some(Topology::Points),
            LINES => Some(Topology::Lines),
            LINE_LOOP => Some(Topology::LineLoop),
            LINE_STRIP => Some(Topology::LineStrip),
            TRIANGLES => Some(Topology::Triangles),
            TRIANGLE_STRIP => Some(Topology::TriangleStrip),
            TRIANGLE_FAN => Some(Topology::TriangleFan),
            _ => None,
        }
    }

    pub fn as_gl_enum(self) -> u32 {
        match self {
            Topology::Points => POINTS,
            Topology::Lines => LINES,
            Topology::LineLoop => LINE_LOOP,
            Topology::LineStrip => LINE_STRIP,
            Topology::Triangles => TRIANGLES,
            Topology::TriangleStrip => TRIANGLE_STRIP,
            Topology::TriangleFan => TRIANGLE_FAN,
        }
    }
}

/// Vertex attribute semantic name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Semantic {
    /// XYZ vertex positions.
    Positions,
    /// XYZ vertex normals.
    Normals,
    /// XYZW vertex tangents where `w` indicates handedness.
    Tangents,
    /// RGB or RGBA vertex color, set `n`.
    Colors(u32),
    /// UV texture coordinates, set `n`.
    TexCoords(u32),
    /// Joint indices, set `n`.
    Joints(u32),
    /// Joint weights, set `n`.
    Weights(u32),
    /// Application-specific attribute, leading `_` stripped.
    Custom(String),
}

impl Semantic {
    /// Recognizes a JSON attribute name. Anything that is not a documented
    /// semantic must start with `_`.
    pub fn from_str(name: &str) -> Option<Self> {
        fn set(name: &str, prefix: &str) -> Option<u32> {
            name[prefix.len()..].parse().ok()
        }
        match name {
            "POSITION" => Some(Semantic::Positions),
            "NORMAL" => Some(Semantic::Normals),
            "TANGENT" => Some(Semantic::Tangents),
            _ if name.starts_with("COLOR_") => set(name, "COLOR_").map(Semantic::Colors),
            _ if name.starts_with("TEXCOORD_") => set(name, "TEXCOORD_").map(Semantic::TexCoords),
            _ if name.starts_with("JOINTS_") => set(name, "JOINTS_").map(Semantic::Joints),
            _ if name.starts_with("WEIGHTS_") => set(name, "WEIGHTS_").map(Semantic::Weights),
            _ if name.starts_with('_') => Some(Semantic::Custom(name[1..].to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for Semantic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Semantic::Positions => f.write_str("POSITION"),
            Semantic::Normals => f.write_str("NORMAL"),
            Semantic::Tangents => f.write_str("TANGENT"),
            Semantic::Colors(n) => write!(f, "COLOR_{n}"),
            Semantic::TexCoords(n) => write!(f, "TEXCOORD_{n}"),
            Semantic::Joints(n) => write!(f, "JOINTS_{n}"),
            Semantic::Weights(n) => write!(f, "WEIGHTS_{n}"),
            Semantic::Custom(name) => write!(f, "_{name}"),
        }
    }
}

/// An attribute binding: semantic name to accessor index.
///
/// Primitives keep their attributes as a flat list in JSON insertion order
/// rather than a map; glTF exporters order them meaningfully and consumers
/// upload them in order.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub semantic: Semantic,
    pub accessor: usize,
}

/// `KHR_draco_mesh_compression` descriptor. The compressed payload stays in
/// the referenced buffer view; decompression is the host's concern.
#[derive(Clone, Debug, PartialEq)]
pub struct DracoPrimitive {
    pub buffer_view: usize,
    /// Attribute name to Draco attribute id.
    pub attributes: Vec<Attribute>,
}

/// Geometry to be rendered with the given material.
#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    /// Attribute bindings in JSON insertion order.
    pub attributes: Vec<Attribute>,
    pub topology: Topology,
    /// Accessor with the index data.
    pub indices: Option<usize>,
    pub material: Option<usize>,
    /// Morph targets, each a flat attribute map like `attributes`.
    pub targets: Vec<Vec<Attribute>>,
    /// `KHR_materials_variants`: maps variant index to material index.
    pub mapped_materials: Vec<Option<usize>>,
    pub draco: Option<DracoPrimitive>,
}

impl Primitive {
    /// Looks up an attribute accessor by semantic.
    pub fn find_attribute(&self, semantic: &Semantic) -> Option<usize> {
        self.attributes
            .iter()
            .find(|a| a.semantic == *semantic)
            .map(|a| a.accessor)
    }
}

/// A set of primitives to be rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
    /// Morph target weights, one per target.
    pub weights: Vec<f32>,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_names() {
        assert_eq!(Semantic::from_str("POSITION"), Some(Semantic::Positions));
        assert_eq!(Semantic::from_str("TEXCOORD_1"), Some(Semantic::TexCoords(1)));
        assert_eq!(Semantic::from_str("JOINTS_0"), Some(Semantic::Joints(0)));
        assert_eq!(
            Semantic::from_str("_DENSITY"),
            Some(Semantic::Custom("DENSITY".into()))
        );
        assert_eq!(Semantic::from_str("TEXCOORD_"), None);
        assert_eq!(Semantic::from_str("BITANGENT"), None);
    }

    #[test]
    fn semantic_display_round_trips() {
        for name in ["POSITION", "NORMAL", "TANGENT", "COLOR_0", "WEIGHTS_2", "_RAIN"] {
            let semantic = Semantic::from_str(name).unwrap();
            assert_eq!(semantic.to_string(), name);
        }
    }
}
