//! Typed views into buffer views.

/// The component data type of an accessor.
///
/// `Int` and `Double` are not part of core glTF 2.0; `Double` requires the
/// [`Options::ALLOW_DOUBLE`](crate::Options::ALLOW_DOUBLE) opt-in or the
/// `KHR_accessor_float64` extension.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ComponentType {
    /// `GL_BYTE`.
    Byte,
    /// `GL_UNSIGNED_BYTE`.
    UnsignedByte,
    /// `GL_SHORT`.
    Short,
    /// `GL_UNSIGNED_SHORT`.
    UnsignedShort,
    /// `GL_INT`.
    Int,
    /// `GL_UNSIGNED_INT`.
    UnsignedInt,
    /// `GL_FLOAT`.
    Float,
    /// `GL_DOUBLE`.
    Double,
}

/// `GL_BYTE`.
pub const BYTE: u32 = 5120;
/// `GL_UNSIGNED_BYTE`.
pub const UNSIGNED_BYTE: u32 = 5121;
/// `GL_SHORT`.
pub const SHORT: u32 = 5122;
/// `GL_UNSIGNED_SHORT`.
pub const UNSIGNED_SHORT: u32 = 5123;
/// `GL_INT`.
pub const INT: u32 = 5124;
/// `GL_UNSIGNED_INT`.
pub const UNSIGNED_INT: u32 = 5125;
/// `GL_FLOAT`.
pub const FLOAT: u32 = 5126;
/// `GL_DOUBLE`.
pub const DOUBLE: u32 = 5130;

// Indexed by `gl_enum - 5120`; the gaps are unassigned GL constants.
const COMPONENT_TYPE_TABLE: [Option<ComponentType>; 11] = [
    Some(ComponentType::Byte),
    Some(ComponentType::UnsignedByte),
    Some(ComponentType::Short),
    Some(ComponentType::UnsignedShort),
    Some(ComponentType::Int),
    Some(ComponentType::UnsignedInt),
    Some(ComponentType::Float),
    None,
    None,
    None,
    Some(ComponentType::Double),
];

impl ComponentType {
    /// Maps a `componentType` GL enum to the tagged value.
    pub fn from_gl_enum(value: u64) -> Option<Self> {
        let index = value.checked_sub(BYTE as u64)?;
        *COMPONENT_TYPE_TABLE.get(index as usize)?
    }

    /// Returns the corresponding GL enum.
    pub fn as_gl_enum(self) -> u32 {
        match self {
            ComponentType::Byte => BYTE,
            ComponentType::UnsignedByte => UNSIGNED_BYTE,
            ComponentType::Short => SHORT,
            ComponentType::UnsignedShort => UNSIGNED_SHORT,
            ComponentType::Int => INT,
            ComponentType::UnsignedInt => UNSIGNED_INT,
            ComponentType::Float => FLOAT,
            ComponentType::Double => DOUBLE,
        }
    }

    /// Returns the number of bytes one component occupies.
    pub fn size(self) -> usize {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
            ComponentType::Int | ComponentType::UnsignedInt | ComponentType::Float => 4,
            ComponentType::Double => 8,
        }
    }

    /// Whether components are stored as floating point.
    pub fn is_float(self) -> bool {
        matches!(self, ComponentType::Float | ComponentType::Double)
    }
}

/// Specifies whether an accessor holds scalars, vectors, or matrices.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl Type {
    /// Maps the `type` JSON string to the tagged value.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "SCALAR" => Some(Type::Scalar),
            "VEC2" => Some(Type::Vec2),
            "VEC3" => Some(Type::Vec3),
            "VEC4" => Some(Type::Vec4),
            "MAT2" => Some(Type::Mat2),
            "MAT3" => Some(Type::Mat3),
            "MAT4" => Some(Type::Mat4),
            _ => None,
        }
    }

    /// The canonical JSON spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Type::Scalar => "SCALAR",
            Type::Vec2 => "VEC2",
            Type::Vec3 => "VEC3",
            Type::Vec4 => "VEC4",
            Type::Mat2 => "MAT2",
            Type::Mat3 => "MAT3",
            Type::Mat4 => "MAT4",
        }
    }

    /// The equivalent number of scalar components.
    pub fn multiplicity(self) -> usize {
        match self {
            Type::Scalar => 1,
            Type::Vec2 => 2,
            Type::Vec3 => 3,
            Type::Vec4 | Type::Mat2 => 4,
            Type::Mat3 => 9,
            Type::Mat4 => 16,
        }
    }
}

/// Byte size of one whole element.
pub fn element_size(type_: Type, component_type: ComponentType) -> usize {
    type_.multiplicity() * component_type.size()
}

/// Per-component `min`/`max` extremes of an accessor.
///
/// Storage is `f64` for float and double accessors and `i64` otherwise; the
/// length always equals the component multiplicity of the accessor type.
#[derive(Clone, Debug, PartialEq)]
pub enum Bounds {
    I64(Vec<i64>),
    F64(Vec<f64>),
}

impl Bounds {
    /// Number of stored components.
    pub fn len(&self) -> usize {
        match self {
            Bounds::I64(v) => v.len(),
            Bounds::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widens the stored minimum at `index` to include `value`.
    pub fn update_min(&mut self, index: usize, value: f64) {
        match self {
            Bounds::I64(v) => v[index] = v[index].min(value as i64),
            Bounds::F64(v) => v[index] = v[index].min(value),
        }
    }

    /// Widens the stored maximum at `index` to include `value`.
    pub fn update_max(&mut self, index: usize, value: f64) {
        match self {
            Bounds::I64(v) => v[index] = v[index].max(value as i64),
            Bounds::F64(v) => v[index] = v[index].max(value),
        }
    }
}

/// Sparse index storage: which elements deviate from the base values.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseIndices {
    /// Buffer view holding the index array.
    pub buffer_view: usize,
    /// Offset into that view in bytes.
    pub byte_offset: usize,
    /// One of `UnsignedByte`, `UnsignedShort`, `UnsignedInt`.
    pub component_type: ComponentType,
}

/// Sparse value storage: the replacement elements.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseValues {
    /// Buffer view holding the replacement elements.
    pub buffer_view: usize,
    /// Offset into that view in bytes.
    pub byte_offset: usize,
}

/// Sparse overlay on top of a base accessor.
#[derive(Clone, Debug, PartialEq)]
pub struct Sparse {
    /// Number of overlaid elements.
    pub count: usize,
    pub indices: SparseIndices,
    pub values: SparseValues,
}

/// A typed view into a buffer view.
#[derive(Clone, Debug, PartialEq)]
pub struct Accessor {
    /// The parent buffer view; absent for zero-initialized sparse accessors.
    pub buffer_view: Option<usize>,
    /// The offset relative to the start of the buffer view in bytes.
    pub byte_offset: usize,
    /// The number of elements, at least one.
    pub count: usize,
    pub type_: Type,
    pub component_type: ComponentType,
    /// Whether integer data should be mapped to `[0, 1]` or `[-1, 1]`.
    /// Never set for `UnsignedInt` or float accessors.
    pub normalized: bool,
    pub min: Option<Bounds>,
    pub max: Option<Bounds>,
    pub sparse: Option<Sparse>,
    pub name: Option<String>,
}

impl Accessor {
    /// Byte size of one whole element of this accessor.
    pub fn element_size(&self) -> usize {
        element_size(self.type_, self.component_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_type_table() {
        assert_eq!(
            ComponentType::from_gl_enum(5120),
            Some(ComponentType::Byte)
        );
        assert_eq!(
            ComponentType::from_gl_enum(5125),
            Some(ComponentType::UnsignedInt)
        );
        assert_eq!(
            ComponentType::from_gl_enum(5130),
            Some(ComponentType::Double)
        );
        assert_eq!(ComponentType::from_gl_enum(5127), None);
        assert_eq!(ComponentType::from_gl_enum(5131), None);
        assert_eq!(ComponentType::from_gl_enum(12), None);
    }

    #[test]
    fn element_sizes() {
        assert_eq!(element_size(Type::Vec3, ComponentType::Float), 12);
        assert_eq!(element_size(Type::Scalar, ComponentType::UnsignedShort), 2);
        assert_eq!(element_size(Type::Mat4, ComponentType::Float), 64);
    }
}
