//! Buffers, buffer views, and the data-source union describing where their
//! bytes live.

use crate::uri::UriBuf;

/// `GL_ARRAY_BUFFER`.
pub const ARRAY_BUFFER: u32 = 34_962;

/// `GL_ELEMENT_ARRAY_BUFFER`.
pub const ELEMENT_ARRAY_BUFFER: u32 = 34_963;

/// Optional GPU binding hint for a buffer view.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    /// Vertex attribute data.
    ArrayBuffer,
    /// Index data.
    ElementArrayBuffer,
}

impl Target {
    pub fn from_gl_enum(value: u64) -> Option<Self> {
        match value as u32 {
            ARRAY_BUFFER => Some(Target::ArrayBuffer),
            ELEMENT_ARRAY_BUFFER => Some(Target::ElementArrayBuffer),
            _ => None,
        }
    }

    pub fn as_gl_enum(self) -> u32 {
        match self {
            Target::ArrayBuffer => ARRAY_BUFFER,
            Target::ElementArrayBuffer => ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// MIME types the loader records. It never inspects the payload.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MimeType {
    #[default]
    None,
    Jpeg,
    Png,
    Ktx2,
    Dds,
    GltfBuffer,
    OctetStream,
    Webp,
}

impl MimeType {
    pub fn from_str(value: &str) -> Self {
        match value {
            "image/jpeg" => MimeType::Jpeg,
            "image/png" => MimeType::Png,
            "image/ktx2" => MimeType::Ktx2,
            "image/vnd-ms.dds" => MimeType::Dds,
            "application/gltf-buffer" => MimeType::GltfBuffer,
            "application/octet-stream" => MimeType::OctetStream,
            "image/webp" => MimeType::Webp,
            _ => MimeType::None,
        }
    }

    pub fn as_str(self) -> Option<&'static str> {
        match self {
            MimeType::None => None,
            MimeType::Jpeg => Some("image/jpeg"),
            MimeType::Png => Some("image/png"),
            MimeType::Ktx2 => Some("image/ktx2"),
            MimeType::Dds => Some("image/vnd-ms.dds"),
            MimeType::GltfBuffer => Some("application/gltf-buffer"),
            MimeType::OctetStream => Some("application/octet-stream"),
            MimeType::Webp => Some("image/webp"),
        }
    }
}

/// Describes where the bytes of a buffer or image live.
///
/// A successfully parsed asset never contains [`DataSource::None`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DataSource {
    /// Nothing attached (yet).
    #[default]
    None,
    /// Bytes live in a buffer view of this asset. Images only.
    BufferView {
        buffer_view: usize,
        mime_type: MimeType,
    },
    /// Bytes live behind an unresolved URI.
    Uri {
        /// Offset into the referenced file, nonzero for GLB-embedded data.
        file_byte_offset: u64,
        uri: UriBuf,
        mime_type: MimeType,
    },
    /// Bytes owned by the asset.
    Bytes {
        bytes: Vec<u8>,
        mime_type: MimeType,
    },
    /// Bytes live in host-managed memory registered under `id`.
    CustomBuffer {
        id: u64,
        mime_type: MimeType,
    },
    /// A meshopt fallback buffer that intentionally carries no payload.
    Fallback,
}

/// Meshopt compression mode of a compressed buffer view.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressionMode {
    Attributes,
    Triangles,
    Indices,
}

impl CompressionMode {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "ATTRIBUTES" => Some(CompressionMode::Attributes),
            "TRIANGLES" => Some(CompressionMode::Triangles),
            "INDICES" => Some(CompressionMode::Indices),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionMode::Attributes => "ATTRIBUTES",
            CompressionMode::Triangles => "TRIANGLES",
            CompressionMode::Indices => "INDICES",
        }
    }
}

/// Meshopt compression filter of a compressed buffer view.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionFilter {
    #[default]
    None,
    Octahedral,
    Quaternion,
    Exponential,
}

impl CompressionFilter {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "NONE" => Some(CompressionFilter::None),
            "OCTAHEDRAL" => Some(CompressionFilter::Octahedral),
            "QUATERNION" => Some(CompressionFilter::Quaternion),
            "EXPONENTIAL" => Some(CompressionFilter::Exponential),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionFilter::None => "NONE",
            CompressionFilter::Octahedral => "OCTAHEDRAL",
            CompressionFilter::Quaternion => "QUATERNION",
            CompressionFilter::Exponential => "EXPONENTIAL",
        }
    }
}

/// `EXT_meshopt_compression` metadata attached to a buffer view. The payload
/// itself is opaque to the loader; decompression is the host's concern.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedView {
    /// Index of the buffer holding the compressed payload.
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Number of elements after decompression.
    pub count: usize,
    pub mode: CompressionMode,
    pub filter: CompressionFilter,
    pub byte_stride: usize,
}

/// A contiguous window into a buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Distance between elements, `4..=252` and a multiple of four.
    pub byte_stride: Option<usize>,
    pub target: Option<Target>,
    /// Present when the view is meshopt-compressed.
    pub meshopt_compression: Option<CompressedView>,
    pub name: Option<String>,
}

/// A linear array of raw bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer {
    pub byte_length: usize,
    pub data: DataSource,
    pub name: Option<String>,
}

impl Buffer {
    /// The owned bytes, when the source owns any.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.data {
            DataSource::Bytes { bytes, .. } => Some(bytes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_round_trip() {
        for mime in [
            MimeType::Jpeg,
            MimeType::Png,
            MimeType::Ktx2,
            MimeType::Dds,
            MimeType::GltfBuffer,
            MimeType::OctetStream,
            MimeType::Webp,
        ] {
            let text = mime.as_str().unwrap();
            assert_eq!(MimeType::from_str(text), mime);
        }
        assert_eq!(MimeType::from_str("application/x-unknown"), MimeType::None);
    }

    #[test]
    fn target_enums() {
        assert_eq!(Target::from_gl_enum(34962), Some(Target::ArrayBuffer));
        assert_eq!(
            Target::from_gl_enum(34963),
            Some(Target::ElementArrayBuffer)
        );
        assert_eq!(Target::from_gl_enum(0), None);
    }
}
