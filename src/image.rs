//! Images that may be used by textures.
//!
//! The loader records where the pixel bytes live and their MIME type; it
//! never decodes them.

use crate::buffer::DataSource;

/// Image data used to create a texture.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub data: DataSource,
    pub name: Option<String>,
}
