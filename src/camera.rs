//! Cameras and their projections.

/// Values for a perspective projection.
#[derive(Clone, Debug, PartialEq)]
pub struct Perspective {
    /// Aspect ratio of the field of view.
    pub aspect_ratio: Option<f32>,
    /// Vertical field of view in radians, greater than zero.
    pub yfov: f32,
    /// Distance to the far clipping plane; an infinite projection when
    /// absent.
    pub zfar: Option<f32>,
    /// Distance to the near clipping plane, greater than zero.
    pub znear: f32,
}

/// Values for an orthographic projection.
#[derive(Clone, Debug, PartialEq)]
pub struct Orthographic {
    /// Horizontal magnification, nonzero.
    pub xmag: f32,
    /// Vertical magnification, nonzero.
    pub ymag: f32,
    pub zfar: f32,
    pub znear: f32,
}

/// The projection of a camera node.
#[derive(Clone, Debug, PartialEq)]
pub enum Projection {
    Perspective(Perspective),
    Orthographic(Orthographic),
}

/// A camera's projection and name.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub projection: Projection,
    pub name: Option<String>,
}
