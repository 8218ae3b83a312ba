//! The glTF node hierarchy.

use crate::math;

/// The transform of a node.
///
/// A node carries either a 4x4 column-major matrix or decomposed TRS
/// properties; the matrix form is converted on request (or eagerly with
/// [`Options::DECOMPOSE_NODE_MATRICES`](crate::Options::DECOMPOSE_NODE_MATRICES)).
#[derive(Clone, Debug, PartialEq)]
pub enum Transform {
    /// 4x4 transformation matrix in column-major order.
    Matrix {
        matrix: [[f32; 4]; 4],
    },
    /// Decomposed translation, rotation, and scale.
    Trs {
        /// `[x, y, z]` vector.
        translation: [f32; 3],
        /// `[x, y, z, w]` unit quaternion, `w` the scalar.
        rotation: [f32; 4],
        /// `[x, y, z]` vector.
        scale: [f32; 3],
    },
}

impl Transform {
    pub const IDENTITY: Transform = Transform::Trs {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Returns the matrix representation, composing `T * R * S` for the
    /// decomposed form.
    pub fn matrix(&self) -> [[f32; 4]; 4] {
        match *self {
            Transform::Matrix { matrix } => matrix,
            Transform::Trs {
                translation,
                rotation,
                scale,
            } => math::compose(translation, rotation, scale),
        }
    }

    /// Returns the decomposed representation, extracting it from the matrix
    /// form. Matrices with skew or shear decompose lossily.
    pub fn decomposed(&self) -> ([f32; 3], [f32; 4], [f32; 3]) {
        match *self {
            Transform::Matrix { matrix } => math::decompose(matrix),
            Transform::Trs {
                translation,
                rotation,
                scale,
            } => (translation, rotation, scale),
        }
    }
}

/// A node in the node hierarchy.
///
/// When a node has a skin it also has a mesh, and all the mesh's primitives
/// carry `JOINTS_0` and `WEIGHTS_0` attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub camera: Option<usize>,
    /// Child node indices.
    pub children: Vec<usize>,
    pub skin: Option<usize>,
    pub mesh: Option<usize>,
    /// `KHR_lights_punctual` light index.
    pub light: Option<usize>,
    pub transform: Transform,
    /// Morph target weights overriding the mesh defaults.
    pub weights: Vec<f32>,
    /// `EXT_mesh_gpu_instancing` attribute bindings in JSON insertion order.
    /// Instancing semantics (`TRANSLATION`, `ROTATION`, `SCALE`, custom) are
    /// kept as plain names.
    pub instancing_attributes: Vec<(String, usize)>,
    pub name: Option<String>,
}

/// The root nodes of a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub nodes: Vec<usize>,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_matrix_decomposes_to_identity_trs() {
        let transform = Transform::Matrix {
            matrix: math::Matrix4::IDENTITY.as_array(),
        };
        let (t, r, s) = transform.decomposed();
        assert_eq!(t, [0.0, 0.0, 0.0]);
        assert_eq!(r, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(s, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn trs_matrix_round_trips() {
        let transform = Transform::Trs {
            translation: [4.0, -2.0, 0.5],
            rotation: [0.0, std::f32::consts::FRAC_1_SQRT_2, 0.0, std::f32::consts::FRAC_1_SQRT_2],
            scale: [2.0, 2.0, 2.0],
        };
        let matrix = transform.matrix();
        let (t, r, s) = Transform::Matrix { matrix }.decomposed();
        let recomposed = Transform::Trs {
            translation: t,
            rotation: r,
            scale: s,
        }
        .matrix();
        for c in 0..4 {
            for row in 0..4 {
                assert_relative_eq!(
                    matrix[c][row],
                    recomposed[c][row],
                    epsilon = 10.0 * f32::EPSILON
                );
            }
        }
    }
}
