//! Minimal linear-algebra kernel backing node transforms.
//!
//! Matrices are column-major, matching the glTF JSON layout. Quaternions are
//! stored `(x, y, z, w)` in the public API; internally the scalar part is
//! kept separate. Only the operations the loader itself needs live here;
//! rendering math belongs to the consumer.

use std::ops::{Index, IndexMut, Mul};

/// 3D vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn magnitude(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Self {
        self.multiply(1.0 / self.magnitude())
    }

    pub fn multiply(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    pub fn as_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Quaternion with separate scalar part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    /// Scalar part.
    pub s: f32,
    /// Vector part.
    pub v: Vector3,
}

impl Quaternion {
    pub fn new(s: f32, x: f32, y: f32, z: f32) -> Self {
        Self {
            s,
            v: Vector3::new(x, y, z),
        }
    }

    /// `[x, y, z, w]` with `w` the scalar, the glTF component order.
    pub fn as_array(self) -> [f32; 4] {
        [self.v.x, self.v.y, self.v.z, self.s]
    }

    /// Recovers a unit quaternion from a pure rotation matrix by taking the
    /// signed square roots of the four `1 ± trace` diagonals and fixing the
    /// hemisphere from the off-diagonal differences.
    pub fn from_matrix(m: Matrix3) -> Self {
        let sqrt_half = |t: f32| ((t.max(0.0) as f64).sqrt() / 2.0) as f32;
        let x = sqrt_half(1.0 + m.x.x - m.y.y - m.z.z).copysign(m.y.z - m.z.y);
        let y = sqrt_half(1.0 - m.x.x + m.y.y - m.z.z).copysign(m.z.x - m.x.z);
        let z = sqrt_half(1.0 - m.x.x - m.y.y + m.z.z).copysign(m.x.y - m.y.x);
        let s = sqrt_half(1.0 + m.x.x + m.y.y + m.z.z);
        Self::new(s, x, y, z)
    }
}

/// 3x3 column-major matrix; fields are columns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix3 {
    pub x: Vector3,
    pub y: Vector3,
    pub z: Vector3,
}

impl Matrix3 {
    /// Constructs from elements given column by column.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        c0r0: f32,
        c0r1: f32,
        c0r2: f32,
        c1r0: f32,
        c1r1: f32,
        c1r2: f32,
        c2r0: f32,
        c2r1: f32,
        c2r2: f32,
    ) -> Self {
        Self {
            x: Vector3::new(c0r0, c0r1, c0r2),
            y: Vector3::new(c1r0, c1r1, c1r2),
            z: Vector3::new(c2r0, c2r1, c2r2),
        }
    }

    pub fn determinant(&self) -> f32 {
        self.x.dot(self.y.cross(self.z))
    }
}

/// 4x4 column-major matrix; the outer array indexes columns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4([[f32; 4]; 4]);

impl Matrix4 {
    pub const IDENTITY: Matrix4 = Matrix4([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub fn from_array(columns: [[f32; 4]; 4]) -> Self {
        Self(columns)
    }

    pub fn as_array(self) -> [[f32; 4]; 4] {
        self.0
    }

    pub fn from_translation(t: Vector3) -> Self {
        let mut m = Self::IDENTITY;
        m.0[3] = [t.x, t.y, t.z, 1.0];
        m
    }

    pub fn from_nonuniform_scale(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.0[0][0] = x;
        m.0[1][1] = y;
        m.0[2][2] = z;
        m
    }

    pub fn from_quaternion(q: Quaternion) -> Self {
        let (x, y, z, w) = (q.v.x, q.v.y, q.v.z, q.s);
        Self([
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y + w * z),
                2.0 * (x * z - w * y),
                0.0,
            ],
            [
                2.0 * (x * y - w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z + w * x),
                0.0,
            ],
            [
                2.0 * (x * z + w * y),
                2.0 * (y * z - w * x),
                1.0 - 2.0 * (x * x + y * y),
                0.0,
            ],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn transpose(self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for (c, column) in self.0.iter().enumerate() {
            for (r, &value) in column.iter().enumerate() {
                out[r][c] = value;
            }
        }
        Self(out)
    }
}

impl Index<usize> for Matrix4 {
    type Output = [f32; 4];

    fn index(&self, column: usize) -> &[f32; 4] {
        &self.0[column]
    }
}

impl IndexMut<usize> for Matrix4 {
    fn index_mut(&mut self, column: usize) -> &mut [f32; 4] {
        &mut self.0[column]
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    /// `ret.col(i)[j] = dot(self.row(j), other.col(i))`.
    fn mul(self, other: Matrix4) -> Matrix4 {
        let mut out = [[0.0f32; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                out[i][j] = (0..4).map(|k| self.0[k][j] * other.0[i][k]).sum();
            }
        }
        Matrix4(out)
    }
}

/// Composes `translation * rotation * scale` into a column-major matrix.
pub fn compose(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> [[f32; 4]; 4] {
    let t = Matrix4::from_translation(translation.into());
    let r = Matrix4::from_quaternion(Quaternion::new(
        rotation[3],
        rotation[0],
        rotation[1],
        rotation[2],
    ));
    let s = Matrix4::from_nonuniform_scale(scale[0], scale[1], scale[2]);
    (t * r * s).as_array()
}

/// Splits an affine column-major matrix into translation, rotation and
/// scale. Skew and shear are not representable; matrices carrying them
/// decompose lossily.
pub fn decompose(m: [[f32; 4]; 4]) -> ([f32; 3], [f32; 4], [f32; 3]) {
    let translation = [m[3][0], m[3][1], m[3][2]];
    #[rustfmt::skip]
    let mut i = Matrix3::new(
        m[0][0], m[0][1], m[0][2],
        m[1][0], m[1][1], m[1][2],
        m[2][0], m[2][1], m[2][2],
    );
    let sx = i.x.magnitude();
    let sy = i.y.magnitude();
    let sz = i.determinant().signum() * i.z.magnitude();
    let scale = [sx, sy, sz];
    i.x = i.x.multiply(1.0 / sx);
    i.y = i.y.multiply(1.0 / sy);
    i.z = i.z.multiply(1.0 / sz);
    let r = Quaternion::from_matrix(i);
    (translation, r.as_array(), scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn check_roundtrip(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) {
        let matrix = compose(translation, rotation, scale);
        let (t, r, s) = decompose(matrix);
        let recomposed = compose(t, r, s);
        for c in 0..4 {
            for row in 0..4 {
                assert_relative_eq!(
                    matrix[c][row],
                    recomposed[c][row],
                    epsilon = 10.0 * f32::EPSILON
                );
            }
        }
        assert_eq!(t, translation);
    }

    #[test]
    fn identity() {
        check_roundtrip([0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0]);
    }

    #[test]
    fn translation_only() {
        check_roundtrip([1.0, -2.5, 3.25], [0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0]);
    }

    #[test]
    fn rotation_only() {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        check_roundtrip([0.0, 0.0, 0.0], [half, 0.0, 0.0, half], [1.0, 1.0, 1.0]);
        check_roundtrip([0.0, 0.0, 0.0], [0.0, half, 0.0, half], [1.0, 1.0, 1.0]);
        check_roundtrip([0.0, 0.0, 0.0], [0.0, 0.0, half, half], [1.0, 1.0, 1.0]);
    }

    #[test]
    fn nonuniform_scale() {
        check_roundtrip([0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0], [2.0, 0.5, 4.0]);
    }

    #[test]
    fn combined() {
        let q: [f32; 4] = [0.259, 0.0, 0.0, 0.966];
        let len = (q[0] * q[0] + q[3] * q[3]).sqrt();
        let q = [q[0] / len, 0.0, 0.0, q[3] / len];
        check_roundtrip([-90.59, -24.38, -40.06], q, [1.5, 1.5, 1.5]);
    }

    #[test]
    fn cross_product_handedness() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn matrix_multiply_identity() {
        let m = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!((Matrix4::IDENTITY * m).as_array(), m.as_array());
        assert_eq!((m * Matrix4::IDENTITY).as_array(), m.as_array());
    }

    #[test]
    fn transpose_involution() {
        let m = Matrix4::from_array([
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ]);
        assert_eq!(m.transpose().transpose(), m);
    }
}
