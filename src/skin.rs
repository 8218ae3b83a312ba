//! Mesh skinning primitives.

/// Joints and matrices defining a skin.
#[derive(Clone, Debug, PartialEq)]
pub struct Skin {
    /// Accessor with one inverse bind matrix per joint; identity matrices
    /// when absent.
    pub inverse_bind_matrices: Option<usize>,
    /// Node used as the skeleton root.
    pub skeleton: Option<usize>,
    /// Nodes used as joints, in `JOINTS_0` index order.
    pub joints: Vec<usize>,
    pub name: Option<String>,
}
