//! Keyframe animations, their channels and samplers.

/// The node property a channel animates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Path {
    Translation,
    Rotation,
    Scale,
    Weights,
}

impl Path {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "translation" => Some(Path::Translation),
            "rotation" => Some(Path::Rotation),
            "scale" => Some(Path::Scale),
            "weights" => Some(Path::Weights),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Path::Translation => "translation",
            Path::Rotation => "rotation",
            Path::Scale => "scale",
            Path::Weights => "weights",
        }
    }
}

/// Keyframe interpolation algorithm.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

impl Interpolation {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "LINEAR" => Some(Interpolation::Linear),
            "STEP" => Some(Interpolation::Step),
            "CUBICSPLINE" => Some(Interpolation::CubicSpline),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interpolation::Linear => "LINEAR",
            Interpolation::Step => "STEP",
            Interpolation::CubicSpline => "CUBICSPLINE",
        }
    }
}

/// Targets an animation sampler at a node property.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub sampler: usize,
    /// The node to animate; may be absent when an extension supplies the
    /// target instead.
    pub node: Option<usize>,
    pub path: Path,
}

/// Combines timestamps with a sequence of output values.
#[derive(Clone, Debug, PartialEq)]
pub struct Sampler {
    /// Accessor with keyframe timestamps, scalar float, strictly increasing.
    pub input: usize,
    /// Accessor with keyframe output values.
    pub output: usize,
    pub interpolation: Interpolation,
}

/// A keyframe animation.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    pub channels: Vec<Channel>,
    pub samplers: Vec<Sampler>,
    pub name: Option<String>,
}
