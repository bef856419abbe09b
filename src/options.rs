//! Solver tunables.

/// Default values
pub mod defaults {
    /// Determinant magnitude at or below which a matrix counts as singular
    pub const EPSILON: f64 = 1e-10;
}

/// How the rotate gesture turns two drag vectors into an angle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RotationSense {
    /// `acos` of the normalized dot product; always in `[0, π]`, so dragging
    /// clockwise and counter-clockwise rotate the same way
    #[default]
    Unsigned,
    /// Same magnitude, signed by the cross product of the drag vectors
    Signed,
}

/// Options shared by the drag resolver and the solver
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Options {
    pub epsilon: f64,
    pub rotation: RotationSense,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            epsilon: defaults::EPSILON,
            rotation: RotationSense::default(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationSense) -> Self {
        self.rotation = rotation;
        self
    }
}
