//! 2x2 unitary algebra for rotation merging.
//!
//! Every rotation-class gate name maps to a fixed matrix; runs of such gates
//! are multiplied out and compared against the identity or another gate,
//! always up to global phase.

use num_complex::Complex64;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Tolerance for floating point comparisons.
const EPSILON: f64 = 1e-9;

/// Rotation-class gate names in merge preference order.
///
/// When two merge candidates have equal duration, the one listed first wins.
pub const ROTATION_GATES: &[&str] = &[
    "i", "identity", "x", "rx180", "y", "ry180", "z", "h", "s", "sdag", "t", "tdag", "rx90", "x90",
    "ry90", "y90", "mrx90", "xm90", "mry90", "ym90",
];

/// A 2x2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct Unitary2x2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a new 2x2 unitary matrix.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// The identity matrix.
    pub fn identity() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0))
    }

    fn diagonal(d: Complex64) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        Self::new(Complex64::new(1.0, 0.0), zero, zero, d)
    }

    /// Hadamard.
    pub fn h() -> Self {
        let s = 1.0 / 2.0_f64.sqrt();
        Self::new(
            Complex64::new(s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(-s, 0.0),
        )
    }

    /// Rotation about X by `theta`.
    pub fn rx(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(0.0, -s),
            Complex64::new(0.0, -s),
            Complex64::new(c, 0.0),
        )
    }

    /// Rotation about Y by `theta`.
    pub fn ry(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(-s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(c, 0.0),
        )
    }

    /// Phase gate diag(1, e^{i lambda}).
    pub fn phase(lambda: f64) -> Self {
        Self::diagonal(Complex64::from_polar(1.0, lambda))
    }

    /// The matrix of a rotation-class gate, by normalized name.
    pub fn for_gate(name: &str) -> Option<Self> {
        let u = match name {
            "i" | "identity" => Self::identity(),
            "x" | "rx180" => Self::rx(PI),
            "y" | "ry180" => Self::ry(PI),
            "z" => Self::phase(PI),
            "h" => Self::h(),
            "s" => Self::phase(FRAC_PI_2),
            "sdag" => Self::phase(-FRAC_PI_2),
            "t" => Self::phase(FRAC_PI_4),
            "tdag" => Self::phase(-FRAC_PI_4),
            "rx90" | "x90" => Self::rx(FRAC_PI_2),
            "ry90" | "y90" => Self::ry(FRAC_PI_2),
            "mrx90" | "xm90" => Self::rx(-FRAC_PI_2),
            "mry90" | "ym90" => Self::ry(-FRAC_PI_2),
            _ => return None,
        };
        Some(u)
    }

    /// Multiply this matrix by another: self * other.
    #[allow(clippy::many_single_char_names)]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// The conjugate transpose.
    pub fn dagger(&self) -> Self {
        Self::new(
            self.data[0].conj(),
            self.data[2].conj(),
            self.data[1].conj(),
            self.data[3].conj(),
        )
    }

    /// Check if this is approximately identity (up to global phase).
    pub fn is_identity(&self) -> bool {
        let [a, b, c, d] = self.data;
        if b.norm() > EPSILON || c.norm() > EPSILON {
            return false;
        }
        (a - d).norm() < EPSILON
    }

    /// Check whether `self` and `other` differ only by a global phase.
    pub fn equals_up_to_phase(&self, other: &Self) -> bool {
        self.mul(&other.dagger()).is_identity()
    }

    /// Product of gates applied in sequence: the last gate multiplies leftmost.
    pub fn sequence<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        names
            .into_iter()
            .try_fold(Self::identity(), |acc, name| Some(Self::for_gate(name)?.mul(&acc)))
    }
}
