use num_traits::{One, Zero};
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

/// A trait for types the basis evaluator can run on.
/// Implemented by `f64` for plain evaluation and by `Dual` when a
/// directional derivative is carried alongside the value.
pub trait Scalar:
    Copy
    + Debug
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Lifts a constant into the scalar type.
    fn constant(value: f64) -> Self;

    /// Real part of the scalar.
    fn value(self) -> f64;

    /// Multiplies by a plain constant.
    fn scale(self, factor: f64) -> Self {
        self * Self::constant(factor)
    }
}

impl Scalar for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    fn value(self) -> f64 {
        self
    }

    fn scale(self, factor: f64) -> Self {
        self * factor
    }
}
