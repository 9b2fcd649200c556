use crate::traits::Scalar;
use num_traits::{One, Zero};
use std::ops::{Add, Mul, Neg, Sub};

/// Simple Dual Number for Forward Mode AD
/// val: real part
/// eps: derivative along the seeded direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual {
    pub val: f64,
    pub eps: f64,
}

impl Dual {
    pub fn new(val: f64, eps: f64) -> Self {
        Self { val, eps }
    }

    /// Seeds a coordinate `x` moving with speed `dx`.
    pub fn variable(x: f64, dx: f64) -> Self {
        Self::new(x, dx)
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
    fn is_zero(&self) -> bool {
        self.val == 0.0 && self.eps == 0.0
    }
}

impl One for Dual {
    fn one() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl Add for Dual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.val + rhs.val, self.eps + rhs.eps)
    }
}

impl Sub for Dual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.val - rhs.val, self.eps - rhs.eps)
    }
}

impl Mul for Dual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.val * rhs.val, self.val * rhs.eps + self.eps * rhs.val)
    }
}

impl Neg for Dual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.val, -self.eps)
    }
}

impl Scalar for Dual {
    fn constant(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    fn value(self) -> f64 {
        self.val
    }

    fn scale(self, factor: f64) -> Self {
        Self::new(self.val * factor, self.eps * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::Dual;
    use crate::traits::Scalar;

    #[test]
    fn product_rule_matches_hand_derivative() {
        // d/dx (x^2 + 3x) at x = 2 is 7
        let x = Dual::variable(2.0, 1.0);
        let y = x * x + x.scale(3.0);
        assert_eq!(y.val, 10.0);
        assert_eq!(y.eps, 7.0);
    }

    #[test]
    fn constants_carry_no_derivative() {
        let c = Dual::constant(4.5);
        assert_eq!(c.eps, 0.0);
        let x = Dual::variable(1.0, 2.0);
        let y = (x - c) * c;
        assert!((y.eps - 9.0).abs() < 1e-15);
    }
}
