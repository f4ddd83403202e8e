use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CFA_CURRENCY_CODE: &str = "XOF";
pub const CFA_CURRENCY_CODE_LOWER: &str = "xof";

//--------------------------------------       Fcfa       ------------------------------------------------------------
/// An amount of CFA francs. The franc has no minor unit, so amounts are plain signed integers and all
/// arithmetic is exact. Percentage calculations round down to the nearest whole franc.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Fcfa(i64);

op!(binary Fcfa, Add, add);
op!(binary Fcfa, Sub, sub);
op!(inplace Fcfa, AddAssign, add_assign);
op!(inplace Fcfa, SubAssign, sub_assign);
op!(unary Fcfa, Neg, neg);

impl Mul<i64> for Fcfa {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Fcfa {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in CFA francs: {0}")]
pub struct FcfaConversionError(String);

impl From<i64> for Fcfa {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Fcfa {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Fcfa {}

impl TryFrom<u64> for Fcfa {
    type Error = FcfaConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(FcfaConversionError(format!("Value {} is too large to convert to Fcfa", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            let value = value as i64;
            Ok(Self(value))
        }
    }
}

impl Display for Fcfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} FCFA", self.0)
    }
}

impl Fcfa {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns `rate` percent of this amount, rounded down to the nearest whole franc.
    pub fn percent(&self, rate: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let share = (self.0 as f64 * rate / 100.0).floor() as i64;
        Self(share)
    }

    /// Clamps negative amounts to zero.
    pub fn max_zero(self) -> Self {
        Self(self.0.max(0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn percent_rounds_down() {
        assert_eq!(Fcfa::from(10_000).percent(10.0), Fcfa::from(1_000));
        assert_eq!(Fcfa::from(1_000).percent(10.0), Fcfa::from(100));
        assert_eq!(Fcfa::from(999).percent(10.0), Fcfa::from(99));
        assert_eq!(Fcfa::from(5).percent(12.5), Fcfa::from(0));
    }

    #[test]
    fn arithmetic() {
        let mut total = Fcfa::from(2_500) * 2;
        assert_eq!(total, Fcfa::from(5_000));
        total -= Fcfa::from(500);
        assert_eq!(total, Fcfa::from(4_500));
        assert_eq!((Fcfa::from(100) - Fcfa::from(300)).max_zero(), Fcfa::zero());
        let sum: Fcfa = [Fcfa::from(1), Fcfa::from(2), Fcfa::from(3)].into_iter().sum();
        assert_eq!(sum, Fcfa::from(6));
    }

    #[test]
    fn display() {
        assert_eq!(Fcfa::from(4_500).to_string(), "4500 FCFA");
    }
}
