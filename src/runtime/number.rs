//! Number capability: the arithmetic the interpreter delegates to.
use std::cmp::Ordering;

use crate::runtime::error::Fault;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Integer(v) => v == 0,
            Number::Float(v) => v == 0.0,
        }
    }

    /// Integer ops that overflow fall back to float arithmetic.
    fn combine(
        self,
        other: Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Number {
        match (self, other) {
            (Number::Integer(l), Number::Integer(r)) => match int_op(l, r) {
                Some(v) => Number::Integer(v),
                None => Number::Float(float_op(l as f64, r as f64)),
            },
            (l, r) => Number::Float(float_op(l.as_f64(), r.as_f64())),
        }
    }

    pub fn add(self, other: Number) -> Number {
        self.combine(other, i64::checked_add, |l, r| l + r)
    }

    pub fn sub(self, other: Number) -> Number {
        self.combine(other, i64::checked_sub, |l, r| l - r)
    }

    pub fn mul(self, other: Number) -> Number {
        self.combine(other, i64::checked_mul, |l, r| l * r)
    }

    /// Exact integer quotients stay integers.
    pub fn div(self, other: Number) -> Result<Number, Fault> {
        if other.is_zero() {
            return Err(Fault::DivideByZero);
        }
        Ok(match (self, other) {
            (Number::Integer(l), Number::Integer(r)) if l.checked_rem(r) == Some(0) => {
                match l.checked_div(r) {
                    Some(q) => Number::Integer(q),
                    None => Number::Float(l as f64 / r as f64),
                }
            }
            (l, r) => Number::Float(l.as_f64() / r.as_f64()),
        })
    }

    pub fn rem(self, other: Number) -> Result<Number, Fault> {
        if other.is_zero() {
            return Err(Fault::DivideByZero);
        }
        Ok(match (self, other) {
            (Number::Integer(l), Number::Integer(r)) => match l.checked_rem(r) {
                Some(v) => Number::Integer(v),
                None => Number::Integer(0),
            },
            (l, r) => Number::Float(l.as_f64() % r.as_f64()),
        })
    }

    pub fn neg(self) -> Number {
        match self {
            Number::Integer(v) => match v.checked_neg() {
                Some(n) => Number::Integer(n),
                None => Number::Float(-(v as f64)),
            },
            Number::Float(v) => Number::Float(-v),
        }
    }

    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(l), Number::Integer(r)) => Some(l.cmp(&r)),
            (l, r) => l.as_f64().partial_cmp(&r.as_f64()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_overflow_promotes_to_float() {
        let n = Number::Integer(i64::MAX).add(Number::Integer(1));
        assert!(matches!(n, Number::Float(_)));
    }

    #[test]
    fn inexact_division_yields_float() {
        assert_eq!(
            Number::Integer(6).div(Number::Integer(3)).unwrap(),
            Number::Integer(2)
        );
        assert_eq!(
            Number::Integer(7).div(Number::Integer(2)).unwrap(),
            Number::Float(3.5)
        );
    }

    #[test]
    fn division_by_zero_faults() {
        assert_eq!(
            Number::Integer(1).div(Number::Integer(0)).unwrap_err(),
            Fault::DivideByZero
        );
        assert_eq!(
            Number::Float(1.0).rem(Number::Float(0.0)).unwrap_err(),
            Fault::DivideByZero
        );
    }

    #[test]
    fn mixed_comparison() {
        assert_eq!(
            Number::Integer(2).compare(Number::Float(2.5)),
            Some(Ordering::Less)
        );
    }
}
