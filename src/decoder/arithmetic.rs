//! LDPC decoder arithmetic.
//!
//! This module contains the trait [`Llr`], which abstracts the numeric
//! representation used by the belief propagation decoders for LLRs and
//! messages, and its implementations:
//!
//! - `f32` and `f64`: unbounded floating point. Additions are plain
//!   floating point additions and normalization is a multiplication.
//! - `i8`, `i16` and `i32`: saturating fixed point with a symmetric range
//!   `[-MAX, MAX]` (so the most negative two's complement value is never
//!   used). The number of fractional bits of each type is given by
//!   [`Llr::FRAC_BITS`]. Normalization is only possible by multiples of 1/8,
//!   which are computed exactly with arithmetic shifts.
//!
//! The decoders are generic over `Llr`, so they get monomorphized for each
//! representation.

use super::Error;
use num_traits::Zero;

/// Numeric representation of LLRs and messages.
///
/// The LLR convention is `log(P(bit = 0) / P(bit = 1))`, so a negative LLR
/// gives a hard decision equal to one.
pub trait Llr:
    std::fmt::Debug + Copy + Default + PartialOrd + Zero + Send + Sync + 'static
{
    /// `true` for saturating fixed point representations.
    const FIXED_POINT: bool;
    /// Number of bits of the representation.
    const BITS: u32;
    /// Number of fractional bits of a fixed point representation.
    ///
    /// This is zero for floating point representations.
    const FRAC_BITS: u32;

    /// Largest representable value (`val_max`).
    fn val_max() -> Self;

    /// Smallest representable value (`val_min`), equal to `-val_max`.
    fn val_min() -> Self;

    /// Quantizes a real LLR into this representation.
    ///
    /// Fixed point representations round to the nearest step and saturate to
    /// `[val_min, val_max]`.
    fn from_f64(llr: f64) -> Self;

    /// Converts to a real LLR.
    fn to_f64(self) -> f64;

    /// Clamps a value into the symmetric range `[val_min, val_max]`.
    fn saturate(self) -> Self;

    /// Saturating addition.
    fn sat_add(self, rhs: Self) -> Self;

    /// Saturating subtraction.
    fn sat_sub(self, rhs: Self) -> Self;

    /// Absolute value.
    fn abs(self) -> Self;

    /// Negation.
    fn neg(self) -> Self;

    /// Multiplication by a normalization factor.
    fn normalize(self, factor: Normalization) -> Self;

    /// Returns `true` if the value is strictly negative.
    fn is_negative(self) -> bool {
        self < Self::zero()
    }

    /// Hard decision: 1 for negative LLRs, 0 otherwise.
    fn hard_decision(self) -> u8 {
        u8::from(self.is_negative())
    }
}

/// Normalization factor of the normalized min-sum rule.
///
/// A `Normalization` is validated against an [`Llr`] representation when it
/// is created. Floating point representations accept any finite factor.
/// Fixed point representations only accept the factors 0.125, 0.25, 0.375,
/// 0.5, 0.625, 0.75, 0.875 and 1.0.
///
/// # Examples
/// ```
/// # use ldpc_bp::decoder::arithmetic::{Llr, Normalization};
/// let half = Normalization::new::<i16>(0.5)?;
/// assert_eq!(80i16.normalize(half), 40);
/// assert!(Normalization::new::<i16>(0.8).is_err());
/// assert!(Normalization::new::<f32>(0.8).is_ok());
/// # Ok::<(), ldpc_bp::decoder::Error>(())
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Normalization {
    factor: f32,
    // factor * 8, only meaningful in fixed point
    eighths: u8,
}

impl Normalization {
    /// The identity normalization (factor 1.0).
    pub const IDENTITY: Normalization = Normalization {
        factor: 1.0,
        eighths: 8,
    };

    /// Creates a normalization factor valid for the representation `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedNormalizationFactor`] if the factor is not
    /// finite, or if `T` is fixed point and the factor is not one of the eight
    /// legal multiples of 1/8.
    pub fn new<T: Llr>(factor: f32) -> Result<Normalization, Error> {
        if !factor.is_finite() {
            return Err(Error::UnsupportedNormalizationFactor(factor));
        }
        let scaled = factor * 8.0;
        let legal_eighth = scaled == scaled.round() && (1.0..=8.0).contains(&scaled);
        if T::FIXED_POINT && !legal_eighth {
            return Err(Error::UnsupportedNormalizationFactor(factor));
        }
        Ok(Normalization {
            factor,
            eighths: if legal_eighth { scaled as u8 } else { 0 },
        })
    }

    /// Returns the normalization factor.
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Returns `true` if this is the factor 1.0.
    pub fn is_identity(&self) -> bool {
        self.factor == 1.0
    }
}

impl Default for Normalization {
    fn default() -> Normalization {
        Normalization::IDENTITY
    }
}

macro_rules! impl_llr_float {
    ($f:ty, $bits:expr, $to_factor:expr) => {
        impl Llr for $f {
            const FIXED_POINT: bool = false;
            const BITS: u32 = $bits;
            const FRAC_BITS: u32 = 0;

            fn val_max() -> $f {
                <$f>::MAX
            }

            fn val_min() -> $f {
                -<$f>::MAX
            }

            fn from_f64(llr: f64) -> $f {
                // Infinite LLRs are mapped to the extreme finite values so that
                // the variable node subtractions never compute inf - inf.
                (llr as $f).clamp(-<$f>::MAX, <$f>::MAX)
            }

            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            fn saturate(self) -> $f {
                self.clamp(-<$f>::MAX, <$f>::MAX)
            }

            fn sat_add(self, rhs: $f) -> $f {
                self + rhs
            }

            fn sat_sub(self, rhs: $f) -> $f {
                self - rhs
            }

            fn abs(self) -> $f {
                <$f>::abs(self)
            }

            fn neg(self) -> $f {
                -self
            }

            fn normalize(self, factor: Normalization) -> $f {
                self * $to_factor(factor.factor)
            }
        }
    };
}

impl_llr_float!(f32, 32, std::convert::identity);
impl_llr_float!(f64, 64, f64::from);

macro_rules! impl_llr_fixed {
    ($t:ty, $frac_bits:expr) => {
        impl Llr for $t {
            const FIXED_POINT: bool = true;
            const BITS: u32 = <$t>::BITS;
            const FRAC_BITS: u32 = $frac_bits;

            fn val_max() -> $t {
                <$t>::MAX
            }

            fn val_min() -> $t {
                -<$t>::MAX
            }

            fn from_f64(llr: f64) -> $t {
                let x = (llr * f64::from(1u32 << $frac_bits)).round();
                // NaN casts to zero
                x.clamp(-f64::from(<$t>::MAX), f64::from(<$t>::MAX)) as $t
            }

            fn to_f64(self) -> f64 {
                f64::from(self) / f64::from(1u32 << $frac_bits)
            }

            fn saturate(self) -> $t {
                self.max(-<$t>::MAX)
            }

            fn sat_add(self, rhs: $t) -> $t {
                self.saturating_add(rhs).max(-<$t>::MAX)
            }

            fn sat_sub(self, rhs: $t) -> $t {
                self.saturating_sub(rhs).max(-<$t>::MAX)
            }

            fn abs(self) -> $t {
                self.saturating_abs()
            }

            fn neg(self) -> $t {
                self.saturating_neg()
            }

            fn normalize(self, factor: Normalization) -> $t {
                let n = factor.eighths;
                if n & 8 != 0 {
                    return self;
                }
                let mut acc: $t = 0;
                if n & 4 != 0 {
                    acc += self >> 1;
                }
                if n & 2 != 0 {
                    acc += self >> 2;
                }
                if n & 1 != 0 {
                    acc += self >> 3;
                }
                acc
            }
        }
    };
}

impl_llr_fixed!(i8, 2);
impl_llr_fixed!(i16, 3);
impl_llr_fixed!(i32, 6);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixed_point_quantization() {
        assert_eq!(i8::from_f64(1.0), 4);
        assert_eq!(i8::from_f64(-1.1), -4);
        assert_eq!(i8::from_f64(1000.0), 127);
        assert_eq!(i8::from_f64(-1000.0), -127);
        assert_eq!(i8::from_f64(f64::NAN), 0);
        assert_eq!(i16::from_f64(2.5), 20);
        assert_eq!(i32::from_f64(-0.5), -32);
        assert_eq!(i16::from_f64(2.5).to_f64(), 2.5);
    }

    #[test]
    fn fixed_point_saturation_is_symmetric() {
        assert_eq!(100i8.sat_add(100), 127);
        assert_eq!((-100i8).sat_add(-100), -127);
        assert_eq!((-127i8).sat_sub(127), -127);
        assert_eq!(i8::MIN.saturate(), -127);
        assert_eq!(Llr::abs(i8::MIN), 127);
        assert_eq!(Llr::neg(i8::MIN), 127);
        assert_eq!(<i16 as Llr>::val_min(), -<i16 as Llr>::val_max());
    }

    #[test]
    fn float_quantization() {
        assert_eq!(f32::from_f64(1.5), 1.5);
        assert_eq!(f64::from_f64(f64::INFINITY), f64::MAX);
        assert_eq!(f32::from_f64(f64::NEG_INFINITY), -f32::MAX);
        assert_eq!(f32::INFINITY.saturate(), f32::MAX);
        assert_eq!(f64::NEG_INFINITY.saturate(), -f64::MAX);
        assert_eq!((-2.5f64).saturate(), -2.5);
        assert_eq!((-3.0f64).hard_decision(), 1);
        assert_eq!(0.0f32.hard_decision(), 0);
    }

    #[test]
    fn fixed_point_normalization_by_eighths() {
        for n in 1..=8u8 {
            let factor = Normalization::new::<i16>(f32::from(n) / 8.0).unwrap();
            // 800 is divisible by 8, so the shifts are exact
            assert_eq!(800i16.normalize(factor), 100 * i16::from(n));
        }
        let f = Normalization::new::<i32>(0.375).unwrap();
        assert_eq!(80i32.normalize(f), 30);
        // truncation of each shifted term
        let f = Normalization::new::<i16>(0.875).unwrap();
        assert_eq!(7i16.normalize(f), 3 + 1);
    }

    #[test]
    fn illegal_fixed_point_factors() {
        for factor in [0.0, 0.1, 0.8, 1.125, -0.5, f32::NAN] {
            assert!(matches!(
                Normalization::new::<i16>(factor),
                Err(Error::UnsupportedNormalizationFactor(_))
            ));
        }
        assert!(Normalization::new::<f64>(0.1).is_ok());
    }

    #[test]
    fn float_factors() {
        let f = Normalization::new::<f64>(0.8).unwrap();
        assert!((10.0f64.normalize(f) - 8.0).abs() < 1e-6);
        assert!(Normalization::new::<f32>(f32::INFINITY).is_err());
        assert!(Normalization::IDENTITY.is_identity());
        assert_eq!(3.25f32.normalize(Normalization::IDENTITY), 3.25);
    }
}
