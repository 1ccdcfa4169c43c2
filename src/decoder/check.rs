//! Check node update rules.
//!
//! This module contains [`CheckUpdate`], the family of rules used to compute
//! the check-to-variable messages leaving a check node from the
//! variable-to-check messages arriving at it. The rule is chosen once when a
//! decoder is built, and then applied to every check node in each iteration.
//!
//! All the rules follow the exclude-self principle: the message sent back
//! along an edge does not depend on the message that arrived on that same
//! edge.
//!
//! # References
//!
//! [1] Jon Hamkins, [Performance of Low-Density Parity-Check Coded Modulation](https://ipnpr.jpl.nasa.gov/progress_report/42-184/184D.pdf),
//! IPN Progress Report 42-184, February 15, 2011.
//!
//! [2] Sarah J. Johnson, Iterative Error Correction: Turbo, Low-Density
//! Parity-Check and Repeat-Accumulate Codes. Cambridge University Press. June
//! 2012.
//!
//! [3] J. Chen, et al. "Reduced-Complexity Decoding of LDPC Codes." IEEE
//! Transactions on Communications, vol. 53, no. 8, August 2005.

use super::{
    arithmetic::{Llr, Normalization},
    Error,
};

/// Check node update rule.
///
/// The type parameter `T` is the [`Llr`] representation of the messages. The
/// parameters of the min-sum variants are stored in that representation.
///
/// # Examples
/// ```
/// # use ldpc_bp::decoder::check::CheckUpdate;
/// let rule = CheckUpdate::<f32>::MinSum;
/// let mut output = [0.0; 3];
/// let mut work = [0.0; 3];
/// let violated = rule.update(&[2.0, -1.0, 3.0], &mut output, &mut work);
/// assert_eq!(output, [-1.0, 2.0, -1.0]);
/// assert!(violated);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckUpdate<T> {
    /// Sum-product rule, computed with the box-plus operator.
    ///
    /// The box-plus combination of all the incoming messages except one is
    /// obtained from forward and backward partial combinations, so it is
    /// exact and never forms a product of unbounded magnitude. See (33) in
    /// [1].
    SumProduct,
    /// Sum-product rule, computed in the log domain with the involution
    /// `phi(x) = -log(tanh(x/2))`.
    ///
    /// See (2.33) in page 68 in [2].
    LogSumProduct,
    /// Min-sum rule.
    MinSum,
    /// Offset min-sum rule.
    ///
    /// The two smallest magnitudes are reduced by `offset` and floored at
    /// zero.
    OffsetMinSum {
        /// Offset (non-negative).
        offset: T,
    },
    /// Normalized (and optionally offset) min-sum rule.
    ///
    /// The two smallest magnitudes are reduced by `offset`, multiplied by the
    /// normalization factor, and floored at zero. See [3].
    NormalizedMinSum {
        /// Normalization factor.
        factor: Normalization,
        /// Offset (non-negative).
        offset: T,
    },
}

impl<T: Llr> CheckUpdate<T> {
    /// Creates an offset min-sum rule.
    ///
    /// # Errors
    ///
    /// Fails if the offset is negative, or if `T` is 8-bit fixed point, which
    /// does not have enough dynamic range for this rule.
    pub fn offset_min_sum(offset: T) -> Result<CheckUpdate<T>, Error> {
        Self::check_offset_precision(offset)?;
        Ok(CheckUpdate::OffsetMinSum { offset })
    }

    /// Creates a normalized min-sum rule.
    ///
    /// # Errors
    ///
    /// Fails like [`CheckUpdate::offset_min_sum`], and also if the factor is
    /// not supported by `T` (see [`Normalization::new`]).
    pub fn normalized_min_sum(factor: f32, offset: T) -> Result<CheckUpdate<T>, Error> {
        Self::check_offset_precision(offset)?;
        Ok(CheckUpdate::NormalizedMinSum {
            factor: Normalization::new::<T>(factor)?,
            offset,
        })
    }

    fn check_offset_precision(offset: T) -> Result<(), Error> {
        if T::FIXED_POINT && T::BITS <= 8 {
            return Err(Error::PrecisionTooLow { bits: T::BITS });
        }
        if offset.is_negative() {
            return Err(Error::NegativeOffset);
        }
        Ok(())
    }

    /// Validates a rule for use in a decoder.
    ///
    /// This catches rules built directly from the enum variants instead of
    /// through [`CheckUpdate::offset_min_sum`] or
    /// [`CheckUpdate::normalized_min_sum`].
    pub fn validate(&self) -> Result<(), Error> {
        match *self {
            CheckUpdate::SumProduct | CheckUpdate::LogSumProduct | CheckUpdate::MinSum => Ok(()),
            CheckUpdate::OffsetMinSum { offset } => Self::check_offset_precision(offset),
            CheckUpdate::NormalizedMinSum { factor, offset } => {
                Self::check_offset_precision(offset)?;
                Normalization::new::<T>(factor.factor()).map(|_| ())
            }
        }
    }

    /// Computes the messages leaving a check node.
    ///
    /// The slice `input` contains the variable-to-check messages arriving at
    /// the check node and `output` receives the check-to-variable message for
    /// each of the same edges. The slice `work` is scratch space. Both `output`
    /// and `work` must be at least as long as `input`.
    ///
    /// The return value is the local sign parity of the input messages: `true`
    /// if the hard decisions of the incoming messages violate the parity
    /// check.
    pub fn update(&self, input: &[T], output: &mut [T], work: &mut [f64]) -> bool {
        let output = &mut output[..input.len()];
        match *self {
            CheckUpdate::SumProduct => sum_product(input, output, &mut work[..input.len()]),
            CheckUpdate::LogSumProduct => {
                log_sum_product(input, output, &mut work[..input.len()])
            }
            CheckUpdate::MinSum => min_sum(input, output, |m| m),
            CheckUpdate::OffsetMinSum { offset } => {
                min_sum(input, output, |m| floor_zero(m.sat_sub(offset)))
            }
            CheckUpdate::NormalizedMinSum { factor, offset } => min_sum(input, output, |m| {
                floor_zero(m.sat_sub(offset).normalize(factor))
            }),
        }
    }
}

fn floor_zero<T: Llr>(x: T) -> T {
    if x < T::zero() {
        T::zero()
    } else {
        x
    }
}

fn with_sign<T: Llr>(magnitude: T, negative: bool) -> T {
    if negative {
        magnitude.neg()
    } else {
        magnitude
    }
}

// Single pass computation of the two smallest magnitudes and the total sign.
// The edge holding the first occurrence of the smallest magnitude receives the
// second smallest, and every other edge receives the smallest.
fn min_sum<T, F>(input: &[T], output: &mut [T], correct: F) -> bool
where
    T: Llr,
    F: Fn(T) -> T,
{
    let mut sign = false;
    let mut min1 = T::val_max();
    let mut min2 = T::val_max();
    let mut argmin = 0;
    for (j, &x) in input.iter().enumerate() {
        sign ^= x.is_negative();
        let a = x.abs();
        if a < min1 {
            min2 = min1;
            min1 = a;
            argmin = j;
        } else if a < min2 {
            min2 = a;
        }
    }
    let for_argmin = correct(min2);
    let for_others = correct(min1);
    for (j, (&x, out)) in input.iter().zip(output.iter_mut()).enumerate() {
        let magnitude = if j == argmin { for_argmin } else { for_others };
        *out = with_sign(magnitude, sign ^ x.is_negative());
    }
    sign
}

// Box-plus operator: 2 atanh(tanh(a/2) tanh(b/2)), in the numerically stable
// Jacobian form. Infinity is its identity element.
fn boxplus(a: f64, b: f64) -> f64 {
    if a.is_infinite() {
        return if a < 0.0 { -b } else { b };
    }
    if b.is_infinite() {
        return if b < 0.0 { -a } else { a };
    }
    let (x, y) = (a.abs(), b.abs());
    let magnitude = x.min(y) + (-(x + y)).exp().ln_1p() - (-(x - y).abs()).exp().ln_1p();
    // The correction terms can make the magnitude slightly negative when
    // both inputs are close to zero.
    let magnitude = magnitude.max(0.0);
    if (a < 0.0) ^ (b < 0.0) {
        -magnitude
    } else {
        magnitude
    }
}

fn sum_product<T: Llr>(input: &[T], output: &mut [T], backward: &mut [f64]) -> bool {
    let n = input.len();
    let mut sign = false;
    // backward[j] is the combination of input[j + 1..]
    let mut acc = f64::INFINITY;
    for j in (0..n).rev() {
        backward[j] = acc;
        acc = boxplus(acc, input[j].to_f64());
    }
    let mut forward = f64::INFINITY;
    for ((&x, out), &b) in input.iter().zip(output.iter_mut()).zip(backward.iter()) {
        sign ^= x.is_negative();
        *out = T::from_f64(boxplus(forward, b));
        forward = boxplus(forward, x.to_f64());
    }
    sign
}

fn phi(x: f64) -> f64 {
    // Ensure that x is not zero. Otherwise the output will be +inf, which gives
    // problems when computing (+inf) - (+inf).
    let x = x.max(1e-30);
    -((0.5 * x).tanh().ln())
}

fn log_sum_product<T: Llr>(input: &[T], output: &mut [T], phis: &mut [f64]) -> bool {
    // Compute combination of all variable messages
    let mut sign = false;
    let mut sum = 0.0;
    for (&x, p) in input.iter().zip(phis.iter_mut()) {
        let phi_x = phi(x.to_f64().abs());
        *p = phi_x;
        sum += phi_x;
        sign ^= x.is_negative();
    }
    // Exclude the contribution of each variable to generate message for
    // that variable
    for ((&x, out), &p) in input.iter().zip(output.iter_mut()).zip(phis.iter()) {
        let y = T::from_f64(phi(sum - p));
        *out = with_sign(y, sign ^ x.is_negative());
    }
    sign
}
