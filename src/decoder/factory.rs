//! LDPC decoder factory.
//!
//! This module contains routines to build an LDPC decoder generically over the
//! message passing schedule, the LLR representation and the check node update
//! rule, which are selected at runtime. Such decoders are represented by
//! `Box<dyn LdpcDecoder>`, using the trait [`LdpcDecoder`].

use super::{
    arithmetic::Llr, check::CheckUpdate, flooding, horizontal_layered, DecoderConfig, Error,
    LdpcDecoder,
};
use crate::sparse::SparseMatrix;
use enum_iterator::Sequence;

/// LLR representation.
///
/// The fixed point precisions use 2 (`Q8`), 3 (`Q16`) and 6 (`Q32`)
/// fractional bits.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Sequence)]
pub enum Precision {
    /// 8-bit fixed point (`i8`).
    Q8,
    /// 16-bit fixed point (`i16`).
    Q16,
    /// 32-bit fixed point (`i32`).
    Q32,
    /// Single precision floating point (`f32`).
    F32,
    /// Double precision floating point (`f64`).
    F64,
}

impl std::str::FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Precision, String> {
        Ok(match s {
            "Q8" => Precision::Q8,
            "Q16" => Precision::Q16,
            "Q32" => Precision::Q32,
            "F32" => Precision::F32,
            "F64" => Precision::F64,
            _ => Err(format!("invalid precision {s}"))?,
        })
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Precision::Q8 => "Q8",
                Precision::Q16 => "Q16",
                Precision::Q32 => "Q32",
                Precision::F32 => "F32",
                Precision::F64 => "F64",
            }
        )
    }
}

/// Message passing schedule.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Schedule {
    /// Flooding schedule (see [`flooding::Decoder`]).
    Flooding,
    /// Horizontal layered schedule (see [`horizontal_layered::Decoder`]).
    Layered {
        /// Number of check nodes in each layer.
        layer_size: usize,
    },
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Schedule::Flooding => write!(f, "flooding"),
            Schedule::Layered { layer_size } => write!(f, "layered ({layer_size} checks/layer)"),
        }
    }
}

/// Check node update rule with precision-independent parameters.
///
/// This is converted into a [`CheckUpdate`] for the precision of the decoder.
/// The offsets are quantized into that precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckRule {
    /// Sum-product rule using the box-plus operator.
    SumProduct,
    /// Sum-product rule using the involution `phi(x)`.
    LogSumProduct,
    /// Min-sum rule.
    MinSum,
    /// Offset min-sum rule.
    OffsetMinSum {
        /// Offset.
        offset: f64,
    },
    /// Normalized min-sum rule.
    NormalizedMinSum {
        /// Normalization factor.
        factor: f32,
        /// Offset.
        offset: f64,
    },
}

impl CheckRule {
    /// Converts the rule into a check node update rule for LLRs of type `T`.
    pub fn to_update<T: Llr>(&self) -> Result<CheckUpdate<T>, Error> {
        Ok(match *self {
            CheckRule::SumProduct => CheckUpdate::SumProduct,
            CheckRule::LogSumProduct => CheckUpdate::LogSumProduct,
            CheckRule::MinSum => CheckUpdate::MinSum,
            CheckRule::OffsetMinSum { offset } => CheckUpdate::offset_min_sum(T::from_f64(offset))?,
            CheckRule::NormalizedMinSum { factor, offset } => {
                CheckUpdate::normalized_min_sum(factor, T::from_f64(offset))?
            }
        })
    }
}

/// LDPC decoder implementation.
///
/// This struct lists the choices that define an LDPC decoder implementation.
///
/// # Examples
/// ```
/// # use ldpc_bp::{decoder::{factory::*, DecoderConfig}, sparse::SparseMatrix};
/// let h = SparseMatrix::from_rows(6, &[vec![0, 1, 3], vec![1, 2, 4], vec![0, 4, 5], vec![2, 3, 5]]);
/// let implementation = DecoderImplementation {
///     schedule: Schedule::Layered { layer_size: 2 },
///     precision: "Q16".parse().unwrap(),
///     rule: CheckRule::NormalizedMinSum { factor: 0.75, offset: 0.0 },
/// };
/// let mut decoder = implementation.build_decoder(&h, DecoderConfig::default())?;
/// // bit 3 is received in error
/// let output = decoder.decode(&[1.5, 2.0, -1.0, -0.5, -2.5, -3.0])?;
/// assert_eq!(output[0].codeword, vec![0, 0, 1, 0, 1, 1]);
/// assert!(output[0].converged);
/// # Ok::<(), ldpc_bp::decoder::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderImplementation {
    /// Message passing schedule.
    pub schedule: Schedule,
    /// LLR representation.
    pub precision: Precision,
    /// Check node update rule.
    pub rule: CheckRule,
}

impl DecoderImplementation {
    /// Builds an LDPC decoder.
    ///
    /// Given a parity check matrix and a decoder configuration, this function
    /// builds an LDPC decoder corresponding to this decoder implementation.
    pub fn build_decoder(
        &self,
        h: &SparseMatrix,
        config: DecoderConfig,
    ) -> Result<Box<dyn LdpcDecoder>, Error> {
        macro_rules! impl_match {
            ($($precision:ident => $t:ty),*) => {
                match self.precision {
                    $(
                        Precision::$precision => self.build::<$t>(h, config),
                    )*
                }
            }
        }

        impl_match!(Q8 => i8, Q16 => i16, Q32 => i32, F32 => f32, F64 => f64)
    }

    fn build<T: Llr>(
        &self,
        h: &SparseMatrix,
        config: DecoderConfig,
    ) -> Result<Box<dyn LdpcDecoder>, Error> {
        let rule = self.rule.to_update::<T>()?;
        Ok(match self.schedule {
            Schedule::Flooding => Box::new(flooding::Decoder::<T>::new(h, rule, config)?),
            Schedule::Layered { layer_size } => Box::new(horizontal_layered::Decoder::<T>::new(
                h, rule, config, layer_size,
            )?),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn johnson() -> SparseMatrix {
        SparseMatrix::from_rows(
            6,
            &[vec![0, 1, 3], vec![1, 2, 4], vec![0, 4, 5], vec![2, 3, 5]],
        )
    }

    #[test]
    fn precision_names() {
        for precision in enum_iterator::all::<Precision>() {
            assert_eq!(
                precision.to_string().parse::<Precision>().unwrap(),
                precision
            );
        }
        assert!("Q12".parse::<Precision>().is_err());
    }

    #[test]
    fn all_implementations_decode() {
        let codeword = [0, 0, 1, 0, 1, 1];
        let schedules = [Schedule::Flooding, Schedule::Layered { layer_size: 2 }];
        for precision in enum_iterator::all::<Precision>() {
            for schedule in schedules {
                let implementation = DecoderImplementation {
                    schedule,
                    precision,
                    rule: CheckRule::MinSum,
                };
                let mut decoder = implementation
                    .build_decoder(&johnson(), DecoderConfig::default().with_batch_size(2))
                    .unwrap();
                assert_eq!(decoder.codeword_len(), 6);
                assert_eq!(decoder.batch_size(), 2);
                for j in 0..codeword.len() {
                    let mut llrs = Vec::new();
                    for frame in 0..2 {
                        llrs.extend(codeword.iter().enumerate().map(|(k, &b)| {
                            let flip = frame == 1 && k == j;
                            if (b == 1) ^ flip {
                                -1.3863
                            } else {
                                1.3863
                            }
                        }));
                    }
                    let output = decoder.decode(&llrs).unwrap();
                    for o in &output {
                        assert_eq!(o.codeword, codeword, "{precision}, {schedule}, bit {j}");
                        assert!(o.converged);
                    }
                    assert_eq!(output[0].iterations, 1);
                }
            }
        }
    }

    #[test]
    fn rule_parameters_are_validated() {
        let implementation = DecoderImplementation {
            schedule: Schedule::Flooding,
            precision: Precision::Q8,
            rule: CheckRule::OffsetMinSum { offset: 0.5 },
        };
        assert_eq!(
            implementation
                .build_decoder(&johnson(), DecoderConfig::default())
                .unwrap_err(),
            Error::PrecisionTooLow { bits: 8 }
        );
        let implementation = DecoderImplementation {
            precision: Precision::Q16,
            rule: CheckRule::NormalizedMinSum {
                factor: 0.3,
                offset: 0.0,
            },
            ..implementation
        };
        assert_eq!(
            implementation
                .build_decoder(&johnson(), DecoderConfig::default())
                .unwrap_err(),
            Error::UnsupportedNormalizationFactor(0.3)
        );
        // floating point supports any factor
        assert!(DecoderImplementation {
            precision: Precision::F32,
            ..implementation
        }
        .build_decoder(&johnson(), DecoderConfig::default())
        .is_ok());
        assert_eq!(
            CheckRule::OffsetMinSum { offset: -1.0 }
                .to_update::<f64>()
                .unwrap_err(),
            Error::NegativeOffset
        );
    }

    #[test]
    fn offset_is_quantized() {
        assert_eq!(
            CheckRule::OffsetMinSum { offset: 0.5 }
                .to_update::<i16>()
                .unwrap(),
            CheckUpdate::OffsetMinSum { offset: 4 }
        );
    }

    #[test]
    fn decoder_errors() {
        let implementation = DecoderImplementation {
            schedule: Schedule::Layered { layer_size: 0 },
            precision: Precision::F64,
            rule: CheckRule::SumProduct,
        };
        assert_eq!(
            implementation
                .build_decoder(&johnson(), DecoderConfig::default())
                .unwrap_err(),
            Error::InvalidLayerSize
        );
        let mut decoder = DecoderImplementation {
            schedule: Schedule::Flooding,
            ..implementation
        }
        .build_decoder(&johnson(), DecoderConfig::default())
        .unwrap();
        assert_eq!(
            decoder.decode(&[0.0; 5]).unwrap_err(),
            Error::InputLength {
                expected: 6,
                actual: 5
            }
        );
    }
}
