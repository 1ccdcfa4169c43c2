//! LDPC belief propagation decoders.
//!
//! This module provides belief propagation decoders for LDPC codes with two
//! message passing schedules:
//!
//! - [`flooding::Decoder`]: all the variable nodes are updated, then all the
//!   check nodes, using only the messages of the previous iteration.
//! - [`horizontal_layered::Decoder`]: the check nodes are processed layer by
//!   layer, and each layer uses the messages already updated by the previous
//!   layers of the same iteration.
//!
//! Both decoders are generic over the [`Llr`](arithmetic::Llr)
//! representation (floating point or saturating fixed point) and accept any
//! [`CheckUpdate`](check::CheckUpdate) rule. They decode batches of
//! independent frames in each call, and stop early with a syndrome-based
//! criterion. The [`factory`] module builds decoders as [`LdpcDecoder`] trait
//! objects selected at runtime.
//!
//! # Examples
//! ```
//! # use ldpc_bp::{decoder::{check::CheckUpdate, flooding::Decoder, DecoderConfig}, sparse::SparseMatrix};
//! let h = SparseMatrix::from_rows(6, &[vec![0, 1, 3], vec![1, 2, 4], vec![0, 4, 5], vec![2, 3, 5]]);
//! let mut decoder = Decoder::<f64>::new(&h, CheckUpdate::SumProduct, DecoderConfig::default())?;
//! // codeword 001011 with bit 0 flipped
//! let llrs = [-1.3863, 1.3863, -1.3863, 1.3863, -1.3863, -1.3863];
//! let output = decoder.decode(&llrs)?;
//! assert_eq!(output[0].codeword, vec![0, 0, 1, 0, 1, 1]);
//! assert!(output[0].converged);
//! # Ok::<(), ldpc_bp::decoder::Error>(())
//! ```

use arithmetic::Llr;
use batch::Schedule;
use messages::MessageStore;
use tanner::TannerGraph;
use thiserror::Error;

pub mod arithmetic;
pub mod batch;
pub mod check;
pub mod factory;
pub mod flooding;
pub mod horizontal_layered;
pub mod messages;
pub mod syndrome;
pub mod tanner;

/// LDPC decoder error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The parity check matrix cannot be used to build a decoder.
    #[error("invalid parity check matrix: {0}")]
    InvalidMatrix(#[from] tanner::MatrixError),
    /// The normalization factor is not supported by the LLR representation.
    #[error(
        "normalization factor {0} is not supported (fixed point only supports \
         0.125, 0.25, 0.375, 0.5, 0.625, 0.75, 0.875 and 1.0)"
    )]
    UnsupportedNormalizationFactor(f32),
    /// The fixed point precision is too low for the check node update rule.
    #[error("offset and normalized min-sum do not work with {bits}-bit fixed point (try 16-bit)")]
    PrecisionTooLow {
        /// Number of bits of the LLR representation.
        bits: u32,
    },
    /// The min-sum offset is negative.
    #[error("the min-sum offset must be non-negative")]
    NegativeOffset,
    /// The maximum number of iterations is zero.
    #[error("the maximum number of iterations must be positive")]
    InvalidIterations,
    /// The syndrome depth is zero.
    #[error("the syndrome depth must be positive")]
    InvalidSyndromeDepth,
    /// The batch size is zero.
    #[error("the batch size must be positive")]
    InvalidBatchSize,
    /// The layer size of a layered decoder is zero.
    #[error("the layer size must be positive")]
    InvalidLayerSize,
    /// The input LLRs do not have the size of a batch of frames.
    #[error("expected {expected} input LLRs (codeword length times batch size), got {actual}")]
    InputLength {
        /// Expected number of LLRs.
        expected: usize,
        /// Number of LLRs given.
        actual: usize,
    },
    /// The output buffer does not have the size of a batch of frames.
    #[error("expected an output buffer of {expected} LLRs, got {actual}")]
    OutputLength {
        /// Expected number of LLRs.
        expected: usize,
        /// Size of the buffer given.
        actual: usize,
    },
}

/// LDPC decoder configuration.
///
/// # Examples
/// ```
/// # use ldpc_bp::decoder::DecoderConfig;
/// let config = DecoderConfig::default()
///     .with_max_iterations(50)
///     .with_syndrome_depth(2)
///     .with_batch_size(4);
/// assert!(config.validate().is_ok());
/// assert!(config.with_syndrome_depth(0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct DecoderConfig {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Enables the syndrome-based stop criterion.
    ///
    /// If disabled, the decoder always runs `max_iterations` iterations.
    pub enable_syndrome: bool,
    /// Number of consecutive iterations with a satisfied syndrome required to
    /// stop.
    pub syndrome_depth: usize,
    /// Number of frames decoded in each call.
    pub batch_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> DecoderConfig {
        DecoderConfig {
            max_iterations: 10,
            enable_syndrome: true,
            syndrome_depth: 1,
            batch_size: 1,
        }
    }
}

impl DecoderConfig {
    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(self, max_iterations: usize) -> DecoderConfig {
        DecoderConfig {
            max_iterations,
            ..self
        }
    }

    /// Enables or disables the syndrome-based stop criterion.
    pub fn with_syndrome(self, enable_syndrome: bool) -> DecoderConfig {
        DecoderConfig {
            enable_syndrome,
            ..self
        }
    }

    /// Sets the syndrome depth.
    pub fn with_syndrome_depth(self, syndrome_depth: usize) -> DecoderConfig {
        DecoderConfig {
            syndrome_depth,
            ..self
        }
    }

    /// Sets the number of frames decoded in each call.
    pub fn with_batch_size(self, batch_size: usize) -> DecoderConfig {
        DecoderConfig { batch_size, ..self }
    }

    /// Checks that the configuration is valid.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidIterations);
        }
        if self.syndrome_depth == 0 {
            return Err(Error::InvalidSyndromeDepth);
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidBatchSize);
        }
        Ok(())
    }
}

/// Decoding status of a frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct FrameStatus {
    /// Number of iterations performed on this frame.
    pub iterations: usize,
    /// Convergence flag.
    ///
    /// If the syndrome-based stop criterion is enabled, this is `true` if it
    /// stopped the decoding of the frame. Otherwise, it is `true` if all the
    /// parity checks were satisfied in the last iteration. Not converging is
    /// not an error: the frame still gets the hard decision of its last
    /// iteration.
    pub converged: bool,
}

/// LDPC decoder output.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct DecoderOutput {
    /// Decoded codeword.
    ///
    /// Contains the hard decision bits of the decoded codeword.
    pub codeword: Vec<u8>,
    /// Number of iterations.
    ///
    /// Number of iterations used in decoding.
    pub iterations: usize,
    /// Convergence flag (see [`FrameStatus::converged`]).
    pub converged: bool,
}

impl DecoderOutput {
    /// Extracts the information bits of the decoded codeword.
    ///
    /// The parameter `info_bits_pos` lists the codeword positions of the
    /// information bits. Returns `None` if some position is not smaller than
    /// the codeword length.
    ///
    /// # Examples
    /// ```
    /// # use ldpc_bp::decoder::DecoderOutput;
    /// let output = DecoderOutput { codeword: vec![1, 0, 1, 1], iterations: 1, converged: true };
    /// assert_eq!(output.information_bits(&[1, 3]), Some(vec![0, 1]));
    /// assert_eq!(output.information_bits(&[1, 4]), None);
    /// ```
    pub fn information_bits(&self, info_bits_pos: &[usize]) -> Option<Vec<u8>> {
        info_bits_pos
            .iter()
            .map(|&p| self.codeword.get(p).copied())
            .collect()
    }
}

/// Generic LDPC decoder.
///
/// This trait is used to form LDPC decoder trait objects, abstracting over the
/// schedule and the LLR representation of the decoder. The input and output
/// LLRs are given as `f64` and are quantized to and from the internal
/// representation.
pub trait LdpcDecoder: std::fmt::Debug + Send {
    /// Decodes a batch of frames.
    ///
    /// The LLRs of the frames are concatenated in `llrs`, whose length must be
    /// the codeword length times the batch size. Returns the hard decision
    /// output of each frame.
    fn decode(&mut self, llrs: &[f64]) -> Result<Vec<DecoderOutput>, Error>;

    /// Decodes a batch of frames producing soft outputs.
    ///
    /// Works like [`LdpcDecoder::decode`] but writes the extrinsic LLRs of each
    /// frame (a-posteriori LLRs minus intrinsic LLRs) into `extrinsic`, which
    /// must have the same length as `llrs`.
    fn decode_soft(&mut self, llrs: &[f64], extrinsic: &mut [f64])
        -> Result<Vec<FrameStatus>, Error>;

    /// Returns the codeword length.
    fn codeword_len(&self) -> usize;

    /// Returns the number of frames decoded in each call.
    fn batch_size(&self) -> usize;
}

// Access to the state shared by the flooding and layered decoders.
pub(crate) trait FrameDecoder<T: Llr>: Schedule {
    fn config(&self) -> &DecoderConfig;

    fn messages(&self) -> &MessageStore<T>;

    fn messages_mut(&mut self) -> &mut MessageStore<T>;

    fn codeword_len(&self) -> usize;
}

fn check_len(expected: usize, actual: usize) -> Result<(), Error> {
    if expected != actual {
        return Err(Error::InputLength { expected, actual });
    }
    Ok(())
}

fn check_output_len(expected: usize, actual: usize) -> Result<(), Error> {
    if expected != actual {
        return Err(Error::OutputLength { expected, actual });
    }
    Ok(())
}

// Loads a batch with `load` and runs the decoder on it.
fn run<T, D, F>(decoder: &mut D, input_len: usize, load: F) -> Result<Vec<FrameStatus>, Error>
where
    T: Llr,
    D: FrameDecoder<T>,
    F: FnOnce(&mut MessageStore<T>),
{
    let config = *decoder.config();
    check_len(decoder.codeword_len() * config.batch_size, input_len)?;
    load(decoder.messages_mut());
    let status = batch::run_batch(decoder, &config);
    tracing::debug!(
        batch_size = config.batch_size,
        iterations = status.iter().map(|s| s.iterations).max().unwrap_or(0),
        converged = status.iter().filter(|s| s.converged).count(),
        "decoded batch"
    );
    Ok(status)
}

fn hard_outputs<T: Llr>(messages: &MessageStore<T>, status: &[FrameStatus]) -> Vec<DecoderOutput> {
    status
        .iter()
        .enumerate()
        .map(|(frame, s)| DecoderOutput {
            codeword: hard_decisions(messages.posterior(frame)),
            iterations: s.iterations,
            converged: s.converged,
        })
        .collect()
}

fn hard_decisions<T: Llr>(llrs: &[T]) -> Vec<u8> {
    llrs.iter().map(|&llr| llr.hard_decision()).collect()
}

// Checks if the hard decisions of `llrs` satisfy all the parity checks.
fn check_llrs<T: Llr>(graph: &TannerGraph, llrs: &[T]) -> bool {
    !(0..graph.num_checks()).any(|c| {
        graph
            .check_vars(c)
            .iter()
            .filter(|&&v| llrs[v].is_negative())
            .count()
            % 2
            == 1
    })
}

// Writes posterior - intrinsic for all the frames, converting with `convert`.
fn write_extrinsic<T, U, F>(messages: &MessageStore<T>, extrinsic: &mut [U], convert: F)
where
    T: Llr,
    F: Fn(T) -> U,
{
    let n = extrinsic.len() / messages.batch_size();
    for (frame, out) in extrinsic.chunks_exact_mut(n).enumerate() {
        for ((o, &p), &i) in out
            .iter_mut()
            .zip(messages.posterior(frame))
            .zip(messages.intrinsic(frame))
        {
            *o = convert(p.sat_sub(i));
        }
    }
}

/// Decodes a batch with LLRs in the internal representation.
pub(crate) fn decode<T: Llr, D: FrameDecoder<T>>(
    decoder: &mut D,
    llrs: &[T],
) -> Result<Vec<DecoderOutput>, Error> {
    let status = run(decoder, llrs.len(), |m| m.load(llrs))?;
    Ok(hard_outputs(decoder.messages(), &status))
}

/// Decodes a batch with soft outputs in the internal representation.
pub(crate) fn decode_soft<T: Llr, D: FrameDecoder<T>>(
    decoder: &mut D,
    llrs: &[T],
    extrinsic: &mut [T],
) -> Result<Vec<FrameStatus>, Error> {
    check_output_len(llrs.len(), extrinsic.len())?;
    let status = run(decoder, llrs.len(), |m| m.load(llrs))?;
    write_extrinsic(decoder.messages(), extrinsic, std::convert::identity);
    Ok(status)
}

/// Decodes a batch with `f64` LLRs.
pub(crate) fn decode_f64<T: Llr, D: FrameDecoder<T>>(
    decoder: &mut D,
    llrs: &[f64],
) -> Result<Vec<DecoderOutput>, Error> {
    let status = run(decoder, llrs.len(), |m| m.load_f64(llrs))?;
    Ok(hard_outputs(decoder.messages(), &status))
}

/// Decodes a batch with `f64` LLRs and soft outputs.
pub(crate) fn decode_soft_f64<T: Llr, D: FrameDecoder<T>>(
    decoder: &mut D,
    llrs: &[f64],
    extrinsic: &mut [f64],
) -> Result<Vec<FrameStatus>, Error> {
    check_output_len(llrs.len(), extrinsic.len())?;
    let status = run(decoder, llrs.len(), |m| m.load_f64(llrs))?;
    write_extrinsic(decoder.messages(), extrinsic, T::to_f64);
    Ok(status)
}
