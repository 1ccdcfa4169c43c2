//! BER simulation
//!
//! This module contains utilities for BER simulation. The all-zero codeword
//! is transmitted using BPSK over an AWGN channel and decoded with an
//! [`LdpcDecoder`] built by the decoder factory. Since belief propagation
//! decoding is symmetric, the all-zero codeword gives the same error
//! statistics as random codewords and no encoder is needed.

use super::{
    channel::AwgnChannel,
    modulation::{BpskDemodulator, BpskModulator},
};
use crate::{
    decoder::{self, factory::DecoderImplementation, DecoderConfig, LdpcDecoder},
    sparse::SparseMatrix,
};
use rand::Rng;
use rand_distr::NormalError;
use std::time::{Duration, Instant};
use thiserror::Error;

/// BER test error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The decoder could not be built or failed.
    #[error("decoder error: {0}")]
    Decoder(#[from] decoder::Error),
    /// The channel noise cannot be simulated.
    #[error("invalid channel noise: {0}")]
    Noise(#[from] NormalError),
    /// The Eb/N0 is not finite.
    #[error("invalid Eb/N0: {0} dB")]
    InvalidEbN0(f32),
    /// The parity check matrix has no information bits.
    #[error("the parity check matrix has no information bits")]
    NoInformationBits,
}

/// BER test parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BerTestParameters<'a> {
    /// Parity check matrix.
    pub h: &'a SparseMatrix,
    /// Decoder implementation.
    pub decoder_implementation: DecoderImplementation,
    /// Decoder configuration.
    pub decoder_config: DecoderConfig,
    /// List of Eb/N0's (in dB) to simulate.
    pub ebn0s_db: &'a [f32],
    /// Maximum number of frame errors for each Eb/N0.
    pub max_frame_errors: u64,
    /// Maximum number of frames for each Eb/N0.
    pub max_frames: u64,
}

/// BER test.
///
/// This struct is used to configure and run a BER test.
#[derive(Debug)]
pub struct BerTest {
    n: usize,
    k: usize,
    decoder: Box<dyn LdpcDecoder>,
    modulator: BpskModulator,
    ebn0s_db: Vec<f32>,
    max_frame_errors: u64,
    max_frames: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct CurrentStatistics {
    num_frames: u64,
    bit_errors: u64,
    frame_errors: u64,
    false_decodes: u64,
    total_iterations: u64,
    start: Instant,
}

/// BER test statistics.
///
/// This structure contains the statistics for a single Eb/N0 case in a BER
/// test.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    /// Eb/N0 in dB units.
    pub ebn0_db: f32,
    /// Number of frames tested.
    pub num_frames: u64,
    /// Number of bit errors.
    pub bit_errors: u64,
    /// Number of frame errors.
    pub frame_errors: u64,
    /// Number of frames falsely decoded.
    ///
    /// This are frames for which the decoder converged to a valid codeword, but
    /// the codeword is different to the transmitted codeword.
    pub false_decodes: u64,
    /// Bit error rate.
    pub ber: f64,
    /// Frame error rate.
    pub fer: f64,
    /// Average number of decoder iterations per frame.
    pub average_iterations: f64,
    /// Elapsed time for this test case.
    pub elapsed: Duration,
}

impl BerTest {
    /// Creates a new BER test.
    ///
    /// The decoder is built from the parity check matrix, the decoder
    /// implementation and the decoder configuration in `parameters`. The
    /// code rate is assumed to be `(n - m) / n`, where `n` and `m` are the
    /// number of columns and rows of the parity check matrix.
    ///
    /// This function only defines the BER test. To run it it is necessary to
    /// call the [`BerTest::run`] method.
    pub fn new(parameters: BerTestParameters<'_>) -> Result<BerTest, Error> {
        let h = parameters.h;
        if h.num_rows() >= h.num_cols() {
            return Err(Error::NoInformationBits);
        }
        if let Some(&ebn0) = parameters.ebn0s_db.iter().find(|x| !x.is_finite()) {
            return Err(Error::InvalidEbN0(ebn0));
        }
        let decoder = parameters
            .decoder_implementation
            .build_decoder(h, parameters.decoder_config)?;
        Ok(BerTest {
            n: h.num_cols(),
            k: h.num_cols() - h.num_rows(),
            decoder,
            modulator: BpskModulator::new(),
            ebn0s_db: parameters.ebn0s_db.to_owned(),
            max_frame_errors: parameters.max_frame_errors,
            max_frames: parameters.max_frames,
        })
    }

    /// Returns the code rate used to compute the channel noise.
    pub fn rate(&self) -> f64 {
        self.k as f64 / self.n as f64
    }

    /// Runs the BER test.
    ///
    /// This function runs the BER test until completion. It returns a list of
    /// statistics for each Eb/N0, or an error.
    ///
    /// Each Eb/N0 is simulated until `max_frame_errors` frame errors or
    /// `max_frames` frames have been counted. The frames are decoded in
    /// batches of the decoder batch size, so these limits can be exceeded by
    /// less than one batch.
    pub fn run<R: Rng>(&mut self, rng: &mut R) -> Result<Vec<Statistics>, Error> {
        let batch_size = self.decoder.batch_size();
        let codeword = vec![0; self.n * batch_size];
        let transmitted = self.modulator.modulate(&codeword);
        let mut statistics = Vec::with_capacity(self.ebn0s_db.len());

        for &ebn0_db in &self.ebn0s_db {
            let ebn0 = 10.0_f64.powf(0.1 * f64::from(ebn0_db));
            let esn0 = self.rate() * ebn0;
            let noise_sigma = (0.5 / esn0).sqrt();
            let channel = AwgnChannel::new(noise_sigma)?;
            let demodulator = BpskDemodulator::new(noise_sigma);
            let mut current = CurrentStatistics::new();
            while current.frame_errors < self.max_frame_errors && current.num_frames < self.max_frames
            {
                let mut symbols = transmitted.clone();
                channel.add_noise(rng, &mut symbols);
                let llrs = demodulator.demodulate(&symbols);
                for output in self.decoder.decode(&llrs)? {
                    let bit_errors = output.codeword.iter().filter(|&&b| b != 0).count() as u64;
                    current.bit_errors += bit_errors;
                    if bit_errors > 0 {
                        current.frame_errors += 1;
                        if output.converged {
                            current.false_decodes += 1;
                        }
                    }
                    current.total_iterations += output.iterations as u64;
                    current.num_frames += 1;
                }
            }
            let stats = Statistics::from_current(&current, ebn0_db, self.n);
            tracing::info!(
                ebn0_db,
                frames = stats.num_frames,
                bit_errors = stats.bit_errors,
                frame_errors = stats.frame_errors,
                false_decodes = stats.false_decodes,
                ber = stats.ber,
                fer = stats.fer,
                average_iterations = stats.average_iterations,
                "finished Eb/N0 point"
            );
            statistics.push(stats);
        }
        Ok(statistics)
    }
}

impl CurrentStatistics {
    fn new() -> CurrentStatistics {
        CurrentStatistics {
            num_frames: 0,
            bit_errors: 0,
            frame_errors: 0,
            false_decodes: 0,
            total_iterations: 0,
            start: Instant::now(),
        }
    }
}

impl Statistics {
    fn from_current(stats: &CurrentStatistics, ebn0_db: f32, n: usize) -> Statistics {
        let elapsed = Instant::now() - stats.start;
        let frames = stats.num_frames as f64;
        Statistics {
            ebn0_db,
            num_frames: stats.num_frames,
            bit_errors: stats.bit_errors,
            frame_errors: stats.frame_errors,
            false_decodes: stats.false_decodes,
            ber: stats.bit_errors as f64 / (n as f64 * frames),
            fer: stats.frame_errors as f64 / frames,
            average_iterations: stats.total_iterations as f64 / frames,
            elapsed,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        decoder::factory::{CheckRule, Precision, Schedule},
        rand::{Rng, SeedableRng},
    };

    fn johnson() -> SparseMatrix {
        SparseMatrix::from_rows(
            6,
            &[vec![0, 1, 3], vec![1, 2, 4], vec![0, 4, 5], vec![2, 3, 5]],
        )
    }

    fn parameters<'a>(h: &'a SparseMatrix, ebn0s_db: &'a [f32]) -> BerTestParameters<'a> {
        BerTestParameters {
            h,
            decoder_implementation: DecoderImplementation {
                schedule: Schedule::Layered { layer_size: 1 },
                precision: Precision::Q16,
                rule: CheckRule::OffsetMinSum { offset: 0.25 },
            },
            decoder_config: DecoderConfig::default().with_batch_size(4),
            ebn0s_db,
            max_frame_errors: 10,
            max_frames: 200,
        }
    }

    #[test]
    fn high_snr_has_no_errors() {
        let h = johnson();
        let mut test = BerTest::new(parameters(&h, &[20.0])).unwrap();
        let stats = test.run(&mut Rng::seed_from_u64(0)).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].num_frames, 200);
        assert_eq!(stats[0].frame_errors, 0);
        assert_eq!(stats[0].ber, 0.0);
        assert_eq!(stats[0].average_iterations, 1.0);
    }

    #[test]
    fn low_snr_stops_at_frame_errors() {
        let h = johnson();
        let mut test = BerTest::new(parameters(&h, &[-10.0, 20.0])).unwrap();
        let stats = test.run(&mut Rng::seed_from_u64(1)).unwrap();
        assert_eq!(stats.len(), 2);
        assert!(stats[0].frame_errors >= 10);
        // frames are decoded in batches of 4
        assert!(stats[0].frame_errors < 14);
        assert!(stats[0].num_frames < 200);
        assert!(stats[0].false_decodes <= stats[0].frame_errors);
        assert!(stats[0].bit_errors >= stats[0].frame_errors);
        assert!(stats[0].fer > stats[1].fer);
    }

    #[test]
    fn invalid_parameters() {
        let h = johnson();
        assert!(matches!(
            BerTest::new(parameters(&h, &[1.0, f32::NAN])),
            Err(Error::InvalidEbN0(x)) if x.is_nan()
        ));
        let square = SparseMatrix::from_rows(2, &[vec![0, 1], vec![1]]);
        assert!(matches!(
            BerTest::new(parameters(&square, &[1.0])),
            Err(Error::NoInformationBits)
        ));
        let mut p = parameters(&h, &[1.0]);
        p.decoder_config = p.decoder_config.with_max_iterations(0);
        assert!(matches!(
            BerTest::new(p),
            Err(Error::Decoder(decoder::Error::InvalidIterations))
        ));
    }
}
