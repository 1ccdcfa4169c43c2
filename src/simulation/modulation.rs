//! Modulation and demodulation.
//!
//! This module implements routines for modulation of bits to symbols and
//! demodulation of symbols to LLRs.

/// BPSK modulator.
///
/// Maps the bit 0 to the symbol +1.0 and the bit 1 to the symbol -1.0, so
/// that positive LLRs correspond to 0 bits.
#[derive(Debug, Clone, Default)]
pub struct BpskModulator {}

impl BpskModulator {
    /// Creates a new BPSK modulator.
    pub fn new() -> BpskModulator {
        BpskModulator::default()
    }

    /// Modulates a sequence of bits into symbols.
    pub fn modulate(&self, codeword: &[u8]) -> Vec<f64> {
        codeword
            .iter()
            .map(|&bit| if bit == 0 { 1.0 } else { -1.0 })
            .collect()
    }
}

/// BPSK demodulator.
///
/// Assumes the same mapping as the [BpskModulator].
#[derive(Debug, Clone, Default)]
pub struct BpskDemodulator {
    scale: f64,
}

impl BpskDemodulator {
    /// Creates a new BPSK demodulator.
    ///
    /// The `noise_sigma` indicates the channel noise standard deviation. The
    /// channel noise is assumed to be a real Gaussian with mean zero and
    /// standard deviation `noise_sigma`.
    pub fn new(noise_sigma: f64) -> BpskDemodulator {
        BpskDemodulator {
            scale: 2.0 / (noise_sigma * noise_sigma),
        }
    }

    /// Returns the LLRs corresponding to a sequence of symbols.
    pub fn demodulate(&self, symbols: &[f64]) -> Vec<f64> {
        symbols.iter().map(|&x| self.scale * x).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bpsk_modulator() {
        let modulator = BpskModulator::new();
        assert_eq!(modulator.modulate(&[1, 1, 0, 1, 0]), vec![-1.0, -1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn bpsk_demodulator() {
        let demodulator = BpskDemodulator::new(0.5);
        let llrs = demodulator.demodulate(&[1.0, -0.25, 0.0]);
        assert_eq!(llrs, vec![8.0, -2.0, 0.0]);
    }
}
