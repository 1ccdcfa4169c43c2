//! Channel simulation.
//!
//! This module contains the simulation of an AWGN channel.

use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};

/// AWGN channel simulation.
///
/// This struct is used to add AWGN to symbols.
#[derive(Debug, Clone)]
pub struct AwgnChannel {
    distr: Normal<f64>,
}

impl AwgnChannel {
    /// Creates a new AWGN channel.
    ///
    /// The channel noise follows a (real) normal distribution with mean zero
    /// and standard deviation sigma.
    ///
    /// # Errors
    ///
    /// Fails if `noise_sigma` is negative or not finite.
    pub fn new(noise_sigma: f64) -> Result<AwgnChannel, NormalError> {
        Ok(AwgnChannel {
            distr: Normal::new(0.0, noise_sigma)?,
        })
    }

    /// Adds noise to a sequence of symbols.
    ///
    /// The noise is added in-place to the slice `symbols`. An [Rng] is used as
    /// source of randomness.
    pub fn add_noise<R: Rng>(&self, rng: &mut R, symbols: &mut [f64]) {
        for x in symbols.iter_mut() {
            *x += self.distr.sample(rng);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rand::{Rng, SeedableRng};

    #[test]
    fn build_awgn() {
        assert!(AwgnChannel::new(0.2).is_ok());
    }

    #[test]
    fn negative_noise_sigma() {
        assert!(AwgnChannel::new(-3.5).is_err());
        assert!(AwgnChannel::new(f64::NAN).is_err());
    }

    #[test]
    fn zero_noise_sigma() {
        let channel = AwgnChannel::new(0.0).unwrap();
        let mut rng = Rng::seed_from_u64(0);
        let mut symbols = vec![1.0; 1024];
        let symbols_orig = symbols.clone();
        channel.add_noise(&mut rng, &mut symbols);
        assert_eq!(&symbols, &symbols_orig);
    }

    #[test]
    fn noise_power() {
        let channel = AwgnChannel::new(2.0).unwrap();
        let mut rng = Rng::seed_from_u64(42);
        let mut symbols = vec![0.0; 100_000];
        channel.add_noise(&mut rng, &mut symbols);
        let power = symbols.iter().map(|x| x * x).sum::<f64>() / symbols.len() as f64;
        assert!((power - 4.0).abs() < 0.1);
    }
}
