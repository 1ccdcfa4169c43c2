//! Simulation.
//!
//! This module contains utilities to simulate the BER of an LDPC decoder in
//! an AWGN channel.

pub mod ber;
pub mod channel;
pub mod modulation;
