//! # LDPC belief propagation
//!
//! `ldpc_bp` is a belief propagation decoder core for LDPC codes. It builds
//! the Tanner graph of a parity check matrix and decodes batches of frames
//! with a flooding or a horizontal layered schedule, using the sum-product
//! rule or one of the min-sum approximations, in floating point or in
//! saturating fixed point arithmetic.
//!
//! The [`decoder`] module contains the decoders, and [`simulation`] contains
//! utilities to measure their BER in an AWGN channel.
//!
//! The crate logs through [`tracing`] and does not install any subscriber.

#![warn(missing_docs)]

pub mod decoder;
pub mod rand;
pub mod simulation;
pub mod sparse;
