//! LDPC decoder with flooding schedule.
//!
//! This module implements a generic belief propagation LDPC decoder with a
//! flooding message passing schedule. Each iteration first updates all the
//! variable nodes and then all the check nodes, so every message is computed
//! from the messages of the previous half-iteration only, and the result does
//! not depend on the order in which the nodes are visited.

use super::{
    arithmetic::Llr,
    batch::Schedule,
    check::CheckUpdate,
    messages::{CheckScratch, MessageStore},
    tanner::TannerGraph,
    DecoderConfig, DecoderOutput, Error, FrameDecoder, FrameStatus, LdpcDecoder,
};
use crate::sparse::SparseMatrix;
use std::sync::Arc;

/// LDPC belief propagation flooding decoder.
///
/// The variable-to-check and check-to-variable messages are both stored in
/// variable-major edge order. The check node pass gathers and scatters them
/// through the transpose permutation of the Tanner graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoder<T: Llr> {
    graph: Arc<TannerGraph>,
    rule: CheckUpdate<T>,
    config: DecoderConfig,
    messages: MessageStore<T>,
    scratch: CheckScratch<T>,
}

impl<T: Llr> Decoder<T> {
    /// Creates a new flooding LDPC decoder.
    ///
    /// The parameter `h` indicates the parity check matrix, `rule` the check
    /// node update rule and `config` the decoder configuration.
    ///
    /// # Errors
    ///
    /// Fails if the parity check matrix, the rule or the configuration are
    /// invalid.
    pub fn new(h: &SparseMatrix, rule: CheckUpdate<T>, config: DecoderConfig) -> Result<Self, Error> {
        Self::from_graph(Arc::new(TannerGraph::from_matrix(h)?), rule, config)
    }

    /// Creates a new flooding LDPC decoder from a Tanner graph.
    ///
    /// The Tanner graph can be shared by several decoders, for instance by
    /// decoders running in different threads.
    pub fn from_graph(
        graph: Arc<TannerGraph>,
        rule: CheckUpdate<T>,
        config: DecoderConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        rule.validate()?;
        let messages = MessageStore::flooding(&graph, config.batch_size);
        let scratch = CheckScratch::new(&graph);
        Ok(Decoder {
            graph,
            rule,
            config,
            messages,
            scratch,
        })
    }

    /// Decodes a batch of frames.
    ///
    /// The LLRs of the `config.batch_size` frames are concatenated in `llrs`.
    /// Returns the hard decision of each frame together with its number of
    /// iterations and convergence flag.
    ///
    /// # Errors
    ///
    /// Fails if the length of `llrs` is not the codeword length times the
    /// batch size.
    pub fn decode(&mut self, llrs: &[T]) -> Result<Vec<DecoderOutput>, Error> {
        super::decode(self, llrs)
    }

    /// Decodes a batch of frames producing extrinsic LLRs.
    ///
    /// The extrinsic LLRs (a-posteriori minus intrinsic) of each frame are
    /// written to `extrinsic`, which must have the same length as `llrs`.
    pub fn decode_soft(&mut self, llrs: &[T], extrinsic: &mut [T]) -> Result<Vec<FrameStatus>, Error> {
        super::decode_soft(self, llrs, extrinsic)
    }

    /// Returns the a-posteriori LLRs of a frame after the last decode call.
    pub fn posterior(&self, frame: usize) -> &[T] {
        self.messages.posterior(frame)
    }

    /// Returns the Tanner graph used by the decoder.
    pub fn graph(&self) -> &Arc<TannerGraph> {
        &self.graph
    }

    /// Returns the decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

// Sum of the check messages arriving at a variable node plus its channel LLR.
fn var_total<T: Llr>(intrinsic: T, check_messages: &[T]) -> T {
    let sum = check_messages
        .iter()
        .fold(T::zero(), |acc, &x| acc.sat_add(x));
    intrinsic.sat_add(sum)
}

impl<T: Llr> Schedule for Decoder<T> {
    fn iterate(&mut self, frame: usize) -> bool {
        let graph = &*self.graph;
        let scratch = &mut self.scratch;
        let m = self.messages.frame_mut(frame);

        // Variable nodes: exclude the contribution of each check node to
        // generate the message for that check node.
        for (v, &llr) in m.intrinsic.iter().enumerate() {
            let edges = graph.var_edges(v);
            let total = var_total(llr, &m.check_to_var[edges.clone()]);
            for e in edges {
                m.var_to_check[e] = total.sat_sub(m.check_to_var[e]);
            }
        }

        // Check nodes
        let mut syndrome = false;
        for c in 0..graph.num_checks() {
            let transpose = graph.check_transpose(c);
            let degree = transpose.len();
            for (x, &e) in scratch.input.iter_mut().zip(transpose) {
                *x = m.var_to_check[e];
            }
            syndrome |= self.rule.update(
                &scratch.input[..degree],
                &mut scratch.output,
                &mut scratch.work,
            );
            for (&x, &e) in scratch.output.iter().zip(transpose) {
                m.check_to_var[e] = x;
            }
        }
        !syndrome
    }

    fn finish(&mut self, frame: usize) {
        let graph = &*self.graph;
        let m = self.messages.frame_mut(frame);
        for (v, (&llr, post)) in m.intrinsic.iter().zip(m.posterior.iter_mut()).enumerate() {
            *post = var_total(llr, &m.check_to_var[graph.var_edges(v)]);
        }
    }
}

impl<T: Llr> FrameDecoder<T> for Decoder<T> {
    fn config(&self) -> &DecoderConfig {
        &self.config
    }

    fn messages(&self) -> &MessageStore<T> {
        &self.messages
    }

    fn messages_mut(&mut self) -> &mut MessageStore<T> {
        &mut self.messages
    }

    fn codeword_len(&self) -> usize {
        self.graph.num_vars()
    }
}

impl<T: Llr> LdpcDecoder for Decoder<T> {
    fn decode(&mut self, llrs: &[f64]) -> Result<Vec<DecoderOutput>, Error> {
        super::decode_f64(self, llrs)
    }

    fn decode_soft(
        &mut self,
        llrs: &[f64],
        extrinsic: &mut [f64],
    ) -> Result<Vec<FrameStatus>, Error> {
        super::decode_soft_f64(self, llrs, extrinsic)
    }

    fn codeword_len(&self) -> usize {
        self.graph.num_vars()
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn johnson() -> SparseMatrix {
        // Example 2.5 in Sarah J. Johnson - Iterative Error Correction
        SparseMatrix::from_rows(
            6,
            &[vec![0, 1, 3], vec![1, 2, 4], vec![0, 4, 5], vec![2, 3, 5]],
        )
    }

    // These are based on example 2.23 in Sarah J. Johnson - Iterative Error Correction

    fn to_llrs(bits: &[u8]) -> Vec<f64> {
        bits.iter()
            .map(|&b| if b == 0 { 1.3863 } else { -1.3863 })
            .collect()
    }

    fn rules<T: Llr>() -> Vec<CheckUpdate<T>> {
        let mut rules = vec![
            CheckUpdate::SumProduct,
            CheckUpdate::LogSumProduct,
            CheckUpdate::MinSum,
        ];
        if !(T::FIXED_POINT && T::BITS <= 8) {
            rules.push(CheckUpdate::offset_min_sum(T::from_f64(0.25)).unwrap());
            rules.push(CheckUpdate::normalized_min_sum(0.75, T::zero()).unwrap());
        }
        rules
    }

    fn no_errors_with<T: Llr>() {
        let codeword = [0, 0, 1, 0, 1, 1];
        for rule in rules::<T>() {
            let mut decoder = Decoder::<T>::new(&johnson(), rule, DecoderConfig::default()).unwrap();
            let output = LdpcDecoder::decode(&mut decoder, &to_llrs(&codeword)).unwrap();
            assert_eq!(
                output,
                vec![DecoderOutput {
                    codeword: codeword.to_vec(),
                    iterations: 1,
                    converged: true,
                }],
                "{rule:?}"
            );
        }
    }

    #[test]
    fn no_errors() {
        no_errors_with::<f64>();
        no_errors_with::<f32>();
        no_errors_with::<i8>();
        no_errors_with::<i16>();
        no_errors_with::<i32>();
    }

    #[test]
    fn single_error() {
        let codeword_good = [0, 0, 1, 0, 1, 1];
        for rule in [CheckUpdate::SumProduct, CheckUpdate::LogSumProduct, CheckUpdate::MinSum] {
            let mut decoder =
                Decoder::<f64>::new(&johnson(), rule, DecoderConfig::default()).unwrap();
            for j in 0..codeword_good.len() {
                let mut codeword_bad = codeword_good;
                codeword_bad[j] ^= 1;
                let output = LdpcDecoder::decode(&mut decoder, &to_llrs(&codeword_bad)).unwrap();
                assert_eq!(&output[0].codeword, &codeword_good, "{rule:?}, error in bit {j}");
                assert_eq!(output[0].iterations, 3);
                assert!(output[0].converged);
            }
        }
    }

    #[test]
    fn toy_code_single_error() {
        // N = 4, K = 2. Bits 1 and 3 are in both checks.
        let h = SparseMatrix::from_rows(4, &[vec![0, 1, 3], vec![1, 2, 3]]);
        let codeword = [1, 0, 1, 1];
        assert!(h.is_codeword(&codeword));
        // bit 3 received with the wrong sign and low reliability
        let received = [-2.0, 1.5, -2.5, 0.5];
        let mut decoder =
            Decoder::<f64>::new(&h, CheckUpdate::SumProduct, DecoderConfig::default()).unwrap();
        let output = decoder.decode(&received).unwrap();
        assert_eq!(output[0].codeword, codeword);
        assert!(output[0].converged);
        assert!(output[0].iterations <= 3);
        assert_eq!(output[0].information_bits(&[0, 1]), Some(vec![1, 0]));
        assert_eq!(output[0].information_bits(&[0, 4]), None);
    }

    #[test]
    fn batch_of_identical_frames() {
        let mut bad = [0, 0, 1, 0, 1, 1];
        bad[2] ^= 1;
        let llrs = to_llrs(&bad);
        let mut single =
            Decoder::<i16>::new(&johnson(), CheckUpdate::MinSum, DecoderConfig::default()).unwrap();
        let expected = LdpcDecoder::decode(&mut single, &llrs).unwrap();
        let mut batched = Decoder::<i16>::new(
            &johnson(),
            CheckUpdate::MinSum,
            DecoderConfig::default().with_batch_size(3),
        )
        .unwrap();
        let output = LdpcDecoder::decode(&mut batched, &llrs.repeat(3)).unwrap();
        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|o| o == &expected[0]));
    }

    #[test]
    fn batch_frames_are_independent() {
        let good = [0, 0, 1, 0, 1, 1];
        let mut bad = good;
        bad[5] ^= 1;
        let mut llrs = to_llrs(&good);
        llrs.extend(to_llrs(&bad));
        let mut decoder = Decoder::<f32>::new(
            &johnson(),
            CheckUpdate::SumProduct,
            DecoderConfig::default().with_batch_size(2),
        )
        .unwrap();
        let output = LdpcDecoder::decode(&mut decoder, &llrs).unwrap();
        assert_eq!(output[0].iterations, 1);
        assert_eq!(output[1].iterations, 3);
        assert!(output.iter().all(|o| o.codeword == good));
    }

    #[test]
    fn not_converged_is_not_an_error() {
        let mut bad = [0, 0, 1, 0, 1, 1];
        bad[0] ^= 1;
        let mut decoder = Decoder::<f64>::new(
            &johnson(),
            CheckUpdate::SumProduct,
            DecoderConfig::default().with_max_iterations(1),
        )
        .unwrap();
        let output = LdpcDecoder::decode(&mut decoder, &to_llrs(&bad)).unwrap();
        assert_eq!(output[0].iterations, 1);
        assert!(!output[0].converged);
        assert_eq!(output[0].codeword.len(), 6);
    }

    #[test]
    fn syndrome_disabled_runs_all_iterations() {
        let codeword = [0, 0, 1, 0, 1, 1];
        let mut decoder = Decoder::<f64>::new(
            &johnson(),
            CheckUpdate::MinSum,
            DecoderConfig::default()
                .with_max_iterations(7)
                .with_syndrome(false),
        )
        .unwrap();
        let output = LdpcDecoder::decode(&mut decoder, &to_llrs(&codeword)).unwrap();
        assert_eq!(output[0].iterations, 7);
        assert!(output[0].converged);
        assert_eq!(output[0].codeword, codeword);
    }

    #[test]
    fn syndrome_depth_delays_stop() {
        let codeword = [0, 0, 1, 0, 1, 1];
        let mut decoder = Decoder::<f64>::new(
            &johnson(),
            CheckUpdate::MinSum,
            DecoderConfig::default().with_syndrome_depth(3),
        )
        .unwrap();
        let output = LdpcDecoder::decode(&mut decoder, &to_llrs(&codeword)).unwrap();
        assert_eq!(output[0].iterations, 3);
        assert!(output[0].converged);
    }

    #[test]
    fn soft_output() {
        let codeword = [0, 0, 1, 0, 1, 1];
        let llrs = to_llrs(&codeword);
        let mut decoder =
            Decoder::<f64>::new(&johnson(), CheckUpdate::MinSum, DecoderConfig::default()).unwrap();
        let mut extrinsic = vec![0.0; 6];
        let status = LdpcDecoder::decode_soft(&mut decoder, &llrs, &mut extrinsic).unwrap();
        assert!(status[0].converged);
        // each bit is in two checks, and each check sends +-1.3863
        for (&e, &x) in extrinsic.iter().zip(&llrs) {
            assert!((e - 2.0 * x).abs() < 1e-12);
        }
        for (&p, &x) in decoder.posterior(0).iter().zip(&llrs) {
            assert!((p - 3.0 * x).abs() < 1e-12);
        }
        assert_eq!(
            LdpcDecoder::decode_soft(&mut decoder, &llrs, &mut [0.0; 5]),
            Err(Error::OutputLength {
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn input_length_mismatch() {
        let mut decoder = Decoder::<f32>::new(
            &johnson(),
            CheckUpdate::MinSum,
            DecoderConfig::default().with_batch_size(2),
        )
        .unwrap();
        assert_eq!(
            decoder.decode(&[1.0; 6]),
            Err(Error::InputLength {
                expected: 12,
                actual: 6
            })
        );
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            Decoder::<i8>::new(
                &johnson(),
                CheckUpdate::OffsetMinSum { offset: 1 },
                DecoderConfig::default()
            )
            .unwrap_err(),
            Error::PrecisionTooLow { bits: 8 }
        );
        assert_eq!(
            Decoder::<f64>::new(
                &johnson(),
                CheckUpdate::MinSum,
                DecoderConfig::default().with_max_iterations(0)
            )
            .unwrap_err(),
            Error::InvalidIterations
        );
        let mut h = johnson();
        h.insert(0, 2);
        h.insert(0, 2);
        assert!(matches!(
            Decoder::<f64>::new(&h, CheckUpdate::MinSum, DecoderConfig::default()),
            Err(Error::InvalidMatrix(_))
        ));
    }

    #[test]
    fn shared_graph() {
        fn assert_send_sync<S: Send + Sync>(_: &S) {}
        let graph = Arc::new(TannerGraph::from_matrix(&johnson()).unwrap());
        assert_send_sync(&graph);
        let a = Decoder::<f32>::from_graph(
            Arc::clone(&graph),
            CheckUpdate::MinSum,
            DecoderConfig::default(),
        )
        .unwrap();
        let b = Decoder::<f32>::from_graph(
            Arc::clone(&graph),
            CheckUpdate::SumProduct,
            DecoderConfig::default(),
        )
        .unwrap();
        assert!(Arc::ptr_eq(a.graph(), b.graph()));
        let handles = [a, b].map(|mut decoder| {
            std::thread::spawn(move || {
                let llrs = to_llrs(&[0, 0, 1, 0, 1, 1]);
                LdpcDecoder::decode(&mut decoder, &llrs).unwrap()
            })
        });
        for handle in handles {
            assert_eq!(handle.join().unwrap()[0].codeword, vec![0, 0, 1, 0, 1, 1]);
        }
    }
}
