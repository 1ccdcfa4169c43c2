//! LDPC decoder with horizontal layered schedule.
//!
//! This module implements a generic belief propagation LDPC decoder with a
//! horizontal layered schedule as described in [An Efficient Message-Passing
//! Schedule for LDPC Decoding](https://www.eng.biu.ac.il/~goldbej/papers/engisrael.pdf),
//! by E. Sharon, S. Litsyn, and J. Goldberg.
//!
//! The check nodes are partitioned into [`Layers`] of consecutive rows of the
//! parity check matrix. An iteration visits the layers in row order, and each
//! layer starts from the a-posteriori LLRs already updated by the previous
//! layers of the same iteration. The checks inside a layer are processed in
//! parallel: all of them read the a-posteriori LLRs as they were at the start
//! of the layer. Thus a single layer holding all the checks behaves as the
//! flooding schedule, and one check per layer gives the fully serial
//! schedule.
//!
//! Only the check-to-variable ("branch") messages are stored, in check-major
//! edge order. The variable-to-check messages of a layer are recomputed as
//! the a-posteriori LLR minus the branch message of the previous iteration.
//! The stop criterion uses the parity checks of the hard decisions on the
//! a-posteriori LLRs after the last layer of each iteration.

use super::{
    arithmetic::Llr,
    batch::Schedule,
    check::CheckUpdate,
    messages::{CheckScratch, MessageStore},
    check_llrs,
    tanner::TannerGraph,
    DecoderConfig, DecoderOutput, Error, FrameDecoder, FrameStatus, LdpcDecoder,
};
use crate::sparse::SparseMatrix;
use std::ops::Range;
use std::sync::Arc;

/// Partition of the check nodes into layers.
///
/// Each layer is a range of consecutive check nodes. The layers cover all the
/// check nodes in increasing order.
///
/// # Examples
/// ```
/// # use ldpc_bp::decoder::horizontal_layered::Layers;
/// let layers = Layers::uniform(10, 4)?;
/// assert_eq!(layers.num_layers(), 3);
/// assert_eq!(layers.iter().collect::<Vec<_>>(), vec![0..4, 4..8, 8..10]);
/// # Ok::<(), ldpc_bp::decoder::Error>(())
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Layers {
    // layer i contains the checks bounds[i]..bounds[i + 1]
    bounds: Box<[usize]>,
}

impl Layers {
    /// Splits `num_checks` check nodes into layers of `layer_size` checks.
    ///
    /// The last layer is shorter if `layer_size` does not divide
    /// `num_checks`. A `layer_size` larger than `num_checks` gives a single
    /// layer.
    ///
    /// # Errors
    ///
    /// Fails if `layer_size` is zero.
    pub fn uniform(num_checks: usize, layer_size: usize) -> Result<Layers, Error> {
        if layer_size == 0 {
            return Err(Error::InvalidLayerSize);
        }
        let bounds = (0..num_checks)
            .step_by(layer_size)
            .chain(std::iter::once(num_checks))
            .collect();
        Ok(Layers { bounds })
    }

    /// Returns a single layer containing all the check nodes.
    pub fn single(num_checks: usize) -> Layers {
        Layers {
            bounds: vec![0, num_checks].into_boxed_slice(),
        }
    }

    /// Returns the number of layers.
    pub fn num_layers(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Returns the number of check nodes covered by the layers.
    pub fn num_checks(&self) -> usize {
        self.bounds[self.bounds.len() - 1]
    }

    /// Returns an iterator over the check node ranges of the layers.
    pub fn iter(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.bounds.windows(2).map(|w| w[0]..w[1])
    }
}

/// LDPC belief propagation horizontal layered decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoder<T: Llr> {
    graph: Arc<TannerGraph>,
    rule: CheckUpdate<T>,
    config: DecoderConfig,
    layers: Layers,
    messages: MessageStore<T>,
    // variable-to-check messages of the current layer
    contributions: Box<[T]>,
    scratch: CheckScratch<T>,
}

impl<T: Llr> Decoder<T> {
    /// Creates a new horizontal layered LDPC decoder.
    ///
    /// The parameter `h` indicates the parity check matrix, `rule` the check
    /// node update rule and `config` the decoder configuration. The rows of
    /// `h` are grouped in layers of `layer_size` rows.
    ///
    /// # Errors
    ///
    /// Fails if the parity check matrix, the rule, the configuration or the
    /// layer size are invalid.
    pub fn new(
        h: &SparseMatrix,
        rule: CheckUpdate<T>,
        config: DecoderConfig,
        layer_size: usize,
    ) -> Result<Self, Error> {
        let graph = Arc::new(TannerGraph::from_matrix(h)?);
        let layers = Layers::uniform(graph.num_checks(), layer_size)?;
        Self::from_graph(graph, rule, config, layers)
    }

    /// Creates a new horizontal layered LDPC decoder from a Tanner graph.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`Decoder::new`], this fails with
    /// [`Error::InvalidLayerSize`] if `layers` does not cover the check
    /// nodes of `graph`.
    pub fn from_graph(
        graph: Arc<TannerGraph>,
        rule: CheckUpdate<T>,
        config: DecoderConfig,
        layers: Layers,
    ) -> Result<Self, Error> {
        config.validate()?;
        rule.validate()?;
        if layers.num_checks() != graph.num_checks() {
            return Err(Error::InvalidLayerSize);
        }
        let max_layer_edges = layers
            .iter()
            .map(|layer| layer.map(|c| graph.check_degree(c)).sum::<usize>())
            .max()
            .unwrap_or(0);
        let messages = MessageStore::layered(&graph, config.batch_size);
        let scratch = CheckScratch::new(&graph);
        Ok(Decoder {
            graph,
            rule,
            config,
            layers,
            messages,
            contributions: vec![T::zero(); max_layer_edges].into_boxed_slice(),
            scratch,
        })
    }

    /// Decodes a batch of frames.
    ///
    /// This works as [`flooding::Decoder::decode`](super::flooding::Decoder::decode).
    pub fn decode(&mut self, llrs: &[T]) -> Result<Vec<DecoderOutput>, Error> {
        super::decode(self, llrs)
    }

    /// Decodes a batch of frames producing extrinsic LLRs.
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

    /// Returns the layers of the decoder.
    pub fn layers(&self) -> &Layers {
        &self.layers
    }
}

impl<T: Llr> Schedule for Decoder<T> {
    fn iterate(&mut self, frame: usize) -> bool {
        let graph = &*self.graph;
        let scratch = &mut self.scratch;
        let edge_vars = graph.edge_vars();
        let m = self.messages.frame_mut(frame);
        let posterior = m.posterior;
        let branches = m.check_to_var;

        for layer in self.layers.iter() {
            let first = graph.check_edges(layer.start).start;
            let last = graph.check_edges(layer.end - 1).end;
            let contributions = &mut self.contributions[..last - first];
            for ((x, &v), &branch) in contributions
                .iter_mut()
                .zip(&edge_vars[first..last])
                .zip(&branches[first..last])
            {
                *x = posterior[v].sat_sub(branch);
            }
            for c in layer {
                let edges = graph.check_edges(c);
                let degree = edges.len();
                self.rule.update(
                    &contributions[edges.start - first..edges.end - first],
                    &mut scratch.output,
                    &mut scratch.work,
                );
                for (e, &new) in edges.zip(&scratch.output[..degree]) {
                    let v = edge_vars[e];
                    posterior[v] = posterior[v].sat_sub(branches[e]).sat_add(new);
                    branches[e] = new;
                }
            }
        }
        // syndrome of the hard decisions after the last layer
        check_llrs(graph, posterior)
    }

    fn finish(&mut self, _frame: usize) {
        // the a-posteriori LLRs are updated in place by each layer
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
