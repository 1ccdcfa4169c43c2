//! Decoder message storage.
//!
//! The [`MessageStore`] holds all the per-frame state of a decoder: the
//! intrinsic (channel) LLRs, the a-posteriori LLRs, and one message per edge
//! of the Tanner graph in each direction. The buffers are allocated once when
//! the decoder is built and are overwritten in every decode call. Frames are
//! stored contiguously (frame-major layout).

use super::{arithmetic::Llr, tanner::TannerGraph};

/// Per-decoder message buffers for a batch of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageStore<T> {
    num_vars: usize,
    num_edges: usize,
    batch_size: usize,
    intrinsic: Box<[T]>,
    posterior: Box<[T]>,
    var_to_check: Box<[T]>,
    check_to_var: Box<[T]>,
}

/// Mutable view of the messages of one frame.
#[derive(Debug)]
pub struct FrameMessages<'a, T> {
    /// Intrinsic LLRs, one per variable node.
    pub intrinsic: &'a [T],
    /// A-posteriori LLRs, one per variable node.
    pub posterior: &'a mut [T],
    /// Variable-to-check messages, one per edge (empty in layered decoders).
    pub var_to_check: &'a mut [T],
    /// Check-to-variable messages, one per edge.
    pub check_to_var: &'a mut [T],
}

impl<T: Llr> MessageStore<T> {
    /// Creates the message store of a flooding decoder.
    ///
    /// Both message directions are stored, in variable-major edge order.
    pub fn flooding(graph: &TannerGraph, batch_size: usize) -> MessageStore<T> {
        Self::with_buffers(graph, batch_size, true)
    }

    /// Creates the message store of a layered decoder.
    ///
    /// Only the check-to-variable messages are stored, in check-major edge
    /// order. The a-posteriori LLRs are updated in place layer after layer.
    pub fn layered(graph: &TannerGraph, batch_size: usize) -> MessageStore<T> {
        Self::with_buffers(graph, batch_size, false)
    }

    fn with_buffers(graph: &TannerGraph, batch_size: usize, var_to_check: bool) -> Self {
        let num_vars = graph.num_vars();
        let num_edges = graph.num_edges();
        let zeros = |n: usize| vec![T::zero(); n].into_boxed_slice();
        MessageStore {
            num_vars,
            num_edges,
            batch_size,
            intrinsic: zeros(num_vars * batch_size),
            posterior: zeros(num_vars * batch_size),
            var_to_check: zeros(if var_to_check {
                num_edges * batch_size
            } else {
                0
            }),
            check_to_var: zeros(num_edges * batch_size),
        }
    }

    /// Returns the number of frames in the batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Loads the intrinsic LLRs of the whole batch and clears the messages.
    ///
    /// The a-posteriori LLRs are initialized to the intrinsic LLRs. Values
    /// outside the symmetric range of `T` are saturated.
    ///
    /// # Panics
    ///
    /// Panics if `llrs` does not contain one value per variable node and
    /// frame.
    pub fn load(&mut self, llrs: &[T]) {
        assert_eq!(llrs.len(), self.intrinsic.len());
        self.fill(llrs.iter().map(|x| x.saturate()));
    }

    /// Quantizes and loads the intrinsic LLRs of the whole batch.
    ///
    /// This works like [`MessageStore::load`], quantizing the LLRs with
    /// [`Llr::from_f64`].
    ///
    /// # Panics
    ///
    /// Panics if `llrs` does not contain one value per variable node and
    /// frame.
    pub fn load_f64(&mut self, llrs: &[f64]) {
        assert_eq!(llrs.len(), self.intrinsic.len());
        self.fill(llrs.iter().map(|&x| T::from_f64(x)));
    }

    fn fill<I: Iterator<Item = T>>(&mut self, llrs: I) {
        for ((x, p), y) in self
            .intrinsic
            .iter_mut()
            .zip(self.posterior.iter_mut())
            .zip(llrs)
        {
            *x = y;
            *p = y;
        }
        self.var_to_check.fill(T::zero());
        self.check_to_var.fill(T::zero());
    }

    /// Returns the messages of one frame.
    pub fn frame_mut(&mut self, frame: usize) -> FrameMessages<'_, T> {
        let vars = frame * self.num_vars..(frame + 1) * self.num_vars;
        let edges = frame * self.num_edges..(frame + 1) * self.num_edges;
        let var_to_check = if self.var_to_check.is_empty() {
            &mut self.var_to_check[..]
        } else {
            &mut self.var_to_check[edges.clone()]
        };
        FrameMessages {
            intrinsic: &self.intrinsic[vars.clone()],
            posterior: &mut self.posterior[vars],
            var_to_check,
            check_to_var: &mut self.check_to_var[edges],
        }
    }

    /// Returns the a-posteriori LLRs of one frame.
    pub fn posterior(&self, frame: usize) -> &[T] {
        &self.posterior[frame * self.num_vars..(frame + 1) * self.num_vars]
    }

    /// Returns the intrinsic LLRs of one frame.
    pub fn intrinsic(&self, frame: usize) -> &[T] {
        &self.intrinsic[frame * self.num_vars..(frame + 1) * self.num_vars]
    }
}

/// Scratch buffers for one check node update.
///
/// These are sized for the largest check node degree of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckScratch<T> {
    /// Gathered incoming messages.
    pub input: Box<[T]>,
    /// Outgoing messages.
    pub output: Box<[T]>,
    /// Work space for the check node update rule.
    pub work: Box<[f64]>,
}

impl<T: Llr> CheckScratch<T> {
    /// Creates scratch buffers for a Tanner graph.
    pub fn new(graph: &TannerGraph) -> CheckScratch<T> {
        let n = graph.max_check_degree();
        CheckScratch {
            input: vec![T::zero(); n].into_boxed_slice(),
            output: vec![T::zero(); n].into_boxed_slice(),
            work: vec![0.0; n].into_boxed_slice(),
        }
    }
}
