//! Tanner graph.
//!
//! This module contains [`TannerGraph`], the immutable bipartite graph
//! representation of a parity check matrix that the belief propagation
//! decoders walk. Each nonzero entry of H is an edge, and every edge has two
//! positions: one in the variable-major edge ordering (all the edges of
//! variable 0, then those of variable 1, etc.) and one in the check-major edge
//! ordering. The graph stores the incidence lists in both orderings, plus a
//! transpose permutation that maps each check-major edge to its variable-major
//! position.

use crate::sparse::SparseMatrix;
use std::ops::Range;
use thiserror::Error;

/// Parity check matrix error.
///
/// These are the reasons why a parity check matrix can be rejected when
/// building a [`TannerGraph`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum MatrixError {
    /// The matrix has no rows or no columns.
    #[error("the parity check matrix has no rows or no columns")]
    Empty,
    /// A row has zero weight.
    #[error("row {0} of the parity check matrix has zero weight")]
    EmptyRow(usize),
    /// A column has zero weight.
    #[error("column {0} of the parity check matrix has zero weight")]
    EmptyColumn(usize),
    /// An entry has been inserted more than once.
    #[error("entry ({row}, {col}) of the parity check matrix is repeated")]
    DuplicateEntry {
        /// Row of the repeated entry.
        row: usize,
        /// Column of the repeated entry.
        col: usize,
    },
}

/// Tanner graph of an LDPC code.
///
/// Variable nodes correspond to the columns of the parity check matrix and
/// check nodes to its rows. The incidence lists of each check node follow the
/// order of the corresponding matrix row, and the incidence lists of each
/// variable node are sorted by check index.
///
/// # Examples
/// ```
/// # use ldpc_bp::{decoder::tanner::TannerGraph, sparse::SparseMatrix};
/// let h = SparseMatrix::from_rows(4, &[vec![0, 1, 3], vec![1, 2, 3]]);
/// let graph = TannerGraph::from_matrix(&h)?;
/// assert_eq!(graph.num_edges(), 6);
/// assert_eq!(graph.var_degree(3), 2);
/// assert_eq!(graph.check_vars(1), &[1, 2, 3]);
/// # Ok::<(), ldpc_bp::decoder::tanner::MatrixError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TannerGraph {
    // var_offsets[v]..var_offsets[v + 1] are the variable-major edges of v
    var_offsets: Box<[usize]>,
    // check adjacent to each variable-major edge
    var_checks: Box<[usize]>,
    // check_offsets[c]..check_offsets[c + 1] are the check-major edges of c
    check_offsets: Box<[usize]>,
    // variable adjacent to each check-major edge
    check_vars: Box<[usize]>,
    // variable-major position of each check-major edge
    transpose: Box<[usize]>,
    max_check_degree: usize,
}

impl TannerGraph {
    /// Builds the Tanner graph of a parity check matrix.
    ///
    /// The construction cost is linear in the number of nonzero entries.
    ///
    /// # Errors
    ///
    /// An error is returned if the matrix is empty, if some row or column has
    /// zero weight, or if some entry has been inserted more than once.
    pub fn from_matrix(h: &SparseMatrix) -> Result<TannerGraph, MatrixError> {
        let num_checks = h.num_rows();
        let num_vars = h.num_cols();
        if num_checks == 0 || num_vars == 0 {
            return Err(MatrixError::Empty);
        }
        if let Some(r) = (0..num_checks).find(|&r| h.row_weight(r) == 0) {
            return Err(MatrixError::EmptyRow(r));
        }
        if let Some(c) = (0..num_vars).find(|&c| h.col_weight(c) == 0) {
            return Err(MatrixError::EmptyColumn(c));
        }

        let var_offsets = prefix_offsets((0..num_vars).map(|v| h.col_weight(v)));
        let check_offsets = prefix_offsets((0..num_checks).map(|c| h.row_weight(c)));
        let num_edges = check_offsets[num_checks];
        debug_assert_eq!(num_edges, var_offsets[num_vars]);

        let mut var_checks = vec![0; num_edges].into_boxed_slice();
        let mut check_vars = vec![0; num_edges].into_boxed_slice();
        let mut transpose = vec![0; num_edges].into_boxed_slice();
        // Next free variable-major slot of each variable. Visiting the checks
        // in increasing order leaves the variable incidence lists sorted.
        let mut cursor = var_offsets[..num_vars].to_vec();
        // Last check that visited each variable, to detect repeated entries.
        let mut last_check = vec![usize::MAX; num_vars];
        let mut edge = 0;
        for c in 0..num_checks {
            for &v in h.iter_row(c) {
                if last_check[v] == c {
                    return Err(MatrixError::DuplicateEntry { row: c, col: v });
                }
                last_check[v] = c;
                let slot = cursor[v];
                cursor[v] += 1;
                var_checks[slot] = c;
                check_vars[edge] = v;
                transpose[edge] = slot;
                edge += 1;
            }
        }
        let max_check_degree = (0..num_checks)
            .map(|c| check_offsets[c + 1] - check_offsets[c])
            .max()
            .unwrap_or(0);

        tracing::debug!(
            num_vars,
            num_checks,
            num_edges,
            max_check_degree,
            "built Tanner graph"
        );

        Ok(TannerGraph {
            var_offsets,
            var_checks,
            check_offsets,
            check_vars,
            transpose,
            max_check_degree,
        })
    }

    /// Returns the number of variable nodes (the codeword length).
    pub fn num_vars(&self) -> usize {
        self.var_offsets.len() - 1
    }

    /// Returns the number of check nodes.
    pub fn num_checks(&self) -> usize {
        self.check_offsets.len() - 1
    }

    /// Returns the number of edges (nonzero entries of H).
    pub fn num_edges(&self) -> usize {
        self.transpose.len()
    }

    /// Returns the degree of a variable node.
    pub fn var_degree(&self, var: usize) -> usize {
        self.var_offsets[var + 1] - self.var_offsets[var]
    }

    /// Returns the degree of a check node.
    pub fn check_degree(&self, check: usize) -> usize {
        self.check_offsets[check + 1] - self.check_offsets[check]
    }

    /// Returns the maximum check node degree.
    pub fn max_check_degree(&self) -> usize {
        self.max_check_degree
    }

    /// Returns the range of variable-major edges of a variable node.
    pub fn var_edges(&self, var: usize) -> Range<usize> {
        self.var_offsets[var]..self.var_offsets[var + 1]
    }

    /// Returns the range of check-major edges of a check node.
    pub fn check_edges(&self, check: usize) -> Range<usize> {
        self.check_offsets[check]..self.check_offsets[check + 1]
    }

    /// Returns the checks adjacent to a variable node.
    pub fn var_checks(&self, var: usize) -> &[usize] {
        &self.var_checks[self.var_edges(var)]
    }

    /// Returns the variables adjacent to a check node.
    pub fn check_vars(&self, check: usize) -> &[usize] {
        &self.check_vars[self.check_edges(check)]
    }

    /// Returns the variable-major positions of the edges of a check node.
    ///
    /// The `j`-th element is the variable-major position of the edge between
    /// `check` and `self.check_vars(check)[j]`.
    pub fn check_transpose(&self, check: usize) -> &[usize] {
        &self.transpose[self.check_edges(check)]
    }

    /// Returns the transpose permutation.
    ///
    /// This maps each check-major edge index to its variable-major edge index.
    pub fn transpose(&self) -> &[usize] {
        &self.transpose
    }

    /// Returns the variable adjacent to each check-major edge.
    pub fn edge_vars(&self) -> &[usize] {
        &self.check_vars
    }
}

fn prefix_offsets<I: Iterator<Item = usize>>(degrees: I) -> Box<[usize]> {
    std::iter::once(0)
        .chain(degrees.scan(0, |acc, d| {
            *acc += d;
            Some(*acc)
        }))
        .collect()
}
