//! # Sparse binary matrix representation
//!
//! This module implements a representation for the sparse binary parity check
//! matrices that define LDPC codes. Rows correspond to parity checks and
//! columns correspond to codeword bits. The decoders do not use this type
//! directly: they convert it into a [`TannerGraph`](crate::decoder::tanner::TannerGraph),
//! which validates it.

use std::borrow::Borrow;
use std::slice::Iter;

/// A sparse binary parity check matrix.
///
/// The matrix stores the columns of the ones of each row and the rows of the
/// ones of each column, both in insertion order. Inserting the same entry
/// twice is allowed here, but such a matrix is rejected when a decoder is
/// built from it.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SparseMatrix {
    rows: Vec<Vec<usize>>,
    cols: Vec<Vec<usize>>,
}

impl SparseMatrix {
    /// Creates the zero matrix with `nrows` rows and `ncols` columns.
    ///
    /// # Examples
    /// ```
    /// # use ldpc_bp::sparse::SparseMatrix;
    /// let h = SparseMatrix::new(10, 30);
    /// assert_eq!(h.num_rows(), 10);
    /// assert_eq!(h.num_cols(), 30);
    /// assert_eq!(h.nnz(), 0);
    /// ```
    pub fn new(nrows: usize, ncols: usize) -> SparseMatrix {
        SparseMatrix {
            rows: vec![Vec::new(); nrows],
            cols: vec![Vec::new(); ncols],
        }
    }

    /// Builds a matrix from the list of columns holding a one in each row.
    ///
    /// # Panics
    ///
    /// Panics if some column index is not smaller than `ncols`.
    ///
    /// # Examples
    /// ```
    /// # use ldpc_bp::sparse::SparseMatrix;
    /// let h = SparseMatrix::from_rows(4, &[vec![0, 1, 3], vec![1, 2, 3]]);
    /// assert_eq!(h.num_rows(), 2);
    /// assert_eq!(h.col_weight(3), 2);
    /// ```
    pub fn from_rows<R: AsRef<[usize]>>(ncols: usize, rows: &[R]) -> SparseMatrix {
        let mut h = SparseMatrix::new(rows.len(), ncols);
        for (row, cols) in rows.iter().enumerate() {
            h.insert_row(row, cols.as_ref().iter());
        }
        h
    }

    /// Returns the number of rows (parity checks).
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns (codeword bits).
    pub fn num_cols(&self) -> usize {
        self.cols.len()
    }

    /// Returns the number of entries equal to one.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// Returns the number of ones in `row`.
    pub fn row_weight(&self, row: usize) -> usize {
        self.rows[row].len()
    }

    /// Returns the number of ones in `col`.
    pub fn col_weight(&self, col: usize) -> usize {
        self.cols[col].len()
    }

    /// Returns `true` if the entry at `row` and `col` is a one.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows[row].contains(&col)
    }

    /// Inserts a one at `row` and `col`.
    ///
    /// # Examples
    /// ```
    /// # use ldpc_bp::sparse::SparseMatrix;
    /// let mut h = SparseMatrix::new(10, 30);
    /// assert!(!h.contains(3, 7));
    /// h.insert(3, 7);
    /// assert!(h.contains(3, 7));
    /// ```
    pub fn insert(&mut self, row: usize, col: usize) {
        assert!(col < self.cols.len(), "column {col} out of range");
        self.rows[row].push(col);
        self.cols[col].push(row);
    }

    /// Inserts ones in the columns `cols` of `row`.
    ///
    /// # Examples
    /// ```
    /// # use ldpc_bp::sparse::SparseMatrix;
    /// let mut h1 = SparseMatrix::new(10, 30);
    /// let mut h2 = SparseMatrix::new(10, 30);
    /// h1.insert_row(0, [3, 7, 9].iter());
    /// for c in [3, 7, 9] {
    ///     h2.insert(0, c);
    /// }
    /// assert_eq!(h1, h2);
    /// ```
    pub fn insert_row<T, S>(&mut self, row: usize, cols: T)
    where
        T: Iterator<Item = S>,
        S: Borrow<usize>,
    {
        for col in cols {
            self.insert(row, *col.borrow());
        }
    }

    /// Inserts ones in the rows `rows` of `col`.
    ///
    /// This works like [`SparseMatrix::insert_row`].
    pub fn insert_col<T, S>(&mut self, col: usize, rows: T)
    where
        T: Iterator<Item = S>,
        S: Borrow<usize>,
    {
        for row in rows {
            self.insert(*row.borrow(), col);
        }
    }

    /// Returns an [Iterator] over the columns of the ones in `row`.
    pub fn iter_row(&self, row: usize) -> Iter<'_, usize> {
        self.rows[row].iter()
    }

    /// Returns an [Iterator] over the rows of the ones in `col`.
    pub fn iter_col(&self, col: usize) -> Iter<'_, usize> {
        self.cols[col].iter()
    }

    /// Computes the syndrome of a hard decision word.
    ///
    /// Returns one value per row, equal to 1 if the parity check of that row is
    /// violated by `bits` and 0 otherwise. Any nonzero element of `bits`
    /// counts as a one.
    ///
    /// # Panics
    ///
    /// Panics if `bits` does not contain one element per column.
    ///
    /// # Examples
    /// ```
    /// # use ldpc_bp::sparse::SparseMatrix;
    /// let h = SparseMatrix::from_rows(4, &[vec![0, 1, 3], vec![1, 2, 3]]);
    /// assert_eq!(h.syndrome(&[1, 0, 1, 1]), vec![0, 0]);
    /// assert_eq!(h.syndrome(&[1, 0, 1, 0]), vec![1, 1]);
    /// ```
    pub fn syndrome(&self, bits: &[u8]) -> Vec<u8> {
        assert_eq!(bits.len(), self.num_cols());
        self.rows
            .iter()
            .map(|row| row.iter().fold(0, |acc, &c| acc ^ u8::from(bits[c] != 0)))
            .collect()
    }

    /// Returns `true` if `bits` satisfies all the parity checks.
    pub fn is_codeword(&self, bits: &[u8]) -> bool {
        self.syndrome(bits).iter().all(|&s| s == 0)
    }
}
