//! Fixed-size feature vectors from section similarity matrices.
//!
//! Two documents with `r` and `c` sections give an `r x c` matrix of
//! section cosine similarities. Classifiers need a fixed input size, so
//! every matrix is reshaped to `N x N`:
//!
//! - rows shorter than `N` are right-padded with zeros
//! - rows longer than `N` are reduced by a [`ReductionPolicy`]
//! - missing rows are zero rows, rows past `N` are dropped
//!
//! The result is flattened row-major. With a row mask every row carries one
//! extra trailing value, 1.0 for a real section and 0.0 for padding.

use std::fmt;
use std::str::FromStr;

use crate::error::{SimilarityError, SimilarityResult};
use crate::vector::cosine_similarity;

/// How a row with more than `N` columns is shortened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReductionPolicy {
    /// Keep the first `N` columns
    Truncate,
    /// Keep the first `N - 1` columns and append the mean of the rest
    Average,
}

impl ReductionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Truncate => "truncate",
            Self::Average => "avg",
        }
    }
}

impl fmt::Display for ReductionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionPolicy {
    type Err = SimilarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truncate" => Ok(Self::Truncate),
            "avg" | "average" => Ok(Self::Average),
            _ => Err(SimilarityError::UnknownPolicy {
                name: s.to_string(),
            }),
        }
    }
}

/// Dense row-major matrix of section similarities.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSimilarityMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl SectionSimilarityMatrix {
    /// Cosine similarity of every source section against every destination section.
    ///
    /// Zero vectors compare as 0.
    pub fn compute(src: &[&[f32]], dest: &[&[f32]]) -> Self {
        let values = src
            .iter()
            .flat_map(|a| dest.iter().map(move |b| cosine_similarity(a, b)))
            .collect();
        Self {
            rows: src.len(),
            cols: dest.len(),
            values,
        }
    }

    /// Matrix from explicit row-major values.
    pub fn from_rows(rows: &[Vec<f32>]) -> SimilarityResult<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(SimilarityError::config("Matrix rows must have equal length"));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            values: rows.concat(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell value; 0 outside the matrix.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        if row < self.rows && col < self.cols {
            self.values[row * self.cols + col]
        } else {
            0.0
        }
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Reshapes section similarity matrices to `N x N` feature vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionMatrixTransformer {
    sections: usize,
    policy: ReductionPolicy,
    row_mask: bool,
}

impl SectionMatrixTransformer {
    pub fn new(sections: usize, policy: ReductionPolicy) -> SimilarityResult<Self> {
        if sections == 0 {
            return Err(SimilarityError::config(
                "Number of sections per document must be at least 1",
            ));
        }
        Ok(Self {
            sections,
            policy,
            row_mask: false,
        })
    }

    pub fn with_row_mask(mut self, row_mask: bool) -> Self {
        self.row_mask = row_mask;
        self
    }

    pub fn sections(&self) -> usize {
        self.sections
    }

    pub fn policy(&self) -> ReductionPolicy {
        self.policy
    }

    pub fn row_mask(&self) -> bool {
        self.row_mask
    }

    /// Length of every produced feature vector.
    pub fn feature_len(&self) -> usize {
        self.sections * self.row_len()
    }

    fn row_len(&self) -> usize {
        self.sections + usize::from(self.row_mask)
    }

    pub fn similarity_matrix(&self, src: &[&[f32]], dest: &[&[f32]]) -> SectionSimilarityMatrix {
        SectionSimilarityMatrix::compute(src, dest)
    }

    /// Feature vector of two documents' section vectors.
    pub fn transform(&self, src: &[&[f32]], dest: &[&[f32]]) -> Vec<f32> {
        self.transform_matrix(&self.similarity_matrix(src, dest))
    }

    /// Feature vector of a precomputed matrix.
    pub fn transform_matrix(&self, matrix: &SectionSimilarityMatrix) -> Vec<f32> {
        let n = self.sections;
        let mut features = Vec::with_capacity(self.feature_len());

        for row in 0..n {
            if row < matrix.rows() {
                self.reduce_row(matrix.row(row), &mut features);
                if self.row_mask {
                    features.push(1.0);
                }
            } else {
                features.extend(std::iter::repeat_n(0.0, self.row_len()));
            }
        }

        features
    }

    fn reduce_row(&self, row: &[f32], out: &mut Vec<f32>) {
        let n = self.sections;
        if row.len() <= n {
            out.extend_from_slice(row);
            out.extend(std::iter::repeat_n(0.0, n - row.len()));
            return;
        }

        match self.policy {
            ReductionPolicy::Truncate => out.extend_from_slice(&row[..n]),
            ReductionPolicy::Average => {
                out.extend_from_slice(&row[..n - 1]);
                let tail = &row[n - 1..];
                let mean = tail.iter().map(|&v| f64::from(v)).sum::<f64>() / tail.len() as f64;
                out.push(mean as f32);
            }
        }
    }
}
