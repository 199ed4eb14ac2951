//! Synthetic embedding corpus.
//!
//! A [`Corpus`] is one owned row-major `f32` buffer with a fixed stride
//! (`dimension`). Rows are handed out as slices; nothing mutates the buffer
//! after generation.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::{Error, Result};

/// Components shown per vector in report previews.
pub const PREVIEW_COMPONENTS: usize = 10;
/// Corpus rows shown in report previews.
pub const PREVIEW_ROWS: usize = 3;

/// N vectors of dimension D stored contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    dimension: usize,
    data: Vec<f32>,
}

impl Corpus {
    /// Builds a corpus from explicit rows, all of length `dimension`.
    pub fn from_rows(dimension: usize, rows: &[Vec<f32>]) -> Result<Self> {
        let mut data = allocate(dimension, rows.len())?;
        for row in rows {
            if row.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { dimension, data })
    }

    /// Vector dimension (row stride).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    /// Returns true if the corpus holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[inline]
    #[must_use]
    pub fn row(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Iterates over rows in index order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dimension.max(1))
    }

    /// The underlying row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Corpus plus the query vector paired against every row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Dataset vectors.
    pub corpus: Corpus,
    /// Query vector, same dimension as the corpus.
    pub query: Vec<f32>,
}

impl Dataset {
    /// Pairs a corpus with a query of matching dimension.
    pub fn new(corpus: Corpus, query: Vec<f32>) -> Result<Self> {
        if query.len() != corpus.dimension() {
            return Err(Error::DimensionMismatch {
                expected: corpus.dimension(),
                actual: query.len(),
            });
        }
        Ok(Self { corpus, query })
    }

    /// Leading components of the query and first corpus rows, for reports.
    #[must_use]
    pub fn preview(&self) -> Preview {
        let head = |v: &[f32]| v.iter().take(PREVIEW_COMPONENTS).copied().collect();
        Preview {
            query: head(&self.query),
            rows: self.corpus.rows().take(PREVIEW_ROWS).map(head).collect(),
            remaining_components: self.corpus.dimension().saturating_sub(PREVIEW_COMPONENTS),
        }
    }
}

/// Truncated view of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    /// First components of the query.
    pub query: Vec<f32>,
    /// First components of the first corpus rows.
    pub rows: Vec<Vec<f32>>,
    /// Components omitted from each vector.
    pub remaining_components: usize,
}

/// Draws every component independently from `U[-1, 1)`.
#[derive(Debug, Clone)]
pub struct CorpusGenerator {
    dimension: usize,
    size: usize,
    seed: u64,
}

impl CorpusGenerator {
    /// Creates a generator; `None` draws a fresh seed from OS entropy.
    #[must_use]
    pub fn new(dimension: usize, size: usize, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        Self {
            dimension,
            size,
            seed,
        }
    }

    /// Seed in use; reuse it to replay the same dataset.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates the corpus, then the query, from one seeded stream.
    pub fn generate(&self) -> Result<Dataset> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let uniform = Uniform::new(-1.0_f32, 1.0_f32);

        let mut data = allocate(self.dimension, self.size)?;
        for _ in 0..self.dimension * self.size {
            data.push(uniform.sample(&mut rng));
        }

        let mut query = allocate(self.dimension, 1)?;
        for _ in 0..self.dimension {
            query.push(uniform.sample(&mut rng));
        }

        tracing::debug!(
            dimension = self.dimension,
            size = self.size,
            seed = self.seed,
            "corpus generated"
        );

        Dataset::new(
            Corpus {
                dimension: self.dimension,
                data,
            },
            query,
        )
    }
}

/// Reserves an empty buffer for `rows * dimension` components.
fn allocate(dimension: usize, rows: usize) -> Result<Vec<f32>> {
    let elements = dimension
        .checked_mul(rows)
        .ok_or(Error::Allocation { elements: usize::MAX })?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(elements)
        .map_err(|_| Error::Allocation { elements })?;
    Ok(buffer)
}
