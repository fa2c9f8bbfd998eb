//! Host-side parameter initialization.
//!
//! Weights are produced as row-major `[dim_input, dim_output]` buffers,
//! which is the layout of [`Dense::weight`](super::Dense::weight).
//! Each input row is sampled from its own seeded generator, so the values
//! only depend on the seed and not on the thread schedule.

pub use super::*;

use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use std::ops::Range;

/// Sampling `N(mean, std)` for a `[dim_input, dim_output]` weight.
pub fn normal(
    dim_input: usize,
    dim_output: usize,
    mean: f32,
    std: f32,
    seed: u64,
) -> Result<Vec<f32>, Error> {
    let distribution = Normal::new(mean, std).map_err(|_| {
        Error::Configuration(
            format!("The standard deviation ({std})"),
            "finite and non-negative".into(),
        )
    })?;
    Ok(sample_rows(dim_input, dim_output, &distribution, seed))
}

/// Zeroing the input rows in `rows` of a `[dim_input, dim_output]` weight.
///
/// The rows are the input channels, i.e., the columns of the weight in
/// `[dim_output, dim_input]` layout.
pub fn zero_rows(
    weight: &mut [f32],
    dim_output: usize,
    rows: Range<usize>,
) {
    let start = rows.start * dim_output;
    let end = (rows.end * dim_output).min(weight.len());
    if start < end {
        weight[start..end].fill(0.0);
    }
}

/// Deriving a sub-seed, e.g., one per layer or per row.
#[inline]
pub const fn derive_seed(
    seed: u64,
    index: u64,
) -> u64 {
    seed ^ index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn sample_rows<D: Distribution<f32> + Sync>(
    row_count: usize,
    dim_output: usize,
    distribution: &D,
    seed: u64,
) -> Vec<f32> {
    (0..row_count)
        .into_par_iter()
        .map(|row| {
            let rng = &mut StdRng::seed_from_u64(derive_seed(seed, row as u64));
            distribution
                .sample_iter(rng)
                .take(dim_output)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .concat()
}
