//! Positional encoding.

pub use super::*;

/// The configuration for [`PositionalEncoder`].
#[derive(Config, Copy, Debug)]
pub struct PositionalEncoderConfig {
    /// Input dimension.
    pub dim_input: usize,
    /// Count of frequency bands.
    ///
    /// `0` selects the identity mapping.
    pub frequency_count: usize,
}

/// Frequency encoding of coordinates.
///
/// `[x, sin(f_0 x), cos(f_0 x), ..., sin(f_{N-1} x), cos(f_{N-1} x)]`
///
/// ## Details
///
/// The frequencies are log-sampled, i.e., `f_i = 2^i`.
/// With no frequency band, the encoder is the identity mapping.
#[derive(Clone, Debug, Module)]
pub struct PositionalEncoder {
    /// Input dimension.
    pub dim_input: usize,
    /// Count of frequency bands.
    pub frequency_count: usize,
}

impl PositionalEncoderConfig {
    /// Initialize from the configuration.
    #[inline]
    pub fn init(&self) -> PositionalEncoder {
        PositionalEncoder {
            dim_input: self.dim_input,
            frequency_count: self.frequency_count,
        }
    }

    /// The identity mapping.
    #[inline]
    pub fn identity(dim_input: usize) -> Self {
        Self::new(dim_input, 0)
    }
}

impl PositionalEncoder {
    /// Output dimension, `dim_input * (1 + 2 * frequency_count)`.
    #[inline]
    pub const fn dim_output(&self) -> usize {
        self.dim_input * (1 + 2 * self.frequency_count)
    }

    /// Whether it is the identity mapping.
    #[inline]
    pub const fn is_identity(&self) -> bool {
        self.frequency_count == 0
    }

    /// The frequencies, `2^0` to `2^(frequency_count - 1)`.
    pub fn frequencies(&self) -> impl Iterator<Item = f32> {
        (0..self.frequency_count as i32).map(|exponent| 2.0_f32.powi(exponent))
    }

    /// Encode the input coordinates.
    ///
    /// ## Shapes
    ///
    /// * `input` - [`[..., dim_input]`](PositionalEncoder::dim_input)
    /// * `output` - [`[..., dim_output]`](PositionalEncoder::dim_output)
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        if self.is_identity() {
            return input;
        }

        let mut bands = Vec::with_capacity(1 + 2 * self.frequency_count);
        bands.push(input.to_owned());
        for frequency in self.frequencies() {
            let phase = input.to_owned().mul_scalar(frequency);
            bands.push(phase.to_owned().sin());
            bands.push(phase.cos());
        }
        Tensor::cat(bands, D - 1)
    }

    /// Vector-Jacobian product of [`PositionalEncoder::forward`].
    ///
    /// It maps the gradient w.r.t. the encoding to the gradient w.r.t. the input.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[N, dim_input]`
    /// * `output_grad` - `[N, dim_output]`
    /// * `input_grad` - `[N, dim_input]`
    pub fn backward<B: Backend>(
        &self,
        input: Tensor<B, 2>,
        output_grad: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        if self.is_identity() {
            return output_grad;
        }

        let [n, _] = output_grad.dims();
        let d = self.dim_input;
        let mut input_grad = output_grad.to_owned().slice([0..n, 0..d]);
        for (index, frequency) in self.frequencies().enumerate() {
            let start = d * (1 + 2 * index);
            let sin_grad = output_grad.to_owned().slice([0..n, start..start + d]);
            let cos_grad = output_grad.to_owned().slice([0..n, start + d..start + 2 * d]);
            let phase = input.to_owned().mul_scalar(frequency);
            input_grad = input_grad
                + (sin_grad * phase.to_owned().cos() - cos_grad * phase.sin())
                    .mul_scalar(frequency);
        }
        input_grad
    }
}
