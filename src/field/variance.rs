//! Single variance network.

pub use super::*;

use burn::tensor::ElementConversion;
use std::fmt;

/// The configuration for [`VarianceNetwork`].
#[derive(Config, Copy, Debug)]
pub struct VarianceNetworkConfig {
    /// Initial value of the variance parameter.
    #[config(default = 0.3)]
    pub init_value: f32,
}

/// A learnable scalar for the sharpness of the density.
///
/// `inv_s = exp(10 * variance)`
#[derive(Module)]
pub struct VarianceNetwork<B: Backend> {
    /// `[1]`
    pub variance: Param<Tensor<B, 1>>,
}

impl VarianceNetworkConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> VarianceNetwork<B> {
        log::debug!(
            target: "neus_fields::field::variance::init",
            "init_value ({})",
            self.init_value,
        );

        VarianceNetwork {
            variance: Param::from_tensor(Tensor::from_floats([self.init_value], device)),
        }
    }
}

impl<B: Backend> VarianceNetwork<B> {
    /// The inverse standard deviation, `exp(10 * variance)`.
    ///
    /// The shape is `[1]`.
    #[inline]
    pub fn inv_s(&self) -> Tensor<B, 1> {
        self.variance.val().mul_scalar(10.0).exp()
    }

    /// Broadcasting [`VarianceNetwork::inv_s`] to every point.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[N, ...]`, only the count is read.
    /// * `output` - `[N, 1]`
    pub fn forward<const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, 2> {
        let n = input.dims()[0];
        Tensor::ones([n, 1], &input.device()) * self.inv_s().unsqueeze::<2>()
    }

    /// The variance value.
    #[inline]
    pub fn variance(&self) -> f32 {
        self.variance.val().into_scalar().elem()
    }

    /// Replacing the variance value with the same parameter id.
    ///
    /// ## Shapes
    ///
    /// * `variance` - `[1]`
    pub fn set_variance(
        &mut self,
        variance: Tensor<B, 1>,
    ) -> &mut Self {
        self.variance = Param::initialized(self.variance.id.to_owned(), variance.require_grad());
        self
    }
}

impl<B: Backend> fmt::Debug for VarianceNetwork<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct(&format!("VarianceNetwork<{}>", B::name()))
            .field("devices", &self.devices())
            .field("variance", &self.variance())
            .finish()
    }
}

impl Default for VarianceNetworkConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Autodiff;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn forward() {
        let device = &Default::default();
        let network = VarianceNetworkConfig::default().init::<B>(device);

        let output = network.forward(Tensor::<B, 2>::zeros([4, 3], device));
        assert_eq!(output.dims(), [4, 1]);
        output.into_data().assert_approx_eq(
            &Tensor::<B, 2>::full([4, 1], 3.0_f32.exp(), device).into_data(),
            4,
        );

        let output = network.forward(Tensor::<B, 1>::zeros([7], device));
        assert_eq!(output.dims(), [7, 1]);
    }

    #[test]
    fn inv_s_is_positive_and_monotonic() {
        let device = &Default::default();

        let values = [-2.0, -0.5, 0.0, 0.1, 0.3, 0.8];
        let outputs = values.map(|init_value| {
            VarianceNetworkConfig::new()
                .with_init_value(init_value)
                .init::<B>(device)
                .inv_s()
                .into_scalar()
        });
        assert!(outputs.iter().all(|&s| s > 0.0), "{outputs:?}");
        assert!(outputs.windows(2).all(|s| s[0] < s[1]), "{outputs:?}");
    }

    #[test]
    fn set_variance() {
        let device = &Default::default();
        let mut network = VarianceNetworkConfig::default().init::<B>(device);
        let id = network.variance.id.to_owned();

        network.set_variance(Tensor::from_floats([0.5], device));
        assert_eq!(network.variance.id, id);
        assert_eq!(network.variance(), 0.5);
        network.inv_s().into_data().assert_approx_eq(
            &Tensor::<B, 1>::from_floats([5.0_f32.exp()], device).into_data(),
            3,
        );
    }

    #[test]
    fn forward_is_differentiable() {
        let device = &Default::default();
        let network = VarianceNetworkConfig::default().init::<Autodiff<B>>(device);

        let output = network.forward(Tensor::<Autodiff<B>, 2>::zeros([3, 3], device));
        let grads = output.sum().backward();
        let variance_grad = network
            .variance
            .grad(&grads)
            .expect("The variance is tracked")
            .into_scalar();

        // d (3 * exp(10 v)) / dv = 30 * exp(10 v)
        let target = 30.0 * 3.0_f32.exp();
        assert!((variance_grad - target).abs() < 1e-2 * target, "{variance_grad}");
    }
}
