//! Softplus activation.

pub use super::*;

use burn::tensor::activation;

/// Smooth approximation of ReLU.
///
/// `log(1 + exp(beta * input)) / beta`
///
/// ## Details
///
/// It is evaluated as `relu(input) + log(1 + exp(-|beta * input|)) / beta`,
/// which never overflows.
#[derive(Clone, Debug, Module)]
pub struct Softplus {
    /// Sharpness.
    pub beta: f32,
}

impl Softplus {
    /// Initialize the activation.
    #[inline]
    pub const fn init(beta: f32) -> Self {
        Self { beta }
    }

    /// Applies the activation on the input tensor.
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        let beta = self.beta;
        activation::relu(input.to_owned())
            + input
                .mul_scalar(beta)
                .abs()
                .neg()
                .exp()
                .log1p()
                .div_scalar(beta)
    }

    /// The derivative of the activation, `sigmoid(beta * input)`.
    pub fn derivative<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        activation::sigmoid(input.mul_scalar(self.beta))
    }
}

impl Default for Softplus {
    #[inline]
    fn default() -> Self {
        Self::init(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn forward() {
        let device = &Default::default();
        let softplus = Softplus::default();

        let input = Tensor::<B, 1>::from_floats([-1.0, -0.01, 0.0, 0.01, 1.0, 50.0], device);
        let output = softplus.forward(input);
        let target = [-1.0_f32, -0.01, 0.0, 0.01, 1.0, 50.0]
            .map(|x| (1.0 + (100.0 * x).exp()).ln() / 100.0);
        let target = [target[0], target[1], target[2], target[3], 1.0, 50.0];
        output
            .into_data()
            .assert_approx_eq(&Tensor::<B, 1>::from_floats(target, device).into_data(), 5);
    }

    #[test]
    fn derivative() {
        let device = &Default::default();
        let softplus = Softplus::init(2.0);

        let input = Tensor::<B, 1>::from_floats([-1.0, 0.0, 1.0], device);
        let output = softplus.derivative(input);
        let target = [-2.0_f32, 0.0, 2.0].map(|x| 1.0 / (1.0 + (-x).exp()));
        output
            .into_data()
            .assert_approx_eq(&Tensor::<B, 1>::from_floats(target, device).into_data(), 5);
    }

    #[test]
    fn forward_is_positive() {
        let device = &Default::default();
        let softplus = Softplus::default();

        let input = Tensor::<B, 1>::from_floats([-0.5, -0.1, 0.0], device);
        let output = softplus.forward(input).into_data().to_vec::<f32>().unwrap();
        assert!(output.iter().all(|&y| y >= 0.0), "{output:?}");
        assert!((output[2] - 2.0_f32.ln() / 100.0).abs() < 1e-6);
    }
}
