//! Linear layer with optional weight normalization.

pub use super::*;

use burn::nn::LinearConfig;
use std::fmt;

/// The configuration for [`Dense`].
#[derive(Config, Copy, Debug)]
pub struct DenseConfig {
    /// Input dimension.
    pub dim_input: usize,
    /// Output dimension.
    pub dim_output: usize,
    /// Decomposing the weight into magnitude and direction.
    #[config(default = false)]
    pub weight_norm: bool,
}

/// Initial values of [`Dense`].
#[derive(Clone, PartialEq)]
pub enum DenseInit {
    /// The default initializer of [`LinearConfig`].
    Linear,
    /// Explicit values.
    Values {
        /// `[dim_input, dim_output]` in row-major order.
        weight: Vec<f32>,
        /// `[dim_output]`
        bias: Vec<f32>,
    },
}

/// [`Linear`] layer with optional weight normalization.
///
/// ## Details
///
/// With weight normalization, the weight of [`Dense::linear`] holds the direction `V`
/// and [`Dense::magnitude`] holds `g`, so the effective weight is `g * V / ||V||`,
/// where the norm runs over the input axis of each output unit.
#[derive(Module)]
pub struct Dense<B: Backend> {
    /// The linear layer.
    ///
    /// The weight shape is `[dim_input, dim_output]`.
    pub linear: Linear<B>,
    /// Magnitude of each output unit under weight normalization.
    ///
    /// The shape is `[dim_output]`.
    pub magnitude: Option<Param<Tensor<B, 1>>>,
}

impl DenseConfig {
    /// Initialize with [`DenseInit::Linear`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<Dense<B>, Error> {
        self.init_with(DenseInit::Linear, device)
    }

    /// Initialize with the given values.
    pub fn init_with<B: Backend>(
        &self,
        init: DenseInit,
        device: &B::Device,
    ) -> Result<Dense<B>, Error> {
        let dim_input = self.dim_input;
        let dim_output = self.dim_output;
        if dim_input == 0 || dim_output == 0 {
            return Err(Error::Configuration(
                format!("The dense layer dimensions ({dim_input} -> {dim_output})"),
                "positive".into(),
            ));
        }

        if let DenseInit::Values { weight, bias } = &init {
            if weight.len() != dim_input * dim_output {
                return Err(Error::Configuration(
                    format!("The weight length ({})", weight.len()),
                    format!("{dim_input} * {dim_output}"),
                ));
            }
            if bias.len() != dim_output {
                return Err(Error::Configuration(
                    format!("The bias length ({})", bias.len()),
                    dim_output.to_string(),
                ));
            }
        }

        let mut linear = LinearConfig::new(dim_input, dim_output).init(device);
        if let DenseInit::Values { weight, bias } = init {
            linear.weight = Param::from_tensor(Tensor::from_data(
                TensorData::new(weight, [dim_input, dim_output]),
                device,
            ));
            linear.bias = Some(Param::from_tensor(Tensor::from_data(
                TensorData::new(bias, [dim_output]),
                device,
            )));
        }

        let magnitude = self.weight_norm.then(|| {
            let magnitude = linear
                .weight
                .val()
                .detach()
                .powf_scalar(2.0)
                .sum_dim(0)
                .sqrt()
                .squeeze::<1>(0);
            Param::from_tensor(magnitude)
        });

        Ok(Dense { linear, magnitude })
    }
}

impl<B: Backend> Dense<B> {
    /// The effective weight.
    ///
    /// The shape is `[dim_input, dim_output]`.
    pub fn weight(&self) -> Tensor<B, 2> {
        let weight = self.linear.weight.val();
        match &self.magnitude {
            None => weight,
            Some(magnitude) => {
                let norm = weight
                    .to_owned()
                    .powf_scalar(2.0)
                    .sum_dim(0)
                    .sqrt()
                    .clamp_min(f32::EPSILON);
                weight.div(norm).mul(magnitude.val().unsqueeze())
            },
        }
    }

    /// The bias.
    ///
    /// The shape is `[dim_output]`.
    #[inline]
    pub fn bias(&self) -> Option<Tensor<B, 1>> {
        self.linear.bias.as_ref().map(|bias| bias.val())
    }

    /// Applies the forward pass on the input tensor.
    ///
    /// ## Shapes
    ///
    /// * `input` - [`[..., dim_input]`](DenseConfig::dim_input)
    /// * `output` - [`[..., dim_output]`](DenseConfig::dim_output)
    pub fn forward<const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        if !self.is_weight_norm() {
            return self.linear.forward(input);
        }

        let output = input.matmul(self.weight().unsqueeze());
        match self.bias() {
            Some(bias) => output + bias.unsqueeze(),
            None => output,
        }
    }

    /// `[dim_input, dim_output]`
    #[inline]
    pub fn dims(&self) -> [usize; 2] {
        self.linear.weight.dims()
    }

    /// Whether the weight is normalized.
    #[inline]
    pub fn is_weight_norm(&self) -> bool {
        self.magnitude.is_some()
    }
}

impl<B: Backend> fmt::Debug for Dense<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("Dense")
            .field("dims()", &self.dims())
            .field("is_weight_norm()", &self.is_weight_norm())
            .finish()
    }
}

impl fmt::Debug for DenseInit {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("Linear"),
            Self::Values { weight, bias } => f
                .debug_struct("Values")
                .field("weight.len()", &weight.len())
                .field("bias.len()", &bias.len())
                .finish(),
        }
    }
}
