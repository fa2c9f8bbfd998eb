//! Signed distance field network.

pub mod fusion;
pub mod gradient;
pub mod property;

pub use super::*;

use burn::nn::LinearConfig;
use std::f32::consts::{PI, SQRT_2};

/// Count of raw coordinate channels at the head of the encoding.
pub const DIM_POSITION: usize = 3;

/// The configuration for [`SdfNetwork`].
#[derive(Config, Debug)]
pub struct SdfNetworkConfig {
    /// Input dimension of the points.
    #[config(default = 3)]
    pub dim_input: usize,
    /// Output dimension, the distance and the feature vector.
    #[config(default = 257)]
    pub dim_output: usize,
    /// Hidden dimension.
    #[config(default = 256)]
    pub dim_hidden: usize,
    /// Count of hidden layers.
    ///
    /// The network has `layer_count + 1` dense layers.
    #[config(default = 8)]
    pub layer_count: usize,
    /// Indices of the layers receiving the encoded points again.
    #[config(default = "vec![4]")]
    pub skip_layers: Vec<usize>,
    /// Count of frequency bands for the points.
    #[config(default = 6)]
    pub frequency_count: usize,
    /// Radius of the initial sphere.
    #[config(default = 0.5)]
    pub bias: f32,
    /// Multiplier of the points on each axis.
    #[config(default = "[1.0, 1.0, 2.0]")]
    pub scale: [f32; 3],
    /// Initializing the field as a sphere of radius [`bias`](Self::bias).
    #[config(default = true)]
    pub geometric_init: bool,
    /// Decomposing the weights into magnitude and direction.
    #[config(default = true)]
    pub weight_norm: bool,
    /// Flipping the sign of the initial field, i.e., negative outside the sphere.
    #[config(default = false)]
    pub inside_outside: bool,
    /// Dimension of the feature slot.
    #[config(default = 256)]
    pub dim_feature: usize,
    /// Dimension of the image features fused into the feature slot.
    #[config(default = 768)]
    pub dim_image_feature: usize,
    /// Seed of the initialization.
    #[config(default = 0x5DF)]
    pub seed: u64,
}

/// Signed distance field network.
///
/// It maps points (and optional features) to
/// the signed distance followed by a feature vector.
///
/// ## Details
///
/// The points are scaled by [`SdfNetworkConfig::scale`] and encoded,
/// and the encoding is concatenated again at each skip layer.
/// The distance is divided by the scale of the first axis,
/// so it is reported in world units.
#[derive(Module)]
pub struct SdfNetwork<B: Backend> {
    /// Dense layers of the field.
    pub layers: Vec<Dense<B>>,
    /// Fusion: encoded points to the image feature space.
    pub fusion_position: Linear<B>,
    /// Fusion: image features to the image feature space.
    pub fusion_key: Linear<B>,
    /// Fusion: image feature space to the feature slot.
    pub fusion_output: Linear<B>,
    /// Activation after every layer except the last.
    pub activation: Softplus,
    /// Encoder of the scaled points.
    pub encoder: PositionalEncoder,
    /// Multiplier of the points on each axis.
    pub scale: Ignored<[f32; 3]>,
    /// Sorted indices of the skip layers.
    pub skip_layers: Ignored<Vec<usize>>,
    /// Dimension of the feature slot.
    pub dim_feature: usize,
}

impl SdfNetworkConfig {
    /// Initialize from the configuration.
    ///
    /// ## Errors
    ///
    /// It returns [`Error::Configuration`] if the skip layers, the dimensions
    /// or the scale are invalid.
    /// Nothing is allocated in that case.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<SdfNetwork<B>, Error> {
        self.validate()?;

        let encoder = PositionalEncoderConfig::new(self.dim_input, self.frequency_count).init();
        let dim_embedded = encoder.dim_output();
        let dims_input = self.dims_input(dim_embedded);
        let dims_output = self.dims_output();

        let layers = dims_input
            .iter()
            .zip(&dims_output)
            .enumerate()
            .map(|(index, (&dim_input, &dim_output))| {
                let init = if self.geometric_init {
                    let seed = init::derive_seed(self.seed, index as u64);
                    self.geometric_init_values(index, dim_input, dim_output, dim_embedded, seed)?
                } else {
                    DenseInit::Linear
                };
                DenseConfig::new(dim_input, dim_output)
                    .with_weight_norm(self.weight_norm)
                    .init_with(init, device)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fusion_position =
            LinearConfig::new(dim_embedded, self.dim_image_feature).init(device);
        let fusion_key =
            LinearConfig::new(self.dim_image_feature, self.dim_image_feature).init(device);
        let fusion_output =
            LinearConfig::new(self.dim_image_feature, self.dim_feature).init(device);

        let mut skip_layers = self.skip_layers.to_owned();
        skip_layers.sort_unstable();
        skip_layers.dedup();

        log::debug!(
            target: "neus_fields::field::sdf::init",
            "layers ({:?} -> {:?}), skip_layers ({skip_layers:?})",
            dims_input,
            dims_output,
        );

        Ok(SdfNetwork {
            layers,
            fusion_position,
            fusion_key,
            fusion_output,
            activation: Softplus::default(),
            encoder,
            scale: Ignored(self.scale),
            skip_layers: Ignored(skip_layers),
            dim_feature: self.dim_feature,
        })
    }

    /// Checking the configuration.
    pub fn validate(&self) -> Result<(), Error> {
        if self.dim_input != DIM_POSITION {
            return Err(Error::Configuration(
                format!("The input dimension ({})", self.dim_input),
                DIM_POSITION.to_string(),
            ));
        }
        for (name, dim) in [
            ("output", self.dim_output),
            ("hidden", self.dim_hidden),
            ("feature", self.dim_feature),
            ("image feature", self.dim_image_feature),
        ] {
            if dim == 0 {
                return Err(Error::Configuration(
                    format!("The {name} dimension (0)"),
                    "positive".into(),
                ));
            }
        }

        if let Some(scale) = self.scale.iter().find(|s| !s.is_finite() || **s == 0.0) {
            return Err(Error::Configuration(
                format!("The scale ({scale}) in {:?}", self.scale),
                "finite and non-zero".into(),
            ));
        }

        let layer_count = self.layer_count;
        if let Some(index) = self.skip_layers.iter().find(|&&index| index >= layer_count) {
            return Err(Error::Configuration(
                format!("The skip layer index ({index})"),
                format!("within [0, {}]", layer_count as isize - 1),
            ));
        }
        if !self.skip_layers.iter().any(|&index| index + 1 < layer_count) {
            return Err(Error::Configuration(
                format!("The skip layer indices ({:?})", self.skip_layers),
                format!("containing an index less than {}", layer_count as isize - 1),
            ));
        }

        Ok(())
    }

    /// Whether the layer at `index` is a skip layer.
    #[inline]
    pub fn is_skip_layer(
        &self,
        index: usize,
    ) -> bool {
        self.skip_layers.contains(&index)
    }

    /// Input dimensions of the dense layers.
    pub fn dims_input(
        &self,
        dim_embedded: usize,
    ) -> Vec<usize> {
        (0..=self.layer_count)
            .map(|index| {
                let dim = if index == 0 {
                    dim_embedded + self.dim_feature
                } else {
                    self.dim_hidden
                };
                if self.is_skip_layer(index) {
                    dim + dim_embedded
                } else {
                    dim
                }
            })
            .collect()
    }

    /// Output dimensions of the dense layers.
    pub fn dims_output(&self) -> Vec<usize> {
        (0..=self.layer_count)
            .map(|index| {
                if index == self.layer_count {
                    self.dim_output
                } else {
                    self.dim_hidden
                }
            })
            .collect()
    }

    /// Geometric initialization of the layer at `index`.
    ///
    /// ## Details
    ///
    /// - Last layer: `W ~ N(±sqrt(pi / dim_input), 1e-4)`, `b = ∓bias`.
    /// - Others: `W ~ N(0, sqrt(2 / dim_output))`, `b = 0`.
    /// - With frequency bands, the first layer only sees the raw coordinates,
    ///   and the skip layers ignore the re-injected frequency channels.
    pub fn geometric_init_values(
        &self,
        index: usize,
        dim_input: usize,
        dim_output: usize,
        dim_embedded: usize,
        seed: u64,
    ) -> Result<DenseInit, Error> {
        if index == self.layer_count {
            let mean = PI.sqrt() / (dim_input as f32).sqrt();
            let (mean, bias) = if self.inside_outside {
                (-mean, self.bias)
            } else {
                (mean, -self.bias)
            };
            return Ok(DenseInit::Values {
                weight: init::normal(dim_input, dim_output, mean, 1e-4, seed)?,
                bias: vec![bias; dim_output],
            });
        }

        let std = SQRT_2 / (dim_output as f32).sqrt();
        let mut weight = init::normal(dim_input, dim_output, 0.0, std, seed)?;
        if self.frequency_count > 0 {
            if index == 0 {
                init::zero_rows(&mut weight, dim_output, DIM_POSITION..dim_input);
            } else if self.is_skip_layer(index) {
                let dim_frequency = dim_embedded - DIM_POSITION;
                init::zero_rows(&mut weight, dim_output, dim_input - dim_frequency..dim_input);
            }
        }

        Ok(DenseInit::Values {
            weight,
            bias: vec![0.0; dim_output],
        })
    }
}

impl<B: Backend> SdfNetwork<B> {
    /// Applies the forward pass on the points.
    ///
    /// ## Shapes
    ///
    /// * `points` - `[N, 3]`
    /// * `features` - [`[N, dim_feature]`](SdfNetworkConfig::dim_feature),
    ///   zeros if it is `None`.
    /// * `output` - [`[N, dim_output]`](SdfNetworkConfig::dim_output),
    ///   the distance followed by the feature vector.
    pub fn forward(
        &self,
        points: Tensor<B, 2>,
        features: Option<Tensor<B, 2>>,
    ) -> Tensor<B, 2> {
        let output = self.trace(points, features).output;
        let [n, dim_output] = output.dims();

        let distance = output.to_owned().slice([0..n, 0..1]).div_scalar(self.distance_scale());
        if dim_output == 1 {
            return distance;
        }
        Tensor::cat(vec![distance, output.slice([0..n, 1..dim_output])], 1)
    }

    /// The signed distances.
    ///
    /// ## Shapes
    ///
    /// * `points` - `[N, 3]`
    /// * `features` - [`[N, dim_feature]`](SdfNetworkConfig::dim_feature)
    /// * `output` - `[N, 1]`
    pub fn sdf(
        &self,
        points: Tensor<B, 2>,
        features: Option<Tensor<B, 2>>,
    ) -> Tensor<B, 2> {
        let output = self.trace(points, features).output;
        let [n, _] = output.dims();
        output.slice([0..n, 0..1]).div_scalar(self.distance_scale())
    }

    /// Evaluating the layers and keeping the intermediate values.
    pub(crate) fn trace(
        &self,
        points: Tensor<B, 2>,
        features: Option<Tensor<B, 2>>,
    ) -> SdfTrace<B> {
        let [n, _] = points.dims();
        let points_scaled = points.to_owned().mul(self.scale(&points.device()));
        let embedded = self.encoder.forward(points_scaled.to_owned());
        let features = features
            .unwrap_or_else(|| Tensor::zeros([n, self.dim_feature], &embedded.device()));

        let last = self.layers.len() - 1;
        let mut preactivations = Vec::with_capacity(last);
        let mut x = Tensor::cat(vec![embedded.to_owned(), features], 1);
        for (index, layer) in self.layers.iter().enumerate() {
            if self.is_skip_layer(index) {
                x = Tensor::cat(vec![x, embedded.to_owned()], 1).div_scalar(SQRT_2);
            }
            x = layer.forward(x);
            if index < last {
                preactivations.push(x.to_owned());
                x = self.activation.forward(x);
            }
        }

        SdfTrace {
            points_scaled,
            embedded,
            preactivations,
            output: x,
        }
    }

    /// Whether the layer at `index` is a skip layer.
    #[inline]
    pub fn is_skip_layer(
        &self,
        index: usize,
    ) -> bool {
        self.skip_layers.0.binary_search(&index).is_ok()
    }

    /// The multiplier of the points.
    ///
    /// The shape is `[1, 3]`.
    #[inline]
    pub fn scale(
        &self,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(self.scale.0, device).unsqueeze()
    }

    /// The divisor of the distances, i.e., the scale of the first axis.
    #[inline]
    pub fn distance_scale(&self) -> f32 {
        self.scale.0[0]
    }
}

/// Intermediate values of [`SdfNetwork::trace`].
#[derive(Clone, Debug)]
pub(crate) struct SdfTrace<B: Backend> {
    /// `[N, 3]`
    pub points_scaled: Tensor<B, 2>,
    /// `[N, dim_embedded]`
    pub embedded: Tensor<B, 2>,
    /// Outputs of the dense layers before the activation, except the last one.
    pub preactivations: Vec<Tensor<B, 2>>,
    /// Output of the last dense layer before unscaling.
    pub output: Tensor<B, 2>,
}

impl Default for SdfNetworkConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
