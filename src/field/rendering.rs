//! Rendering network for view-dependent colors.

pub use super::*;

use burn::tensor::activation;
use std::{fmt, str::FromStr};

/// The inputs of [`RenderingNetwork`] besides the features.
#[derive(Config, Copy, Debug, PartialEq, Eq)]
pub enum RenderingMode {
    /// Points, view directions and normals.
    Idr,
    /// Points and normals.
    NoViewDir,
    /// Points and view directions.
    NoNormal,
}

/// The configuration for [`RenderingNetwork`].
#[derive(Config, Copy, Debug)]
pub struct RenderingNetworkConfig {
    /// Dimension of the feature vectors from the SDF network.
    #[config(default = 256)]
    pub dim_feature: usize,
    /// The selected inputs.
    #[config(default = "RenderingMode::Idr")]
    pub mode: RenderingMode,
    /// Dimension of the points, the normals and the view directions.
    #[config(default = 3)]
    pub dim_position: usize,
    /// Output dimension.
    #[config(default = 3)]
    pub dim_output: usize,
    /// Hidden dimension.
    #[config(default = 256)]
    pub dim_hidden: usize,
    /// Count of hidden layers.
    ///
    /// The network has `layer_count + 1` dense layers.
    #[config(default = 4)]
    pub layer_count: usize,
    /// Decomposing the weights into magnitude and direction.
    #[config(default = true)]
    pub weight_norm: bool,
    /// Count of frequency bands for the view directions.
    #[config(default = 4)]
    pub view_frequency_count: usize,
    /// Squeezing the output into `(0, 1)` with sigmoid.
    #[config(default = true)]
    pub squeeze_output: bool,
    /// Dimension of the image features.
    #[config(default = 256)]
    pub dim_image_feature: usize,
}

/// Rendering network.
///
/// It maps the geometry and the features of points to colors.
///
/// ## Details
///
/// The input is the concatenation of the inputs selected by [`RenderingMode`],
/// followed by the feature vectors and the image features.
/// ReLU is applied after every layer except the last.
#[derive(Module)]
pub struct RenderingNetwork<B: Backend> {
    /// Dense layers.
    pub layers: Vec<Dense<B>>,
    /// Activation after every layer except the last.
    pub activation: Relu,
    /// Encoder of the view directions.
    pub view_encoder: PositionalEncoder,
    /// The selected inputs.
    pub mode: Ignored<RenderingMode>,
    /// Squeezing the output into `(0, 1)`.
    pub squeeze_output: bool,
}

impl RenderingMode {
    /// All the modes.
    pub const ALL: [Self; 3] = [Self::Idr, Self::NoViewDir, Self::NoNormal];

    /// The name to parse from.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idr => "idr",
            Self::NoViewDir => "no_view_dir",
            Self::NoNormal => "no_normal",
        }
    }

    /// Whether the view directions are inputs.
    #[inline]
    pub const fn has_view_dirs(&self) -> bool {
        !matches!(self, Self::NoViewDir)
    }

    /// Whether the normals are inputs.
    #[inline]
    pub const fn has_normals(&self) -> bool {
        !matches!(self, Self::NoNormal)
    }
}

impl FromStr for RenderingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|mode| mode.name() == s).ok_or_else(|| {
            Error::UnsupportedMode(
                s.into(),
                Self::ALL.map(|mode| mode.name()).join(", "),
            )
        })
    }
}

impl Default for RenderingMode {
    #[inline]
    fn default() -> Self {
        Self::Idr
    }
}

impl RenderingNetworkConfig {
    /// Initialize from the configuration.
    ///
    /// ## Errors
    ///
    /// It returns [`Error::Configuration`] if any dimension is zero.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<RenderingNetwork<B>, Error> {
        for (name, dim) in [
            ("feature", self.dim_feature),
            ("position", self.dim_position),
            ("output", self.dim_output),
            ("hidden", self.dim_hidden),
            ("image feature", self.dim_image_feature),
        ] {
            if dim == 0 {
                return Err(Error::Configuration(
                    format!("The {name} dimension of the rendering network (0)"),
                    "positive".into(),
                ));
            }
        }

        let view_encoder =
            PositionalEncoderConfig::new(self.dim_position, self.view_frequency_count).init();
        let dims = self.dims(view_encoder.dim_output());

        let layers = dims
            .windows(2)
            .map(|dims| {
                DenseConfig::new(dims[0], dims[1])
                    .with_weight_norm(self.weight_norm)
                    .init(device)
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            target: "neus_fields::field::rendering::init",
            "mode ({}), layers ({dims:?})",
            self.mode.name(),
        );

        Ok(RenderingNetwork {
            layers,
            activation: Relu::new(),
            view_encoder,
            mode: Ignored(self.mode),
            squeeze_output: self.squeeze_output,
        })
    }

    /// Input dimension of the first layer.
    pub fn dim_input(&self) -> usize {
        let dim_view = PositionalEncoderConfig::new(self.dim_position, self.view_frequency_count)
            .init()
            .dim_output();
        self.dims(dim_view)[0]
    }

    /// Widths from the input to the output.
    fn dims(
        &self,
        dim_view: usize,
    ) -> Vec<usize> {
        let mut dim_input = self.dim_position + self.dim_feature + self.dim_image_feature;
        if self.mode.has_view_dirs() {
            dim_input += dim_view;
        }
        if self.mode.has_normals() {
            dim_input += self.dim_position;
        }

        let mut dims = Vec::with_capacity(self.layer_count + 2);
        dims.push(dim_input);
        dims.extend(std::iter::repeat(self.dim_hidden).take(self.layer_count));
        dims.push(self.dim_output);
        dims
    }
}

impl<B: Backend> RenderingNetwork<B> {
    /// Applies the forward pass.
    ///
    /// ## Shapes
    ///
    /// * `points` - `[N, 3]`
    /// * `normals` - `[N, 3]`, unused in [`RenderingMode::NoNormal`].
    /// * `view_dirs` - `[N, 3]`, unused in [`RenderingMode::NoViewDir`].
    /// * `feature_vectors` - [`[N, dim_feature]`](RenderingNetworkConfig::dim_feature)
    /// * `image_features` - [`[N, dim_image_feature]`](RenderingNetworkConfig::dim_image_feature)
    /// * `output` - [`[N, dim_output]`](RenderingNetworkConfig::dim_output)
    pub fn forward(
        &self,
        points: Tensor<B, 2>,
        normals: Tensor<B, 2>,
        view_dirs: Tensor<B, 2>,
        feature_vectors: Tensor<B, 2>,
        image_features: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let mode = self.mode();
        let mut inputs = Vec::with_capacity(5);
        inputs.push(points);
        if mode.has_view_dirs() {
            inputs.push(self.view_encoder.forward(view_dirs));
        }
        if mode.has_normals() {
            inputs.push(normals);
        }
        inputs.push(feature_vectors);
        inputs.push(image_features);

        let last = self.layers.len() - 1;
        let mut x = Tensor::cat(inputs, 1);
        for (index, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if index < last {
                x = self.activation.forward(x);
            }
        }

        if self.squeeze_output {
            activation::sigmoid(x)
        } else {
            x
        }
    }

    /// The selected inputs.
    #[inline]
    pub fn mode(&self) -> RenderingMode {
        self.mode.0
    }

    /// Input dimension of the first layer.
    #[inline]
    pub fn dim_input(&self) -> usize {
        self.layers.first().map(|layer| layer.dims()[0]).unwrap_or_default()
    }
}

impl<B: Backend> fmt::Debug for RenderingNetwork<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct(&format!("RenderingNetwork<{}>", B::name()))
            .field("devices", &self.devices())
            .field("mode", &self.mode())
            .field("layers", &self.layers)
            .field("view_encoder", &self.view_encoder)
            .field("squeeze_output", &self.squeeze_output)
            .finish()
    }
}

impl Default for RenderingNetworkConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
