//! Neural radiance field network.

pub use super::*;

use burn::nn::LinearConfig;
use std::fmt;

/// The configuration for [`NerfNetwork`].
#[derive(Config, Debug)]
pub struct NerfNetworkConfig {
    /// Count of point layers.
    #[config(default = 8)]
    pub depth: usize,
    /// Width of the point layers.
    #[config(default = 256)]
    pub width: usize,
    /// Input dimension of the points.
    #[config(default = 3)]
    pub dim_input: usize,
    /// Input dimension of the view directions.
    #[config(default = 3)]
    pub dim_input_view: usize,
    /// Count of frequency bands for the points.
    #[config(default = 0)]
    pub frequency_count: usize,
    /// Count of frequency bands for the view directions.
    #[config(default = 0)]
    pub view_frequency_count: usize,
    /// Output dimension of the unconditioned head.
    #[config(default = 4)]
    pub dim_output: usize,
    /// Indices of the point layers followed by the encoded points again.
    #[config(default = "vec![4]")]
    pub skips: Vec<usize>,
    /// Conditioning the colors on the view directions.
    #[config(default = true)]
    pub use_view_dirs: bool,
}

/// Density and radiance network.
///
/// ## Details
///
/// After the point layer `i` in [`skips`](NerfNetworkConfig::skips),
/// the encoded points are concatenated before its output.
/// The density is read from the last point layer,
/// and the colors from a view-conditioned branch.
#[derive(Module)]
pub struct NerfNetwork<B: Backend> {
    /// Point layers.
    pub points_layers: Vec<Linear<B>>,
    /// View-conditioned layers.
    pub views_layers: Vec<Linear<B>>,
    /// `[width, width]`
    pub feature_layer: Linear<B>,
    /// `[width, 1]`
    pub alpha_layer: Linear<B>,
    /// `[width / 2, 3]`
    pub rgb_layer: Linear<B>,
    /// Activation after the point layers and the view-conditioned layers.
    pub activation: Relu,
    /// Encoder of the points.
    pub encoder: PositionalEncoder,
    /// Encoder of the view directions.
    pub view_encoder: PositionalEncoder,
    /// Sorted indices of the skip layers.
    pub skips: Ignored<Vec<usize>>,
}

/// The output of [`NerfNetwork::forward`].
#[derive(Clone, Debug)]
pub struct NerfOutput<B: Backend> {
    /// Raw densities.
    ///
    /// The shape is `[N, 1]`.
    pub alpha: Tensor<B, 2>,
    /// Raw colors.
    ///
    /// The shape is `[N, 3]`.
    pub rgb: Tensor<B, 2>,
}

impl NerfNetworkConfig {
    /// Initialize from the configuration.
    ///
    /// ## Errors
    ///
    /// * [`Error::UnimplementedPath`] if [`use_view_dirs`](Self::use_view_dirs) is `false`.
    /// * [`Error::Configuration`] if the skips or the dimensions are invalid.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<NerfNetwork<B>, Error> {
        if !self.use_view_dirs {
            return Err(Error::UnimplementedPath(format!(
                "The NeRF output head without view directions ({} channels)",
                self.dim_output,
            )));
        }
        self.validate()?;

        let encoder = PositionalEncoderConfig::new(self.dim_input, self.frequency_count).init();
        let view_encoder =
            PositionalEncoderConfig::new(self.dim_input_view, self.view_frequency_count).init();
        let dim_embedded = encoder.dim_output();
        let dim_view_embedded = view_encoder.dim_output();
        let width = self.width;
        let linear = |dim_input: usize, dim_output: usize| {
            LinearConfig::new(dim_input, dim_output).init::<B>(device)
        };

        let mut skips = self.skips.to_owned();
        skips.sort_unstable();
        skips.dedup();

        let dims_input = (0..self.depth)
            .map(|index| match index {
                0 => dim_embedded,
                index if skips.binary_search(&(index - 1)).is_ok() => width + dim_embedded,
                _ => width,
            })
            .collect::<Vec<_>>();
        let points_layers = dims_input
            .iter()
            .map(|&dim_input| linear(dim_input, width))
            .collect::<Vec<_>>();
        let views_layers = vec![linear(dim_view_embedded + width, width / 2)];
        let feature_layer = linear(width, width);
        let alpha_layer = linear(width, 1);
        let rgb_layer = linear(width / 2, 3);

        log::debug!(
            target: "neus_fields::field::nerf::init",
            "points_layers ({dims_input:?} -> {width}), skips ({skips:?})",
        );

        Ok(NerfNetwork {
            points_layers,
            views_layers,
            feature_layer,
            alpha_layer,
            rgb_layer,
            activation: Relu::new(),
            encoder,
            view_encoder,
            skips: Ignored(skips),
        })
    }

    /// Checking the configuration.
    pub fn validate(&self) -> Result<(), Error> {
        if self.depth == 0 {
            return Err(Error::Configuration(
                "The depth of the NeRF network (0)".into(),
                "positive".into(),
            ));
        }
        if self.width < 2 {
            return Err(Error::Configuration(
                format!("The width of the NeRF network ({})", self.width),
                "at least 2".into(),
            ));
        }
        if self.dim_input == 0 || self.dim_input_view == 0 {
            return Err(Error::Configuration(
                format!(
                    "The input dimensions of the NeRF network ({}, {})",
                    self.dim_input, self.dim_input_view,
                ),
                "positive".into(),
            ));
        }
        if let Some(index) = self.skips.iter().find(|&&index| index + 1 >= self.depth) {
            return Err(Error::Configuration(
                format!("The skip index of the NeRF network ({index})"),
                format!("less than {}", self.depth - 1),
            ));
        }

        Ok(())
    }
}

impl<B: Backend> NerfNetwork<B> {
    /// Applies the forward pass.
    ///
    /// ## Shapes
    ///
    /// * `points` - [`[N, dim_input]`](NerfNetworkConfig::dim_input)
    /// * `view_dirs` - [`[N, dim_input_view]`](NerfNetworkConfig::dim_input_view)
    pub fn forward(
        &self,
        points: Tensor<B, 2>,
        view_dirs: Tensor<B, 2>,
    ) -> NerfOutput<B> {
        let embedded = self.encoder.forward(points);
        let view_embedded = self.view_encoder.forward(view_dirs);

        let mut h = embedded.to_owned();
        for (index, layer) in self.points_layers.iter().enumerate() {
            h = self.activation.forward(layer.forward(h));
            if self.skips.0.binary_search(&index).is_ok() {
                h = Tensor::cat(vec![embedded.to_owned(), h], 1);
            }
        }

        let alpha = self.alpha_layer.forward(h.to_owned());
        let feature = self.feature_layer.forward(h);
        let mut h = Tensor::cat(vec![feature, view_embedded], 1);
        for layer in &self.views_layers {
            h = self.activation.forward(layer.forward(h));
        }
        let rgb = self.rgb_layer.forward(h);

        NerfOutput { alpha, rgb }
    }
}

impl<B: Backend> fmt::Debug for NerfNetwork<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct(&format!("NerfNetwork<{}>", B::name()))
            .field("devices", &self.devices())
            .field("points_layers", &self.points_layers)
            .field("views_layers", &self.views_layers)
            .field("skips", &self.skips.0)
            .field("encoder", &self.encoder)
            .field("view_encoder", &self.view_encoder)
            .finish()
    }
}

impl Default for NerfNetworkConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type B = NdArray<f32>;

    fn config() -> NerfNetworkConfig {
        NerfNetworkConfig::new().with_depth(4).with_width(16).with_skips(vec![1])
    }

    #[test]
    fn init_layer_dims() {
        let device = &Default::default();
        let network = config()
            .with_frequency_count(2)
            .with_view_frequency_count(1)
            .init::<B>(device)
            .unwrap();

        let dim_embedded = 3 * (1 + 2 * 2);
        let dims = network
            .points_layers
            .iter()
            .map(|layer| layer.weight.dims())
            .collect::<Vec<_>>();
        assert_eq!(
            dims,
            [
                [dim_embedded, 16],
                [16, 16],
                [16 + dim_embedded, 16],
                [16, 16],
            ]
        );
        assert_eq!(network.views_layers[0].weight.dims(), [16 + 3 * 3, 8]);
        assert_eq!(network.alpha_layer.weight.dims(), [16, 1]);
        assert_eq!(network.rgb_layer.weight.dims(), [8, 3]);
    }

    #[test]
    fn forward_shapes() {
        let device = &Default::default();

        for (frequency_count, view_frequency_count) in [(0, 0), (4, 2)] {
            let network = config()
                .with_frequency_count(frequency_count)
                .with_view_frequency_count(view_frequency_count)
                .init::<B>(device)
                .unwrap();
            for n in [1, 9] {
                let output = network.forward(
                    Tensor::random([n, 3], Distribution::Default, device),
                    Tensor::random([n, 3], Distribution::Default, device),
                );
                assert_eq!(output.alpha.dims(), [n, 1]);
                assert_eq!(output.rgb.dims(), [n, 3]);
            }
        }
    }

    #[test]
    fn forward_alpha_ignores_view_dirs() {
        let device = &Default::default();
        let network = config().init::<B>(device).unwrap();

        let points = Tensor::<B, 2>::random([5, 3], Distribution::Default, device);
        let output_target = network.forward(points.to_owned(), Tensor::zeros([5, 3], device));
        let output = network.forward(points, Tensor::ones([5, 3], device));

        output
            .alpha
            .into_data()
            .assert_eq(&output_target.alpha.into_data(), true);
        assert!(!output.rgb.equal(output_target.rgb).all().into_scalar());
    }

    #[test]
    fn init_rejects_invalid_skips() {
        let device = &Default::default();

        for skips in [vec![3], vec![0, 4], vec![10]] {
            let output = config().with_skips(skips.to_owned()).init::<B>(device);
            assert!(
                matches!(output, Err(Error::Configuration(..))),
                "skips: {skips:?}",
            );
        }

        let output = config().with_skips(vec![]).init::<B>(device);
        assert!(output.is_ok());
        let output = config().with_skips(vec![0, 2]).init::<B>(device);
        assert!(output.is_ok());
    }

    #[test]
    fn init_rejects_unconditioned_head() {
        let device = &Default::default();

        let output = config().with_use_view_dirs(false).init::<B>(device);
        assert!(matches!(output, Err(Error::UnimplementedPath(..))));
    }

    #[test]
    fn init_linear_bounds() {
        let device = &Default::default();
        let network = config().with_frequency_count(1).init::<B>(device).unwrap();

        let layers = network
            .points_layers
            .iter()
            .chain(&network.views_layers)
            .chain([&network.feature_layer, &network.alpha_layer, &network.rgb_layer]);
        for layer in layers {
            let [dim_input, _] = layer.weight.dims();
            let bound = (dim_input as f32).sqrt().recip() + 1e-6;
            let weight = layer.weight.val().into_data().to_vec::<f32>().unwrap();
            let bias = layer
                .bias
                .as_ref()
                .expect("The bias is enabled")
                .val()
                .into_data()
                .to_vec::<f32>()
                .unwrap();
            assert!(
                weight.iter().chain(&bias).all(|v| v.abs() <= bound),
                "dim_input: {dim_input}",
            );
        }
    }

    #[test]
    fn init_default() {
        let device = &Default::default();
        let network = NerfNetworkConfig::default().init::<B>(device).unwrap();

        assert_eq!(network.points_layers.len(), 8);
        assert_eq!(network.points_layers[5].weight.dims(), [256 + 3, 256]);
        assert_eq!(network.views_layers[0].weight.dims(), [256 + 3, 128]);
    }
}
