//! SDF network property implementation.

pub use super::*;

use humansize::{format_size, BINARY};
use std::fmt;

/// Attribute getters
impl<B: Backend> SdfNetwork<B> {
    /// Count of dense layers in the field, i.e., `layer_count + 1`.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Output dimension of the encoder.
    #[inline]
    pub fn dim_embedded(&self) -> usize {
        self.encoder.dim_output()
    }

    /// Output dimension of the field.
    #[inline]
    pub fn dim_output(&self) -> usize {
        self.layers.last().map(|layer| layer.dims()[1]).unwrap_or_default()
    }

    /// Size of the parameters in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.num_params() * size_of::<B::FloatElem>()
    }

    /// Readable size of the parameters.
    #[inline]
    pub fn size_readable(&self) -> String {
        format_size(self.size(), BINARY.decimal_places(1))
    }
}

impl<B: Backend> fmt::Debug for SdfNetwork<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct(&format!("SdfNetwork<{}>", B::name()))
            .field("devices", &self.devices())
            .field("size", &self.size_readable())
            .field("layers", &self.layers)
            .field("scale", &self.scale.0)
            .field("skip_layers", &self.skip_layers.0)
            .field("encoder", &self.encoder)
            .field("dim_feature", &self.dim_feature)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn size() {
        let device = &Default::default();
        let network = SdfNetworkConfig::new()
            .with_dim_output(2)
            .with_dim_hidden(4)
            .with_layer_count(2)
            .with_skip_layers(vec![0])
            .with_frequency_count(0)
            .with_dim_feature(1)
            .with_dim_image_feature(2)
            .with_weight_norm(false)
            .init::<B>(device)
            .unwrap();

        assert_eq!(network.layer_count(), 3);
        assert_eq!(network.dim_embedded(), 3);
        assert_eq!(network.dim_output(), 2);

        // Layers: (3 + 1 + 3) * 4 + 4, 4 * 4 + 4, 4 * 2 + 2
        // Fusion: 3 * 2 + 2, 2 * 2 + 2, 2 * 1 + 1
        let param_count = 32 + 20 + 10 + 8 + 6 + 3;
        assert_eq!(network.num_params(), param_count);
        assert_eq!(network.size(), param_count * 4);
        assert_eq!(network.size_readable(), "316 B");

        let network = SdfNetworkConfig::new()
            .with_dim_output(2)
            .with_dim_hidden(4)
            .with_layer_count(2)
            .with_skip_layers(vec![0])
            .with_frequency_count(0)
            .with_dim_feature(1)
            .with_dim_image_feature(2)
            .init::<B>(device)
            .unwrap();
        assert_eq!(network.num_params(), param_count + 4 + 4 + 2);
    }

    #[test]
    fn debug() {
        let device = &Default::default();
        let network = SdfNetworkConfig::new()
            .with_dim_hidden(8)
            .with_layer_count(2)
            .with_skip_layers(vec![0])
            .with_dim_image_feature(8)
            .init::<B>(device)
            .unwrap();

        let output = format!("{network:?}");
        assert!(output.starts_with("SdfNetwork<"), "{output}");
        assert!(output.contains("skip_layers: [0]"), "{output}");
    }
}
