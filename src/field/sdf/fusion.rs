//! Fusion of image features into the feature slot.

pub use super::*;

impl<B: Backend> SdfNetwork<B> {
    /// Fusing the image features with the encoded points.
    ///
    /// `fusion_output(softplus(fusion_position(encode(scale * points)) + fusion_key(image_features)))`
    ///
    /// ## Shapes
    ///
    /// * `points` - `[N, 3]`
    /// * `image_features` - [`[N, dim_image_feature]`](SdfNetworkConfig::dim_image_feature)
    /// * `output` - [`[N, dim_feature]`](SdfNetworkConfig::dim_feature)
    pub fn fuse_features(
        &self,
        points: Tensor<B, 2>,
        image_features: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let scale = self.scale(&points.device());
        let embedded = self.encoder.forward(points.mul(scale));
        let query = self.fusion_position.forward(embedded);
        let key = self.fusion_key.forward(image_features);
        self.fusion_output.forward(self.activation.forward(query + key))
    }

    /// Applies the forward pass with the fused image features in the feature slot.
    ///
    /// ## Shapes
    ///
    /// * `points` - `[N, 3]`
    /// * `image_features` - [`[N, dim_image_feature]`](SdfNetworkConfig::dim_image_feature)
    /// * `output` - [`[N, dim_output]`](SdfNetworkConfig::dim_output)
    pub fn forward_with_image_features(
        &self,
        points: Tensor<B, 2>,
        image_features: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let features = self.fuse_features(points.to_owned(), image_features);
        self.forward(points, Some(features))
    }
}
