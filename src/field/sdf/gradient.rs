//! Gradients of the signed distances w.r.t. the points.

pub use super::*;

/// Analytic gradients
impl<B: Backend> SdfNetwork<B> {
    /// Gradients of the signed distances w.r.t. the points.
    ///
    /// ## Shapes
    ///
    /// * `points` - `[N, 3]`
    /// * `features` - [`[N, dim_feature]`](SdfNetworkConfig::dim_feature)
    /// * `output` - `[N, 1, 3]`
    ///
    /// ## Details
    ///
    /// The gradients are accumulated backward through the layers with tensor operations.
    /// On an autodiff backend, the output stays in the graph,
    /// so it can be differentiated again, e.g., for the eikonal or curvature terms.
    pub fn gradient(
        &self,
        points: Tensor<B, 2>,
        features: Option<Tensor<B, 2>>,
    ) -> Tensor<B, 3> {
        let SdfTrace {
            points_scaled,
            embedded,
            preactivations,
            ..
        } = self.trace(points, features);
        let [n, dim_embedded] = embedded.dims();
        let device = embedded.device();
        let last = self.layers.len() - 1;

        // d distance / d output[:, 0]
        let mut grad =
            Tensor::<B, 2>::ones([n, 1], &device).div_scalar(self.distance_scale());
        let mut embedded_grad = Tensor::<B, 2>::zeros([n, dim_embedded], &device);

        for (index, layer) in self.layers.iter().enumerate().rev() {
            let mut weight = layer.weight();
            let [dim_input, _] = weight.dims();
            if index == last {
                weight = weight.slice([0..dim_input, 0..1]);
            }

            let mut input_grad = grad.to_owned().matmul(weight.transpose());
            if self.is_skip_layer(index) {
                input_grad = input_grad.div_scalar(SQRT_2);
                let dim_head = dim_input - dim_embedded;
                embedded_grad = embedded_grad
                    + input_grad.to_owned().slice([0..n, dim_head..dim_input]);
                input_grad = input_grad.slice([0..n, 0..dim_head]);
            }

            if index == 0 {
                embedded_grad = embedded_grad + input_grad.slice([0..n, 0..dim_embedded]);
            } else {
                grad = input_grad
                    * self
                        .activation
                        .derivative(preactivations[index - 1].to_owned());
            }
        }

        let points_scaled_grad = self.encoder.backward(points_scaled, embedded_grad);
        let points_grad = points_scaled_grad.mul(self.scale(&device));
        points_grad.unsqueeze_dim(1)
    }
}

/// Autodiff gradients
impl<AB: AutodiffBackend> SdfNetwork<AB> {
    /// Gradients of the signed distances w.r.t. the points using the backward pass.
    ///
    /// ## Shapes
    ///
    /// * `points` - `[N, 3]`, it should require gradients.
    /// * `features` - [`[N, dim_feature]`](SdfNetworkConfig::dim_feature)
    /// * `output` - `[N, 1, 3]`
    ///
    /// ## Errors
    ///
    /// It returns [`Error::Differentiation`] if the points are not tracked.
    ///
    /// ## Details
    ///
    /// The graph is consumed by the backward pass,
    /// so the output cannot be differentiated again.
    /// Use [`SdfNetwork::gradient`] for the higher-order terms.
    pub fn gradient_autodiff(
        &self,
        points: Tensor<AB, 2>,
        features: Option<Tensor<AB, 2>>,
    ) -> Result<Tensor<AB::InnerBackend, 3>, Error> {
        if !points.is_require_grad() {
            return Err(Error::Differentiation(
                "The points should require gradients before the distances are computed"
                    .into(),
            ));
        }

        let grads = self.sdf(points.to_owned(), features).sum().backward();
        let points_grad = points.grad(&grads).ok_or_else(|| {
            Error::Differentiation("The points are not reachable from the distances".into())
        })?;

        Ok(points_grad.unsqueeze_dim(1))
    }
}
