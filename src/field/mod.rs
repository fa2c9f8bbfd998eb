//! Neural fields for implicit surface rendering.
//!
//! ## Data flow
//!
//! ```plaintext
//! PositionalEncoder -> SdfNetwork -> (distance, feature, gradient) -> RenderingNetwork -> RGB
//! PositionalEncoder -> NerfNetwork -> (alpha, RGB)
//! VarianceNetwork -> inverse standard deviation
//! ```

pub mod dense;
pub mod encoder;
pub mod init;
pub mod nerf;
pub mod rendering;
pub mod sdf;
pub mod softplus;
pub mod variance;

pub use crate::error::Error;
pub use burn::{
    config::Config,
    module::{Ignored, Module, Param},
    nn::{Linear, Relu},
    tensor::{
        backend::{AutodiffBackend, Backend},
        Tensor, TensorData,
    },
};
pub use dense::{Dense, DenseConfig, DenseInit};
pub use encoder::{PositionalEncoder, PositionalEncoderConfig};
pub use nerf::{NerfNetwork, NerfNetworkConfig, NerfOutput};
pub use rendering::{RenderingMode, RenderingNetwork, RenderingNetworkConfig};
pub use sdf::{SdfNetwork, SdfNetworkConfig};
pub use softplus::Softplus;
pub use variance::{VarianceNetwork, VarianceNetworkConfig};
