#![allow(missing_docs)]

pub mod backend;
pub mod error;
pub mod field;

pub use error::Error;
pub use field::{
    NerfNetwork, NerfNetworkConfig, RenderingMode, RenderingNetwork, RenderingNetworkConfig,
    SdfNetwork, SdfNetworkConfig, VarianceNetwork, VarianceNetworkConfig,
};
