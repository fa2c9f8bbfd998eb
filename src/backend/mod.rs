//! Backend presets.

pub use burn::{
    backend::wgpu::WgpuDevice,
    tensor::backend::{AutodiffBackend, Backend},
};

use burn::backend::{autodiff, wgpu};

/// Tracking the gradients of `B`, e.g., for the eikonal term of [`SdfNetwork::gradient`](crate::SdfNetwork::gradient).
pub type Autodiff<B> = autodiff::Autodiff<B>;
pub type Wgpu = wgpu::Wgpu;
