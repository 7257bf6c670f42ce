//! Crate-level error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::gpu::GpuError;
use crate::model::ModelError;
use crate::window::WindowError;

/// Any failure surfaced by the viewer wrappers
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Library, window or context creation failed
    #[error(transparent)]
    Window(#[from] WindowError),

    /// Model loading or list usage failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// GPU resource allocation failed
    #[error(transparent)]
    Gpu(#[from] GpuError),

    /// Configuration could not be read or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}
