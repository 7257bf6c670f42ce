//! # Model Viewer
//!
//! Thin wrappers around GLFW and OpenGL for a simple interactive model viewer.
//!
//! ## Features
//!
//! - **Window Lifecycle**: RAII ownership of the GLFW library and its windows
//! - **Input Callbacks**: Per-key, scroll, mouse, cursor and resize callbacks
//! - **Shared GPU Meshes**: Reference-counted model buffers in a slot-map arena
//! - **Model Cycling**: A list of loaded models with a wrapping cursor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use model_viewer::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     let library = Library::new()?;
//!     let mut window = Window::with_defaults(&library, "Viewer")?;
//!     let models = ModelList::load(&window.gpu(), &["teapot.obj", "cube.obj"])?;
//!
//!     let list = models.clone();
//!     window.on_keydown(Key::N, move || list.next_model());
//!
//!     window.run_loop(|| models.draw());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod assets;
pub mod config;
pub mod gpu;
pub mod input;
pub mod logging;
pub mod model;
pub mod window;

mod error;

pub use error::ViewerError;

/// Common imports for viewer users
pub mod prelude {
    pub use crate::{
        ViewerError,
        assets::{MeshData, Vertex},
        config::{Config, ViewerConfig},
        gpu::{Gpu, ShaderProgram},
        input::{Key, KeyAction, MouseButton},
        model::{Drawable, Model, ModelList},
        window::{Library, Window, WindowSignals},
    };
}
