//! Interactive model viewer
//!
//! Shows OBJ models one at a time. N / P cycle through them, V toggles vsync,
//! Escape quits, dragging with the left button orbits and scrolling zooms.
//! Keys can be rebound in the config file.

mod camera;
mod shaders;

use camera::{fit_to_unit, OrbitCamera};
use clap::Parser;
use model_viewer::config::ConfigError;
use model_viewer::gpu::{GlowDevice, GpuError};
use model_viewer::prelude::*;
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.12, 1.0];
const MODEL_COLOR: [f32; 3] = [0.8, 0.7, 0.5];

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "model_viewer", version, about = "Cycle through OBJ models in a window")]
struct Args {
    /// OBJ files to show, in order; replaces the config file's list when given
    models: Vec<PathBuf>,

    /// TOML or RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Window title
    #[arg(long)]
    title: Option<String>,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Start with vsync off
    #[arg(long)]
    no_vsync: bool,
}

impl Args {
    /// Merge the config file (if any) with command line overrides
    fn into_config(self) -> Result<ViewerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                ViewerConfig::load_from_file(path)?
            }
            None => ViewerConfig::default(),
        };

        if let Some(title) = self.title {
            config.window.title = title;
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if self.no_vsync {
            config.window.vsync = false;
        }
        if !self.models.is_empty() {
            config.models = self.models;
        }

        config.validate()?;
        Ok(config)
    }
}

fn run(config: &ViewerConfig) -> Result<(), ViewerError> {
    let paths = config.resolved_models();

    let library = Library::new()?;
    let mut window = Window::new(&library, &config.window.title, config.window.width, config.window.height)?;
    window.set_vsync(config.window.vsync);

    let gpu = window.gpu();
    let device = gpu
        .device::<GlowDevice>()
        .ok_or_else(|| GpuError::Allocation("window has no OpenGL device".to_string()))?;
    let program = ShaderProgram::new(device.context().clone(), shaders::VERTEX, shaders::FRAGMENT)?;
    let models = ModelList::load(&gpu, &paths)?;
    log::info!("Loaded {} model(s)", models.len());

    let (width, height) = window.framebuffer_size();
    device.enable_depth();
    device.set_viewport(width, height);
    let camera = Rc::new(RefCell::new(OrbitCamera::new(1.0)));
    camera.borrow_mut().resize(width, height);

    bind_controls(&mut window, &config.controls, &models);
    bind_camera(&mut window, &camera);

    let resize_gpu = gpu.clone();
    let resize_camera = camera.clone();
    window.on_size_change(move |width, height| {
        if let Some(device) = resize_gpu.device::<GlowDevice>() {
            device.set_viewport(width, height);
        }
        resize_camera.borrow_mut().resize(width, height);
    });

    window.run_loop(|| {
        device.clear(CLEAR_COLOR);
        program.bind();
        program.set_mat4("u_view_projection", &to_array(&camera.borrow().view_projection()));
        program.set_mat4("u_model", &to_array(&fit_to_unit(models.current().bounds())));
        program.set_vec3("u_color", MODEL_COLOR);
        models.draw();
    });

    Ok(())
}

fn bind_controls(window: &mut Window<'_>, controls: &model_viewer::config::Controls, models: &ModelList) {
    let list = models.clone();
    window.on_keydown(controls.next, move || {
        list.next_model();
        log::info!("Model {}/{}: {}", list.index() + 1, list.len(), list.current().label());
    });

    let list = models.clone();
    window.on_keydown(controls.prev, move || {
        list.prev_model();
        log::info!("Model {}/{}: {}", list.index() + 1, list.len(), list.current().label());
    });

    let signals = window.signals();
    window.on_keydown(controls.toggle_vsync, move || signals.request_vsync_toggle());

    let signals = window.signals();
    window.on_keydown(controls.quit, move || signals.request_close());
}

fn bind_camera(window: &mut Window<'_>, camera: &Rc<RefCell<OrbitCamera>>) {
    let drag = camera.clone();
    window.on_mouse(move |button, action| match (button, action) {
        (MouseButton::Left, KeyAction::Down) => drag.borrow_mut().begin_drag(),
        (MouseButton::Left, KeyAction::Up) => drag.borrow_mut().end_drag(),
        _ => {}
    });

    let orbit = camera.clone();
    window.on_cursor_move(move |x, y| orbit.borrow_mut().cursor_moved(x, y));

    let zoom = camera.clone();
    window.on_scroll(move |_, y| zoom.borrow_mut().zoom(y));
}

fn to_array(matrix: &nalgebra::Matrix4<f32>) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(matrix.as_slice());
    out
}

fn main() -> ExitCode {
    model_viewer::logging::init();

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let args = Args::parse_from(["model_viewer", "--width", "1024", "--no-vsync", "a.obj", "b.obj"]);
        let config = args.into_config().unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert!(!config.window.vsync);
        assert_eq!(config.models, vec![PathBuf::from("a.obj"), PathBuf::from("b.obj")]);
    }

    #[test]
    fn test_cli_models_replace_config_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(&path, "models = [\"from_config.obj\"]\n").unwrap();
        let config_arg = path.to_str().unwrap();

        let args = Args::parse_from(["model_viewer", "--config", config_arg, "cli.obj"]);
        assert_eq!(args.into_config().unwrap().models, vec![PathBuf::from("cli.obj")]);

        let args = Args::parse_from(["model_viewer", "--config", config_arg]);
        assert_eq!(args.into_config().unwrap().models, vec![PathBuf::from("from_config.obj")]);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = Args::parse_from(["model_viewer", "--height", "0"]);
        assert!(matches!(args.into_config(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let args = Args::parse_from(["model_viewer", "--config", "/definitely/not/here.toml"]);
        assert!(matches!(args.into_config(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_matrix_is_column_major() {
        let matrix = nalgebra::Matrix4::new_translation(&nalgebra::Vector3::new(1.0, 2.0, 3.0));
        let array = to_array(&matrix);
        assert_eq!(&array[12..15], &[1.0, 2.0, 3.0]);
    }
}
