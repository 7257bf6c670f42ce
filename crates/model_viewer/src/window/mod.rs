//! GLFW lifecycle and window management
//!
//! [`Library`] proves GLFW is initialized and tears it down on drop. A
//! [`Window`] borrows the library for its whole life, owns one native window
//! and its OpenGL context, and runs the main loop. Input callbacks are stored
//! in a [`CallbackTable`] and invoked synchronously while the loop polls
//! events.
//!
//! Registration and the loop both take `&mut self`, so callbacks cannot be
//! swapped while the loop is running. Callbacks that need to close the window
//! or flip vsync capture a [`WindowSignals`] handle instead.
//!
//! Models uploaded through [`Window::gpu`] belong to this window's context,
//! which is made current before any of their GL calls. Dropping the window
//! deletes their buffers; handles kept past that point draw nothing.

mod backend;
mod glfw_backend;

#[cfg(test)]
mod scripted;

pub use glfw_backend::GL_VERSION;

use crate::gpu::{GlowDevice, Gpu, GraphicsDevice};
use crate::input::{CallbackTable, Key, KeyAction, MouseButton};
use backend::WindowBackend;
use glfw_backend::GlfwBackend;
use std::cell::Cell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized, e.g. no display
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// Another [`Library`] is still alive
    #[error("GLFW is already initialized by another Library")]
    AlreadyInitialized,

    /// The window or its context could not be created
    #[error("Window creation failed: {0}")]
    CreationFailed(String),
}

/// Result alias for window operations
pub type WindowResult<T> = Result<T, WindowError>;

static LIBRARY_LIVE: AtomicBool = AtomicBool::new(false);

/// Marks the process-wide library slot as taken until dropped
#[derive(Debug)]
struct InitGuard(());

impl InitGuard {
    fn acquire() -> WindowResult<Self> {
        LIBRARY_LIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(()))
            .map_err(|_| WindowError::AlreadyInitialized)
    }
}

impl Drop for InitGuard {
    fn drop(&mut self) {
        LIBRARY_LIVE.store(false, Ordering::Release);
    }
}

/// Initialized GLFW library
///
/// Holding one is the precondition for creating windows. Only one may be
/// alive at a time. Movable, not clonable.
pub struct Library {
    glfw: glfw::Glfw,
    _guard: InitGuard,
}

impl Library {
    /// Initialize GLFW
    pub fn new() -> WindowResult<Self> {
        let guard = InitGuard::acquire()?;
        let glfw = glfw::init(|error: glfw::Error, description: String| {
            log::error!("GLFW error {error:?}: {description}");
        })
        .map_err(|e| WindowError::InitializationFailed(e.to_string()))?;

        log::info!("GLFW {} initialized", glfw::get_version_string());
        Ok(Self { glfw, _guard: guard })
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        log::info!("Terminating GLFW");
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library").finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct Signals {
    close: Cell<bool>,
    toggle_vsync: Cell<bool>,
}

/// Requests a callback can make of its window
///
/// Requests are applied right after the poll step of the current frame.
#[derive(Debug, Clone, Default)]
pub struct WindowSignals {
    inner: Rc<Signals>,
}

impl WindowSignals {
    /// Ask the loop to stop after the current frame
    pub fn request_close(&self) {
        self.inner.close.set(true);
    }

    /// Ask the loop to flip vsync; two requests in one frame cancel out
    pub fn request_vsync_toggle(&self) {
        self.inner.toggle_vsync.set(!self.inner.toggle_vsync.get());
    }

    fn take_close(&self) -> bool {
        self.inner.close.replace(false)
    }

    fn take_vsync_toggle(&self) -> bool {
        self.inner.toggle_vsync.replace(false)
    }
}

/// A window with an OpenGL context
pub struct Window<'lib> {
    // Field order is drop order; `Drop` has already shut the arena down, so
    // model handles held by callbacks release nothing
    callbacks: CallbackTable,
    gpu: Gpu,
    backend: Box<dyn WindowBackend>,
    signals: WindowSignals,
    vsync: bool,
    title: String,
    _library: PhantomData<&'lib Library>,
}

impl<'lib> Window<'lib> {
    /// Default width in pixels
    pub const DEFAULT_WIDTH: u32 = 800;
    /// Default height in pixels
    pub const DEFAULT_HEIGHT: u32 = 600;

    /// Create a window and make its context current
    pub fn new(library: &'lib Library, title: &str, width: u32, height: u32) -> WindowResult<Self> {
        log::info!("Creating window '{title}' ({width}x{height})");
        let (backend, gl) = GlfwBackend::new(&library.glfw, title, width, height)?;
        Ok(Self::from_backend(Box::new(backend), GlowDevice::new(gl), title))
    }

    /// Create a window of the default size
    pub fn with_defaults(library: &'lib Library, title: &str) -> WindowResult<Self> {
        Self::new(library, title, Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }

    fn from_backend<D: GraphicsDevice + 'static>(mut backend: Box<dyn WindowBackend>, device: D, title: &str) -> Self {
        backend.set_swap_interval(true);
        let gpu = Gpu::with_binding(device, backend.context_binding());
        Self {
            callbacks: CallbackTable::new(),
            gpu,
            backend,
            signals: WindowSignals::default(),
            vsync: true,
            title: title.to_string(),
            _library: PhantomData,
        }
    }

    /// Run until the close flag is set
    ///
    /// Each iteration polls events (running callbacks), applies pending
    /// signals, calls `body` and swaps buffers.
    pub fn run_loop<F: FnMut()>(&mut self, mut body: F) {
        log::info!("Entering main loop for '{}'", self.title);
        let mut frames: u64 = 0;

        while !self.backend.should_close() {
            for event in self.backend.poll_events() {
                self.callbacks.dispatch(&event);
            }
            self.apply_signals();

            body();
            self.backend.swap_buffers();
            frames += 1;
        }

        log::info!("Main loop for '{}' finished after {frames} frames", self.title);
    }

    fn apply_signals(&mut self) {
        if self.signals.take_vsync_toggle() {
            self.toggle_vsync();
        }
        if self.signals.take_close() {
            self.request_close();
        }
    }

    /// Bind this window's context to the calling thread
    pub fn make_current(&mut self) {
        self.backend.make_current();
    }

    /// Run `callback` whenever `key` is pressed
    pub fn on_keydown<F: FnMut() + 'static>(&mut self, key: Key, callback: F) {
        self.callbacks.set_keydown(key, Box::new(callback));
    }

    /// Run `callback` with scroll offsets
    pub fn on_scroll<F: FnMut(f32, f32) + 'static>(&mut self, callback: F) {
        self.callbacks.set_scroll(Box::new(callback));
    }

    /// Run `callback` on mouse button presses and releases
    pub fn on_mouse<F: FnMut(MouseButton, KeyAction) + 'static>(&mut self, callback: F) {
        self.callbacks.set_mouse(Box::new(callback));
    }

    /// Run `callback` with the cursor position when it moves
    pub fn on_cursor_move<F: FnMut(f32, f32) + 'static>(&mut self, callback: F) {
        self.callbacks.set_cursor_move(Box::new(callback));
    }

    /// Run `callback` with the new framebuffer size in pixels
    pub fn on_size_change<F: FnMut(i32, i32) + 'static>(&mut self, callback: F) {
        self.callbacks.set_size_change(Box::new(callback));
    }

    /// Flip vsync and return the new state
    pub fn toggle_vsync(&mut self) -> bool {
        self.set_vsync(!self.vsync);
        self.vsync
    }

    /// Turn vsync on or off
    ///
    /// Also makes this window's context current.
    pub fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
        self.backend.make_current();
        self.backend.set_swap_interval(enabled);
        log::debug!("Vsync {}", if enabled { "on" } else { "off" });
    }

    /// Whether vsync is on
    pub const fn vsync(&self) -> bool {
        self.vsync
    }

    /// Set the close flag; the loop exits before its next iteration
    pub fn request_close(&mut self) {
        self.backend.set_should_close(true);
    }

    /// Handle callbacks can capture to request a close or vsync flip
    pub fn signals(&self) -> WindowSignals {
        self.signals.clone()
    }

    /// GPU handle bound to this window's context
    pub fn gpu(&self) -> Gpu {
        self.gpu.clone()
    }

    /// Drawable size in pixels
    pub fn framebuffer_size(&self) -> (i32, i32) {
        self.backend.framebuffer_size()
    }

    /// Title bar text
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Change the title bar text
    pub fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
        self.backend.set_title(title);
    }
}

impl Drop for Window<'_> {
    fn drop(&mut self) {
        log::debug!("Destroying window '{}'", self.title);
        self.gpu.shutdown();
    }
}
