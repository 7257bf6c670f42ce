//! Backend-agnostic window trait
//!
//! The seam between [`Window`](super::Window) and the native windowing
//! library. GLFW is the production implementation; tests drive the loop with
//! a scripted backend.

use crate::gpu::ContextBinding;
use crate::input::InputEvent;

/// Operations a window needs from the native windowing library
///
/// Window operations happen on the thread that created the window.
pub(crate) trait WindowBackend {
    /// Whether the close flag is set
    fn should_close(&self) -> bool;

    /// Set or clear the close flag
    fn set_should_close(&mut self, should_close: bool);

    /// Process pending native events and return them translated
    fn poll_events(&mut self) -> Vec<InputEvent>;

    /// Present the back buffer
    fn swap_buffers(&mut self);

    /// Bind this window's context to the calling thread
    fn make_current(&mut self);

    /// Apply vsync on (interval 1) or off (interval 0)
    ///
    /// Affects whichever context is current; callers make this one current
    /// first.
    fn set_swap_interval(&mut self, vsync: bool);

    /// Handle that makes this window's context current again
    fn context_binding(&self) -> Box<dyn ContextBinding>;

    /// Drawable size in pixels
    fn framebuffer_size(&self) -> (i32, i32);

    /// Set the title bar text
    fn set_title(&mut self, title: &str);
}
