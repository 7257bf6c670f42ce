//! GLFW window with an OpenGL context

use super::backend::WindowBackend;
use super::WindowError;
use crate::gpu::ContextBinding;
use crate::input::{InputEvent, Key, KeyAction, MouseButton};
use glfw::Context as _;
use std::rc::Rc;

/// OpenGL version requested for every window
pub const GL_VERSION: (u32, u32) = (3, 3);

/// GLFW window, its event receiver and the loaded GL function table
pub(crate) struct GlfwBackend {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl GlfwBackend {
    /// Create a window with a core-profile context and make it current
    pub(crate) fn new(
        glfw: &glfw::Glfw,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<(Self, Rc<glow::Context>), WindowError> {
        let mut glfw = glfw.clone();
        glfw.window_hint(glfw::WindowHint::ContextVersion(GL_VERSION.0, GL_VERSION.1));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or_else(|| WindowError::CreationFailed(title.to_string()))?;

        window.make_current();

        window.set_key_polling(true);
        window.set_scroll_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_close_polling(true);

        let gl = unsafe {
            glow::Context::from_loader_function(|name| window.get_proc_address(name) as *const _)
        };

        Ok((Self { window, events }, Rc::new(gl)))
    }
}

impl WindowBackend for GlfwBackend {
    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.window.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| translate_event(&event))
            .collect()
    }

    fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    fn make_current(&mut self) {
        self.window.make_current();
    }

    fn set_swap_interval(&mut self, vsync: bool) {
        let interval = if vsync {
            glfw::SwapInterval::Sync(1)
        } else {
            glfw::SwapInterval::None
        };
        self.window.glfw.set_swap_interval(interval);
    }

    fn framebuffer_size(&self) -> (i32, i32) {
        self.window.get_framebuffer_size()
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn context_binding(&self) -> Box<dyn ContextBinding> {
        Box::new(GlfwContext {
            window: self.window.window_ptr(),
        })
    }
}

/// Rebinds one GLFW window's context when another is current
struct GlfwContext {
    window: *mut glfw::ffi::GLFWwindow,
}

impl ContextBinding for GlfwContext {
    fn bind(&self) {
        // Only reached while the window is alive: `Window::drop` shuts its
        // arena down before the backend is destroyed
        unsafe {
            if glfw::ffi::glfwGetCurrentContext() != self.window {
                glfw::ffi::glfwMakeContextCurrent(self.window);
            }
        }
    }
}

/// Convert a GLFW event into the viewer's event type
///
/// Key repeats and events the viewer does not expose map to `None`.
pub(crate) fn translate_event(event: &glfw::WindowEvent) -> Option<InputEvent> {
    match *event {
        glfw::WindowEvent::Key(key, _, action, _) => Some(InputEvent::Key {
            key: translate_key(key)?,
            action: translate_action(action)?,
        }),
        glfw::WindowEvent::Scroll(x, y) => Some(InputEvent::Scroll {
            x: x as f32,
            y: y as f32,
        }),
        glfw::WindowEvent::MouseButton(button, action, _) => Some(InputEvent::MouseButton {
            button: translate_button(button),
            action: translate_action(action)?,
        }),
        glfw::WindowEvent::CursorPos(x, y) => Some(InputEvent::CursorMove {
            x: x as f32,
            y: y as f32,
        }),
        glfw::WindowEvent::FramebufferSize(width, height) => {
            Some(InputEvent::FramebufferResize { width, height })
        }
        _ => None,
    }
}

const fn translate_action(action: glfw::Action) -> Option<KeyAction> {
    match action {
        glfw::Action::Press => Some(KeyAction::Down),
        glfw::Action::Release => Some(KeyAction::Up),
        glfw::Action::Repeat => None,
    }
}

const fn translate_button(button: glfw::MouseButton) -> MouseButton {
    match button {
        glfw::MouseButton::Button1 => MouseButton::Left,
        glfw::MouseButton::Button2 => MouseButton::Right,
        glfw::MouseButton::Button3 => MouseButton::Middle,
        glfw::MouseButton::Button4 => MouseButton::Other(4),
        glfw::MouseButton::Button5 => MouseButton::Other(5),
        glfw::MouseButton::Button6 => MouseButton::Other(6),
        glfw::MouseButton::Button7 => MouseButton::Other(7),
        glfw::MouseButton::Button8 => MouseButton::Other(8),
    }
}

const fn translate_key(key: glfw::Key) -> Option<Key> {
    Some(match key {
        glfw::Key::A => Key::A,
        glfw::Key::B => Key::B,
        glfw::Key::C => Key::C,
        glfw::Key::D => Key::D,
        glfw::Key::E => Key::E,
        glfw::Key::F => Key::F,
        glfw::Key::G => Key::G,
        glfw::Key::H => Key::H,
        glfw::Key::I => Key::I,
        glfw::Key::J => Key::J,
        glfw::Key::K => Key::K,
        glfw::Key::L => Key::L,
        glfw::Key::M => Key::M,
        glfw::Key::N => Key::N,
        glfw::Key::O => Key::O,
        glfw::Key::P => Key::P,
        glfw::Key::Q => Key::Q,
        glfw::Key::R => Key::R,
        glfw::Key::S => Key::S,
        glfw::Key::T => Key::T,
        glfw::Key::U => Key::U,
        glfw::Key::V => Key::V,
        glfw::Key::W => Key::W,
        glfw::Key::X => Key::X,
        glfw::Key::Y => Key::Y,
        glfw::Key::Z => Key::Z,
        glfw::Key::Space => Key::Space,
        glfw::Key::Escape => Key::Escape,
        glfw::Key::Up => Key::Up,
        glfw::Key::Down => Key::Down,
        glfw::Key::Left => Key::Left,
        glfw::Key::Right => Key::Right,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_translates() {
        let event = glfw::WindowEvent::Key(glfw::Key::N, 0, glfw::Action::Press, glfw::Modifiers::empty());
        assert_eq!(
            translate_event(&event),
            Some(InputEvent::Key { key: Key::N, action: KeyAction::Down })
        );
    }

    #[test]
    fn test_key_repeat_is_dropped() {
        let event = glfw::WindowEvent::Key(glfw::Key::N, 0, glfw::Action::Repeat, glfw::Modifiers::empty());
        assert_eq!(translate_event(&event), None);
    }

    #[test]
    fn test_unmapped_key_is_dropped() {
        let event = glfw::WindowEvent::Key(glfw::Key::F1, 0, glfw::Action::Press, glfw::Modifiers::empty());
        assert_eq!(translate_event(&event), None);
    }

    #[test]
    fn test_pointer_events_translate() {
        assert_eq!(
            translate_event(&glfw::WindowEvent::Scroll(0.0, -1.0)),
            Some(InputEvent::Scroll { x: 0.0, y: -1.0 })
        );
        assert_eq!(
            translate_event(&glfw::WindowEvent::CursorPos(10.0, 20.0)),
            Some(InputEvent::CursorMove { x: 10.0, y: 20.0 })
        );
        assert_eq!(
            translate_event(&glfw::WindowEvent::MouseButton(
                glfw::MouseButton::Button1,
                glfw::Action::Release,
                glfw::Modifiers::empty()
            )),
            Some(InputEvent::MouseButton { button: MouseButton::Left, action: KeyAction::Up })
        );
        assert_eq!(
            translate_event(&glfw::WindowEvent::FramebufferSize(640, 480)),
            Some(InputEvent::FramebufferResize { width: 640, height: 480 })
        );
    }

    #[test]
    fn test_other_events_are_dropped() {
        assert_eq!(translate_event(&glfw::WindowEvent::Close), None);
    }
}
