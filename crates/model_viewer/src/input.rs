//! Input types and the callback registration table
//!
//! The key, action and button enums keep GLFW's raw codes out of the public
//! interface. Window backends translate native events into [`InputEvent`]s and
//! the window hands them to a [`CallbackTable`] during the poll step.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Keys that can carry a key-down binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Space key
    Space,
    /// Escape key
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Press state reported for keys and mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Pressed
    Down,
    /// Released
    Up,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
    /// Any further button, numbered from 4
    Other(u8),
}

/// A backend-neutral input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A key changed state
    Key {
        /// Which key
        key: Key,
        /// New state
        action: KeyAction,
    },
    /// Scroll wheel or touchpad offset
    Scroll {
        /// Horizontal offset
        x: f32,
        /// Vertical offset
        y: f32,
    },
    /// A mouse button changed state
    MouseButton {
        /// Which button
        button: MouseButton,
        /// New state
        action: KeyAction,
    },
    /// The cursor moved, in screen coordinates relative to the content area
    CursorMove {
        /// Horizontal position
        x: f32,
        /// Vertical position
        y: f32,
    },
    /// The framebuffer was resized, in pixels
    FramebufferResize {
        /// New width
        width: i32,
        /// New height
        height: i32,
    },
}

/// Callback run when a bound key goes down
pub type KeyCallback = Box<dyn FnMut()>;
/// Callback receiving scroll offsets
pub type ScrollCallback = Box<dyn FnMut(f32, f32)>;
/// Callback receiving mouse button changes
pub type MouseButtonCallback = Box<dyn FnMut(MouseButton, KeyAction)>;
/// Callback receiving cursor positions
pub type CursorPosCallback = Box<dyn FnMut(f32, f32)>;
/// Callback receiving framebuffer sizes
pub type FbSizeCallback = Box<dyn FnMut(i32, i32)>;

/// Registration table mapping event kinds to stored closures
///
/// Each category holds at most one callback; key-down holds one per key.
/// Registering again replaces the previous callback.
#[derive(Default)]
pub struct CallbackTable {
    keydown: HashMap<Key, KeyCallback>,
    scroll: Option<ScrollCallback>,
    mouse: Option<MouseButtonCallback>,
    cursor_move: Option<CursorPosCallback>,
    size_change: Option<FbSizeCallback>,
}

impl CallbackTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a callback to `key` going down
    pub fn set_keydown(&mut self, key: Key, callback: KeyCallback) {
        if self.keydown.insert(key, callback).is_some() {
            log::debug!("Replaced key-down callback for {key:?}");
        }
    }

    /// Set the scroll callback
    pub fn set_scroll(&mut self, callback: ScrollCallback) {
        self.scroll = Some(callback);
    }

    /// Set the mouse button callback
    pub fn set_mouse(&mut self, callback: MouseButtonCallback) {
        self.mouse = Some(callback);
    }

    /// Set the cursor move callback
    pub fn set_cursor_move(&mut self, callback: CursorPosCallback) {
        self.cursor_move = Some(callback);
    }

    /// Set the framebuffer resize callback
    pub fn set_size_change(&mut self, callback: FbSizeCallback) {
        self.size_change = Some(callback);
    }

    /// Whether `key` has a key-down binding
    pub fn has_keydown(&self, key: Key) -> bool {
        self.keydown.contains_key(&key)
    }

    /// Run the callback registered for `event`, if any
    ///
    /// Returns true when a callback ran.
    pub fn dispatch(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::Key { key, action: KeyAction::Down } => {
                self.keydown.get_mut(&key).map(|callback| callback()).is_some()
            }
            InputEvent::Key { action: KeyAction::Up, .. } => false,
            InputEvent::Scroll { x, y } => self.scroll.as_mut().map(|callback| callback(x, y)).is_some(),
            InputEvent::MouseButton { button, action } => {
                self.mouse.as_mut().map(|callback| callback(button, action)).is_some()
            }
            InputEvent::CursorMove { x, y } => {
                self.cursor_move.as_mut().map(|callback| callback(x, y)).is_some()
            }
            InputEvent::FramebufferResize { width, height } => {
                self.size_change.as_mut().map(|callback| callback(width, height)).is_some()
            }
        }
    }
}
