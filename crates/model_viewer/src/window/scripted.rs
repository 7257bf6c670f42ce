//! Scripted window backend for tests

use super::backend::WindowBackend;
use crate::gpu::recording::CallLog;
use crate::gpu::ContextBinding;
use crate::input::InputEvent;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// What the backend observed, shared with the test
#[derive(Debug, Default)]
pub(crate) struct ScriptState {
    pub(crate) polls: usize,
    pub(crate) swaps: usize,
    pub(crate) make_current_calls: usize,
    pub(crate) swap_intervals: Vec<bool>,
    pub(crate) title: String,
    pub(crate) close_flag: bool,
    pub(crate) binds: usize,
    pub(crate) binds_after_destroy: usize,
    pub(crate) destroyed: bool,
    pub(crate) released_at_destroy: Option<usize>,
}

/// Replays one batch of events per poll; sets the close flag once the
/// script runs out
pub(crate) struct ScriptedBackend {
    frames: VecDeque<Vec<InputEvent>>,
    state: Rc<RefCell<ScriptState>>,
    watched: Option<CallLog>,
}

impl ScriptedBackend {
    pub(crate) fn new(frames: Vec<Vec<InputEvent>>) -> (Self, Rc<RefCell<ScriptState>>) {
        let state = Rc::new(RefCell::new(ScriptState::default()));
        let backend = Self {
            frames: frames.into(),
            state: state.clone(),
            watched: None,
        };
        (backend, state)
    }

    /// Note how many releases `log` holds when this backend is destroyed
    pub(crate) fn watch(&mut self, log: CallLog) {
        self.watched = Some(log);
    }
}

impl Drop for ScriptedBackend {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.destroyed = true;
        state.released_at_destroy = self.watched.as_ref().map(|log| log.released().len());
    }
}

/// Counts binds, and binds that arrive after the backend is gone
struct ScriptedContext {
    state: Rc<RefCell<ScriptState>>,
}

impl ContextBinding for ScriptedContext {
    fn bind(&self) {
        let mut state = self.state.borrow_mut();
        state.binds += 1;
        if state.destroyed {
            state.binds_after_destroy += 1;
        }
    }
}

impl WindowBackend for ScriptedBackend {
    fn should_close(&self) -> bool {
        self.state.borrow().close_flag
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.state.borrow_mut().close_flag = should_close;
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut state = self.state.borrow_mut();
        state.polls += 1;
        let events = self.frames.pop_front().unwrap_or_default();
        if self.frames.is_empty() {
            state.close_flag = true;
        }
        events
    }

    fn swap_buffers(&mut self) {
        self.state.borrow_mut().swaps += 1;
    }

    fn make_current(&mut self) {
        self.state.borrow_mut().make_current_calls += 1;
    }

    fn set_swap_interval(&mut self, vsync: bool) {
        self.state.borrow_mut().swap_intervals.push(vsync);
    }

    fn framebuffer_size(&self) -> (i32, i32) {
        (800, 600)
    }

    fn set_title(&mut self, title: &str) {
        self.state.borrow_mut().title = title.to_string();
    }

    fn context_binding(&self) -> Box<dyn ContextBinding> {
        Box::new(ScriptedContext {
            state: self.state.clone(),
        })
    }
}
