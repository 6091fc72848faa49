//! Global input hook feeding the event dispatcher.
//!
//! Platform implementations:
//! - macOS: native Core Graphics event tap (`macos.rs`), reports native click counts
//! - Windows/Linux: `rdev` (`rdev_impl.rs`), click counts synthesized

use crossbeam_channel::{bounded, Receiver, Sender};
use seltext_core::InputEvent;
use std::thread::{self, JoinHandle};

#[cfg(target_os = "macos")]
mod macos;

#[cfg(not(target_os = "macos"))]
mod rdev_impl;

/// Handle to control the input hook.
pub struct InputHookHandle {
    event_rx: Receiver<InputEvent>,
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl InputHookHandle {
    /// A receiver for the event stream, e.g. for the dispatcher thread.
    pub fn events(&self) -> Receiver<InputEvent> {
        self.event_rx.clone()
    }

    /// Signal the hook to stop.
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }
}

impl Drop for InputHookHandle {
    fn drop(&mut self) {
        self.stop();
        // Not joined: the rdev listener blocks until process exit.
        let _ = self.thread.take();
    }
}

/// Start capturing global input events.
pub fn start_input_hook() -> InputHookHandle {
    let (event_tx, event_rx) = bounded(1024);
    let (stop_tx, stop_rx) = bounded(1);

    #[cfg(target_os = "macos")]
    let thread = thread::spawn(move || {
        macos::start_hook(event_tx, stop_rx);
    });

    #[cfg(not(target_os = "macos"))]
    let thread = thread::spawn(move || {
        rdev_impl::start_hook(event_tx, stop_rx);
    });

    InputHookHandle {
        event_rx,
        stop_tx,
        thread: Some(thread),
    }
}
