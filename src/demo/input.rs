//! Keybindings for the demo screen.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::console::{Console, Terminal};

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// No action, continue.
    None,
    /// Quit the application.
    Quit,
    /// Freeze the screen until the next key.
    Pause,
    /// Prompt for a note.
    AddNote,
}

/// Maps one input byte to an action.
pub fn handle_key(key: u8) -> KeyAction {
    match key {
        b'q' | b'Q' => KeyAction::Quit,
        // Ctrl-D
        0x04 => KeyAction::Quit,
        b'p' | b'P' => KeyAction::Pause,
        b'n' | b'N' => KeyAction::AddNote,
        _ => KeyAction::None,
    }
}

/// Holds the screen until a key arrives, `running` is cleared or input
/// closes, checking every `step`.
///
/// A blocking read would keep going through Ctrl-C, so the pause is a loop of
/// short [`Console::check_button`] waits instead.
pub fn pause_until_key<T: Terminal>(
    console: &mut Console<T>,
    running: &AtomicBool,
    step: Duration,
) -> io::Result<Option<u8>> {
    while running.load(Ordering::SeqCst) && !console.input_closed() {
        if let Some(key) = console.check_button(step)? {
            return Ok(Some(key));
        }
    }
    Ok(None)
}
