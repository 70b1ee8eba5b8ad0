//! Scoped terminal mode guards.
//!
//! [`RawMode`] switches input to cbreak for its lifetime; [`CookedMode`]
//! temporarily undoes that inside a raw scope, for prompts. Both restore on
//! drop, including during unwinding.

use std::ops::{Deref, DerefMut};

use super::Console;
use super::terminal::Terminal;

/// Raw input for as long as the guard lives.
pub struct RawMode<'a, T: Terminal> {
    console: &'a mut Console<T>,
    /// Whether this guard switched the mode. Nested guards leave it alone.
    engaged: bool,
}

impl<'a, T: Terminal> RawMode<'a, T> {
    pub(super) fn new(console: &'a mut Console<T>) -> Self {
        let engaged = !console.is_raw() && console.enter_raw();
        Self { console, engaged }
    }
}

impl<T: Terminal> Deref for RawMode<'_, T> {
    type Target = Console<T>;

    fn deref(&self) -> &Console<T> {
        self.console
    }
}

impl<T: Terminal> DerefMut for RawMode<'_, T> {
    fn deref_mut(&mut self) -> &mut Console<T> {
        self.console
    }
}

impl<T: Terminal> Drop for RawMode<'_, T> {
    fn drop(&mut self) {
        if self.engaged {
            self.console.leave_raw();
        }
    }
}

/// Cooked (line-buffered, echoing) input for as long as the guard lives.
/// Raw mode is re-entered on drop if it was active before.
pub struct CookedMode<'a, T: Terminal> {
    console: &'a mut Console<T>,
    was_raw: bool,
}

impl<'a, T: Terminal> CookedMode<'a, T> {
    pub(super) fn new(console: &'a mut Console<T>) -> Self {
        let was_raw = console.is_raw();
        console.leave_raw();
        Self { console, was_raw }
    }
}

impl<T: Terminal> Deref for CookedMode<'_, T> {
    type Target = Console<T>;

    fn deref(&self) -> &Console<T> {
        self.console
    }
}

impl<T: Terminal> DerefMut for CookedMode<'_, T> {
    fn deref_mut(&mut self) -> &mut Console<T> {
        self.console
    }
}

impl<T: Terminal> Drop for CookedMode<'_, T> {
    fn drop(&mut self) {
        if self.was_raw {
            self.console.enter_raw();
        }
    }
}
