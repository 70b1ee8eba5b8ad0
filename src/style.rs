//! SGR styling for table output.
//!
//! Escape sequences are produced with crossterm commands and are only emitted
//! when the caller says output is an interactive terminal.

use std::fmt;
use std::io::{self, Write};

use crossterm::Command;
use crossterm::queue;
use crossterm::style::{Attribute, SetAttribute};
use crossterm::terminal::{Clear, ClearType};

use crate::cell::Color;

/// SGR parameter for a foreground colour: 30-37 normal, 90-97 bright.
pub fn sgr_code(color: Color) -> u8 {
    let index = color.index();
    if color.is_bright() {
        90 + index - 8
    } else {
        30 + index
    }
}

/// Sets the foreground to one of the 16 basic colours.
///
/// crossterm's `SetForegroundColor` writes palette colours as `38;5;N`,
/// which terminals without 256-colour support ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBasicColor(pub Color);

impl Command for SetBasicColor {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "\x1b[{}m", sgr_code(self.0))
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Err(io::Error::other("basic colours need ANSI support"))
    }

    #[cfg(windows)]
    fn is_ansi_code_supported(&self) -> bool {
        true
    }
}

/// Pre-defined styles.
pub struct Styles;

impl Styles {
    /// Starts a styled span. Returns `true` if anything was emitted, in which
    /// case the span must be closed with [`Styles::reset`].
    pub fn begin(mut out: &mut dyn Write, bold: bool, color: Option<Color>) -> io::Result<bool> {
        if bold {
            queue!(&mut out, SetAttribute(Attribute::Bold))?;
        }
        if let Some(color) = color {
            queue!(&mut out, SetBasicColor(color))?;
        }
        Ok(bold || color.is_some())
    }

    /// Resets all attributes and colours.
    pub fn reset(mut out: &mut dyn Write) -> io::Result<()> {
        queue!(&mut out, SetAttribute(Attribute::Reset))
    }

    /// Clears the screen and homes the cursor.
    pub fn clear_screen(mut out: &mut dyn Write) -> io::Result<()> {
        queue!(&mut out, Clear(ClearType::All), crossterm::cursor::MoveTo(0, 0))
    }
}
