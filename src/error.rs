//! Error types for rendering.

use std::io;

/// A cell value whose `Display` implementation failed.
///
/// This is a contract violation by whoever produced the row; it is never
/// masked by the renderer.
#[derive(Debug, Clone)]
pub struct FormatError {
    /// Type name of the offending value.
    pub type_name: &'static str,
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot format value of type {} as text", self.type_name)
    }
}

impl std::error::Error for FormatError {}

/// Error types that can occur while printing a block.
#[derive(Debug)]
pub enum RenderError {
    /// Writing to the output stream failed.
    Io(io::Error),
    /// A cell could not be converted to text.
    Format(FormatError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "I/O error: {}", e),
            RenderError::Format(e) => write!(f, "Format error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(e) => Some(e),
            RenderError::Format(e) => Some(e),
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        RenderError::Io(e)
    }
}

impl From<FormatError> for RenderError {
    fn from(e: FormatError) -> Self {
        RenderError::Format(e)
    }
}
