//! blocktop - terminal rendering and input engine for "top"-style dashboards.
//!
//! Provides:
//! - `cell`: cell values (`Cell`), colour-tagged text (`ColorStr`)
//! - `fmt`: human-readable numeric compaction
//! - `block`: column-aligned tables with persistent column widths
//! - `console`: terminal mode, resize tracking, key polling, composite refresh
//! - `style`: SGR output helpers
//! - `demo`: synthetic data source used by the `blocktop` binary

pub mod block;
pub mod cell;
pub mod console;
pub mod demo;
pub mod error;
pub mod fmt;
pub mod style;

pub use block::{Block, Printable};
pub use cell::{Cell, Color, ColorStr};
pub use console::{Console, ConsoleConfig};
pub use error::{FormatError, RenderError};
