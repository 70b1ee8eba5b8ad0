//! Cell values and colour-tagged text.
//!
//! Every value a row can hold is a [`Cell`]. Formatting is a single `match`
//! over the variants, producing a [`ColorStr`]: plain text plus an optional
//! colour that the line printer applies.

use std::fmt::{self, Write as _};

use tracing::error;

use crate::error::FormatError;
use crate::fmt::{compact_float, compact_int};

/// Foreground colours: 8 base colours, each in a normal and a bright variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Purple,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightPurple,
    BrightCyan,
    BrightWhite,
}

impl Color {
    /// All colours, normal variants first.
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Purple,
        Color::Cyan,
        Color::White,
        Color::BrightBlack,
        Color::BrightRed,
        Color::BrightGreen,
        Color::BrightYellow,
        Color::BrightBlue,
        Color::BrightPurple,
        Color::BrightCyan,
        Color::BrightWhite,
    ];

    /// Returns `true` for the bright variants.
    pub fn is_bright(self) -> bool {
        self.index() >= 8
    }

    /// Position in the standard 16-colour ANSI palette (0-15).
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Immutable text with an optional colour tag.
///
/// Padding never embeds styling; the colour is applied by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorStr {
    text: String,
    color: Option<Color>,
}

impl ColorStr {
    pub fn new(text: impl Into<String>, color: Option<Color>) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    /// Text without a colour tag.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, None)
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self::new(text, Some(color))
    }

    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Left-justify to `width` characters with trailing spaces.
    /// Text already at least `width` long is returned unchanged.
    pub fn ljust(&self, width: usize) -> String {
        format!("{:<width$}", self.text, width = width)
    }
}

impl fmt::Display for ColorStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A single table cell.
pub enum Cell {
    /// Absent value, shown as an empty string.
    Empty,
    Text(String),
    /// Whole number, compacted with integer division.
    Int(i128),
    /// Fractional number, compacted with two decimals.
    Float(f64),
    /// Values joined with `" / "`.
    List(Vec<Cell>),
    Colored(ColorStr),
    /// Any other value, shown through its `Display` implementation.
    Display {
        type_name: &'static str,
        value: Box<dyn fmt::Display>,
    },
}

impl Cell {
    /// Wraps an arbitrary displayable value.
    pub fn display<T: fmt::Display + 'static>(value: T) -> Self {
        Cell::Display {
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    /// Converts the cell to display text plus an optional colour.
    pub fn format(&self) -> Result<ColorStr, FormatError> {
        match self {
            Cell::Empty => Ok(ColorStr::default()),
            Cell::Text(s) => Ok(ColorStr::plain(s.as_str())),
            Cell::Int(n) => Ok(ColorStr::plain(compact_int(*n))),
            Cell::Float(x) => Ok(ColorStr::plain(compact_float(*x))),
            Cell::List(items) => {
                let parts = items
                    .iter()
                    .map(|item| item.format().map(|c| c.text))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ColorStr::plain(parts.join(" / ")))
            }
            Cell::Colored(c) => Ok(c.clone()),
            Cell::Display { type_name, value } => {
                let type_name = *type_name;
                let mut text = String::new();
                if write!(text, "{}", value).is_err() {
                    error!(type_name, partial = %text, "unformattable cell value");
                    return Err(FormatError { type_name });
                }
                Ok(ColorStr::plain(text))
            }
        }
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => write!(f, "Empty"),
            Cell::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Cell::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Cell::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Cell::List(items) => f.debug_tuple("List").field(items).finish(),
            Cell::Colored(c) => f.debug_tuple("Colored").field(c).finish(),
            Cell::Display { type_name, .. } => f.debug_tuple("Display").field(type_name).finish(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<ColorStr> for Cell {
    fn from(c: ColorStr) -> Self {
        Cell::Colored(c)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Text(if b { "True" } else { "False" }.to_string())
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Float(x)
    }
}

impl From<f32> for Cell {
    fn from(x: f32) -> Self {
        Cell::Float(x.into())
    }
}

macro_rules! int_cell {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Cell {
                fn from(n: $t) -> Self {
                    Cell::Int(n as i128)
                }
            }
        )*
    };
}

int_cell!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

impl<T: Into<Cell>> From<Vec<T>> for Cell {
    fn from(values: Vec<T>) -> Self {
        Cell::List(values.into_iter().map(Into::into).collect())
    }
}

/// Builds a row of cells from heterogeneous values.
///
/// ```
/// use blocktop::row;
/// let r = row!["db1", 12345, 0.5, vec![3, 7]];
/// assert_eq!(r.len(), 4);
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::cell::Cell::from($value)),*]
    };
}
