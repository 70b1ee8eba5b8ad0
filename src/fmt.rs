//! Human-readable numeric compaction for table cells.
//!
//! Numbers are divided by 1000 while they are at least 10000, picking up a
//! magnitude suffix at each step: `12345` -> `"12k"`, `15000000` -> `"15M"`.
//! Whole numbers use integer division and no decimals; fractional numbers use
//! real division and two decimals (`12345.6` -> `"12.35k"`).

/// Magnitude suffixes, smallest first.
pub const SUFFIXES: [&str; 9] = ["", "k", "M", "G", "T", "P", "E", "Z", "Y"];

/// Values below this are shown as they are.
const COMPACT_LIMIT: i128 = 10_000;

/// Compact a whole number: `"999"`, `"12k"`, `"15M"`.
///
/// Negative values are never compacted.
pub fn compact_int(value: i128) -> String {
    let mut value = value;
    let mut magnitude = 0;
    while value >= COMPACT_LIMIT && magnitude + 1 < SUFFIXES.len() {
        value /= 1000;
        magnitude += 1;
    }
    format!("{}{}", value, SUFFIXES[magnitude])
}

/// Compact a fractional number with two decimals: `"1.50"`, `"12.35k"`.
pub fn compact_float(value: f64) -> String {
    let mut value = value;
    let mut magnitude = 0;
    while value >= COMPACT_LIMIT as f64 && magnitude + 1 < SUFFIXES.len() {
        value /= 1000.0;
        magnitude += 1;
    }
    format!("{:.2}{}", value, SUFFIXES[magnitude])
}
