//! Character-level helpers shared by the smartype crates.

pub mod chars;
pub mod line_ending;
