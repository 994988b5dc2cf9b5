//! Parsers turning resource files into model values.
pub mod json;
