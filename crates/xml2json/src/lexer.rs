//! Byte-level scanning primitives

pub mod cursor;

pub use cursor::Cursor;
