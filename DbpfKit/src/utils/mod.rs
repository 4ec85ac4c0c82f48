//! Utility functions

pub mod cursor;
pub mod hex;

pub use cursor::{ByteCursor, Reposition};
pub use hex::parse_hex;
