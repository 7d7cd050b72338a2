//! Filesystem primitives shared across features.

pub mod atomic;

pub use atomic::{copy_atomic, write_atomic};
