//! # Kiln Core
//!
//! Domain-agnostic editing primitives shared by the Kiln crates.
//!
//! The [`abstract_editor`] module knows nothing about scenes or components:
//! it provides the command pattern, the undo/redo history and a queue for
//! actions produced away from the main thread. `kiln-scene` implements the
//! concrete variable-editing commands on top of it.

pub mod abstract_editor;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
