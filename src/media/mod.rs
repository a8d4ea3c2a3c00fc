//! Media module for item representation and parsing.

pub mod item;
pub mod parser;

pub use item::{MediaItem, MediaKind};
pub use parser::{media_references, resolve_reference, select_best_variant, MediaReference};
