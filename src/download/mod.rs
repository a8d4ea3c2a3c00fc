//! Download module: fetching new media from the source platform.
//!
//! This module provides:
//! - Cursor tracking and persistence
//! - Media file downloading
//! - The polling task and its consumer stream

pub mod cursor;
pub mod media;
pub mod poller;

pub use cursor::{Cursor, CursorSeed, CursorStore};
pub use media::{HttpDownloader, MediaResolver};
pub use poller::{MediaStream, Poller, PollerSettings};
