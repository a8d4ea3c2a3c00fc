//! Counters for one relay session.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::download::Cursor;
use crate::media::{MediaItem, MediaKind};

/// What a relay session has delivered so far.
#[derive(Debug, Clone)]
pub struct RelayStats {
    pub photos: u64,
    pub videos: u64,
    pub animated_gifs: u64,
    pub bytes: u64,
    /// Items accepted per destination kind.
    pub exported: BTreeMap<&'static str, u64>,
    /// Cursor last published by the poller.
    pub cursor: Cursor,
    started: Instant,
}

impl RelayStats {
    pub fn new(cursor: Cursor) -> Self {
        Self {
            photos: 0,
            videos: 0,
            animated_gifs: 0,
            bytes: 0,
            exported: BTreeMap::new(),
            cursor,
            started: Instant::now(),
        }
    }

    /// Count an item every destination in `destinations` accepted.
    pub fn record(&mut self, item: &MediaItem, destinations: &[&'static str]) {
        match item.kind() {
            MediaKind::Photo => self.photos += 1,
            MediaKind::Video => self.videos += 1,
            MediaKind::AnimatedGif => self.animated_gifs += 1,
        }
        self.bytes += item.len() as u64;
        for kind in destinations {
            *self.exported.entry(*kind).or_default() += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.photos + self.videos + self.animated_gifs
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new(Cursor::default())
    }
}
