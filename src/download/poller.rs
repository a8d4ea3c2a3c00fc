//! Incremental timeline polling.
//!
//! The poller runs as its own task and hands media to the consumer one item
//! at a time. It does not start the next download until the consumer has
//! come back for more, so a slow destination slows polling down instead of
//! piling up payloads in memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::api::TimelineSource;
use crate::download::cursor::{Cursor, CursorSeed, CursorStore};
use crate::download::media::MediaResolver;
use crate::error::{Error, Phase, PhaseExt, Result};
use crate::media::{media_references, MediaItem};

/// Poller settings, built from the validated configuration.
#[derive(Debug, Clone)]
pub struct PollerSettings {
    /// Pause between two polls.
    pub interval: Duration,
    /// Initial cursor source.
    pub seed: CursorSeed,
    /// Account to watch, the authenticated one when `None`.
    pub screen_name: Option<String>,
    /// Persist the cursor between runs.
    pub cursor_store: Option<CursorStore>,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            seed: CursorSeed::Latest,
            screen_name: None,
            cursor_store: None,
        }
    }
}

enum Handoff {
    Media(MediaItem, oneshot::Sender<()>),
    Failed(Error),
}

/// Polls one account for tweets newer than its cursor.
pub struct Poller<S, R> {
    source: Arc<S>,
    resolver: Arc<R>,
    screen_name: String,
    cursor: Cursor,
    interval: Duration,
    store: Option<CursorStore>,
}

impl<S, R> Poller<S, R>
where
    S: TimelineSource + 'static,
    R: MediaResolver + 'static,
{
    /// Resolve the watched account and seed the cursor.
    pub async fn new(source: Arc<S>, resolver: Arc<R>, settings: PollerSettings) -> Result<Self> {
        let screen_name = match settings.screen_name {
            Some(name) => name.trim_start_matches('@').to_string(),
            None => source.verify_credentials().await.during(Phase::Fetch)?.screen_name,
        };

        let cursor = seed_cursor(
            source.as_ref(),
            &screen_name,
            settings.seed,
            settings.cursor_store.as_ref(),
        )
        .await
        .during(Phase::Fetch)?;

        tracing::info!(screen_name = %screen_name, since = %cursor, "Poller ready");

        Ok(Self {
            source,
            resolver,
            screen_name,
            cursor,
            interval: settings.interval,
            store: settings.cursor_store,
        })
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }

    /// Spawn the polling task and return the consumer side.
    pub fn start(self) -> MediaStream {
        let (tx, rx) = mpsc::channel(1);
        let (cursor_tx, cursor_rx) = watch::channel(self.cursor);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(self.run(tx, cursor_tx, cancel.clone()));

        MediaStream {
            rx,
            pending_ack: None,
            cursor: cursor_rx,
            cancel,
            task: Some(task),
        }
    }

    async fn run(
        mut self,
        tx: mpsc::Sender<Handoff>,
        cursor_tx: watch::Sender<Cursor>,
        cancel: CancellationToken,
    ) {
        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.poll_once(&tx, &cursor_tx) => outcome,
            };

            match outcome {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!("Consumer went away, stopping poller");
                    break;
                }
                Err(e) => {
                    tracing::debug!(since = %self.cursor, "Poll failed: {}", e);
                    let _ = tx.send(Handoff::Failed(e.during(Phase::Fetch))).await;
                    break;
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }

        tracing::debug!(since = %self.cursor, "Poller stopped");
    }

    /// One poll cycle. Returns false once the consumer is gone.
    async fn poll_once(
        &mut self,
        tx: &mpsc::Sender<Handoff>,
        cursor_tx: &watch::Sender<Cursor>,
    ) -> Result<bool> {
        let floor = self.cursor;
        let tweets = self
            .source
            .tweets_since(&self.screen_name, floor.since())
            .await?;

        tracing::debug!(since = %floor, tweets = tweets.len(), "poll");

        for tweet in &tweets {
            if tweet.id <= floor.id() {
                tracing::debug!(tweet = tweet.id, "Skipping tweet at or below cursor");
                continue;
            }

            for media in media_references(tweet) {
                let item = self.resolver.resolve(media).await?;
                if !hand_off(tx, item).await {
                    return Ok(false);
                }
            }

            if self.cursor.advance(tweet.id) {
                cursor_tx.send_replace(self.cursor);
            }
        }

        if self.cursor != floor {
            if let Some(store) = &self.store {
                store.save(self.cursor).await?;
            }
        }

        Ok(true)
    }
}

/// Send one item and wait until the consumer asks for the next one.
///
/// Returns false when the consumer went away, including when it dropped
/// the item without coming back for more.
async fn hand_off(tx: &mpsc::Sender<Handoff>, item: MediaItem) -> bool {
    let (ack_tx, ack_rx) = oneshot::channel();
    if tx.send(Handoff::Media(item, ack_tx)).await.is_err() {
        return false;
    }
    ack_rx.await.is_ok()
}

async fn seed_cursor<S: TimelineSource + ?Sized>(
    source: &S,
    screen_name: &str,
    seed: CursorSeed,
    store: Option<&CursorStore>,
) -> Result<Cursor> {
    if let CursorSeed::Explicit(id) = seed {
        return Ok(Cursor::new(id));
    }

    if let Some(store) = store {
        if let Some(cursor) = store.load()? {
            tracing::info!(
                path = %store.path().display(),
                since = %cursor,
                "Resuming from stored cursor"
            );
            return Ok(cursor);
        }
    }

    let latest = source.latest_tweets(screen_name, 1).await?;
    match latest.iter().map(|t| t.id).max() {
        Some(id) => Ok(Cursor::new(id)),
        None => {
            tracing::warn!(screen_name, "Account has no tweets yet, starting from the beginning");
            Ok(Cursor::default())
        }
    }
}

/// Consumer side of a running poller.
pub struct MediaStream {
    rx: mpsc::Receiver<Handoff>,
    pending_ack: Option<oneshot::Sender<()>>,
    cursor: watch::Receiver<Cursor>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MediaStream {
    /// Next media item, or the error that stopped the poller.
    ///
    /// Calling this again signals that the previous item is done with.
    /// Returns `None` once the poller has stopped.
    pub async fn next(&mut self) -> Option<Result<MediaItem>> {
        if let Some(ack) = self.pending_ack.take() {
            let _ = ack.send(());
        }

        match self.rx.recv().await? {
            Handoff::Media(item, ack) => {
                self.pending_ack = Some(ack);
                Some(Ok(item))
            }
            Handoff::Failed(e) => Some(Err(e)),
        }
    }

    /// Latest cursor published by the poller.
    pub fn cursor(&self) -> Cursor {
        *self.cursor.borrow()
    }

    /// Stop the poller and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        self.pending_ack.take();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Poller task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
