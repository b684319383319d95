//! Streaming delivery of paginated results
//!
//! A [`PageStream`] is the receiving half of a single-slot channel. The
//! producer (the pagination task) owns every sender; the stream ends once the
//! last sender is dropped, which happens exactly once, after all page work has
//! finished. Dropping the stream early makes the producer's next send fail, and
//! the producer stops at that point.

use crate::ScrapeError;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, Mutex};

/// One delivered result: an extracted fragment or a page-level error
pub type StreamItem = Result<String, ScrapeError>;

/// Items buffered between producer and consumer; one slot keeps the handoff
/// as close to unbuffered as a tokio channel allows
pub(crate) const STREAM_CAPACITY: usize = 1;

/// Creates a connected producer/consumer pair
pub(crate) fn channel() -> (ItemSender, PageStream) {
    let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
    let sender = ItemSender {
        tx,
        batch: Arc::new(Mutex::new(())),
    };
    (sender, PageStream { rx })
}

/// Producer half, cloned into every unit of page work
#[derive(Debug, Clone)]
pub(crate) struct ItemSender {
    tx: mpsc::Sender<StreamItem>,
    // held for the whole of a batch so one page's items are never interleaved
    // with another's
    batch: Arc<Mutex<()>>,
}

impl ItemSender {
    /// Hands one item to the consumer, waiting for room
    ///
    /// Returns `false` when the consumer has gone away.
    pub(crate) async fn send(&self, item: StreamItem) -> bool {
        let _guard = self.batch.lock().await;
        self.tx.send(item).await.is_ok()
    }

    /// Hands a page's items to the consumer back to back
    ///
    /// Returns `false` as soon as the consumer has gone away.
    pub(crate) async fn send_batch(&self, items: Vec<StreamItem>) -> bool {
        let _guard = self.batch.lock().await;
        for item in items {
            if self.tx.send(item).await.is_err() {
                return false;
            }
        }
        true
    }
}

/// Finite, non-restartable stream of [`StreamItem`]s
///
/// Consume it with [`PageStream::next_item`], [`PageStream::collect_all`], or
/// as a [`futures::Stream`]. Drain it to the end to let the producer finish.
#[derive(Debug)]
pub struct PageStream {
    rx: mpsc::Receiver<StreamItem>,
}

impl PageStream {
    /// Receives the next item, or `None` once the stream is closed
    pub async fn next_item(&mut self) -> Option<StreamItem> {
        self.rx.recv().await
    }

    /// Drains the stream, returning every item in delivery order
    pub async fn collect_all(mut self) -> Vec<StreamItem> {
        let mut items = Vec::new();
        while let Some(item) = self.rx.recv().await {
            items.push(item);
        }
        items
    }
}

impl Stream for PageStream {
    type Item = StreamItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
