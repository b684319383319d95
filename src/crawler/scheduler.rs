//! Scheduler for numbered page work
//!
//! This module handles the fan-out of counted pagination:
//! - One unit of work per page, spawned onto a `JoinSet`
//! - Optional global concurrency limiting via a semaphore
//! - Inline, in-order execution when concurrency is disabled
//! - Joining every unit before returning

use crate::config::FetchOptions;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// How numbered pages are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// One page at a time, in page order, on the calling task
    Inline,

    /// Every page on its own task, at most `cap` in flight when set
    Spawned { cap: Option<usize> },
}

/// Runs page work according to the fetch options
#[derive(Debug, Clone, Copy)]
pub struct PageScheduler {
    mode: Mode,
}

impl PageScheduler {
    /// Creates a scheduler
    ///
    /// `concurrent == false` runs pages inline. Otherwise pages are spawned, with
    /// at most `max_concurrent_pages` in flight when that is set.
    pub fn new(options: &FetchOptions) -> Self {
        let mode = if options.concurrent {
            Mode::Spawned {
                cap: options.max_concurrent_pages.map(|n| n.max(1)),
            }
        } else {
            Mode::Inline
        };
        Self { mode }
    }

    /// Runs `work` once per page and waits for every unit to finish
    ///
    /// Work returns `false` when the consumer is gone; remaining pages are then
    /// skipped (inline) or aborted (spawned).
    pub async fn run<I, F, Fut>(&self, pages: I, work: F)
    where
        I: IntoIterator<Item = u32>,
        F: Fn(u32) -> Fut,
        Fut: Future<Output = bool> + Send + 'static,
    {
        match self.mode {
            Mode::Inline => {
                for page in pages {
                    if !work(page).await {
                        tracing::debug!("Consumer gone, stopping at page {}", page);
                        break;
                    }
                }
            }
            Mode::Spawned { cap } => {
                let limit = cap.map(|n| Arc::new(Semaphore::new(n)));
                let mut tasks = JoinSet::new();

                for page in pages {
                    let permit = match &limit {
                        Some(semaphore) => match Arc::clone(semaphore).acquire_owned().await {
                            Ok(permit) => Some(permit),
                            Err(_) => break,
                        },
                        None => None,
                    };

                    let unit = work(page);
                    tasks.spawn(async move {
                        let keep_going = unit.await;
                        drop(permit);
                        keep_going
                    });
                }

                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok(true) => {}
                        Ok(false) => tasks.abort_all(),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => tracing::error!("Page task failed: {}", e),
                    }
                }
            }
        }
    }
}
