//! Shared test utilities for source and monitor testing
//!
//! Provides a scripted `ScriptedSource` so spread, gate and loop tests can
//! replay exact per-tick reads without any network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::errors::{SourceError, SourceResult};
use crate::adapters::traits::QuoteSource;
use crate::core::quote::QuoteSide;

/// One scripted outcome for a single `read_field` call
#[derive(Debug, Clone)]
pub enum ScriptedRead {
    /// Field located with this raw text
    Text(String),
    /// Field absent on this read
    Absent,
    /// Read fails with a recoverable request error
    Fail,
    /// Read never completes (exercises the per-read timeout)
    Hang,
    /// Session died
    Lost,
}

impl ScriptedRead {
    pub fn text(value: &str) -> Self {
        ScriptedRead::Text(value.to_string())
    }
}

/// Scripted quote source
///
/// Each slot replays its queue one entry per read; once a queue is down to
/// its last entry, that entry repeats forever.
pub struct ScriptedSource {
    name: String,
    open: bool,
    fail_open: bool,
    sell: Mutex<VecDeque<ScriptedRead>>,
    buy: Mutex<VecDeque<ScriptedRead>>,
    reads: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedSource {
    /// Create a closed source whose slots are absent until scripted
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            open: false,
            fail_open: false,
            sell: Mutex::new(VecDeque::from([ScriptedRead::Absent])),
            buy: Mutex::new(VecDeque::from([ScriptedRead::Absent])),
            reads: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fixed sell/buy text returned on every tick
    pub fn with_quotes(self, sell: &str, buy: &str) -> Self {
        self.with_script(vec![(ScriptedRead::text(sell), ScriptedRead::text(buy))])
    }

    /// Per-tick `(sell, buy)` script
    pub fn with_script(self, ticks: Vec<(ScriptedRead, ScriptedRead)>) -> Self {
        let (sell, buy): (VecDeque<_>, VecDeque<_>) = ticks.into_iter().unzip();
        if let Ok(mut queue) = self.sell.lock() {
            *queue = sell;
        }
        if let Ok(mut queue) = self.buy.lock() {
            *queue = buy;
        }
        self
    }

    /// Make `open()` fail
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Shared counter of `read_field` calls
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn next_read(&self, side: QuoteSide) -> ScriptedRead {
        let slot = match side {
            QuoteSide::Sell => &self.sell,
            QuoteSide::Buy => &self.buy,
        };
        let Ok(mut queue) = slot.lock() else {
            return ScriptedRead::Fail;
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or(ScriptedRead::Absent)
        } else {
            queue.front().cloned().unwrap_or(ScriptedRead::Absent)
        }
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    async fn open(&mut self) -> SourceResult<()> {
        if self.fail_open {
            return Err(SourceError::ConnectionFailed(format!(
                "{}: scripted open failure",
                self.name
            )));
        }
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) -> SourceResult<()> {
        self.open = false;
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_field(&self, side: QuoteSide) -> SourceResult<Option<String>> {
        if !self.open {
            return Err(SourceError::SessionClosed(self.name.clone()));
        }
        self.reads.fetch_add(1, Ordering::SeqCst);

        match self.next_read(side) {
            ScriptedRead::Text(text) => Ok(Some(text)),
            ScriptedRead::Absent => Ok(None),
            ScriptedRead::Fail => Err(SourceError::Request("scripted failure".to_string())),
            ScriptedRead::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
            ScriptedRead::Lost => Err(SourceError::SessionClosed(self.name.clone())),
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn venue_name(&self) -> &str {
        &self.name
    }
}
