//! Diagnostic events for side effects whose failures never reach callers.

use tokio::sync::broadcast;
use url::Url;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Writing a freshly parsed body back into the cache failed.
    CachePassbackFailed { error: String },
    /// One or more `Set-Cookie` values could not be stored in the jar.
    CookieWriteFailed { uri: Url, failures: Vec<String> },
}

/// Fan-out of diagnostics to any number of subscribers.
///
/// Publishing with no subscriber drops the event; slow subscribers lose
/// the oldest events once the channel is full.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    sender: broadcast::Sender<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.sender.subscribe()
    }

    pub fn publish(&self, diagnostic: Diagnostic) {
        let _ = self.sender.send(diagnostic);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
