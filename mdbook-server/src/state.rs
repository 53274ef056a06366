//! Application state

use crate::config::Settings;
use crate::error::ApiError;
use anyhow::{Context, Result};
use mdbook_core::{Book, Library};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,

    /// All books of the library directory, with the references
    pub library: Arc<RwLock<Library>>,

    /// Channel for SSE events
    pub event_tx: broadcast::Sender<ServerEvent>,
}

/// Server-sent events
#[derive(Debug, Clone)]
pub enum ServerEvent {
    BookCreated { bid: String, title: String },

    /// Contents or structure of a book changed
    BookUpdated { bid: String, digest: String },

    BookDeleted { bid: String },

    ReferencesUpdated { id: String },

    /// A book or item was exported
    ExportComplete { bid: String, format: String },
}

impl AppState {
    /// Read the library directory named in the settings
    pub fn new(settings: Settings) -> Result<Self> {
        std::fs::create_dir_all(&settings.dir)
            .with_context(|| format!("Creating {}", settings.dir.display()))?;
        let library = Library::open(&settings.dir)
            .with_context(|| format!("Reading library {}", settings.dir.display()))?;
        tracing::info!(
            "Read {} books from {}",
            library.len(),
            settings.dir.display()
        );

        let (event_tx, _) = broadcast::channel(100);
        Ok(Self {
            settings: Arc::new(settings),
            library: Arc::new(RwLock::new(library)),
            event_tx,
        })
    }

    /// Run a change on one book and announce its new digest
    pub async fn update_book<T>(
        &self,
        bid: &str,
        change: impl FnOnce(&mut Book) -> mdbook_core::Result<T>,
    ) -> Result<T, ApiError> {
        let mut library = self.library.write().await;
        let book = library.book_mut(bid)?;
        let result = change(book)?;
        self.broadcast(ServerEvent::BookUpdated {
            bid: book.bid.clone(),
            digest: book.digest(),
        });
        Ok(result)
    }

    /// Subscribe to server events
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast an event
    pub fn broadcast(&self, event: ServerEvent) {
        // Ignore errors (no subscribers)
        let _ = self.event_tx.send(event);
    }
}
