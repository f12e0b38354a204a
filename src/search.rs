//! Search
//!
//! Debounce and stale-response guarding for search and filter inputs. Each
//! new input invalidates the previously scheduled fetch; only the most
//! recent scheduled task runs, and only the response for the latest issued
//! query may be applied.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::time::sleep;

use crate::{
    api::{
        ApiError,
        products::{CatalogClient, ProductQuery},
    },
    products::Product,
};

/// Delay before a search suggestion fetch fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Delay before a price-range filter fetch fires.
pub const PRICE_FILTER_DEBOUNCE: Duration = Duration::from_millis(500);

/// Queries shorter than this (after trimming) produce no suggestions.
pub const MIN_QUERY_LEN: usize = 2;

/// Maximum number of suggestions surfaced to the shopper.
pub const MAX_SUGGESTIONS: usize = 6;

/// Generation-counted debounce timer.
///
/// Every [`settle`](Self::settle) call starts a new generation; a call only
/// yields its value back if no newer call arrived while it slept.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    /// Create a debouncer with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait out the delay; returns `Some(value)` only when this call is
    /// still the newest one.
    pub async fn settle<T>(&self, value: T) -> Option<T> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        sleep(self.delay).await;

        if self.generation.load(Ordering::SeqCst) == generation {
            Some(value)
        } else {
            None
        }
    }
}

/// Ticket for one issued query; see [`QueryGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

/// Stale-response guard.
///
/// A ticket is issued when a request is dispatched; its response may be
/// applied only while the ticket is still the latest one. This keeps an
/// older, slower response from overwriting a newer query's results.
#[derive(Debug, Clone, Default)]
pub struct QueryGuard {
    latest: Arc<AtomicU64>,
}

impl QueryGuard {
    /// Create a guard with no outstanding queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new query, superseding all earlier tickets.
    pub fn issue(&self) -> QueryTicket {
        QueryTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether the ticket still belongs to the latest query.
    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Pass `value` through only when the ticket is still current.
    pub fn accept<T>(&self, ticket: QueryTicket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}

/// Debounced product search suggestions.
#[derive(Clone)]
pub struct Suggester {
    client: Arc<dyn CatalogClient>,
    debouncer: Debouncer,
    guard: QueryGuard,
}

impl fmt::Debug for Suggester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suggester")
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl Suggester {
    /// Create a suggester with the default search debounce.
    pub fn new(client: Arc<dyn CatalogClient>) -> Self {
        Self::with_delay(client, SEARCH_DEBOUNCE)
    }

    /// Create a suggester with a custom debounce delay.
    pub fn with_delay(client: Arc<dyn CatalogClient>, delay: Duration) -> Self {
        Self {
            client,
            debouncer: Debouncer::new(delay),
            guard: QueryGuard::new(),
        }
    }

    /// Fetch suggestions for a raw input value.
    ///
    /// Short queries resolve to no suggestions without touching the
    /// network; superseded and stale calls resolve to no suggestions as
    /// well, so only the newest input ever surfaces results.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the catalog request fails.
    pub async fn suggest(&self, raw_query: &str) -> Result<Vec<Product>, ApiError> {
        let query = raw_query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let Some(query) = self.debouncer.settle(query.to_owned()).await else {
            return Ok(Vec::new());
        };

        let ticket = self.guard.issue();

        let mut products = self
            .client
            .search_products(ProductQuery::search(query))
            .await?;

        if !self.guard.is_current(ticket) {
            return Ok(Vec::new());
        }

        products.truncate(MAX_SUGGESTIONS);

        Ok(products)
    }
}
