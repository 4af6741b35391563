use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::FragmentFetcher;
use crate::error::RetrievalError;

/// Canned response for one source.
#[derive(Debug, Clone)]
pub struct MemoryRoute {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
    pub hang: bool,
}

impl MemoryRoute {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: None,
            hang: false,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            delay: None,
            hang: false,
        }
    }

    /// A route that never answers.
    pub fn hang() -> Self {
        Self {
            hang: true,
            ..Self::ok("")
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// In-memory fetcher with optional latency per route.
///
/// Unknown sources answer 404. Every request is recorded so callers can
/// inspect issue order and peak concurrency.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    routes: HashMap<String, MemoryRoute>,
    requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, source: impl Into<String>, route: MemoryRoute) -> Self {
        self.routes.insert(source.into(), route);
        self
    }

    pub fn insert(&mut self, source: impl Into<String>, route: MemoryRoute) {
        self.routes.insert(source.into(), route);
    }

    /// Sources requested so far, in issue order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Highest number of requests that were pending at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FragmentFetcher for MemoryFetcher {
    async fn fetch(&self, source: &str) -> Result<String, RetrievalError> {
        self.requests.lock().push(source.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let Some(route) = self.routes.get(source) else {
            return Err(RetrievalError::Status {
                source_url: source.to_string(),
                status: 404,
            });
        };

        if route.hang {
            futures::future::pending::<()>().await;
        }
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }

        if !(200..300).contains(&route.status) {
            return Err(RetrievalError::Status {
                source_url: source.to_string(),
                status: route.status,
            });
        }
        Ok(route.body.clone())
    }

    fn describe(&self) -> String {
        format!("memory({} routes)", self.routes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_and_missing() {
        let f = MemoryFetcher::new()
            .with_route("/a.html", MemoryRoute::ok("A"))
            .with_route("/gone.html", MemoryRoute::status(410));

        assert_eq!(f.fetch("/a.html").await.unwrap(), "A");
        assert_eq!(f.fetch("/gone.html").await.unwrap_err().status(), Some(410));
        assert_eq!(f.fetch("/nope.html").await.unwrap_err().status(), Some(404));
        assert_eq!(f.requests(), vec!["/a.html", "/gone.html", "/nope.html"]);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_counted() {
        let f = MemoryFetcher::new()
            .with_route("/a", MemoryRoute::ok("a").delayed(Duration::from_millis(20)))
            .with_route("/b", MemoryRoute::ok("b").delayed(Duration::from_millis(20)));

        let (a, b) = futures::join!(f.fetch("/a"), f.fetch("/b"));
        assert_eq!(a.unwrap(), "a");
        assert_eq!(b.unwrap(), "b");
        assert_eq!(f.max_in_flight(), 2);
    }
}
