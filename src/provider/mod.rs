//! The annotation provider boundary.
//!
//! A provider performs exactly one remote call per `fetch`: no retries, no
//! caching. All retry/caching policy lives in the layers above, so this seam
//! stays dumb enough to mock.

pub mod client;
pub mod types;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AnnoError;
use crate::key::VariantKey;
use types::VepAllele;

pub use client::VepClient;

/// One remote lookup: normalized variant in, raw provider alleles out.
#[async_trait]
pub trait AnnotationProvider: Send + Sync {
    /// Fetch the provider's annotation for `key`. An empty result set is
    /// reported as `NotFound`, never as an empty `Vec`.
    async fn fetch(&self, key: &VariantKey) -> Result<Vec<VepAllele>, AnnoError>;
}

/// In-memory provider for tests and examples.
///
/// Stores canned responses or failures per canonical variant string and
/// counts fetches, which is what the coalescing and negative-cache tests
/// assert on.
///
/// # Example
///
/// ```
/// use varanno::MockProvider;
///
/// let provider = MockProvider::new();
/// provider.fail_with("BAD:g.1A>G", varanno::AnnoError::Timeout);
/// assert_eq!(provider.fetch_count(), 0);
/// ```
#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<HashMap<String, Result<Vec<VepAllele>, AnnoError>>>,
    fetches: AtomicUsize,
}

impl MockProvider {
    /// Create an empty mock; unknown variants yield `NotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canned successful response.
    pub fn respond_with(&self, canonical: &str, alleles: Vec<VepAllele>) {
        self.responses
            .lock()
            .expect("mock provider lock poisoned")
            .insert(canonical.to_string(), Ok(alleles));
    }

    /// Register a canned failure.
    pub fn fail_with(&self, canonical: &str, error: AnnoError) {
        self.responses
            .lock()
            .expect("mock provider lock poisoned")
            .insert(canonical.to_string(), Err(error));
    }

    /// Total number of `fetch` calls observed.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnnotationProvider for MockProvider {
    async fn fetch(&self, key: &VariantKey) -> Result<Vec<VepAllele>, AnnoError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.lock().expect("mock provider lock poisoned");
        match responses.get(key.canonical()) {
            Some(result) => result.clone(),
            None => Err(AnnoError::NotFound {
                variant: key.canonical().to_string(),
            }),
        }
    }
}
