//! varanno: cached HGVS variant annotation
//!
//! Looks up variant effect annotations from the Ensembl VEP REST API and
//! caches them behind a single-flight layer, so repeated and concurrent
//! lookups of the same variant cost one upstream call. Ships with a batch
//! TSV front end and a small REST service over the same core.
//!
//! # Example
//!
//! ```
//! use varanno::VariantKey;
//!
//! // Different spellings normalize to one cache key
//! let a = VariantKey::normalize("NC_000006.12:g.152387156G>A").unwrap();
//! let b = VariantKey::normalize("  nc_000006.12:g.152387156g>a ").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.canonical(), "NC_000006.12:g.152387156G>A");
//! ```

pub mod annotate;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod provider;
pub mod record;
pub mod service;

// Re-export commonly used types
pub use annotate::AnnotationService;
pub use batch::{BatchRunner, BatchSummary};
pub use cache::{CacheConfig, CacheStats, SingleFlightCache};
pub use config::AnnotatorConfig;
pub use error::AnnoError;
pub use key::{GenomicSub, VariantKey};
pub use provider::{AnnotationProvider, MockProvider, VepClient};
pub use record::AnnotationRecord;

/// Result type alias for varanno operations
pub type Result<T> = std::result::Result<T, AnnoError>;
