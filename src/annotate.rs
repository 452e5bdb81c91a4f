//! The annotation service.
//!
//! Ties the pieces together: normalize the raw variant string into a
//! [`VariantKey`], consult the [`SingleFlightCache`], and on a miss fetch
//! from the [`AnnotationProvider`] and shape the response into an
//! [`AnnotationRecord`]. Both front ends (batch CLI and web service) sit on
//! top of this one type.

use std::sync::Arc;

use crate::cache::{CacheConfig, CacheStats, SingleFlightCache};
use crate::error::AnnoError;
use crate::key::VariantKey;
use crate::provider::AnnotationProvider;
use crate::record::AnnotationRecord;

/// Cached variant annotation lookups over a provider.
///
/// Cheap to clone; clones share the same cache and provider.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use varanno::{AnnotationService, MockProvider};
/// use varanno::cache::CacheConfig;
///
/// # async fn example() -> Result<(), varanno::AnnoError> {
/// let provider = Arc::new(MockProvider::new());
/// let service = AnnotationService::new(provider, CacheConfig::default());
/// let record = service.lookup("NC_000006.12:g.152387156G>A").await?;
/// println!("{}", record.most_severe_consequence);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AnnotationService {
    provider: Arc<dyn AnnotationProvider>,
    cache: SingleFlightCache,
}

impl AnnotationService {
    /// Create a service over `provider` with the given cache configuration.
    pub fn new(provider: Arc<dyn AnnotationProvider>, cache_config: CacheConfig) -> Self {
        Self {
            provider,
            cache: SingleFlightCache::new(cache_config),
        }
    }

    /// Annotate one variant, served from cache when possible.
    ///
    /// Normalization failures (`InvalidInput`) are returned immediately and
    /// never reach the cache or the provider. Everything else goes through
    /// the single-flight cache, so concurrent lookups of the same variant
    /// share one provider call.
    pub async fn lookup(&self, raw: &str) -> Result<Arc<AnnotationRecord>, AnnoError> {
        let key = VariantKey::normalize(raw)?;
        let provider = Arc::clone(&self.provider);
        let loader_key = key.clone();
        self.cache
            .get(&key, async move {
                let alleles = provider.fetch(&loader_key).await?;
                AnnotationRecord::from_alleles(&loader_key, &alleles)
            })
            .await
    }

    /// Snapshot of cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop all cached entries.
    pub fn clear_cache(&self) {
        self.cache.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::{TranscriptConsequence, VepAllele};
    use crate::provider::MockProvider;
    use std::time::Duration;

    fn allele(gene: &str) -> VepAllele {
        VepAllele {
            assembly_name: "GRCh38".to_string(),
            seq_region_name: "6".to_string(),
            start: 152387156,
            end: 152387156,
            strand: 1,
            most_severe_consequence: "synonymous_variant".to_string(),
            transcript_consequences: vec![TranscriptConsequence {
                gene_symbol: Some(gene.to_string()),
            }],
        }
    }

    fn service(provider: Arc<MockProvider>) -> AnnotationService {
        AnnotationService::new(
            provider,
            CacheConfig {
                capacity: 8,
                ttl: Duration::from_secs(60),
                negative_ttl: Duration::from_secs(60),
            },
        )
    }

    #[tokio::test]
    async fn test_lookup_normalizes_before_caching() {
        let provider = Arc::new(MockProvider::new());
        provider.respond_with("NC_000006.12:g.152387156G>A", vec![allele("SYNE1")]);
        let service = service(Arc::clone(&provider));

        // Three spellings of the same variant share one fetch.
        for raw in [
            "NC_000006.12:g.152387156G>A",
            "nc_000006.12:G.152387156g>a",
            "  NC_000006.12:g.152387156G>A  ",
        ] {
            let record = service.lookup(raw).await.unwrap();
            assert_eq!(record.input, "NC_000006.12:g.152387156G>A");
            assert_eq!(record.genes, vec!["SYNE1".to_string()]);
        }
        assert_eq!(provider.fetch_count(), 1);

        let stats = service.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_provider() {
        let provider = Arc::new(MockProvider::new());
        let service = service(Arc::clone(&provider));

        let err = service.lookup("   ").await.unwrap_err();
        assert!(matches!(err, AnnoError::InvalidInput { .. }));
        assert_eq!(provider.fetch_count(), 0);
        assert_eq!(service.cache_stats().misses, 0);
    }

    #[tokio::test]
    async fn test_not_found_negative_cached() {
        let provider = Arc::new(MockProvider::new());
        let service = service(Arc::clone(&provider));

        for _ in 0..3 {
            let err = service.lookup("NC_000001.11:g.100A>G").await.unwrap_err();
            assert!(matches!(err, AnnoError::NotFound { .. }));
        }
        assert_eq!(provider.fetch_count(), 1);
        assert_eq!(service.cache_stats().negative_hits, 2);
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        let provider = Arc::new(MockProvider::new());
        provider.fail_with("NC_000001.11:g.100A>G", AnnoError::Unavailable {
            msg: "down".to_string(),
        });
        let service = service(Arc::clone(&provider));

        let err = service.lookup("NC_000001.11:g.100A>G").await.unwrap_err();
        assert!(err.is_transient());

        provider.respond_with("NC_000001.11:g.100A>G", vec![allele("GENE1")]);
        let record = service.lookup("NC_000001.11:g.100A>G").await.unwrap();
        assert_eq!(record.genes, vec!["GENE1".to_string()]);
        assert_eq!(provider.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_shape_negative_cached() {
        let provider = Arc::new(MockProvider::new());
        let mut bad = allele("GENE1");
        bad.strand = 0;
        provider.respond_with("NC_000001.11:g.100A>G", vec![bad]);
        let service = service(Arc::clone(&provider));

        for _ in 0..2 {
            let err = service.lookup("NC_000001.11:g.100A>G").await.unwrap_err();
            assert!(matches!(err, AnnoError::MalformedResponse { .. }));
        }
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let provider = Arc::new(MockProvider::new());
        provider.respond_with("NC_000001.11:g.100A>G", vec![allele("GENE1")]);
        let service = service(Arc::clone(&provider));

        service.lookup("NC_000001.11:g.100A>G").await.unwrap();
        service.clear_cache();
        service.lookup("NC_000001.11:g.100A>G").await.unwrap();
        assert_eq!(provider.fetch_count(), 2);
    }
}
