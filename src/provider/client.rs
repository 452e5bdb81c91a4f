//! HTTP client for the Ensembl VEP REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::ProviderConfig;
use crate::error::AnnoError;
use crate::key::VariantKey;

use super::types::{VepAllele, VepErrorBody};
use super::AnnotationProvider;

/// Default VEP HGVS endpoint.
pub const DEFAULT_BASE_URL: &str = "https://rest.ensembl.org/vep/human/hgvs";

/// Thin reqwest wrapper: one GET per lookup, keyed by the canonical variant
/// string embedded in the URL path. Status codes and transport failures are
/// mapped to error kinds here; everything else (retries, caching, backoff)
/// is policy that belongs to the cache layer above.
pub struct VepClient {
    client: reqwest::Client,
    base_url: String,
}

impl VepClient {
    /// Build a client from provider configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, AnnoError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .build()
            .map_err(|e| AnnoError::Config {
                msg: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, key: &VariantKey) -> String {
        format!(
            "{}/{}",
            self.base_url,
            urlencoding::encode(key.canonical())
        )
    }

    fn map_status(status: StatusCode, key: &VariantKey, detail: Option<String>) -> AnnoError {
        match status {
            StatusCode::NOT_FOUND => AnnoError::NotFound {
                variant: key.canonical().to_string(),
            },
            StatusCode::TOO_MANY_REQUESTS => AnnoError::RateLimited,
            s if s.is_server_error() => AnnoError::Unavailable {
                msg: format!("provider returned HTTP {s}"),
            },
            s if s.is_client_error() => AnnoError::invalid_input(
                detail.unwrap_or_else(|| format!("provider rejected request with HTTP {s}")),
            ),
            s => AnnoError::Unavailable {
                msg: format!("unexpected HTTP status {s}"),
            },
        }
    }

    fn map_transport_error(err: reqwest::Error) -> AnnoError {
        if err.is_timeout() {
            AnnoError::Timeout
        } else {
            AnnoError::Unavailable {
                msg: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl AnnotationProvider for VepClient {
    async fn fetch(&self, key: &VariantKey) -> Result<Vec<VepAllele>, AnnoError> {
        let url = self.url_for(key);
        tracing::debug!(variant = %key, %url, "fetching annotation");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            // Provider error bodies carry a human-readable message; keep it
            // for 4xx responses surfaced back to the caller.
            let detail = response
                .json::<VepErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error);
            return Err(Self::map_status(status, key, detail));
        }

        let body = response.text().await.map_err(Self::map_transport_error)?;
        let alleles: Vec<VepAllele> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(variant = %key, payload = %body, "unparseable provider response: {e}");
            AnnoError::malformed(e.to_string())
        })?;

        if alleles.is_empty() {
            return Err(AnnoError::NotFound {
                variant: key.canonical().to_string(),
            });
        }

        Ok(alleles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    fn client() -> VepClient {
        VepClient::new(&ProviderConfig::default()).unwrap()
    }

    fn key(s: &str) -> VariantKey {
        VariantKey::normalize(s).unwrap()
    }

    #[test]
    fn test_url_embeds_encoded_canonical() {
        let url = client().url_for(&key("NC_000006.12:g.152387156G>A"));
        assert_eq!(
            url,
            "https://rest.ensembl.org/vep/human/hgvs/NC_000006.12%3Ag.152387156G%3EA"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ProviderConfig {
            base_url: "http://localhost:9000/vep/".to_string(),
            ..ProviderConfig::default()
        };
        let client = VepClient::new(&config).unwrap();
        assert!(client
            .url_for(&key("X:g.1A>G"))
            .starts_with("http://localhost:9000/vep/X"));
    }

    #[test]
    fn test_status_mapping() {
        let k = key("NC_000006.12:g.152387156G>A");

        assert!(matches!(
            VepClient::map_status(StatusCode::NOT_FOUND, &k, None),
            AnnoError::NotFound { .. }
        ));
        assert_eq!(
            VepClient::map_status(StatusCode::TOO_MANY_REQUESTS, &k, None),
            AnnoError::RateLimited
        );
        assert!(matches!(
            VepClient::map_status(StatusCode::BAD_GATEWAY, &k, None),
            AnnoError::Unavailable { .. }
        ));
        assert!(matches!(
            VepClient::map_status(StatusCode::INTERNAL_SERVER_ERROR, &k, None),
            AnnoError::Unavailable { .. }
        ));
        assert!(matches!(
            VepClient::map_status(StatusCode::BAD_REQUEST, &k, None),
            AnnoError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_client_error_keeps_provider_detail() {
        let err = VepClient::map_status(
            StatusCode::BAD_REQUEST,
            &key("X:g.1A>G"),
            Some("Unable to parse HGVS string".to_string()),
        );
        assert_eq!(
            err,
            AnnoError::invalid_input("Unable to parse HGVS string")
        );
    }
}
