use async_trait::async_trait;

use fund_core::{ApiConfig, ApiError, ClientFactory, FundraisingApi};

use crate::http::HttpClient;
use crate::memory::MemoryClient;

/// [`ClientFactory`] for the REST API.
///
/// ```rust,no_run
/// use fund_core::ClientRegistry;
/// use fund_client::HttpClientFactory;
///
/// let mut registry = ClientRegistry::new();
/// registry.register(Box::new(HttpClientFactory));
/// ```
pub struct HttpClientFactory;

#[async_trait]
impl ClientFactory for HttpClientFactory {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    /// Builds the client only; no request is made until the first call.
    async fn create(
        &self,
        config: &ApiConfig,
    ) -> Result<Box<dyn FundraisingApi>, ApiError> {
        Ok(Box::new(HttpClient::new(config)?))
    }
}

/// [`ClientFactory`] for the in-process store. Each `create` starts empty.
pub struct MemoryClientFactory;

#[async_trait]
impl ClientFactory for MemoryClientFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        config: &ApiConfig,
    ) -> Result<Box<dyn FundraisingApi>, ApiError> {
        Ok(Box::new(MemoryClient::new(config.token.clone())))
    }
}

#[cfg(test)]
mod tests {
    use fund_core::{ApiConfig, ClientFactory, FundraisingApi};

    use super::{HttpClientFactory, MemoryClientFactory};

    #[test]
    fn backend_names() {
        assert_eq!(HttpClientFactory.backend_name(), "http");
        assert_eq!(MemoryClientFactory.backend_name(), "memory");
    }

    #[tokio::test]
    async fn http_factory_rejects_bad_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        let result = HttpClientFactory.create(&config).await;
        assert!(result.is_err(), "bad base URL should be rejected");
    }

    #[tokio::test]
    async fn memory_factory_creates_empty_store() {
        let config = ApiConfig {
            backend: "memory".to_string(),
            ..ApiConfig::default()
        };
        let client = MemoryClientFactory.create(&config).await.unwrap();
        assert!(client.list_causes().await.unwrap().is_empty());
    }
}
