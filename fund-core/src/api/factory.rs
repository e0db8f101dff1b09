use std::collections::HashMap;

use async_trait::async_trait;

use super::client::{ApiError, FundraisingApi};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Backend-agnostic client configuration.
///
/// `backend` must match the [`ClientFactory::backend_name`] of a
/// registered factory. The remaining fields are passed through to that
/// factory; backends that do not talk to a server ignore `base_url` and
/// `timeout_ms`.
///
/// | backend  | meaning                                  |
/// |----------|------------------------------------------|
/// | `http`   | REST API at `base_url`                   |
/// | `memory` | in-process store, empty on every start   |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"http"`).
    pub backend: String,
    pub base_url: String,
    /// Token sent as `Authorization: Token <token>`.
    pub token: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// One implementation per backend. Each backend exports a unit struct that
/// implements this trait and is registered with a [`ClientRegistry`] at
/// startup.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    async fn create(&self, config: &ApiConfig) -> Result<Box<dyn FundraisingApi>, ApiError>;
}

/// Registry of [`ClientFactory`] instances, keyed by backend name.
pub struct ClientRegistry {
    factories: HashMap<&'static str, Box<dyn ClientFactory>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn ClientFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`ApiError::Configuration`]: no factory is registered for the
    ///   requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &ApiConfig,
    ) -> Result<Box<dyn FundraisingApi>, ApiError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                ApiError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::models::{
        Campaign, Cause, NewCause, NewProject, Project, ProjectBeneficiary, ProjectFilter,
        ProjectUpdate, UserProfile,
    };
    use crate::pagination::{PageQuery, Paginated};

    use super::{ApiConfig, ApiError, ClientFactory, ClientRegistry, FundraisingApi};

    // ── stub client ──────────────────────────────────────────────────────
    // The tests only check routing, so every call is unimplemented.
    struct StubClient;

    #[async_trait]
    impl FundraisingApi for StubClient {
        async fn list_projects(
            &self,
            _page: PageQuery,
            _filter: &ProjectFilter,
        ) -> Result<Paginated<Project>, ApiError> {
            unimplemented!()
        }
        async fn get_project(&self, _id: i64) -> Result<Project, ApiError> {
            unimplemented!()
        }
        async fn create_project(&self, _project: &NewProject) -> Result<Project, ApiError> {
            unimplemented!()
        }
        async fn update_project(
            &self,
            _id: i64,
            _update: &ProjectUpdate,
        ) -> Result<Project, ApiError> {
            unimplemented!()
        }
        async fn delete_project(&self, _id: i64) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn list_project_beneficiaries(
            &self,
            _project_id: i64,
        ) -> Result<Vec<ProjectBeneficiary>, ApiError> {
            unimplemented!()
        }
        async fn list_project_campaigns(&self, _project_id: i64) -> Result<Vec<Campaign>, ApiError> {
            unimplemented!()
        }
        async fn list_causes(&self) -> Result<Vec<Cause>, ApiError> {
            unimplemented!()
        }
        async fn get_cause(&self, _id: i64) -> Result<Cause, ApiError> {
            unimplemented!()
        }
        async fn create_cause(&self, _cause: &NewCause) -> Result<Cause, ApiError> {
            unimplemented!()
        }
        async fn update_cause(&self, _id: i64, _cause: &NewCause) -> Result<Cause, ApiError> {
            unimplemented!()
        }
        async fn delete_cause(&self, _id: i64) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn current_user(&self) -> Result<UserProfile, ApiError> {
            unimplemented!()
        }
    }

    // ── stub factory ─────────────────────────────────────────────────────
    /// Flips `called` on `create` so tests can prove dispatch happened.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ClientFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(&self, _config: &ApiConfig) -> Result<Box<dyn FundraisingApi>, ApiError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubClient))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl ClientFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(&self, _config: &ApiConfig) -> Result<Box<dyn FundraisingApi>, ApiError> {
            Err(ApiError::Transport("intentional failure".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn ClientFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config_for(backend: &str) -> ApiConfig {
        ApiConfig {
            backend: backend.to_string(),
            ..ApiConfig::default()
        }
    }

    // ── ApiConfig ────────────────────────────────────────────────────────
    #[test]
    fn default_config_targets_local_http_api() {
        let cfg = ApiConfig::default();
        assert_eq!(cfg.backend, "http");
        assert_eq!(cfg.base_url, "http://localhost:8000/api");
        assert_eq!(cfg.token, None);
        assert_eq!(cfg.timeout_ms, 30_000);
    }

    // ── registration ─────────────────────────────────────────────────────
    #[test]
    fn new_registry_has_no_backends() {
        assert!(ClientRegistry::new().available_backends().is_empty());
        assert!(ClientRegistry::default().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = ClientRegistry::new();
        let (f1, _) = stub_factory("memory");
        let (f2, _) = stub_factory("http");
        reg.register(f1);
        reg.register(f2);
        assert_eq!(reg.available_backends(), vec!["http", "memory"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = ClientRegistry::new();
        let (old, _) = stub_factory("http");
        let (new, _) = stub_factory("http");
        reg.register(old);
        reg.register(new);
        assert_eq!(reg.available_backends(), vec!["http"]);
    }

    // ── dispatch ─────────────────────────────────────────────────────────
    #[tokio::test]
    async fn create_calls_only_the_matching_factory() {
        let mut reg = ClientRegistry::new();
        let (http, http_called) = stub_factory("http");
        let (memory, memory_called) = stub_factory("memory");
        reg.register(http);
        reg.register(memory);

        let result = reg.create(&config_for("memory")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert!(memory_called.load(Ordering::SeqCst));
        assert!(!http_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available() {
        let mut reg = ClientRegistry::new();
        let (f, _) = stub_factory("http");
        reg.register(f);

        match reg.create(&config_for("grpc")).await {
            Err(ApiError::Configuration(msg)) => {
                assert!(msg.contains("grpc"), "error should name the requested backend");
                assert!(msg.contains("http"), "error should list available backends");
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a client"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = ClientRegistry::new();
        reg.register(Box::new(FailingFactory));

        assert_eq!(
            reg.create(&config_for("failing")).await.err(),
            Some(ApiError::Transport("intentional failure".to_string()))
        );
    }
}
