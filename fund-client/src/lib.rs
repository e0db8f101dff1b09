pub mod factory;
pub mod http;
pub mod memory;

use fund_core::ClientRegistry;

pub use factory::{HttpClientFactory, MemoryClientFactory};
pub use http::HttpClient;
pub use memory::MemoryClient;

/// A registry with every backend this crate provides.
pub fn default_registry() -> ClientRegistry {
    let mut registry = ClientRegistry::new();
    registry.register(Box::new(HttpClientFactory));
    registry.register(Box::new(MemoryClientFactory));
    registry
}
