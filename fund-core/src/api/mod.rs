pub mod client;
pub mod factory;

pub use client::{ApiError, FundraisingApi};
pub use factory::{ApiConfig, ClientFactory, ClientRegistry};
