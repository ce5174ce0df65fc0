// Remote API access: wire models and the HTTP client

pub mod client;
pub mod models;

pub use client::ApiClient;
