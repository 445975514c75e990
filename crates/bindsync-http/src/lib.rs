//! HTTP plumbing for bindsync
//!
//! A thin JSON client over reqwest that every remote call goes through.
//!
//! ## Features
//!
//! - **Trait-based design**: mockable via `HttpClientTrait`
//! - **Retry**: 429, 5xx and transport failures are retried with linear backoff
//! - **Pacing**: every request, successful or not, is followed by a fixed delay
//! - **Testing support**: exercised against wiremock servers

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;

pub use client::{HttpClient, HttpClientTrait};
pub use config::HttpConfig;
pub use error::{HttpError, Result};
pub use middleware::{Pacer, RetryConfig, RetryMiddleware};

/// Re-export commonly used types
pub use reqwest::{header, Method, StatusCode};
