//! Web service module for variant annotation.
//!
//! A small REST API over [`crate::annotate::AnnotationService`]: annotate a
//! single variant by path or by JSON body, inspect cache statistics, and a
//! health endpoint. Concurrent requests for the same variant share one
//! upstream call through the single-flight cache.

pub mod config;
pub mod handlers;
pub mod server;
pub mod types;

pub use config::{ServerConfig, ServiceConfig};
pub use server::{create_app, AppState};
pub use types::{AnnotateRequest, CacheStatsResponse, ErrorResponse, HealthResponse};
