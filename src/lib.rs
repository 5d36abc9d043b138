//! Property Listings Service
//!
//! A CRUD backend for real-estate listings whose additional attributes are
//! validated at runtime against a configuration catalog.
//!
//! # Architecture Overview
//!
//! This crate is organized into four main layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   API Layer                  │
//! │   HTTP handlers, routing, error responses    │
//! ├─────────────────────────────────────────────┤
//! │               Application Layer              │
//! │  Property and configuration use cases        │
//! ├─────────────────────────────────────────────┤
//! │                 Domain Layer                 │
//! │  Types, filters, validation rules, errors    │
//! ├─────────────────────────────────────────────┤
//! │             Infrastructure Layer             │
//! │  PostgreSQL repositories, tracing, metrics   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Validation
//!
//! A property is accepted only if its `property_type` is the key of some
//! configuration and every additional feature matches a configuration of
//! the same key:
//!
//! - `select` features must carry one of the configured values
//! - `number` features must carry an integer
//! - `text` features must carry no value
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use property_listings::api::create_router;
//! use property_listings::app::AppState;
//! use property_listings::infra::PostgresClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(PostgresClient::with_defaults(&database_url).await?);
//!     let state = Arc::new(AppState::new(db.clone(), db));
//!
//!     let router = create_router(state);
//!     axum::serve(listener, router).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

// Test utilities are available in tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
