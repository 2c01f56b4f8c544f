//! Remote data sources for the storefront backend.
//!
//! The backend exposes the same five calls for every collection:
//! `GET /E`, `GET /E/{id}`, `POST /E`, `PUT /E/{id}` and `DELETE /E/{id}`,
//! with camelCase JSON bodies. `RemoteSource` is that surface; each call is a
//! single attempt with no retry and no caching.

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;

use async_trait::async_trait;

use crate::entity::Entity;

pub use backend::{Offline, RemoteBackend};
pub use client::ApiClient;
pub use error::ApiError;
pub use memory::MemoryApi;

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// `GET /E`
    async fn list<E: Entity>(&self) -> Result<Vec<E>, ApiError>;

    /// `GET /E/{id}`. A 404 is a successful answer of `None`.
    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, ApiError>;

    /// `POST /E`
    async fn create<E: Entity>(&self, entity: &E) -> Result<(), ApiError>;

    /// `PUT /E/{id}`
    async fn replace<E: Entity>(&self, entity: &E) -> Result<(), ApiError>;

    /// `DELETE /E/{id}`
    async fn delete<E: Entity>(&self, id: &str) -> Result<(), ApiError>;
}
