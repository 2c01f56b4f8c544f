//! Core library for storefront.
//!
//! Products, customers and sales are read and written through repositories
//! that combine a remote REST API with a local snapshot:
//!
//! - `api`: remote sources (`ApiClient`, `MemoryApi`, `Offline`)
//! - `cache`: local stores (`MemoryStore`, `JsonFileStore`, `SqliteStore`)
//! - `repository`: the reconciliation policy and per-entity helpers
//! - `storefront`: the three repositories wired together, plus checkout
//! - `seed`: built-in data served when nothing else is available

pub mod api;
pub mod cache;
pub mod config;
pub mod entity;
pub mod models;
pub mod repository;
pub mod seed;
pub mod storefront;
pub mod utils;

pub use api::{ApiClient, ApiError, MemoryApi, Offline, RemoteBackend, RemoteSource};
pub use cache::{JsonFileStore, LocalBackend, LocalStore, MemoryStore, SqliteStore};
pub use config::{Config, StorageKind};
pub use entity::{DeleteMode, Entity};
pub use models::{Cart, CartItem, Customer, Money, Product, ProductKind, Sale, SaleItem, SaleStatus};
pub use repository::{
    CustomerRepository, Fetched, LocalWrite, Patched, ProductRepository, RemoteWrite, Repository,
    SaleRepository, Source, WriteOutcome,
};
pub use storefront::{CollectionSync, Receipt, Storefront, SyncReport};
