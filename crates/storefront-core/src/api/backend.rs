use async_trait::async_trait;

use super::{ApiClient, ApiError, MemoryApi, RemoteSource};
use crate::entity::Entity;

/// A remote that never answers. Repositories built on it serve only local
/// and seed data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl RemoteSource for Offline {
    async fn list<E: Entity>(&self) -> Result<Vec<E>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn get<E: Entity>(&self, _id: &str) -> Result<Option<E>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn create<E: Entity>(&self, _entity: &E) -> Result<(), ApiError> {
        Err(ApiError::Offline)
    }

    async fn replace<E: Entity>(&self, _entity: &E) -> Result<(), ApiError> {
        Err(ApiError::Offline)
    }

    async fn delete<E: Entity>(&self, _id: &str) -> Result<(), ApiError> {
        Err(ApiError::Offline)
    }
}

/// Runtime-selected remote source.
pub enum RemoteBackend {
    Http(ApiClient),
    Memory(MemoryApi),
    Offline(Offline),
}

impl RemoteBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Memory(_) => "memory",
            Self::Offline(_) => "offline",
        }
    }
}

macro_rules! delegate {
    ($self:ident, $remote:ident => $call:expr) => {
        match $self {
            RemoteBackend::Http($remote) => $call.await,
            RemoteBackend::Memory($remote) => $call.await,
            RemoteBackend::Offline($remote) => $call.await,
        }
    };
}

#[async_trait]
impl RemoteSource for RemoteBackend {
    async fn list<E: Entity>(&self) -> Result<Vec<E>, ApiError> {
        delegate!(self, remote => remote.list::<E>())
    }

    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, ApiError> {
        delegate!(self, remote => remote.get::<E>(id))
    }

    async fn create<E: Entity>(&self, entity: &E) -> Result<(), ApiError> {
        delegate!(self, remote => remote.create(entity))
    }

    async fn replace<E: Entity>(&self, entity: &E) -> Result<(), ApiError> {
        delegate!(self, remote => remote.replace(entity))
    }

    async fn delete<E: Entity>(&self, id: &str) -> Result<(), ApiError> {
        delegate!(self, remote => remote.delete::<E>(id))
    }
}
