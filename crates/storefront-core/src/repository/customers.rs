use crate::api::RemoteSource;
use crate::cache::LocalStore;
use crate::models::Customer;

use super::{CustomerRepository, Fetched};

impl<R, S> CustomerRepository<R, S>
where
    R: RemoteSource,
    S: LocalStore,
{
    /// Case-insensitive substring search on name, email and phone.
    pub async fn search(&self, query: &str) -> Fetched<Vec<Customer>> {
        let query = query.to_string();
        self.query(move |customer: &Customer| customer.matches(&query)).await
    }

    /// First customer registered with `email`, compared case-insensitively.
    pub async fn by_email(&self, email: &str) -> Fetched<Option<Customer>> {
        let email = email.to_string();
        self.query(move |customer: &Customer| customer.has_email(&email))
            .await
            .map(|customers| customers.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::api::Offline;
    use crate::cache::MemoryStore;
    use crate::repository::Source;
    use crate::seed;

    use super::*;

    fn offline() -> CustomerRepository<Offline, MemoryStore> {
        CustomerRepository::new(Arc::new(Offline), Arc::new(MemoryStore::new()), seed::customers())
    }

    #[tokio::test]
    async fn test_search_seed_by_phone_and_email() {
        let repo = offline();

        let result = repo.search("987654321").await;
        assert_eq!(result.source, Source::Seed);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].name, "María García");

        assert_eq!(repo.search("@email.com").await.data.len(), 2);
    }

    #[tokio::test]
    async fn test_by_email() {
        let repo = offline();
        let found = repo.by_email("JUAN.PEREZ@email.com").await;
        assert_eq!(found.data.map(|c| c.id), Some("1".to_string()));
        assert!(repo.by_email("nobody@email.com").await.data.is_none());
    }
}
