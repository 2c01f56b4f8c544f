use crate::api::RemoteSource;
use crate::cache::LocalStore;
use crate::models::{Product, ProductKind};

use super::{Fetched, Patched, ProductRepository};

impl<R, S> ProductRepository<R, S>
where
    R: RemoteSource,
    S: LocalStore,
{
    /// Case-insensitive substring search on name and description.
    pub async fn search(&self, query: &str) -> Fetched<Vec<Product>> {
        let query = query.to_string();
        self.query(move |product: &Product| product.matches(&query)).await
    }

    /// Exact category match.
    pub async fn by_category(&self, category: &str) -> Fetched<Vec<Product>> {
        let category = category.to_string();
        self.query(move |product: &Product| product.category == category).await
    }

    pub async fn by_kind(&self, kind: ProductKind) -> Fetched<Vec<Product>> {
        self.query(move |product: &Product| product.kind == kind).await
    }

    pub async fn in_stock(&self) -> Fetched<Vec<Product>> {
        self.query(|product: &Product| product.in_stock()).await
    }

    pub async fn set_stock(&self, id: &str, stock: u32) -> Patched<Product> {
        self.patch(id, move |product: &mut Product| product.stock = stock).await
    }

    /// Relative stock change, never going below zero.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> Patched<Product> {
        self.patch(id, move |product: &mut Product| product.adjust_stock(delta)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::api::MemoryApi;
    use crate::cache::MemoryStore;
    use crate::models::Money;
    use crate::repository::{RemoteWrite, Source};

    use super::*;

    fn catalog() -> Vec<Product> {
        vec![
            Product::new("1", "Laptop Gaming", "Laptop de alta gama", Money::from_units(1500), "Tecnología", 5),
            Product::new("2", "Monitor Gaming 4K", "Monitor para gaming", Money::from_units(800), "Tecnología", 1),
            Product::new("3", "Silla", "Silla de oficina", Money::from_units(120), "Muebles", 0)
                .with_kind(ProductKind::Rental),
        ]
    }

    fn repository(api: MemoryApi) -> ProductRepository<MemoryApi, MemoryStore> {
        ProductRepository::new(Arc::new(api), Arc::new(MemoryStore::new()), Vec::new())
    }

    #[tokio::test]
    async fn test_search_matches_name_and_description() {
        let repo = repository(MemoryApi::new().with_collection(catalog()));

        let result = repo.search("GAMING").await;
        assert_eq!(result.source, Source::Remote);
        assert_eq!(result.data.len(), 2);

        let result = repo.search("oficina").await;
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].id, "3");
    }

    #[tokio::test]
    async fn test_filters() {
        let repo = repository(MemoryApi::new().with_collection(catalog()));

        assert_eq!(repo.by_category("Tecnología").await.data.len(), 2);
        // Category match is exact
        assert!(repo.by_category("tecnología").await.data.is_empty());
        assert_eq!(repo.by_kind(ProductKind::Rental).await.data.len(), 1);
        assert_eq!(repo.in_stock().await.data.len(), 2);
    }

    #[tokio::test]
    async fn test_filters_fall_back_to_local_snapshot() {
        let repo = repository(MemoryApi::new().with_collection(catalog()));
        repo.all().await;
        repo.remote().set_available(false);

        let result = repo.by_category("Muebles").await;
        assert_eq!(result.source, Source::Local);
        assert_eq!(result.data.len(), 1);
    }

    #[tokio::test]
    async fn test_adjust_stock_saturates_at_zero() {
        let repo = repository(MemoryApi::new().with_collection(catalog()));
        repo.all().await;

        let patched = repo.adjust_stock("2", -5).await;
        assert_eq!(patched.entity.as_ref().map(|p| p.stock), Some(0));
        assert_eq!(patched.outcome.remote, RemoteWrite::Accepted);
        assert_eq!(repo.remote().contents::<Product>()[1].stock, 0);

        let patched = repo.set_stock("2", 7).await;
        assert_eq!(patched.entity.map(|p| p.stock), Some(7));
    }
}
