//! The three repositories wired over one remote source and one local store.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ApiClient, Offline, RemoteBackend, RemoteSource};
use crate::cache::{LocalBackend, LocalStore};
use crate::config::Config;
use crate::models::{Cart, Product, Sale};
use crate::repository::{
    CustomerRepository, Patched, ProductRepository, SaleRepository, Source, WriteOutcome,
};
use crate::seed;

pub struct Storefront<R, S> {
    pub products: ProductRepository<R, S>,
    pub customers: CustomerRepository<R, S>,
    pub sales: SaleRepository<R, S>,
}

/// Per-collection result of `Storefront::refresh_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSync {
    pub source: Source,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub products: CollectionSync,
    pub customers: CollectionSync,
    pub sales: CollectionSync,
}

impl SyncReport {
    /// Every collection came back from the remote.
    pub fn is_complete(&self) -> bool {
        [self.products, self.customers, self.sales]
            .iter()
            .all(|sync| sync.source == Source::Remote)
    }
}

/// A recorded checkout.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub sale: Sale,
    pub outcome: WriteOutcome,
    /// One stock adjustment per sale line, in line order.
    pub stock: Vec<Patched<Product>>,
}

impl<R, S> Storefront<R, S>
where
    R: RemoteSource,
    S: LocalStore,
{
    /// Build the repositories over shared sources with the built-in seed sets.
    pub fn new(remote: Arc<R>, local: Arc<S>) -> Self {
        Self {
            products: ProductRepository::new(Arc::clone(&remote), Arc::clone(&local), seed::products()),
            customers: CustomerRepository::new(Arc::clone(&remote), Arc::clone(&local), seed::customers()),
            sales: SaleRepository::new(remote, local, seed::sales()),
        }
    }

    /// Read every collection once, reconciling whatever the remote returns.
    pub async fn refresh_all(&self) -> SyncReport {
        let (products, customers, sales) =
            futures::join!(self.products.all(), self.customers.all(), self.sales.all());

        let report = SyncReport {
            products: CollectionSync {
                source: products.source,
                count: products.data.len(),
            },
            customers: CollectionSync {
                source: customers.source,
                count: customers.data.len(),
            },
            sales: CollectionSync {
                source: sales.source,
                count: sales.data.len(),
            },
        };
        info!(
            products = report.products.count,
            customers = report.customers.count,
            sales = report.sales.count,
            complete = report.is_complete(),
            "Refreshed collections"
        );
        report
    }

    /// Record the cart as a pending sale and take its quantities out of stock.
    ///
    /// Stock is only adjusted once the sale is stored locally.
    pub async fn checkout(&self, cart: &Cart, customer_id: &str) -> Result<Receipt> {
        if cart.is_empty() {
            bail!("Cannot check out an empty cart");
        }

        let sale = cart.to_sale(Uuid::new_v4().to_string(), customer_id);
        let outcome = self.sales.insert(sale.clone()).await;
        if !outcome.is_applied() {
            warn!(sale_id = %sale.id, remote = ?outcome.remote, "Sale not stored locally, stock left unchanged");
            bail!("Failed to record sale {} locally", sale.id);
        }
        debug!(sale_id = %sale.id, total = %sale.total, "Recorded sale");

        let mut stock = Vec::with_capacity(sale.items.len());
        for item in &sale.items {
            let patched = self
                .products
                .adjust_stock(&item.product_id, -i64::from(item.quantity))
                .await;
            stock.push(patched);
        }

        Ok(Receipt {
            sale,
            outcome,
            stock,
        })
    }
}

impl Storefront<RemoteBackend, LocalBackend> {
    /// Wire the backends named by `config`. Without an API URL the storefront
    /// runs offline on local and seed data.
    pub fn from_config(config: &Config) -> Result<Self> {
        let remote = match config.api_base_url {
            Some(ref url) => {
                let mut client = ApiClient::new(url, config.request_timeout())?;
                if let Some(ref token) = config.api_token {
                    client.set_token(token.clone());
                }
                RemoteBackend::Http(client)
            }
            None => RemoteBackend::Offline(Offline),
        };
        let local = LocalBackend::open(config.storage, &config.data_dir()?)?;
        debug!(remote = remote.name(), storage = ?local.kind(), "Opened storefront backends");

        Ok(Self::new(Arc::new(remote), Arc::new(local)))
    }
}
