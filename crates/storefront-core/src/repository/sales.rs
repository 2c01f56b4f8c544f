use crate::api::RemoteSource;
use crate::cache::LocalStore;
use crate::models::{Sale, SaleStatus};

use super::{Fetched, Patched, SaleRepository};

impl<R, S> SaleRepository<R, S>
where
    R: RemoteSource,
    S: LocalStore,
{
    pub async fn by_customer(&self, customer_id: &str) -> Fetched<Vec<Sale>> {
        let customer_id = customer_id.to_string();
        self.query(move |sale: &Sale| sale.customer_id == customer_id).await
    }

    pub async fn by_status(&self, status: SaleStatus) -> Fetched<Vec<Sale>> {
        self.query(move |sale: &Sale| sale.status == status).await
    }

    pub async fn set_status(&self, id: &str, status: SaleStatus) -> Patched<Sale> {
        self.patch(id, move |sale: &mut Sale| sale.status = status).await
    }
}
