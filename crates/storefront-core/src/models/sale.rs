use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

use super::Money;

/// Lifecycle of a sale, from checkout to delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Confirmed => "confirmed",
            SaleStatus::Processing => "processing",
            SaleStatus::Shipped => "shipped",
            SaleStatus::Delivered => "delivered",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SaleStatus::Pending),
            "confirmed" => Ok(SaleStatus::Confirmed),
            "processing" => Ok(SaleStatus::Processing),
            "shipped" => Ok(SaleStatus::Shipped),
            "delivered" => Ok(SaleStatus::Delivered),
            "cancelled" => Ok(SaleStatus::Cancelled),
            other => Err(format!("Unknown sale status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default)]
    pub line_total: Money,
}

impl SaleItem {
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            line_total: unit_price.times(quantity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    #[serde(default)]
    pub items: Vec<SaleItem>,
    #[serde(default)]
    pub total: Money,
    #[serde(default)]
    pub status: SaleStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    pub fn new(id: impl Into<String>, customer_id: impl Into<String>, items: Vec<SaleItem>) -> Self {
        let now = Utc::now();
        let mut sale = Self {
            id: id.into(),
            customer_id: customer_id.into(),
            items,
            total: Money::ZERO,
            status: SaleStatus::Pending,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        sale.recompute_totals();
        sale
    }

    pub fn with_status(mut self, status: SaleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Recompute every line total from price and quantity, then the sale total.
    pub fn recompute_totals(&mut self) {
        for item in &mut self.items {
            item.line_total = item.unit_price.times(item.quantity);
        }
        self.total = self.items.iter().map(|item| item.line_total).sum();
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

impl Entity for Sale {
    const COLLECTION: &'static str = "sales";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn normalize(&mut self) {
        self.recompute_totals();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_exact_sum_of_lines() {
        let sale = Sale::new(
            "s1",
            "c1",
            vec![
                SaleItem::new("1", "Laptop", 2, Money::from_cents(149_999)),
                SaleItem::new("2", "Cable", 3, Money::from_cents(333)),
            ],
        );
        assert_eq!(sale.items[0].line_total, Money::from_cents(299_998));
        assert_eq!(sale.items[1].line_total, Money::from_cents(999));
        assert_eq!(sale.total, Money::from_cents(300_997));
        assert_eq!(sale.item_count(), 5);
    }

    #[test]
    fn test_normalize_repairs_wire_totals() {
        let json = r#"{
            "id": "s2",
            "customerId": "c1",
            "items": [{"productId": "1", "quantity": 4, "unitPrice": 250, "lineTotal": 1}],
            "total": 7,
            "status": "shipped"
        }"#;
        let sale: Sale = serde_json::from_str(json).unwrap();
        let sale = sale.normalized();
        assert_eq!(sale.items[0].line_total, Money::from_cents(1000));
        assert_eq!(sale.total, Money::from_cents(1000));
        assert_eq!(sale.status, SaleStatus::Shipped);
    }

    #[test]
    fn test_status_parses_case_insensitively() {
        assert_eq!("Delivered".parse::<SaleStatus>(), Ok(SaleStatus::Delivered));
        assert!("lost".parse::<SaleStatus>().is_err());
    }
}
