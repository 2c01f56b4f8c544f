use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entity::{DeleteMode, Entity};
use crate::utils::contains_ignore_case;

use super::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    #[default]
    Sale,
    Rental,
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductKind::Sale => write!(f, "Sale"),
            ProductKind::Rental => write!(f, "Rental"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_stock")]
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub kind: ProductKind,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Stock arrives as a signed number on the wire; anything below zero is
/// stored as zero.
fn deserialize_stock<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, i64::from(u32::MAX)) as u32)
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        category: impl Into<String>,
        stock: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            price,
            category: category.into(),
            stock,
            image_url: None,
            active: true,
            kind: ProductKind::Sale,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_kind(mut self, kind: ProductKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    /// Case-insensitive substring match on name and description.
    pub fn matches(&self, query: &str) -> bool {
        contains_ignore_case(&self.name, query) || contains_ignore_case(&self.description, query)
    }

    /// Apply a relative stock change, saturating at zero.
    pub fn adjust_stock(&mut self, delta: i64) {
        let next = i64::from(self.stock).saturating_add(delta);
        self.stock = next.clamp(0, i64::from(u32::MAX)) as u32;
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";

    // Products keep their history; deleting only hides them.
    const DELETE_MODE: DeleteMode = DeleteMode::Soft;

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

    fn is_visible(&self) -> bool {
        self.active
    }

    fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_stock_on_the_wire_is_clamped() {
        let json = r#"{"id":"7","name":"Mouse","price":2500,"stock":-4}"#;
        let product: Product = serde_json::from_str(json).expect("product should parse");
        assert_eq!(product.stock, 0);
        assert!(product.active);
        assert_eq!(product.kind, ProductKind::Sale);
        assert_eq!(product.image_url, None);
    }

    #[test]
    fn test_uses_camel_case_field_names() {
        let product = Product::new("1", "Laptop", "Gaming", Money::from_units(10), "Tech", 1)
            .with_image_url("https://img.example/1.png");
        let value = serde_json::to_value(&product).unwrap();
        assert!(value.get("imageUrl").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert_eq!(value["kind"], "sale");
    }

    #[test]
    fn test_adjust_stock_saturates_at_zero() {
        let mut product = Product::new("1", "Laptop", "Gaming", Money::from_units(10), "Tech", 2);
        product.adjust_stock(-5);
        assert_eq!(product.stock, 0);
        product.adjust_stock(3);
        assert_eq!(product.stock, 3);
    }

    #[test]
    fn test_matches_name_or_description() {
        let product = Product::new("1", "Monitor 4K", "Ultra HD panel", Money::from_units(800), "Tech", 1);
        assert!(product.matches("monitor"));
        assert!(product.matches("ULTRA"));
        assert!(!product.matches("keyboard"));
    }
}
