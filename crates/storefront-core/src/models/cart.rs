use serde::{Deserialize, Serialize};

use super::{Money, Product, Sale, SaleItem};

/// A line in the cart. Remembers the stock that was available when the
/// product was added so quantity changes can be capped without a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub available_stock: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    pub fn remaining_stock(&self) -> u32 {
        self.available_stock.saturating_sub(self.quantity)
    }
}

/// In-memory shopping cart. Never persisted; converted into a `Sale` at checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add up to `quantity` units of `product`, never exceeding its stock.
    /// Returns how many units were actually added.
    pub fn add(&mut self, product: &Product, quantity: u32) -> u32 {
        if quantity == 0 || product.stock == 0 {
            return 0;
        }

        let stock = product.stock;
        if let Some(item) = self.items.iter_mut().find(|item| item.product_id == product.id) {
            let added = quantity.min(stock.saturating_sub(item.quantity));
            item.quantity += added;
            item.available_stock = stock;
            return added;
        }

        let added = quantity.min(stock);
        self.items.push(CartItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: added,
            available_stock: stock,
        });
        added
    }

    pub fn remove(&mut self, product_id: &str) {
        self.items.retain(|item| item.product_id != product_id);
    }

    /// Set the quantity of a line, clamped to the available stock.
    /// A resulting quantity of zero removes the line. Returns the quantity kept.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> u32 {
        let Some(item) = self.items.iter_mut().find(|item| item.product_id == product_id) else {
            return 0;
        };

        let kept = quantity.min(item.available_stock);
        if kept == 0 {
            self.remove(product_id);
        } else {
            item.quantity = kept;
        }
        kept
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Build a pending sale from the cart contents.
    pub fn to_sale(&self, id: impl Into<String>, customer_id: impl Into<String>) -> Sale {
        let items = self
            .items
            .iter()
            .map(|item| {
                SaleItem::new(
                    item.product_id.clone(),
                    item.product_name.clone(),
                    item.quantity,
                    item.unit_price,
                )
            })
            .collect();
        Sale::new(id, customer_id, items)
    }
}
