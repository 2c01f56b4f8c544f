//! Data models for storefront entities.
//!
//! - `Product`: catalog entries with stock, soft-deleted via `active`
//! - `Customer`: registered customers with contact info
//! - `Sale`, `SaleItem`: recorded sales with exact line and sale totals
//! - `Cart`: in-memory shopping cart that turns into a `Sale`
//! - `Money`: integer minor-unit amounts

pub mod cart;
pub mod customer;
pub mod money;
pub mod product;
pub mod sale;

pub use cart::{Cart, CartItem};
pub use customer::Customer;
pub use money::Money;
pub use product::{Product, ProductKind};
pub use sale::{Sale, SaleItem, SaleStatus};
