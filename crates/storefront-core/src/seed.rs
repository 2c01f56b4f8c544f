//! Built-in catalog served when neither the remote nor the local store has data.

use chrono::{DateTime, Utc};

use crate::models::{Customer, Money, Product, Sale};

/// 2024-01-01T00:00:00Z, so seed records compare equal across runs.
const SEED_TIMESTAMP: i64 = 1_704_067_200;

fn seeded_at() -> DateTime<Utc> {
    DateTime::from_timestamp(SEED_TIMESTAMP, 0).unwrap_or_default()
}

pub fn products() -> Vec<Product> {
    let at = seeded_at();
    vec![
        Product::new(
            "1",
            "Laptop Gaming",
            "Laptop para gaming de alta gama",
            Money::from_units(1500),
            "Tecnología",
            5,
        )
        .with_created_at(at),
        Product::new(
            "2",
            "Monitor Gaming 4K",
            "Monitor ultra HD de 32 pulgadas para gaming profesional",
            Money::from_units(800),
            "Tecnología",
            1,
        )
        .with_created_at(at),
        Product::new(
            "3",
            "Smartphone",
            "Teléfono inteligente de última generación",
            Money::from_units(600),
            "Tecnología",
            10,
        )
        .with_created_at(at),
    ]
}

pub fn customers() -> Vec<Customer> {
    let at = seeded_at();
    vec![
        Customer::new("1", "Juan Pérez", "juan.perez@email.com")
            .with_phone("123456789")
            .with_address("Calle Principal 123")
            .with_created_at(at),
        Customer::new("2", "María García", "maria.garcia@email.com")
            .with_phone("987654321")
            .with_address("Avenida Central 456")
            .with_created_at(at),
    ]
}

/// No sales ship with the application.
pub fn sales() -> Vec<Sale> {
    Vec::new()
}
