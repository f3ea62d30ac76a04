//! Demo catalog for running without a database.

use common::Money;
use store::InMemoryStore;

const DEMO_BUYERS: &[(&str, &str)] = &[
    ("Santiago Henao", "santiago@example.com"),
    ("María Elena Ruiz", "maria@example.com"),
    ("Carlos Alberto Díaz", "carlos@example.com"),
];

/// (name, price in cents, stock)
const DEMO_PRODUCTS: &[(&str, i64, u32)] = &[
    ("Laptop Dell Inspiron 15", 250_000_000, 15),
    ("Smartphone Samsung Galaxy A54", 180_000_000, 25),
    ("Executive Office Desk", 85_000_000, 8),
    ("Ergonomic Chair", 45_000_000, 20),
    ("LG UltraWide 29 Monitor", 120_000_000, 12),
    ("Logitech Mechanical Keyboard", 35_000_000, 30),
    ("Microsoft Wireless Mouse", 18_000_000, 40),
    ("HP LaserJet Pro Printer", 65_000_000, 6),
];

/// Fills an in-memory store with a few buyers and products.
pub async fn seed_demo_catalog(store: &InMemoryStore) {
    for (name, email) in DEMO_BUYERS {
        let buyer = store.insert_buyer(*name, *email, true).await;
        tracing::debug!(buyer_id = %buyer.id, %name, "seeded buyer");
    }

    for (name, cents, stock) in DEMO_PRODUCTS {
        let product = store
            .insert_product(*name, Money::from_cents(*cents), *stock)
            .await;
        tracing::debug!(product_id = %product.id, %name, stock, "seeded product");
    }

    tracing::info!(
        buyers = DEMO_BUYERS.len(),
        products = DEMO_PRODUCTS.len(),
        "Seeded demo catalog"
    );
}
