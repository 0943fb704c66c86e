//! Sample data for local development.

use abc_retailers_admin::storage::StorageServices;
use abc_retailers_core::{Customer, Email, Price, Product};

use super::CommandError;

const CUSTOMERS: &[(&str, &str, &str, &str, &str)] = &[
    ("Thabo", "Mokoena", "thabom", "thabo@example.com", "12 Long St, Cape Town"),
    ("Naledi", "Khumalo", "naledik", "naledi@example.com", "3 Jacaranda St, Pretoria"),
    ("Pieter", "van Wyk", "pieterv", "pieter@example.com", "88 Oxford Rd, Johannesburg"),
];

const PRODUCTS: &[(&str, &str, &str, u32)] = &[
    ("Coffee Beans 1kg", "Medium roast, whole bean", "9.99", 10),
    ("Rooibos Tea", "Loose leaf, 250g", "45.50", 40),
    ("Ceramic Mug", "350ml, dishwasher safe", "89.00", 25),
];

/// Insert sample customers and products. Returns how many records were
/// written.
///
/// Every run inserts new records with fresh IDs.
///
/// # Errors
///
/// Returns the first storage failure.
pub async fn run(storage: &StorageServices) -> Result<usize, CommandError> {
    storage.ensure_provisioned().await?;
    let entities = storage.entities();

    for &(name, surname, username, email, address) in CUSTOMERS {
        let Ok(email) = Email::parse(email) else {
            tracing::warn!("Skipping customer with invalid email: {email}");
            continue;
        };
        let customer = Customer::new(
            name.to_owned(),
            surname.to_owned(),
            username.to_owned(),
            email,
            address.to_owned(),
        );
        entities.insert(customer).await?;
    }

    for &(name, description, price, stock) in PRODUCTS {
        let Ok(price) = Price::parse_lenient(price) else {
            tracing::warn!("Skipping product with invalid price: {name}");
            continue;
        };
        let product = Product::new(name.to_owned(), description.to_owned(), price, stock);
        entities.insert(product).await?;
    }

    let written = CUSTOMERS.len() + PRODUCTS.len();
    tracing::info!("Seeded {written} records");
    Ok(written)
}
