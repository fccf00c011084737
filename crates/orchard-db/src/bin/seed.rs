//! Seeds a local database with demo data: two users, a small catalog with
//! and without variants, and a couple of coupons.
//!
//! ```text
//! DATABASE_PATH=./orchard.db cargo run -p orchard-db --bin seed
//! ```

use chrono::Utc;
use tracing::info;

use orchard_core::{validation, Coupon, CouponType, Money, Product, User, Variant};
use orchard_db::repository::generate_id;
use orchard_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./orchard.db".to_string());
    let db = Database::new(DbConfig::new(&path)).await?;
    let now = Utc::now();

    let users = db.users();
    let customer_id = generate_id();
    users
        .insert(&User {
            id: customer_id.clone(),
            email: "customer@example.com".to_string(),
            role: "user".to_string(),
            points: 200,
            created_at: now,
            updated_at: now,
        })
        .await?;
    users
        .insert(&User {
            id: generate_id(),
            email: "admin@example.com".to_string(),
            role: "admin".to_string(),
            points: 0,
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!("Seeded users (customer id {customer_id})");

    let products = db.products();

    let sneaker_id = generate_id();
    products
        .insert(&Product {
            id: sneaker_id.clone(),
            name: "Runner Sneaker".to_string(),
            description: Some("Lightweight everyday runner".to_string()),
            category_id: None,
            price_units: None,
            min_price_units: None,
            stock: 0,
            image_url: Some("https://img.example/sneaker.jpg".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;
    for (name, price, stock) in [
        ("Red / 41", 100_000, 5),
        ("Red / 42", 100_000, 8),
        ("Black / 42", 110_000, 3),
    ] {
        products
            .insert_variant(&Variant {
                id: generate_id(),
                product_id: sneaker_id.clone(),
                name: name.to_string(),
                price_units: Money::from_units(price),
                stock,
                discount_percentage: 0,
            })
            .await?;
    }

    products
        .insert(&Product {
            id: generate_id(),
            name: "Canvas Tote".to_string(),
            description: None,
            category_id: None,
            price_units: Some(Money::from_units(50_000)),
            min_price_units: None,
            stock: 40,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(active = products.count().await?, "Seeded catalog");

    let coupons = db.coupons();
    for (code, value, kind, max_uses) in [
        ("SALE1", 10, CouponType::Percentage, 10),
        ("FLAT5", 50_000, CouponType::Fixed, 3),
    ] {
        validation::validate_coupon_code(code)?;
        validation::validate_coupon_max_uses(max_uses)?;
        coupons
            .insert(&Coupon {
                id: generate_id(),
                code: code.to_string(),
                value,
                kind,
                max_uses,
                current_uses: 0,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    info!("Seeded coupons");

    db.close().await;
    Ok(())
}
