//! Seed the database with default settings and a starter menu.
//!
//! Settings rows are created from their defaults on first read, so seeding
//! them is idempotent. The demo menu is only inserted into an empty catalog.

use real_taste_core::{CategoryId, Price};
use real_taste_server::db::{CategoryRepository, ProductRepository, SettingsRepository};
use real_taste_server::models::{CategoryInput, ProductInput};
use real_taste_server::services::CategoryService;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use super::connect;

/// A demo product: name, description, price in paise, stock, featured.
type DemoProduct = (&'static str, &'static str, i64, i32, bool);

const DEMO_MENU: &[(&str, &str, &[DemoProduct])] = &[
    (
        "Hot Drinks",
        "Fresh brews and chai",
        &[
            ("Masala Chai", "Spiced milk tea brewed to order", 4_000, 100, true),
            ("Filter Coffee", "South Indian decoction with frothed milk", 5_000, 100, false),
        ],
    ),
    (
        "Snacks",
        "Quick bites from the counter",
        &[
            ("Samosa", "Potato and pea filling, two pieces", 3_000, 60, true),
            ("Vada Pav", "Spiced potato fritter in a soft bun", 3_500, 50, false),
        ],
    ),
    (
        "Meals",
        "Full plates for lunch and dinner",
        &[
            ("Veg Thali", "Dal, two sabzis, rice, rotis and salad", 18_000, 25, true),
            ("Paneer Butter Masala", "With two butter naan", 22_000, 20, false),
        ],
    ),
];

/// Seed settings and, unless `settings_only`, the demo menu.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run(settings_only: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    let settings = SettingsRepository::new(&pool);
    let shop = settings.shop().await?;
    let store = settings.store().await?;
    info!(shop = %shop.shop_name, store = %store.store_name, "Settings ready");

    if settings_only {
        return Ok(());
    }

    if CategoryRepository::new(&pool).count().await? > 0 {
        info!("Catalog already has categories, skipping demo menu");
        return Ok(());
    }

    let mut products = 0;
    for (name, description, items) in DEMO_MENU {
        let category = CategoryService::new(&pool)
            .create(
                CategoryInput {
                    name: (*name).to_owned(),
                    description: (*description).to_owned(),
                    image: None,
                    parent_id: None,
                    is_active: true,
                },
                None,
            )
            .await?;
        info!(category = %category.slug, "Category created");
        products += seed_products(&pool, category.id, items).await?;
    }

    info!("Seeding complete!");
    info!("  Categories: {}", DEMO_MENU.len());
    info!("  Products: {products}");
    Ok(())
}

async fn seed_products(
    pool: &PgPool,
    category_id: CategoryId,
    items: &[DemoProduct],
) -> Result<usize, Box<dyn std::error::Error>> {
    let repo = ProductRepository::new(pool);
    for &(name, description, paise, stock, featured) in items {
        let input = ProductInput {
            name: name.to_owned(),
            description: description.to_owned(),
            price: Price::new(Decimal::new(paise, 2))?,
            category_id: Some(category_id),
            image: None,
            images: Vec::new(),
            stock,
            is_available: true,
            featured,
        }
        .validate()?;
        repo.create(&input).await?;
    }
    Ok(items.len())
}
