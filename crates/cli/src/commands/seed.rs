//! Seed command: populate a development database with sample catalog data.

use rust_decimal::Decimal;

use tamarind_server::db::{CategoryRepository, ProductRepository, RepositoryError};
use tamarind_server::models::category::CreateCategoryInput;
use tamarind_server::models::product::CreateProductInput;

use super::CommandError;

const CATEGORIES: &[&str] = &["Electronics", "Books", "Kitchen", "Outdoors"];

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: &'static str,
    stock: i32,
    category: &'static str,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Wireless Earbuds",
        description: "Compact earbuds with a pocket charging case.",
        price: "39.99",
        stock: 120,
        category: "Electronics",
    },
    SeedProduct {
        name: "Mechanical Keyboard",
        description: "Tenkeyless board with hot-swappable switches.",
        price: "89.00",
        stock: 45,
        category: "Electronics",
    },
    SeedProduct {
        name: "The Pragmatic Gardener",
        description: "A season-by-season guide to small-space gardening.",
        price: "18.50",
        stock: 200,
        category: "Books",
    },
    SeedProduct {
        name: "Cast Iron Skillet",
        description: "Pre-seasoned 10-inch skillet.",
        price: "24.00",
        stock: 80,
        category: "Kitchen",
    },
    SeedProduct {
        name: "Trail Water Bottle",
        description: "Insulated 750ml bottle with a clip lid.",
        price: "15.75",
        stock: 0,
        category: "Outdoors",
    },
];

/// Seed sample categories and products. Existing rows are left alone.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert fails
/// for a reason other than a duplicate.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let categories = CategoryRepository::new(&pool);
    for name in CATEGORIES {
        let input = CreateCategoryInput {
            name: (*name).to_owned(),
            icon: None,
        };
        match categories.create(&input).await {
            Ok(category) => tracing::info!(name, id = %category.id, "category seeded"),
            Err(RepositoryError::Conflict(_)) => {
                tracing::info!(name, "category already present, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let products = ProductRepository::new(&pool);
    for seed in PRODUCTS {
        let price: Decimal = seed
            .price
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("bad seed price: {e}")))?;

        let input = CreateProductInput {
            name: seed.name.to_owned(),
            description: seed.description.to_owned(),
            price,
            stock: seed.stock,
            category: seed.category.to_owned(),
            images: Vec::new(),
        };
        let product = products.create(&input).await?;
        tracing::info!(name = seed.name, id = %product.id, "product seeded");
    }

    tracing::info!("seeding complete");
    Ok(())
}
