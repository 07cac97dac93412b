//! # Product Repository
//!
//! Database operations for the catalog. Products belong to a pricing
//! tier; a seat sees its own tier's products plus the general tier.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreResult;
use crate::repository::new_id;
use cabina_core::{Product, GENERAL_TIER};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    pub async fn insert(&self, name: &str, price_cents: i64, group_id: i64) -> StoreResult<Product> {
        let product = Product {
            id: new_id(),
            name: name.to_string(),
            price_cents,
            group_id,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, group_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.group_id)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, group_id
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists the products offered on a seat of the given tier: the tier's
    /// own products plus the general tier.
    pub async fn list_for_tier(&self, group_id: i64) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, group_id
            FROM products
            WHERE group_id = ?1 OR group_id = ?2
            ORDER BY name
            "#,
        )
        .bind(group_id)
        .bind(GENERAL_TIER)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts products (seed guard).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;

    #[tokio::test]
    async fn test_tier_listing_includes_general_tier() {
        let db = Database::in_memory().await.unwrap();
        db.seats().insert_group(2, "Gamer").await.unwrap();
        let repo = db.products();

        repo.insert("Inca Kola 500ml", 250, 1).await.unwrap();
        repo.insert("Hora gamer", 500, 2).await.unwrap();

        // A general-tier seat only sees the general catalog.
        let general = repo.list_for_tier(1).await.unwrap();
        assert_eq!(general.len(), 1);

        // A gamer-tier seat sees both.
        let gamer = repo.list_for_tier(2).await.unwrap();
        assert_eq!(gamer.len(), 2);
    }
}
