//! Product Repository
//!
//! Stock mutations are single-statement atomic updates so two
//! concurrent order transitions touching the same product cannot lose
//! each other's adjustment.

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use shared::util::now_millis;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Product, ProductCreate, ProductUpdate};

pub const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active products, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_active = true ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self.base.db().select(id.clone()).await?;
        Ok(product)
    }

    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        if data.title.trim().is_empty() {
            return Err(RepoError::Validation("title must not be empty".into()));
        }
        if data.price.is_sign_negative() {
            return Err(RepoError::Validation("price cannot be negative".into()));
        }
        if data.stock.is_some_and(|s| s < 0) {
            return Err(RepoError::Validation("stock cannot be negative".into()));
        }

        let product = Product {
            id: None,
            title: data.title,
            description: data.description.unwrap_or_default(),
            image: data.image.unwrap_or_default(),
            price: data.price,
            stock: data.stock.unwrap_or(0),
            is_active: true,
            created_at: now_millis(),
        };

        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;

        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    pub async fn update(&self, id: &RecordId, data: ProductUpdate) -> RepoResult<Product> {
        let mut product = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?;

        if let Some(title) = data.title {
            product.title = title;
        }
        if let Some(description) = data.description {
            product.description = description;
        }
        if let Some(image) = data.image {
            product.image = image;
        }
        if let Some(price) = data.price {
            if price.is_sign_negative() {
                return Err(RepoError::Validation("price cannot be negative".into()));
            }
            product.price = price;
        }
        if let Some(stock) = data.stock {
            if stock < 0 {
                return Err(RepoError::Validation("stock cannot be negative".into()));
            }
            product.stock = stock;
        }
        if let Some(is_active) = data.is_active {
            product.is_active = is_active;
        }

        let updated: Option<Product> = self
            .base
            .db()
            .update(id.clone())
            .content(product)
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    /// Hard delete a product
    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        let deleted: Option<Product> = self.base.db().delete(id.clone()).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Product {id} not found")));
        }
        Ok(())
    }

    /// Atomically decrement stock, clamping at zero.
    ///
    /// Returns `None` when the product does not exist.
    pub async fn decrement_stock(&self, id: &RecordId, qty: i64) -> RepoResult<Option<Product>> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $product SET stock = math::max(stock - $qty, 0) RETURN AFTER")
            .bind(("product", id.clone()))
            .bind(("qty", qty))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// Atomically increment stock (no clamp).
    ///
    /// Returns `None` when the product does not exist.
    pub async fn increment_stock(&self, id: &RecordId, qty: i64) -> RepoResult<Option<Product>> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $product SET stock = stock + $qty RETURN AFTER")
            .bind(("product", id.clone()))
            .bind(("qty", qty))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use rust_decimal::Decimal;

    async fn repo() -> ProductRepository {
        let service = DbService::memory().await.unwrap();
        ProductRepository::new(service.db)
    }

    async fn seed(repo: &ProductRepository, stock: i64) -> Product {
        repo.create(ProductCreate {
            title: "Linen Shirt".into(),
            description: None,
            image: None,
            price: Decimal::new(4995, 2),
            stock: Some(stock),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn decrement_clamps_at_zero() {
        let repo = repo().await;
        let product = seed(&repo, 5).await;
        let id = product.id.unwrap();

        let after = repo.decrement_stock(&id, 3).await.unwrap().unwrap();
        assert_eq!(after.stock, 2);

        let after = repo.decrement_stock(&id, 10).await.unwrap().unwrap();
        assert_eq!(after.stock, 0);
    }

    #[tokio::test]
    async fn increment_restores_exactly() {
        let repo = repo().await;
        let product = seed(&repo, 2).await;
        let id = product.id.unwrap();

        let after = repo.increment_stock(&id, 3).await.unwrap().unwrap();
        assert_eq!(after.stock, 5);
    }

    #[tokio::test]
    async fn stock_ops_report_missing_products() {
        let repo = repo().await;
        let ghost = RecordId::from_table_key(PRODUCT_TABLE, "missing");
        assert!(repo.decrement_stock(&ghost, 1).await.unwrap().is_none());
        assert!(repo.increment_stock(&ghost, 1).await.unwrap().is_none());
    }
}
