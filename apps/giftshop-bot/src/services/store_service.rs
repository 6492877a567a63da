use giftshop_db::models::store::{Product, User};
use giftshop_db::repositories::gift_code_repo::GiftCodeRepository;
use giftshop_db::repositories::product_repo::ProductRepository;
use giftshop_db::repositories::user_repo::UserRepository;
use sqlx::PgPool;
use tracing::info;

use crate::error::{ShopError, ShopResult};
use crate::models::payment::UserDisplay;

/// Product with its remaining stock, for the admin overview.
#[derive(Debug, Clone)]
pub struct ProductStock {
    pub product: Product,
    pub unused_codes: i64,
}

#[derive(Debug, Clone)]
pub struct StoreService {
    product_repo: ProductRepository,
    code_repo: GiftCodeRepository,
    user_repo: UserRepository,
}

impl StoreService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            product_repo: ProductRepository::new(pool.clone()),
            code_repo: GiftCodeRepository::new(pool.clone()),
            user_repo: UserRepository::new(pool),
        }
    }

    pub async fn create_product(
        &self,
        title: &str,
        description: &str,
        price_provider: i64,
        currency_provider: &str,
        price_points: i64,
        image_url: &str,
    ) -> ShopResult<i64> {
        let id = self
            .product_repo
            .create(
                title,
                description,
                price_provider,
                currency_provider,
                price_points,
                image_url,
            )
            .await?;
        info!("Created product {} ({})", id, title);
        Ok(id)
    }

    pub async fn list_products(&self, active_only: bool) -> ShopResult<Vec<Product>> {
        Ok(self.product_repo.list(active_only).await?)
    }

    /// Buyer lookup; a deactivated product is reported as missing.
    pub async fn get_product(&self, id: i64) -> ShopResult<Product> {
        self.product_repo
            .get_active(id)
            .await?
            .ok_or(ShopError::ProductNotFound(id))
    }

    pub async fn get_product_admin(&self, id: i64) -> ShopResult<Product> {
        self.product_repo
            .get_by_id(id)
            .await?
            .ok_or(ShopError::ProductNotFound(id))
    }

    pub async fn add_codes(&self, product_id: i64, codes: &[String]) -> ShopResult<u64> {
        self.get_product_admin(product_id).await?;
        let inserted = self.code_repo.add_codes(product_id, codes).await?;
        info!("Added {} codes to product {}", inserted, product_id);
        Ok(inserted)
    }

    pub async fn stock_count(&self, product_id: i64) -> ShopResult<i64> {
        Ok(self.code_repo.count_unused(product_id).await?)
    }

    pub async fn products_with_stock(&self) -> ShopResult<Vec<ProductStock>> {
        let products = self.product_repo.list(false).await?;
        let mut overview = Vec::with_capacity(products.len());
        for product in products {
            let unused_codes = self.code_repo.count_unused(product.id).await?;
            overview.push(ProductStock {
                product,
                unused_codes,
            });
        }
        Ok(overview)
    }

    pub async fn set_product_active(&self, id: i64, is_active: bool) -> ShopResult<()> {
        if !self.product_repo.set_active(id, is_active).await? {
            return Err(ShopError::ProductNotFound(id));
        }
        info!("Product {} active={}", id, is_active);
        Ok(())
    }

    /// Existing orders keep the amount they were created with.
    pub async fn update_product_prices(
        &self,
        id: i64,
        price_provider: i64,
        price_points: i64,
    ) -> ShopResult<()> {
        if !self
            .product_repo
            .update_prices(id, price_provider, price_points)
            .await?
        {
            return Err(ShopError::ProductNotFound(id));
        }
        Ok(())
    }

    pub async fn upsert_user(&self, tg_id: i64, display: &UserDisplay) -> ShopResult<User> {
        Ok(self
            .user_repo
            .upsert(
                tg_id,
                display.first_name.as_deref(),
                display.username.as_deref(),
            )
            .await?)
    }
}
