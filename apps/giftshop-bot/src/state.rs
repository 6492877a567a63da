use sqlx::PgPool;
use std::sync::Arc;

use crate::config::ShopConfig;
use crate::services::admin_service::AdminService;
use crate::services::order_service::OrderService;
use crate::services::store_service::StoreService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ShopConfig>,
    pub store_service: StoreService,
    pub order_service: OrderService,
    pub admin_service: AdminService,
}

impl AppState {
    pub fn new(pool: PgPool, config: ShopConfig) -> Self {
        let store_service = StoreService::new(pool.clone());
        let order_service = OrderService::new(pool, store_service.clone(), &config);
        let admin_service =
            AdminService::new(config.admin_ids.clone(), config.provider_currency.clone());
        Self {
            config: Arc::new(config),
            store_service,
            order_service,
            admin_service,
        }
    }
}
