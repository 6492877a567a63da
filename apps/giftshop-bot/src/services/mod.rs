pub mod admin_service;
pub mod fulfillment_service;
pub mod order_service;
pub mod store_service;
