pub mod gift_code_repo;
pub mod order_repo;
pub mod product_repo;
pub mod user_repo;
