#![allow(dead_code)]

use giftshop_bot::AppState;
use giftshop_bot::config::ShopConfig;
use giftshop_bot::models::payment::UserDisplay;
use sqlx::PgPool;
use std::collections::HashSet;
use std::env;
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};

fn split_db_url(url: &str) -> Result<(String, String), String> {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base.to_string(), Some(query)),
        None => (url.to_string(), None),
    };

    let db_start = base
        .rfind('/')
        .ok_or_else(|| "invalid database url".to_string())?;
    if db_start + 1 >= base.len() {
        return Err("database name is empty".to_string());
    }

    let db_name = base[db_start + 1..].to_string();
    let mut admin_url = format!("{}postgres", &base[..db_start + 1]);
    if let Some(query) = query {
        admin_url = format!("{admin_url}?{query}");
    }

    Ok((admin_url, db_name))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Recreates the scratch database named by `TEST_DATABASE_URL`.
pub async fn init_test_db() -> TestDb {
    dotenvy::dotenv().ok();
    let test_url = env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let (admin_url, db_name) =
        split_db_url(&test_url).expect("invalid TEST_DATABASE_URL format");

    let lock = TEST_DB_LOCK.get_or_init(|| Mutex::new(()));
    let guard = lock.lock().await;

    let admin_pool = PgPool::connect(&admin_url)
        .await
        .expect("connect admin db");

    let quoted_name = quote_identifier(&db_name);
    let drop_sql = format!("DROP DATABASE IF EXISTS {quoted_name} WITH (FORCE)");
    let create_sql = format!("CREATE DATABASE {quoted_name}");

    let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
    sqlx::query(&create_sql)
        .execute(&admin_pool)
        .await
        .expect("create test db");
    admin_pool.close().await;

    let pool = PgPool::connect(&test_url).await.expect("connect test db");
    giftshop_db::db::migrate(&pool).await.expect("migrations");
    TestDb {
        pool,
        _guard: guard,
    }
}

pub fn test_config() -> ShopConfig {
    ShopConfig {
        provider_token: Some("TEST:PROVIDER".to_string()),
        provider_currency: "RUB".to_string(),
        admin_ids: HashSet::from([1]),
        fulfillment_max_retries: 5,
        order_history_limit: 10,
    }
}

pub fn build_state(pool: PgPool) -> AppState {
    AppState::new(pool, test_config())
}

pub fn display(name: &str) -> UserDisplay {
    UserDisplay {
        first_name: Some(name.to_string()),
        username: Some(name.to_lowercase()),
    }
}

pub fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}
