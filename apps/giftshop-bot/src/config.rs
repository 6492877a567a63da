use clap::Parser;
use giftshop_db::db::DbConfig;
use std::collections::HashSet;
use std::net::SocketAddr;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Gift shop bot and mini app API", long_about = None)]
pub struct Args {
    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN")]
    pub bot_token: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Payment provider token; the provider rail is disabled when empty
    #[arg(long, env = "PROVIDER_TOKEN", default_value = "")]
    pub provider_token: String,

    /// Currency for new products when the admin omits one
    #[arg(long, env = "PROVIDER_CURRENCY", default_value = "RUB")]
    pub provider_currency: String,

    /// Comma-separated Telegram ids allowed to run admin commands
    #[arg(long, env = "ADMIN_IDS", default_value = "")]
    pub admin_ids: String,

    #[arg(long, env = "WEB_BIND", default_value = "0.0.0.0:8080")]
    pub web_bind: SocketAddr,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub db_max_connections: u32,

    #[arg(long, env = "FULFILLMENT_MAX_RETRIES", default_value_t = 3)]
    pub fulfillment_max_retries: u32,

    #[arg(long, env = "ORDER_HISTORY_LIMIT", default_value_t = 10)]
    pub order_history_limit: i64,
}

/// Runtime settings handed to services at construction time.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    pub provider_token: Option<String>,
    pub provider_currency: String,
    pub admin_ids: HashSet<i64>,
    pub fulfillment_max_retries: u32,
    pub order_history_limit: i64,
}

impl Args {
    pub fn shop_config(&self) -> ShopConfig {
        let provider_token = self.provider_token.trim();
        ShopConfig {
            provider_token: (!provider_token.is_empty()).then(|| provider_token.to_string()),
            provider_currency: self.provider_currency.trim().to_uppercase(),
            admin_ids: parse_admin_ids(&self.admin_ids),
            fulfillment_max_retries: self.fulfillment_max_retries.max(1),
            order_history_limit: self.order_history_limit.max(1),
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.database_url.clone(),
            max_connections: self.db_max_connections,
        }
    }
}

/// Unparseable entries are dropped with a warning rather than failing startup.
pub fn parse_admin_ids(raw: &str) -> HashSet<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!("Ignoring invalid admin id: {}", s);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec![
            "giftshop-bot",
            "--bot-token",
            "123:abc",
            "--database-url",
            "postgres://localhost/shop",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("args parse")
    }

    #[test]
    fn admin_ids_skip_garbage() {
        let ids = parse_admin_ids(" 1, 2 ,,abc, 3");
        assert_eq!(ids, HashSet::from([1, 2, 3]));
        assert!(parse_admin_ids("").is_empty());
    }

    #[test]
    fn empty_provider_token_disables_rail() {
        let cfg = args(&["--provider-token", "  "]).shop_config();
        assert!(cfg.provider_token.is_none());

        let cfg = args(&["--provider-token", "284685063:TEST"]).shop_config();
        assert_eq!(cfg.provider_token.as_deref(), Some("284685063:TEST"));
    }

    #[test]
    fn retries_are_at_least_one() {
        let cfg = args(&["--fulfillment-max-retries", "0", "--provider-currency", "usd"]).shop_config();
        assert_eq!(cfg.fulfillment_max_retries, 1);
        assert_eq!(cfg.provider_currency, "USD");
    }
}
