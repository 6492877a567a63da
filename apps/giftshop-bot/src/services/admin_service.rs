use giftshop_db::repositories::gift_code_repo::parse_code_lines;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ShopError, ShopResult};

pub const ADD_PRODUCT_USAGE: &str =
    "/addproduct title | description | price_provider | currency | price_points | image_url";
pub const ADD_CODES_USAGE: &str = "/addcodes <product_id>, then one code per line";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price_provider: i64,
    pub currency_provider: String,
    pub price_points: i64,
    pub image_url: String,
}

/// Operator allow-list plus parsing of admin command payloads.
#[derive(Debug, Clone)]
pub struct AdminService {
    admin_ids: Arc<HashSet<i64>>,
    default_currency: String,
}

impl AdminService {
    pub fn new(admin_ids: HashSet<i64>, default_currency: impl Into<String>) -> Self {
        Self {
            admin_ids: Arc::new(admin_ids),
            default_currency: default_currency.into(),
        }
    }

    pub fn is_admin(&self, tg_id: i64) -> bool {
        self.admin_ids.contains(&tg_id)
    }

    /// Parses `title | description | price_provider | currency | price_points | image_url`.
    /// Trailing fields may be omitted; currency falls back to the configured default.
    pub fn parse_new_product(&self, args: &str) -> ShopResult<NewProduct> {
        let fields: Vec<&str> = args.split('|').map(str::trim).collect();
        let field = |i: usize| fields.get(i).copied().unwrap_or("");

        let title = field(0);
        if title.is_empty() {
            return Err(ShopError::InvalidInput(format!("Usage: {}", ADD_PRODUCT_USAGE)));
        }

        let price_provider = parse_price(field(2), "price_provider")?;
        let price_points = parse_price(field(4), "price_points")?;
        let currency = match field(3) {
            "" => self.default_currency.clone(),
            c => c.to_uppercase(),
        };

        Ok(NewProduct {
            title: title.to_string(),
            description: field(1).to_string(),
            price_provider,
            currency_provider: currency,
            price_points,
            image_url: field(5).to_string(),
        })
    }

    /// First line carries the product id, the remaining lines are codes.
    pub fn parse_add_codes(&self, args: &str) -> ShopResult<(i64, Vec<String>)> {
        let (head, body) = args.split_once('\n').unwrap_or((args, ""));
        let product_id = parse_id(head)?;
        let codes = parse_code_lines(body);
        if codes.is_empty() {
            return Err(ShopError::InvalidInput(format!(
                "No codes found. Usage: {}",
                ADD_CODES_USAGE
            )));
        }
        Ok((product_id, codes))
    }
}

pub fn parse_id(raw: &str) -> ShopResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ShopError::InvalidInput(format!("Invalid id: {}", raw.trim())))
}

fn parse_price(raw: &str, name: &str) -> ShopResult<i64> {
    if raw.is_empty() {
        return Ok(0);
    }
    match raw.parse::<i64>() {
        Ok(v) if v >= 0 => Ok(v),
        _ => Err(ShopError::InvalidInput(format!(
            "{} must be a non-negative integer, got '{}'",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AdminService {
        AdminService::new(HashSet::from([100, 200]), "RUB")
    }

    #[test]
    fn allow_list_gates_admins() {
        let svc = admin();
        assert!(svc.is_admin(100));
        assert!(!svc.is_admin(300));
    }

    #[test]
    fn parses_full_product_line() {
        let p = admin()
            .parse_new_product("Steam 10$ | Digital code | 1000 | usd | 100 | https://img/x.png")
            .unwrap();
        assert_eq!(p.title, "Steam 10$");
        assert_eq!(p.price_provider, 1000);
        assert_eq!(p.currency_provider, "USD");
        assert_eq!(p.price_points, 100);
        assert_eq!(p.image_url, "https://img/x.png");
    }

    #[test]
    fn missing_fields_default() {
        let p = admin().parse_new_product("Netflix | Subscription | 1500").unwrap();
        assert_eq!(p.currency_provider, "RUB");
        assert_eq!(p.price_points, 0);
        assert_eq!(p.image_url, "");
    }

    #[test]
    fn zero_prices_on_both_rails_are_accepted() {
        let p = admin().parse_new_product("Freebie | | 0 | RUB | 0").unwrap();
        assert_eq!((p.price_provider, p.price_points), (0, 0));
    }

    #[test]
    fn rejects_bad_prices_and_empty_title() {
        assert!(admin().parse_new_product(" | desc | 10").is_err());
        assert!(admin().parse_new_product("X | desc | -5").is_err());
        assert!(admin().parse_new_product("X | desc | ten").is_err());
    }

    #[test]
    fn parses_code_upload() {
        let (id, codes) = admin().parse_add_codes("7\nA1\n\nA2\nA2\n").unwrap();
        assert_eq!(id, 7);
        assert_eq!(codes, vec!["A1", "A2", "A2"]);
    }

    #[test]
    fn code_upload_needs_id_and_codes() {
        assert!(admin().parse_add_codes("x\nA1").is_err());
        assert!(admin().parse_add_codes("7").is_err());
    }
}
