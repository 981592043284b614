//! HTML pages rendered with askama. Money arrives in cents and leaves as
//! formatted USD strings, so templates only print text.

use crate::error::AppError;
use crate::models::{HistoryRecord, Holding, PortfolioEntry, Portfolio, Quote};
use askama::Template;
use axum::response::Html;

/// Render a template into an HTML response body.
pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

/// Format cents as US dollars with thousands separators, e.g. `$1,234.56`.
pub fn usd(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{:02}", cents % 100)
}

#[derive(Template)]
#[template(path = "apology.html")]
pub struct ApologyTemplate<'a> {
    pub user: Option<String>,
    pub code: u16,
    pub message: &'a str,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "change_password.html")]
pub struct ChangePasswordTemplate {
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "add_cash.html")]
pub struct AddCashTemplate {
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "quote.html")]
pub struct QuoteTemplate {
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "quoted.html")]
pub struct QuotedTemplate {
    pub user: Option<String>,
    pub name: String,
    pub symbol: String,
    pub price: String,
}

impl QuotedTemplate {
    pub fn new(user: Option<String>, quote: Quote) -> Self {
        Self {
            user,
            name: quote.name,
            symbol: quote.symbol,
            price: usd(quote.price),
        }
    }
}

#[derive(Template)]
#[template(path = "buy.html")]
pub struct BuyTemplate {
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "sell.html")]
pub struct SellTemplate {
    pub user: Option<String>,
    pub symbols: Vec<String>,
}

impl SellTemplate {
    pub fn new(user: Option<String>, holdings: Vec<PortfolioEntry>) -> Self {
        Self {
            user,
            symbols: holdings.into_iter().map(|h| h.stock_symbol).collect(),
        }
    }
}

pub struct HoldingRow {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: String,
    pub total: String,
}

impl From<Holding> for HoldingRow {
    fn from(h: Holding) -> Self {
        Self {
            symbol: h.stock_symbol,
            name: h.stock_name,
            shares: h.stock_amount,
            price: usd(h.current_price),
            total: usd(h.total_value),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user: Option<String>,
    pub holdings: Vec<HoldingRow>,
    pub cash: String,
    pub holdings_value: String,
    pub total: String,
}

impl IndexTemplate {
    pub fn new(user: Option<String>, portfolio: Portfolio) -> Self {
        Self {
            user,
            holdings: portfolio.holdings.into_iter().map(HoldingRow::from).collect(),
            cash: usd(portfolio.cash),
            holdings_value: usd(portfolio.holdings_value),
            total: usd(portfolio.grand_total),
        }
    }
}

pub struct HistoryRow {
    pub symbol: String,
    pub shares: i64,
    pub price: String,
    pub total: String,
    pub method: String,
    pub timestamp: String,
}

impl From<HistoryRecord> for HistoryRow {
    fn from(r: HistoryRecord) -> Self {
        Self {
            symbol: r.stock_symbol,
            shares: r.stock_amount,
            price: usd(r.stock_price),
            total: usd(r.total_value),
            method: r.method.to_string(),
            timestamp: r.timestamp,
        }
    }
}

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub user: Option<String>,
    pub records: Vec<HistoryRow>,
}

impl HistoryTemplate {
    pub fn new(user: Option<String>, records: Vec<HistoryRecord>) -> Self {
        Self {
            user,
            records: records.into_iter().map(HistoryRow::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Method;

    #[test]
    fn usd_groups_thousands() {
        assert_eq!(usd(0), "$0.00");
        assert_eq!(usd(5), "$0.05");
        assert_eq!(usd(99_999), "$999.99");
        assert_eq!(usd(1_000_000), "$10,000.00");
        assert_eq!(usd(123_456_789_01), "$123,456,789.01");
        assert_eq!(usd(-1_050), "-$10.50");
    }

    #[test]
    fn apology_escapes_the_message() {
        let html = ApologyTemplate {
            user: None,
            code: 400,
            message: "<script>",
        }
        .render()
        .unwrap();
        assert!(html.contains("400"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn index_shows_holdings_and_totals() {
        let portfolio = Portfolio {
            holdings: vec![Holding {
                stock_symbol: "AAPL".into(),
                stock_name: "Apple Inc".into(),
                stock_amount: 2,
                current_price: 15_000,
                total_value: 30_000,
            }],
            cash: 970_000,
            holdings_value: 30_000,
            grand_total: 1_000_000,
        };
        let html = IndexTemplate::new(Some("alice".into()), portfolio)
            .render()
            .unwrap();

        assert!(html.contains("Apple Inc"));
        assert!(html.contains("$300.00"));
        assert!(html.contains("$9,700.00"));
        assert!(html.contains("$10,000.00"));
        assert!(html.contains("alice"));
    }

    #[test]
    fn history_lists_methods() {
        let record = HistoryRecord {
            id: "1".into(),
            user_id: 1,
            stock_symbol: "MSFT".into(),
            stock_amount: 1,
            stock_price: 40_000,
            total_value: 40_000,
            method: Method::Sell,
            timestamp: "2024-01-01 00:00:00".into(),
        };
        let html = HistoryTemplate::new(None, vec![record]).render().unwrap();

        assert!(html.contains("MSFT"));
        assert!(html.contains("Sell"));
        assert!(html.contains("$400.00"));
    }
}
