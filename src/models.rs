use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered user. `cash` is in cents.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub cash: i64,
}

/// Shares of one symbol held by one user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PortfolioEntry {
    pub user_id: i64,
    pub stock_symbol: String,
    pub stock_amount: i64,
}

/// Direction of a completed transaction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Buy,
    Sell,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Buy => "Buy",
            Method::Sell => "Sell",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Method {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Method {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Buy" => Ok(Method::Buy),
            "Sell" => Ok(Method::Sell),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// One row of the append-only transaction ledger. Money fields are in cents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: String,
    pub user_id: i64,
    pub stock_symbol: String,
    pub stock_amount: i64,
    pub stock_price: i64,
    pub total_value: i64,
    pub method: Method,
    pub timestamp: String,
}

/// A quote from the price source. `price` is in cents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub name: String,
    pub symbol: String,
    pub price: i64,
}

/// A holding priced at the latest quote.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub stock_symbol: String,
    pub stock_name: String,
    pub stock_amount: i64,
    pub current_price: i64,
    pub total_value: i64,
}

/// Everything the index page shows.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Portfolio {
    pub holdings: Vec<Holding>,
    pub cash: i64,
    /// Sum of `total_value` over all holdings.
    pub holdings_value: i64,
    /// Holdings plus cash.
    pub grand_total: i64,
}

/// Convert a floating point dollar price to cents.
pub fn to_cents(price: f64) -> i64 {
    (price * 100.0).round() as i64
}
