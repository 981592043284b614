//! Buy, sell and cash rules against the quote source and the store.
//!
//! Quotes are fetched before the connection is locked. Every mutation runs in
//! one SQLite transaction; returning early drops it, which rolls back.

use crate::db::DatabasePool;
use crate::error::AppError;
use crate::forms::{CashDeposit, SymbolQuery, TradeOrder};
use crate::models::{HistoryRecord, Holding, Method, Portfolio, PortfolioEntry, Quote};
use crate::quotes::QuoteSource;
use rusqlite::{OptionalExtension, Transaction};

/// Look up a symbol, turning absence into a user-facing error.
pub async fn quote(quotes: &dyn QuoteSource, query: &SymbolQuery) -> Result<Quote, AppError> {
    quotes
        .lookup(&query.0)
        .await?
        .ok_or(AppError::Lookup("invalid stock symbol"))
}

pub async fn buy(
    pool: &DatabasePool,
    quotes: &dyn QuoteSource,
    user_id: i64,
    order: TradeOrder,
) -> Result<HistoryRecord, AppError> {
    let stock = quote(quotes, &SymbolQuery(order.symbol)).await?;
    let cost = stock
        .price
        .checked_mul(order.shares)
        .ok_or(AppError::InsufficientFunds)?;

    let mut conn = pool.lock().await;
    let tx = conn.transaction()?;

    let cash = cash_of(&tx, user_id)?;
    if cash - cost < 0 {
        return Err(AppError::InsufficientFunds);
    }

    tx.execute(
        "UPDATE users SET cash = cash - ? WHERE id = ?",
        rusqlite::params![cost, user_id],
    )?;
    let record = record_history(&tx, user_id, &stock, order.shares, cost, Method::Buy)?;
    tx.execute(
        "INSERT INTO portfolio (user_id, stock_symbol, stock_amount)
         VALUES (?, ?, ?)
         ON CONFLICT(user_id, stock_symbol)
         DO UPDATE SET stock_amount = portfolio.stock_amount + excluded.stock_amount",
        rusqlite::params![user_id, &stock.symbol, order.shares],
    )?;
    tx.commit()?;

    tracing::info!(
        "User {} bought {} {} at {}",
        user_id,
        order.shares,
        stock.symbol,
        stock.price
    );
    Ok(record)
}

pub async fn sell(
    pool: &DatabasePool,
    quotes: &dyn QuoteSource,
    user_id: i64,
    order: TradeOrder,
) -> Result<HistoryRecord, AppError> {
    let stock = quote(quotes, &SymbolQuery(order.symbol)).await?;

    let mut conn = pool.lock().await;
    let tx = conn.transaction()?;

    // Not holding the symbol at all counts as zero shares
    let held: i64 = tx
        .query_row(
            "SELECT stock_amount FROM portfolio WHERE user_id = ? AND stock_symbol = ?",
            rusqlite::params![user_id, &stock.symbol],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);
    if order.shares > held {
        return Err(AppError::Validation("invalid number of shares"));
    }

    let proceeds = stock
        .price
        .checked_mul(order.shares)
        .ok_or(AppError::Overflow)?;
    let balance = cash_of(&tx, user_id)?
        .checked_add(proceeds)
        .ok_or(AppError::Overflow)?;
    tx.execute(
        "UPDATE users SET cash = ? WHERE id = ?",
        rusqlite::params![balance, user_id],
    )?;
    let record = record_history(&tx, user_id, &stock, order.shares, proceeds, Method::Sell)?;

    let remaining = held - order.shares;
    if remaining == 0 {
        tx.execute(
            "DELETE FROM portfolio WHERE user_id = ? AND stock_symbol = ?",
            rusqlite::params![user_id, &stock.symbol],
        )?;
    } else {
        tx.execute(
            "UPDATE portfolio SET stock_amount = ? WHERE user_id = ? AND stock_symbol = ?",
            rusqlite::params![remaining, user_id, &stock.symbol],
        )?;
    }
    tx.commit()?;

    tracing::info!(
        "User {} sold {} {} at {}",
        user_id,
        order.shares,
        stock.symbol,
        stock.price
    );
    Ok(record)
}

/// Add a deposit to the user's cash and return the new balance.
pub async fn add_cash(
    pool: &DatabasePool,
    user_id: i64,
    deposit: CashDeposit,
) -> Result<i64, AppError> {
    let mut conn = pool.lock().await;
    let tx = conn.transaction()?;

    let balance = cash_of(&tx, user_id)?
        .checked_add(deposit.cents())
        .ok_or(AppError::Validation("invalid cash amount"))?;
    tx.execute(
        "UPDATE users SET cash = ? WHERE id = ?",
        rusqlite::params![balance, user_id],
    )?;
    tx.commit()?;

    tracing::info!("User {} added {} cents", user_id, deposit.cents());
    Ok(balance)
}

/// Current holdings, without prices.
pub async fn holdings(pool: &DatabasePool, user_id: i64) -> Result<Vec<PortfolioEntry>, AppError> {
    let conn = pool.lock().await;
    let mut stmt = conn.prepare(
        "SELECT user_id, stock_symbol, stock_amount FROM portfolio
         WHERE user_id = ?
         ORDER BY stock_symbol",
    )?;
    let entries = stmt
        .query_map([user_id], |row| {
            Ok(PortfolioEntry {
                user_id: row.get(0)?,
                stock_symbol: row.get(1)?,
                stock_amount: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Holdings priced at the latest quotes, plus cash and totals.
pub async fn portfolio_view(
    pool: &DatabasePool,
    quotes: &dyn QuoteSource,
    user_id: i64,
) -> Result<Portfolio, AppError> {
    let entries = holdings(pool, user_id).await?;
    let cash = {
        let conn = pool.lock().await;
        conn.query_row("SELECT cash FROM users WHERE id = ?", [user_id], |row| {
            row.get::<_, i64>(0)
        })?
    };

    let mut holdings = Vec::with_capacity(entries.len());
    let mut holdings_value: i64 = 0;
    for entry in entries {
        let stock = quote(quotes, &SymbolQuery(entry.stock_symbol)).await?;
        let total_value = stock
            .price
            .checked_mul(entry.stock_amount)
            .ok_or(AppError::Overflow)?;
        holdings_value = holdings_value
            .checked_add(total_value)
            .ok_or(AppError::Overflow)?;
        holdings.push(Holding {
            stock_symbol: stock.symbol,
            stock_name: stock.name,
            stock_amount: entry.stock_amount,
            current_price: stock.price,
            total_value,
        });
    }

    let grand_total = holdings_value
        .checked_add(cash)
        .ok_or(AppError::Overflow)?;

    Ok(Portfolio {
        holdings,
        cash,
        holdings_value,
        grand_total,
    })
}

/// Every transaction of the user, oldest first.
pub async fn history_view(
    pool: &DatabasePool,
    user_id: i64,
) -> Result<Vec<HistoryRecord>, AppError> {
    let conn = pool.lock().await;
    let mut stmt = conn.prepare(
        "SELECT id, user_id, stock_symbol, stock_amount, stock_price, total_value, method, timestamp
         FROM history
         WHERE user_id = ?
         ORDER BY rowid",
    )?;
    let records = stmt
        .query_map([user_id], |row| {
            Ok(HistoryRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                stock_symbol: row.get(2)?,
                stock_amount: row.get(3)?,
                stock_price: row.get(4)?,
                total_value: row.get(5)?,
                method: row.get(6)?,
                timestamp: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

fn cash_of(tx: &Transaction<'_>, user_id: i64) -> Result<i64, rusqlite::Error> {
    tx.query_row("SELECT cash FROM users WHERE id = ?", [user_id], |row| {
        row.get(0)
    })
}

fn record_history(
    tx: &Transaction<'_>,
    user_id: i64,
    stock: &Quote,
    shares: i64,
    total_value: i64,
    method: Method,
) -> Result<HistoryRecord, rusqlite::Error> {
    let record = HistoryRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id,
        stock_symbol: stock.symbol.clone(),
        stock_amount: shares,
        stock_price: stock.price,
        total_value,
        method,
        timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    tx.execute(
        "INSERT INTO history (id, user_id, stock_symbol, stock_amount, stock_price, total_value, method, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &record.id,
            record.user_id,
            &record.stock_symbol,
            record.stock_amount,
            record.stock_price,
            record.total_value,
            record.method,
            &record.timestamp,
        ],
    )?;
    Ok(record)
}
