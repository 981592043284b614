use crate::auth::SessionUser;
use crate::error::AppError;
use crate::forms::{QuoteForm, TradeForm};
use crate::handlers::AppState;
use crate::trading;
use crate::views::{render, BuyTemplate, QuoteTemplate, QuotedTemplate, SellTemplate};
use axum::{
    extract::State,
    response::{Html, Redirect},
    Form,
};

pub async fn quote_form(user: SessionUser) -> Result<Html<String>, AppError> {
    render(&QuoteTemplate {
        user: Some(user.username),
    })
}

pub async fn quote(
    State(state): State<AppState>,
    user: SessionUser,
    Form(form): Form<QuoteForm>,
) -> Result<Html<String>, AppError> {
    let query = form.validate()?;
    let stock = trading::quote(state.quotes.as_ref(), &query).await?;
    render(&QuotedTemplate::new(Some(user.username), stock))
}

pub async fn buy_form(user: SessionUser) -> Result<Html<String>, AppError> {
    render(&BuyTemplate {
        user: Some(user.username),
    })
}

/// Buy shares at the current price. The form carries `symbol` and `shares`.
#[axum::debug_handler]
pub async fn buy_stock(
    State(state): State<AppState>,
    user: SessionUser,
    Form(form): Form<TradeForm>,
) -> Result<Redirect, AppError> {
    let order = form.validate()?;
    trading::buy(&state.pool, state.quotes.as_ref(), user.id, order).await?;
    Ok(Redirect::to("/"))
}

/// The sell form only offers symbols the user holds.
pub async fn sell_form(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Html<String>, AppError> {
    let holdings = trading::holdings(&state.pool, user.id).await?;
    render(&SellTemplate::new(Some(user.username), holdings))
}

/// Sell shares at the current price. The form carries `symbol` and `shares`.
pub async fn sell_stock(
    State(state): State<AppState>,
    user: SessionUser,
    Form(form): Form<TradeForm>,
) -> Result<Redirect, AppError> {
    let order = form.validate()?;
    trading::sell(&state.pool, state.quotes.as_ref(), user.id, order).await?;
    Ok(Redirect::to("/"))
}
