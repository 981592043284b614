use crate::auth::SessionUser;
use crate::error::AppError;
use crate::handlers::AppState;
use crate::trading::{history_view, portfolio_view};
use crate::views::{render, HistoryTemplate, IndexTemplate};
use axum::{extract::State, response::Html};

/// Holdings at current prices, cash and the grand total.
pub async fn index(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Html<String>, AppError> {
    let portfolio = portfolio_view(&state.pool, state.quotes.as_ref(), user.id).await?;
    render(&IndexTemplate::new(Some(user.username), portfolio))
}

pub async fn history(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Html<String>, AppError> {
    let records = history_view(&state.pool, user.id).await?;
    render(&HistoryTemplate::new(Some(user.username), records))
}
