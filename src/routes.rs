use crate::error::apology_with_user;
use crate::handlers::{
    accounts::{
        add_cash, add_cash_form, change_password, change_password_form, login, login_form,
        logout, register, register_form,
    },
    portfolio::{history, index},
    trading::{buy_form, buy_stock, quote, quote_form, sell_form, sell_stock},
    AppState,
};
use axum::http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::http::HeaderValue;
use axum::{middleware, routing::get, Router};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

/// Build the application routes. The caller adds the session layer on top.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Portfolio routes
        .route("/", get(index))
        .route("/history", get(history))
        // Trading routes
        .route("/quote", get(quote_form).post(quote))
        .route("/buy", get(buy_form).post(buy_stock))
        .route("/sell", get(sell_form).post(sell_stock))
        // Account routes
        .route("/addcash", get(add_cash_form).post(add_cash))
        .route(
            "/changePassword",
            get(change_password_form).post(change_password),
        )
        // Auth routes
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        // Database and quote source state
        .with_state(state)
        // Error pages show the logged in navigation
        .layer(middleware::from_fn(apology_with_user))
        // Responses are never cached
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
}
