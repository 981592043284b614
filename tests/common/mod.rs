#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use stocksim_web::{build_router, AppState, DatabasePool, Quote, QuoteError, QuoteSource};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

/// Quote source with fixed, adjustable prices.
#[derive(Default)]
pub struct StubQuotes(Mutex<HashMap<String, Quote>>);

impl StubQuotes {
    pub fn set(&self, symbol: &str, name: &str, price: i64) {
        self.0.lock().unwrap().insert(
            symbol.to_string(),
            Quote {
                name: name.to_string(),
                symbol: symbol.to_string(),
                price,
            },
        );
    }
}

#[async_trait]
impl QuoteSource for StubQuotes {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, QuoteError> {
        Ok(self.0.lock().unwrap().get(symbol).cloned())
    }
}

pub fn create_app(quotes: Arc<StubQuotes>) -> Router {
    let state = AppState {
        pool: DatabasePool::in_memory().unwrap(),
        quotes,
    };
    let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
    build_router(state).layer(sessions)
}

pub fn default_quotes() -> Arc<StubQuotes> {
    let quotes = StubQuotes::default();
    quotes.set("AAPL", "Apple Inc", 150_00);
    quotes.set("MSFT", "Microsoft Corp", 400_00);
    Arc::new(quotes)
}

/// Reduce `Set-Cookie` headers to a `Cookie` request header value.
pub fn cookie_header(response: &Response<Body>) -> Option<String> {
    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.split(';').next().unwrap_or("").to_string())
        .collect();
    if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Register a user and return the session cookie.
pub async fn register(app: &Router, username: &str, password: &str) -> String {
    let form = format!("username={username}&password={password}&confirmation={password}");
    let response = send(app, post_form("/register", &form, None)).await;
    assert_eq!(location(&response), "/");
    cookie_header(&response).expect("registration should start a session")
}
